//! Face search session
//!
//! Independent of the clustering session: it has its own in-flight guard
//! and shares only the gateway.

use crate::error::{WorkflowError, WorkflowResult};
use crate::gateway::{post_json, ServiceGateway};
use crate::services::{InFlightGuard, SessionOutcome};
use crate::utils::paths::split_file_name;
use chrono::Utc;
use fcw_common::api::{SearchRequest, SearchResponse, SEARCH_FACES};
use fcw_common::events::{EventBus, WorkflowEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Matches in service order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub matches: Vec<String>,
    pub count: u64,
}

impl SearchResult {
    /// Matches split into file name and parent directory, for display
    pub fn items(&self) -> Vec<SearchMatch<'_>> {
        self.matches.iter().map(|path| SearchMatch::new(path)).collect()
    }
}

/// One matching image path
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchMatch<'a> {
    pub path: &'a str,
    pub file_name: &'a str,
    pub directory: &'a str,
}

impl<'a> SearchMatch<'a> {
    pub fn new(path: &'a str) -> Self {
        let (directory, file_name) = split_file_name(path);
        Self {
            path,
            file_name,
            directory,
        }
    }
}

/// Face search workflow
pub struct SearchSession {
    gateway: Arc<dyn ServiceGateway>,
    event_bus: EventBus,
    in_flight: AtomicBool,
}

impl SearchSession {
    pub fn new(gateway: Arc<dyn ServiceGateway>, event_bus: EventBus) -> Self {
        Self {
            gateway,
            event_bus,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Find images in `directory` tagged with any of `person_names`
    /// (comma-separated)
    pub async fn run(
        &self,
        directory: &str,
        person_names: &str,
    ) -> WorkflowResult<SessionOutcome<SearchResult>> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("Search already in flight, ignoring request");
            return Ok(SessionOutcome::AlreadyRunning);
        };

        let directory = directory.trim();
        let person_names = person_names.trim();
        if directory.is_empty() || person_names.is_empty() {
            return Err(WorkflowError::Validation(
                "Please fill in both the directory and the person names".to_string(),
            ));
        }

        let request = SearchRequest {
            directory: directory.to_string(),
            face_names: person_names.to_string(),
        };
        tracing::debug!(directory = %directory, names = %person_names, "Searching faces");

        match post_json::<_, SearchResponse>(self.gateway.as_ref(), SEARCH_FACES, &request).await {
            Ok(response) => {
                tracing::info!(directory = %directory, count = response.count, "Search completed");
                self.event_bus.emit_lossy(WorkflowEvent::SearchCompleted {
                    directory: directory.to_string(),
                    count: response.count,
                    timestamp: Utc::now(),
                });
                Ok(SessionOutcome::Completed(SearchResult {
                    matches: response.matches,
                    count: response.count,
                }))
            }
            Err(e) => {
                tracing::error!(error = %e, "Search failed");
                self.event_bus.emit_lossy(WorkflowEvent::SearchFailed {
                    message: e.message.clone(),
                    timestamp: Utc::now(),
                });
                Err(e.into())
            }
        }
    }
}
