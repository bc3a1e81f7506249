//! Directory image count lookup with memoization
//!
//! Counts are cached per exact directory string for the life of the
//! session: no expiry and no path normalization, so `C:\Photos` and
//! `C:\Photos\` are two different keys. Only successful lookups are cached.

use crate::error::WorkflowResult;
use crate::gateway::{post_json, ServiceGateway};
use chrono::Utc;
use fcw_common::api::{CountRequest, CountResponse, IMAGES_COUNT};
use fcw_common::events::{EventBus, WorkflowEvent};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Directory → image count memo
#[derive(Debug, Default)]
pub struct CountCache {
    entries: HashMap<String, u64>,
}

impl CountCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lookup(&self, directory: &str) -> Option<u64> {
        self.entries.get(directory).copied()
    }

    pub fn store(&mut self, directory: impl Into<String>, count: u64) {
        self.entries.insert(directory.into(), count);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Image count for a directory and where it came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageCount {
    pub count: u64,
    pub cached: bool,
}

/// Resolves directory image counts, consulting the cache first
pub struct ImageCounter {
    gateway: Arc<dyn ServiceGateway>,
    cache: Mutex<CountCache>,
    event_bus: EventBus,
}

impl ImageCounter {
    pub fn new(gateway: Arc<dyn ServiceGateway>, event_bus: EventBus) -> Self {
        Self {
            gateway,
            cache: Mutex::new(CountCache::new()),
            event_bus,
        }
    }

    /// Count images in `directory`
    ///
    /// Returns `Ok(None)` for a blank directory without calling the service.
    /// A failed lookup leaves the cache untouched.
    pub async fn update_image_count(&self, directory: &str) -> WorkflowResult<Option<ImageCount>> {
        if directory.trim().is_empty() {
            return Ok(None);
        }

        if let Some(count) = self.cache.lock().await.lookup(directory) {
            tracing::debug!(directory = %directory, count, "Image count cache hit");
            self.event_bus.emit_lossy(WorkflowEvent::ImageCountUpdated {
                directory: directory.to_string(),
                count,
                cached: true,
                timestamp: Utc::now(),
            });
            return Ok(Some(ImageCount {
                count,
                cached: true,
            }));
        }

        tracing::debug!(directory = %directory, "Image count cache miss");
        let request = CountRequest {
            directory: directory.to_string(),
        };

        match post_json::<_, CountResponse>(self.gateway.as_ref(), IMAGES_COUNT, &request).await {
            Ok(response) => {
                self.cache.lock().await.store(directory, response.count);
                tracing::info!(directory = %directory, count = response.count, "Counted images");
                self.event_bus.emit_lossy(WorkflowEvent::ImageCountUpdated {
                    directory: directory.to_string(),
                    count: response.count,
                    cached: false,
                    timestamp: Utc::now(),
                });
                Ok(Some(ImageCount {
                    count: response.count,
                    cached: false,
                }))
            }
            Err(e) => {
                tracing::error!(directory = %directory, error = %e, "Error counting images");
                self.event_bus.emit_lossy(WorkflowEvent::ImageCountFailed {
                    directory: directory.to_string(),
                    message: e.message.clone(),
                    timestamp: Utc::now(),
                });
                Err(e.into())
            }
        }
    }

    /// Number of directories currently memoized
    pub async fn cached_directories(&self) -> usize {
        self.cache.lock().await.len()
    }
}
