//! Clustering session
//!
//! Runs one clustering job end to end:
//! guard → validate → remember settings → start progress → submit →
//! stop progress → replace model (success only) → release guard.
//!
//! At most one run is in flight; a second `run` while one is pending is a
//! no-op. A failed run leaves the previous cluster model in place.

use crate::error::{WorkflowError, WorkflowResult};
use crate::gateway::{post_json, ServiceGateway};
use crate::models::{ClusterModel, ClusteringForm, SharedClusterModel};
use crate::services::preferences::PreferenceStore;
use crate::services::progress_simulator::ProgressSimulator;
use crate::services::{InFlightGuard, SessionOutcome};
use chrono::Utc;
use fcw_common::api::{ClusterRequest, ClusterResponse, Statistics, FACES_CLUSTER};
use fcw_common::events::{EventBus, WorkflowEvent};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use uuid::Uuid;

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringSummary {
    pub run_id: Uuid,
    pub statistics: Statistics,
    pub cluster_count: usize,
}

/// Clustering workflow with its in-flight guard
pub struct ClusteringSession {
    gateway: Arc<dyn ServiceGateway>,
    model: SharedClusterModel,
    preferences: Arc<dyn PreferenceStore>,
    simulator: ProgressSimulator,
    event_bus: EventBus,
    in_flight: AtomicBool,
}

impl ClusteringSession {
    pub fn new(
        gateway: Arc<dyn ServiceGateway>,
        model: SharedClusterModel,
        preferences: Arc<dyn PreferenceStore>,
        simulator: ProgressSimulator,
        event_bus: EventBus,
    ) -> Self {
        Self {
            gateway,
            model,
            preferences,
            simulator,
            event_bus,
            in_flight: AtomicBool::new(false),
        }
    }

    /// True while a run is pending
    pub fn is_running(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Cluster the faces found in `form.directory` with the form's
    /// selected algorithm
    ///
    /// Returns `SessionOutcome::AlreadyRunning` without side effects when a
    /// run is pending. Validation errors are raised before any network call.
    /// Every field of the form is remembered, not only the ones the job uses.
    pub async fn run(
        &self,
        form: &ClusteringForm,
    ) -> WorkflowResult<SessionOutcome<ClusteringSummary>> {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!(directory = %form.directory, "Clustering already in flight, ignoring request");
            return Ok(SessionOutcome::AlreadyRunning);
        };

        let directory = form.directory.trim();
        if directory.is_empty() {
            return Err(WorkflowError::Validation(
                "Please specify a directory".to_string(),
            ));
        }
        let params = form.job_parameters()?;

        if let Err(e) = self.preferences.save(&form.snapshot()).await {
            tracing::warn!(error = %e, "Could not remember clustering settings");
        }

        let run_id = Uuid::new_v4();
        tracing::info!(
            run_id = %run_id,
            directory = %directory,
            algorithm = %params.algorithm(),
            "Starting clustering run"
        );
        self.event_bus.emit_lossy(WorkflowEvent::ClusteringStarted {
            run_id,
            directory: directory.to_string(),
            algorithm: params.algorithm(),
            timestamp: Utc::now(),
        });

        let tick_bus = self.event_bus.clone();
        let progress = self.simulator.start(move |stage| {
            tick_bus.emit_lossy(WorkflowEvent::ClusteringProgress {
                run_id,
                percentage: stage.percentage,
                label: stage.label.to_string(),
                timestamp: Utc::now(),
            });
        });

        let request = ClusterRequest {
            directory: directory.to_string(),
            params,
        };
        let result =
            post_json::<_, ClusterResponse>(self.gateway.as_ref(), FACES_CLUSTER, &request).await;

        progress.stop();
        self.event_bus
            .emit_lossy(WorkflowEvent::ClusteringProgressFinished {
                run_id,
                timestamp: Utc::now(),
            });

        match result {
            Ok(response) => {
                let statistics = response.statistics;
                let model = ClusterModel::from_response(response.clusters, statistics);
                let cluster_count = model.len();

                *self.model.write().await = model;

                tracing::info!(
                    run_id = %run_id,
                    clusters = cluster_count,
                    total_faces = statistics.total_faces,
                    clustered_faces = statistics.clustered_faces,
                    "Clustering run completed"
                );
                self.event_bus.emit_lossy(WorkflowEvent::ClusteringCompleted {
                    run_id,
                    statistics,
                    cluster_count,
                    timestamp: Utc::now(),
                });

                Ok(SessionOutcome::Completed(ClusteringSummary {
                    run_id,
                    statistics,
                    cluster_count,
                }))
            }
            Err(e) => {
                tracing::error!(run_id = %run_id, error = %e, "Clustering run failed");
                self.event_bus.emit_lossy(WorkflowEvent::ClusteringFailed {
                    run_id,
                    message: e.message.clone(),
                    timestamp: Utc::now(),
                });
                Err(e.into())
            }
        }
    }
}
