//! Event types for the FCW workflow
//!
//! Orchestration code never renders anything itself. It emits a
//! `WorkflowEvent` on the `EventBus` and whatever adapter is attached (the
//! command-line front end, a GUI, a test) subscribes and displays it.

use crate::api::{Algorithm, Statistics};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Workflow event types
///
/// Serialized with a `type` tag so an adapter can forward them verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkflowEvent {
    /// Directory image count known (from cache or service)
    ImageCountUpdated {
        directory: String,
        count: u64,
        /// True when served from the count cache
        cached: bool,
        timestamp: DateTime<Utc>,
    },

    /// Directory image count lookup failed
    ImageCountFailed {
        directory: String,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Clustering run accepted and submitted
    ClusteringStarted {
        run_id: Uuid,
        directory: String,
        algorithm: Algorithm,
        timestamp: DateTime<Utc>,
    },

    /// Staged progress tick
    ///
    /// Scripted, not derived from the service. Reaching 100 does not mean
    /// the job is done; `ClusteringCompleted`/`ClusteringFailed` do.
    ClusteringProgress {
        run_id: Uuid,
        percentage: u8,
        label: String,
        timestamp: DateTime<Utc>,
    },

    /// Progress indicator reached its terminal state (run ended)
    ClusteringProgressFinished {
        run_id: Uuid,
        timestamp: DateTime<Utc>,
    },

    /// Clustering run succeeded and the cluster model was replaced
    ClusteringCompleted {
        run_id: Uuid,
        statistics: Statistics,
        cluster_count: usize,
        timestamp: DateTime<Utc>,
    },

    /// Clustering run failed; previous results are untouched
    ClusteringFailed {
        run_id: Uuid,
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Labels committed; `accepted` may be lower than `submitted`
    MetadataSaved {
        submitted: usize,
        accepted: u64,
        timestamp: DateTime<Utc>,
    },

    /// Commit requested with no named cluster
    MetadataNothingToSave { timestamp: DateTime<Utc> },

    /// Metadata commit failed at the service
    MetadataFailed {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Face search finished
    SearchCompleted {
        directory: String,
        count: u64,
        timestamp: DateTime<Utc>,
    },

    /// Face search failed at the service
    SearchFailed {
        message: String,
        timestamp: DateTime<Utc>,
    },

    /// Export document written
    ResultsExported {
        path: String,
        cluster_count: usize,
        timestamp: DateTime<Utc>,
    },
}

/// Broadcast channel for workflow events
///
/// Cloning shares the underlying channel.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<WorkflowEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// Slow subscribers lose the oldest events once `capacity` is exceeded.
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: WorkflowEvent,
    ) -> Result<usize, broadcast::error::SendError<WorkflowEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: WorkflowEvent) {
        let _ = self.tx.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emit_lossy_without_subscribers() {
        let bus = EventBus::new(4);
        bus.emit_lossy(WorkflowEvent::MetadataNothingToSave {
            timestamp: Utc::now(),
        });
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus
            .emit(WorkflowEvent::MetadataNothingToSave {
                timestamp: Utc::now()
            })
            .is_err());
    }

    #[tokio::test]
    async fn test_subscriber_receives_event() {
        let bus = EventBus::new(4);
        let mut rx = bus.subscribe();
        let run_id = Uuid::new_v4();

        bus.emit_lossy(WorkflowEvent::ClusteringProgress {
            run_id,
            percentage: 20,
            label: "Reading images".to_string(),
            timestamp: Utc::now(),
        });

        match rx.recv().await.unwrap() {
            WorkflowEvent::ClusteringProgress {
                run_id: got,
                percentage,
                ..
            } => {
                assert_eq!(got, run_id);
                assert_eq!(percentage, 20);
            }
            other => panic!("unexpected event: {:?}", other),
        }
    }

    #[test]
    fn test_event_serializes_with_type_tag() {
        let event = WorkflowEvent::SearchFailed {
            message: "boom".to_string(),
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "SearchFailed");
        assert_eq!(value["message"], "boom");
    }
}
