//! Metadata commit: write person names back to the service
//!
//! Labels are resolved against the current cluster model at commit time
//! and sent as one request keyed by cluster id.

use crate::error::WorkflowResult;
use crate::gateway::{post_json, ServiceGateway};
use crate::models::{ClusterModel, LabelAssignment, SharedClusterModel};
use chrono::Utc;
use fcw_common::api::{MetadataEntry, MetadataRequest, MetadataResponse, METADATA_ADD};
use fcw_common::events::{EventBus, WorkflowEvent};
use std::sync::Arc;

/// Result of a commit that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// No cluster had a name; the service was not called
    NothingToSave,
    /// Request accepted; `accepted` may be lower than `submitted`
    Saved { submitted: usize, accepted: u64 },
}

impl CommitOutcome {
    /// Service accepted fewer clusters than were sent
    pub fn is_partial(&self) -> bool {
        match self {
            CommitOutcome::Saved {
                submitted,
                accepted,
            } => *accepted < *submitted as u64,
            CommitOutcome::NothingToSave => false,
        }
    }
}

/// Build the `/metadata/add` payload
///
/// Blank names are dropped. Unknown cluster ids still produce an entry,
/// with no paths. If an id is labelled twice the last label wins.
pub fn build_payload(model: &ClusterModel, labels: &[LabelAssignment]) -> MetadataRequest {
    let mut payload = MetadataRequest::new();
    for label in labels {
        let Some(name) = label.name() else {
            continue;
        };
        payload.insert(
            label.cluster_id.to_string(),
            MetadataEntry {
                name: name.to_string(),
                paths: model.get_members(&label.cluster_id).to_vec(),
            },
        );
    }
    payload
}

/// Commits person names against the shared cluster model
pub struct MetadataCommit {
    gateway: Arc<dyn ServiceGateway>,
    model: SharedClusterModel,
    event_bus: EventBus,
}

impl MetadataCommit {
    pub fn new(gateway: Arc<dyn ServiceGateway>, model: SharedClusterModel, event_bus: EventBus) -> Self {
        Self {
            gateway,
            model,
            event_bus,
        }
    }

    pub async fn commit(&self, labels: &[LabelAssignment]) -> WorkflowResult<CommitOutcome> {
        let payload = {
            let model = self.model.read().await;
            build_payload(&model, labels)
        };

        if payload.is_empty() {
            tracing::warn!("No names entered, nothing to save");
            self.event_bus.emit_lossy(WorkflowEvent::MetadataNothingToSave {
                timestamp: Utc::now(),
            });
            return Ok(CommitOutcome::NothingToSave);
        }

        let submitted = payload.len();
        tracing::debug!(clusters = submitted, "Submitting cluster names");

        match post_json::<_, MetadataResponse>(self.gateway.as_ref(), METADATA_ADD, &payload).await {
            Ok(response) => {
                let accepted = response.success_count;
                if accepted < submitted as u64 {
                    tracing::warn!(submitted, accepted, "Service accepted only part of the names");
                } else {
                    tracing::info!(submitted, accepted, "Saved cluster names");
                }
                self.event_bus.emit_lossy(WorkflowEvent::MetadataSaved {
                    submitted,
                    accepted,
                    timestamp: Utc::now(),
                });
                Ok(CommitOutcome::Saved {
                    submitted,
                    accepted,
                })
            }
            Err(e) => {
                tracing::error!(error = %e, "Saving cluster names failed");
                self.event_bus.emit_lossy(WorkflowEvent::MetadataFailed {
                    message: e.message.clone(),
                    timestamp: Utc::now(),
                });
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fcw_common::api::{Statistics, WireCluster};
    use std::collections::BTreeMap;

    fn model() -> ClusterModel {
        let mut clusters = BTreeMap::new();
        clusters.insert(
            "0".to_string(),
            WireCluster {
                count: Some(2),
                faces: vec!["a".to_string(), "b".to_string()],
            },
        );
        clusters.insert(
            "1".to_string(),
            WireCluster {
                count: Some(1),
                faces: vec!["c".to_string()],
            },
        );
        ClusterModel::from_response(clusters, Statistics::default())
    }

    #[test]
    fn test_payload_skips_blank_names() {
        let labels = vec![
            LabelAssignment::new("0", "Alice"),
            LabelAssignment::new("1", "   "),
        ];
        let payload = build_payload(&model(), &labels);

        assert_eq!(payload.len(), 1);
        assert_eq!(payload["0"].name, "Alice");
        assert_eq!(payload["0"].paths, vec!["a", "b"]);
    }

    #[test]
    fn test_payload_for_stale_id_has_no_paths() {
        let payload = build_payload(&model(), &[LabelAssignment::new("9", "Zed")]);
        assert_eq!(payload["9"].paths, Vec::<String>::new());
    }

    #[test]
    fn test_partial_acceptance() {
        assert!(CommitOutcome::Saved { submitted: 3, accepted: 2 }.is_partial());
        assert!(!CommitOutcome::Saved { submitted: 2, accepted: 2 }.is_partial());
        assert!(!CommitOutcome::NothingToSave.is_partial());
    }
}
