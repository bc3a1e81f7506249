//! Export of clustering results to a portable JSON document

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::{ClusterId, ClusterModel, LabelAssignment};
use chrono::{DateTime, SecondsFormat, Utc};
use fcw_common::api::Statistics;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

/// Exported cluster: resolved name and member references
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportCluster {
    pub name: String,
    pub paths: Vec<String>,
}

/// Snapshot of statistics, clusters and names
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportDocument {
    /// ISO-8601 creation time
    pub timestamp: String,
    pub statistics: Statistics,
    pub clusters: BTreeMap<String, ExportCluster>,
}

impl ExportDocument {
    /// Build the document at time `now`
    ///
    /// Every cluster in the model appears, named by its label or by its
    /// positional default. Labels for ids no longer in the model still
    /// appear, with no paths.
    pub fn snapshot(
        model: &ClusterModel,
        statistics: Statistics,
        labels: &[LabelAssignment],
        now: DateTime<Utc>,
    ) -> Self {
        let names: HashMap<&ClusterId, &str> = labels
            .iter()
            .filter_map(|label| label.name().map(|name| (&label.cluster_id, name)))
            .collect();

        let mut ids: Vec<&ClusterId> = model.ids().collect();
        for label in labels {
            if !model.contains(&label.cluster_id) && !ids.contains(&&label.cluster_id) {
                ids.push(&label.cluster_id);
            }
        }

        let clusters = ids
            .into_iter()
            .map(|id| {
                let name = names
                    .get(id)
                    .map(|name| name.to_string())
                    .unwrap_or_else(|| id.default_name());
                (
                    id.to_string(),
                    ExportCluster {
                        name,
                        paths: model.get_members(id).to_vec(),
                    },
                )
            })
            .collect();

        Self {
            timestamp: now.to_rfc3339_opts(SecondsFormat::Millis, true),
            statistics,
            clusters,
        }
    }

    /// `face-clustering-results-YYYY-MM-DD.json`
    pub fn file_name(now: DateTime<Utc>) -> String {
        format!("face-clustering-results-{}.json", now.format("%Y-%m-%d"))
    }

    /// Write the pretty-printed document into `dir`, returning its path
    pub async fn write_to(&self, dir: &Path, now: DateTime<Utc>) -> WorkflowResult<PathBuf> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| WorkflowError::Export(e.to_string()))?;

        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| WorkflowError::Export(format!("Create {} failed: {}", dir.display(), e)))?;

        let path = dir.join(Self::file_name(now));
        tokio::fs::write(&path, json)
            .await
            .map_err(|e| WorkflowError::Export(format!("Write {} failed: {}", path.display(), e)))?;

        tracing::info!(path = %path.display(), clusters = self.clusters.len(), "Exported results");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use fcw_common::api::WireCluster;
    use tempfile::TempDir;

    fn model() -> ClusterModel {
        let mut clusters = BTreeMap::new();
        for (id, faces) in [("0", vec!["a", "b"]), ("1", vec!["c"])] {
            clusters.insert(
                id.to_string(),
                WireCluster {
                    count: Some(faces.len() as u64),
                    faces: faces.into_iter().map(String::from).collect(),
                },
            );
        }
        ClusterModel::from_response(
            clusters,
            Statistics {
                total_faces: 4,
                clustered_faces: 3,
                num_clusters: 2,
                clustering_rate: 0.75,
            },
        )
    }

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 9, 14, 30, 0).unwrap()
    }

    #[test]
    fn test_unlabelled_clusters_get_positional_names() {
        let model = model();
        let labels = vec![LabelAssignment::new("1", " Bob "), LabelAssignment::new("0", "")];
        let doc = ExportDocument::snapshot(&model, model.statistics(), &labels, fixed_now());

        assert_eq!(doc.clusters.len(), 2);
        assert_eq!(doc.clusters["0"].name, "Person 1");
        assert_eq!(doc.clusters["0"].paths, vec!["a", "b"]);
        assert_eq!(doc.clusters["1"].name, "Bob");
        assert_eq!(doc.timestamp, "2024-03-09T14:30:00.000Z");
    }

    #[test]
    fn test_stale_label_exports_with_empty_paths() {
        let model = model();
        let labels = vec![LabelAssignment::new("7", "Ghost")];
        let doc = ExportDocument::snapshot(&model, model.statistics(), &labels, fixed_now());

        assert_eq!(doc.clusters.len(), 3);
        assert_eq!(doc.clusters["7"].name, "Ghost");
        assert!(doc.clusters["7"].paths.is_empty());
    }

    #[test]
    fn test_file_name_uses_date() {
        assert_eq!(
            ExportDocument::file_name(fixed_now()),
            "face-clustering-results-2024-03-09.json"
        );
    }

    #[tokio::test]
    async fn test_write_to_produces_readable_json() {
        let temp_dir = TempDir::new().unwrap();
        let model = model();
        let doc = ExportDocument::snapshot(&model, model.statistics(), &[], fixed_now());

        let path = doc.write_to(&temp_dir.path().join("out"), fixed_now()).await.unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&content).unwrap();

        assert_eq!(parsed["statistics"]["numClusters"], 2);
        assert_eq!(parsed["clusters"]["1"]["name"], "Person 2");
    }
}
