//! Clustering settings: editable form state and the remembered snapshot
//!
//! The snapshot is merged onto the form on load. Fields missing from the
//! snapshot leave the form as it was.

use crate::error::{WorkflowError, WorkflowResult};
use fcw_common::api::{Algorithm, ClusteringParams};
use serde::{Deserialize, Serialize};

pub const DEFAULT_EPS: f64 = 0.65;
pub const DEFAULT_MIN_SAMPLES: u32 = 3;
pub const DEFAULT_NUM_CLUSTERS: u32 = 20;

/// Remembered clustering settings, as stored in the preference file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsSnapshot {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<Algorithm>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_samples: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub num_clusters: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_directory: Option<String>,
}

/// Editable clustering parameters (what a UI form would hold)
#[derive(Debug, Clone, PartialEq)]
pub struct ClusteringForm {
    pub directory: String,
    pub algorithm: Algorithm,
    pub eps: f64,
    pub min_samples: u32,
    pub num_clusters: u32,
}

impl Default for ClusteringForm {
    fn default() -> Self {
        Self {
            directory: String::new(),
            algorithm: Algorithm::Dbscan,
            eps: DEFAULT_EPS,
            min_samples: DEFAULT_MIN_SAMPLES,
            num_clusters: DEFAULT_NUM_CLUSTERS,
        }
    }
}

impl ClusteringForm {
    /// Merge a loaded snapshot into the form
    pub fn apply(&mut self, snapshot: &SettingsSnapshot) {
        if let Some(algorithm) = snapshot.algorithm {
            self.algorithm = algorithm;
        }
        if let Some(eps) = snapshot.eps {
            self.eps = eps;
        }
        if let Some(min_samples) = snapshot.min_samples {
            self.min_samples = min_samples;
        }
        if let Some(num_clusters) = snapshot.num_clusters {
            self.num_clusters = num_clusters;
        }
        if let Some(directory) = &snapshot.last_directory {
            self.directory = directory.clone();
        }
    }

    /// Capture every field of the form; this is what a run remembers
    pub fn snapshot(&self) -> SettingsSnapshot {
        SettingsSnapshot {
            algorithm: Some(self.algorithm),
            eps: Some(self.eps),
            min_samples: Some(self.min_samples),
            num_clusters: Some(self.num_clusters),
            last_directory: Some(self.directory.clone()),
        }
    }

    /// Parameter set for the selected algorithm, validated
    pub fn job_parameters(&self) -> WorkflowResult<ClusteringParams> {
        let params = match self.algorithm {
            Algorithm::Dbscan => ClusteringParams::Dbscan {
                eps: self.eps,
                min_samples: self.min_samples,
            },
            Algorithm::Kmeans => ClusteringParams::Kmeans {
                num_clusters: self.num_clusters,
            },
            Algorithm::Hierarchical => ClusteringParams::Hierarchical {
                num_clusters: self.num_clusters,
            },
        };

        params
            .validate()
            .map_err(|e| WorkflowError::Validation(e.to_string()))?;
        Ok(params)
    }
}
