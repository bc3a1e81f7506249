//! Wire types for the clustering service
//!
//! Outgoing bodies use camelCase keys. Incoming bodies accept camelCase and
//! the service's snake_case spellings; unknown fields are ignored.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ========================================
// Clustering parameters
// ========================================

/// Clustering algorithm offered by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Dbscan,
    Kmeans,
    Hierarchical,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Dbscan => "dbscan",
            Algorithm::Kmeans => "kmeans",
            Algorithm::Hierarchical => "hierarchical",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Algorithm {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dbscan" => Ok(Algorithm::Dbscan),
            "kmeans" => Ok(Algorithm::Kmeans),
            "hierarchical" => Ok(Algorithm::Hierarchical),
            other => Err(Error::InvalidInput(format!("Unknown algorithm: {}", other))),
        }
    }
}

/// Algorithm-specific parameter set
///
/// Only the fields relevant to the selected algorithm exist, so an
/// irrelevant parameter can never be sent, not even as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "algorithm", rename_all = "lowercase")]
pub enum ClusteringParams {
    Dbscan {
        eps: f64,
        #[serde(rename = "minSamples", alias = "min_samples")]
        min_samples: u32,
    },
    Kmeans {
        #[serde(rename = "numClusters", alias = "n_clusters")]
        num_clusters: u32,
    },
    Hierarchical {
        #[serde(rename = "numClusters", alias = "n_clusters")]
        num_clusters: u32,
    },
}

impl ClusteringParams {
    pub fn algorithm(&self) -> Algorithm {
        match self {
            ClusteringParams::Dbscan { .. } => Algorithm::Dbscan,
            ClusteringParams::Kmeans { .. } => Algorithm::Kmeans,
            ClusteringParams::Hierarchical { .. } => Algorithm::Hierarchical,
        }
    }

    /// Reject malformed values before they reach the network
    pub fn validate(&self) -> Result<()> {
        match *self {
            ClusteringParams::Dbscan { eps, min_samples } => {
                if !eps.is_finite() || eps <= 0.0 {
                    return Err(Error::InvalidInput(format!(
                        "eps must be a positive number, got {}",
                        eps
                    )));
                }
                if min_samples < 1 {
                    return Err(Error::InvalidInput(
                        "minSamples must be at least 1".to_string(),
                    ));
                }
            }
            ClusteringParams::Kmeans { num_clusters }
            | ClusteringParams::Hierarchical { num_clusters } => {
                if num_clusters < 1 {
                    return Err(Error::InvalidInput(
                        "numClusters must be at least 1".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

// ========================================
// Request/response bodies
// ========================================

/// `POST /images/count` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountRequest {
    pub directory: String,
}

/// `POST /images/count` success body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: u64,
}

/// `POST /faces/cluster` body: directory plus the flattened parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterRequest {
    pub directory: String,
    #[serde(flatten)]
    pub params: ClusteringParams,
}

/// One cluster as returned by the service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireCluster {
    /// Service-reported size; informational only
    #[serde(default)]
    pub count: Option<u64>,
    /// Encoded face thumbnails, in service order
    #[serde(default)]
    pub faces: Vec<String>,
}

/// Summary figures attached to a clustering response
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    #[serde(alias = "total_faces")]
    pub total_faces: u64,
    #[serde(alias = "clustered_faces")]
    pub clustered_faces: u64,
    #[serde(alias = "num_clusters")]
    pub num_clusters: u64,
    /// Fraction of faces assigned to a cluster, in [0, 1]
    #[serde(alias = "clustering_rate")]
    pub clustering_rate: f64,
}

/// `POST /faces/cluster` success body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterResponse {
    #[serde(default)]
    pub clusters: BTreeMap<String, WireCluster>,
    pub statistics: Statistics,
}

/// Name and member references submitted for one cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub name: String,
    pub paths: Vec<String>,
}

/// `POST /metadata/add` body, keyed by cluster id
pub type MetadataRequest = BTreeMap<String, MetadataEntry>;

/// `POST /metadata/add` success body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataResponse {
    #[serde(alias = "success_count")]
    pub success_count: u64,
    #[serde(default, alias = "total_count")]
    pub total_count: Option<u64>,
}

/// `POST /search/faces` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    pub directory: String,
    /// Comma-separated person names, as typed
    #[serde(alias = "face_names")]
    pub face_names: String,
}

/// `POST /search/faces` success body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    #[serde(default)]
    pub matches: Vec<String>,
    #[serde(default)]
    pub count: u64,
}
