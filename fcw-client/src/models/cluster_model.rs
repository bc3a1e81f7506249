//! Cluster model: cluster id → member images
//!
//! Built atomically from one clustering response and swapped in wholesale.
//! Readers (metadata commit, export) look members up by id; an id that is
//! not in the current model resolves to no members rather than an error,
//! because labels may have been typed against an older model.

use fcw_common::api::{Statistics, WireCluster};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Cluster model shared between the clustering session (sole writer) and
/// its readers
pub type SharedClusterModel = Arc<RwLock<ClusterModel>>;

/// Cluster identifier as keyed by the service
///
/// Integer ids sort numerically ("2" < "10") and before any other id;
/// the rest sort lexically.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClusterId(String);

impl ClusterId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Positional label used when nobody named the cluster
    ///
    /// Numeric ids are zero-based on the wire, so "0" becomes "Person 1".
    pub fn default_name(&self) -> String {
        match self.0.trim().parse::<u64>().ok().and_then(|n| n.checked_add(1)) {
            Some(n) => format!("Person {}", n),
            None => format!("Person {}", self.0),
        }
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ClusterId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ClusterId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Ord for ClusterId {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.0.parse::<u64>(), other.0.parse::<u64>()) {
            (Ok(a), Ok(b)) => a.cmp(&b).then_with(|| self.0.cmp(&other.0)),
            (Ok(_), Err(_)) => Ordering::Less,
            (Err(_), Ok(_)) => Ordering::Greater,
            (Err(_), Err(_)) => self.0.cmp(&other.0),
        }
    }
}

impl PartialOrd for ClusterId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// One cluster of faces
#[derive(Debug, Clone, PartialEq)]
pub struct ClusterEntry {
    pub id: ClusterId,
    /// Opaque image references (encoded thumbnails), service order
    pub member_images: Vec<String>,
    /// Always `member_images.len()`
    pub member_count: usize,
}

impl ClusterEntry {
    pub fn new(id: ClusterId, member_images: Vec<String>) -> Self {
        let member_count = member_images.len();
        Self {
            id,
            member_images,
            member_count,
        }
    }
}

/// Authoritative result of the latest successful clustering run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClusterModel {
    entries: BTreeMap<ClusterId, ClusterEntry>,
    statistics: Statistics,
}

impl ClusterModel {
    /// Build a model from a clustering response
    pub fn from_response(clusters: BTreeMap<String, WireCluster>, statistics: Statistics) -> Self {
        let entries = clusters
            .into_iter()
            .map(|(id, cluster)| {
                let id = ClusterId::new(id);
                if let Some(reported) = cluster.count {
                    if reported as usize != cluster.faces.len() {
                        tracing::debug!(
                            cluster = %id,
                            reported,
                            received = cluster.faces.len(),
                            "Service count differs from returned faces"
                        );
                    }
                }
                (id.clone(), ClusterEntry::new(id, cluster.faces))
            })
            .collect();

        Self {
            entries,
            statistics,
        }
    }

    /// Member images of `id`; empty for unknown ids
    pub fn get_members(&self, id: &ClusterId) -> &[String] {
        self.entries
            .get(id)
            .map(|entry| entry.member_images.as_slice())
            .unwrap_or(&[])
    }

    pub fn get(&self, id: &ClusterId) -> Option<&ClusterEntry> {
        self.entries.get(id)
    }

    pub fn contains(&self, id: &ClusterId) -> bool {
        self.entries.contains_key(id)
    }

    /// Cluster ids in display order
    pub fn ids(&self) -> impl Iterator<Item = &ClusterId> {
        self.entries.keys()
    }

    pub fn entries(&self) -> impl Iterator<Item = &ClusterEntry> {
        self.entries.values()
    }

    pub fn statistics(&self) -> Statistics {
        self.statistics
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
