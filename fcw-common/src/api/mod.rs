//! Remote clustering service contract
//!
//! Request/response shapes and endpoint paths consumed by the client.

pub mod types;

pub use types::{
    Algorithm, ClusterRequest, ClusterResponse, ClusteringParams, CountRequest, CountResponse,
    MetadataEntry, MetadataRequest, MetadataResponse, SearchRequest, SearchResponse, Statistics,
    WireCluster,
};

/// Directory image count lookup
pub const IMAGES_COUNT: &str = "/images/count";
/// Clustering job submission
pub const FACES_CLUSTER: &str = "/faces/cluster";
/// Person name metadata write-back
pub const METADATA_ADD: &str = "/metadata/add";
/// Face search by person names
pub const SEARCH_FACES: &str = "/search/faces";
