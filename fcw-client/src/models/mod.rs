//! Data models for the clustering workflow

pub mod cluster_model;
pub mod labels;
pub mod settings;

pub use cluster_model::{ClusterEntry, ClusterId, ClusterModel, SharedClusterModel};
pub use fcw_common::api::{Algorithm, ClusteringParams, Statistics};
pub use labels::LabelAssignment;
pub use settings::{ClusteringForm, SettingsSnapshot};
