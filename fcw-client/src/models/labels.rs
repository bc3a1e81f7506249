//! Person names typed against clusters
//!
//! Built fresh from input state for every commit or export; never stored.

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::ClusterId;

/// A user-entered name for one cluster
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelAssignment {
    pub cluster_id: ClusterId,
    pub person_name: String,
}

impl LabelAssignment {
    pub fn new(cluster_id: impl Into<ClusterId>, person_name: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            person_name: person_name.into(),
        }
    }

    /// Trimmed name, `None` when blank
    pub fn name(&self) -> Option<&str> {
        let name = self.person_name.trim();
        if name.is_empty() {
            None
        } else {
            Some(name)
        }
    }

    /// Parse `ID=NAME` as given on the command line
    pub fn parse(input: &str) -> WorkflowResult<Self> {
        let (id, name) = input.split_once('=').ok_or_else(|| {
            WorkflowError::Validation(format!("Label must look like ID=NAME, got '{}'", input))
        })?;

        let id = id.trim();
        if id.is_empty() {
            return Err(WorkflowError::Validation(format!(
                "Label is missing a cluster id: '{}'",
                input
            )));
        }

        Ok(Self::new(id, name))
    }
}
