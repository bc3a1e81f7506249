//! fcw-client library interface
//!
//! Orchestration core of the face clustering workbench. Every call to the
//! remote service goes through [`gateway::ServiceGateway`]; the
//! [`Workbench`] owns the session-scoped state (cluster model, count cache,
//! in-flight guards) and is driven by an adapter such as the `fcw` binary.

pub mod error;
pub mod gateway;
pub mod models;
pub mod services;
pub mod utils;
pub mod workbench;

pub use crate::error::{WorkflowError, WorkflowResult};
pub use crate::workbench::{Workbench, WorkbenchOptions};
