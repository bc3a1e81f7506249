//! # FCW Common Library
//!
//! Shared code for the face clustering workbench:
//! - Wire contract types for the remote clustering service
//! - Workflow event types (WorkflowEvent enum) and EventBus
//! - Bootstrap configuration loading
//! - Common error type

pub mod api;
pub mod config;
pub mod error;
pub mod events;

pub use error::{Error, Result};
