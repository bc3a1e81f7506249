//! Workflow services
//!
//! Each service owns one piece of the clustering workflow and talks to the
//! remote service only through the shared gateway.

pub mod clustering_session;
pub mod count_cache;
pub mod export_serializer;
pub mod metadata_commit;
pub mod preferences;
pub mod progress_simulator;
pub mod search_session;

pub use clustering_session::{ClusteringSession, ClusteringSummary};
pub use count_cache::{CountCache, ImageCount, ImageCounter};
pub use export_serializer::{ExportCluster, ExportDocument};
pub use metadata_commit::{CommitOutcome, MetadataCommit};
pub use preferences::{JsonFilePreferenceStore, MemoryPreferenceStore, PreferenceStore};
pub use progress_simulator::{ProgressHandle, ProgressSimulator, ProgressStage};
pub use search_session::{SearchMatch, SearchResult, SearchSession};

use std::sync::atomic::{AtomicBool, Ordering};

/// Result of a guarded workflow invocation
#[derive(Debug, Clone, PartialEq)]
pub enum SessionOutcome<T> {
    /// The workflow ran to completion
    Completed(T),
    /// Another invocation was still in flight; nothing happened
    AlreadyRunning,
}

impl<T> SessionOutcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            SessionOutcome::Completed(value) => Some(value),
            SessionOutcome::AlreadyRunning => None,
        }
    }

    pub fn is_already_running(&self) -> bool {
        matches!(self, SessionOutcome::AlreadyRunning)
    }
}

/// In-flight flag held for the duration of one workflow invocation
///
/// Released on drop, so every exit path (success, error, early return)
/// frees the workflow for the next invocation.
pub(crate) struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> InFlightGuard<'a> {
    /// Claim the flag, or `None` if it is already held
    pub(crate) fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}
