//! Staged progress indicator
//!
//! Emits a fixed script of five stages on a fixed cadence while a
//! clustering job is outstanding. The script knows nothing about the real
//! job: reaching 100% does not mean the job finished, and the job may finish
//! before the script does. The owner must call [`ProgressHandle::stop`] when
//! the run ends; dropping the handle stops it as well.

use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One scripted progress step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressStage {
    pub percentage: u8,
    pub label: &'static str,
}

/// The script, in emission order
pub const STAGES: [ProgressStage; 5] = [
    ProgressStage { percentage: 20, label: "Reading images" },
    ProgressStage { percentage: 50, label: "Detecting faces" },
    ProgressStage { percentage: 75, label: "Computing embeddings" },
    ProgressStage { percentage: 90, label: "Clustering" },
    ProgressStage { percentage: 100, label: "Finalizing" },
];

/// Default time between stages
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(2000);

/// Factory for progress emitters
#[derive(Debug, Clone, Copy)]
pub struct ProgressSimulator {
    interval: Duration,
}

impl Default for ProgressSimulator {
    fn default() -> Self {
        Self::new(DEFAULT_INTERVAL)
    }
}

impl ProgressSimulator {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start emitting stages to `on_tick`
    ///
    /// The first stage fires one interval after start. Must be called from
    /// within a tokio runtime.
    pub fn start<F>(&self, mut on_tick: F) -> ProgressHandle
    where
        F: FnMut(ProgressStage) + Send + 'static,
    {
        let token = CancellationToken::new();
        let child = token.clone();
        let period = self.interval;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            for stage in STAGES {
                tokio::select! {
                    biased;
                    _ = child.cancelled() => return,
                    _ = ticker.tick() => {
                        tracing::debug!(percentage = stage.percentage, label = stage.label, "Progress tick");
                        on_tick(stage);
                    }
                }
            }
        });

        ProgressHandle { token, task }
    }
}

/// Running progress emitter
pub struct ProgressHandle {
    token: CancellationToken,
    task: JoinHandle<()>,
}

impl ProgressHandle {
    /// Stop emitting. Safe to call any number of times.
    pub fn stop(&self) {
        self.token.cancel();
        self.task.abort();
    }

    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// True once the emitter task has exited (script done or stopped)
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for ProgressHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
