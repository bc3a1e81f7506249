//! Session-scoped workflow controller
//!
//! Owns everything that lives for one session: the cluster model, the count
//! cache, the in-flight guards and the editable settings. An adapter (CLI,
//! GUI) calls these methods in place of UI event handlers and subscribes to
//! [`Workbench::subscribe`] to render what happens.

use crate::error::WorkflowResult;
use crate::gateway::{HttpGateway, ServiceGateway};
use crate::models::{ClusterId, ClusterModel, ClusteringForm, LabelAssignment, SharedClusterModel};
use crate::services::{
    ClusteringSession, ClusteringSummary, CommitOutcome, ExportDocument, ImageCount,
    ImageCounter, JsonFilePreferenceStore, MetadataCommit, PreferenceStore, ProgressSimulator,
    SearchResult, SearchSession, SessionOutcome,
};
use crate::utils::paths::is_plausible_directory;
use chrono::Utc;
use fcw_common::config::TomlConfig;
use fcw_common::events::{EventBus, WorkflowEvent};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Mutex, RwLock};

/// Tunables for a workbench
#[derive(Debug, Clone)]
pub struct WorkbenchOptions {
    pub progress_interval: Duration,
    pub export_dir: PathBuf,
    pub event_capacity: usize,
}

impl Default for WorkbenchOptions {
    fn default() -> Self {
        Self {
            progress_interval: crate::services::progress_simulator::DEFAULT_INTERVAL,
            export_dir: PathBuf::from("."),
            event_capacity: 100,
        }
    }
}

/// Face clustering workflow controller
pub struct Workbench {
    event_bus: EventBus,
    model: SharedClusterModel,
    form: Mutex<ClusteringForm>,
    preferences: Arc<dyn PreferenceStore>,
    counter: ImageCounter,
    clustering: ClusteringSession,
    commit: MetadataCommit,
    search: SearchSession,
    export_dir: PathBuf,
}

impl Workbench {
    pub fn new(
        gateway: Arc<dyn ServiceGateway>,
        preferences: Arc<dyn PreferenceStore>,
        options: WorkbenchOptions,
    ) -> Self {
        let event_bus = EventBus::new(options.event_capacity);
        let model: SharedClusterModel = Arc::new(RwLock::new(ClusterModel::default()));

        Self {
            counter: ImageCounter::new(Arc::clone(&gateway), event_bus.clone()),
            clustering: ClusteringSession::new(
                Arc::clone(&gateway),
                Arc::clone(&model),
                Arc::clone(&preferences),
                ProgressSimulator::new(options.progress_interval),
                event_bus.clone(),
            ),
            commit: MetadataCommit::new(Arc::clone(&gateway), Arc::clone(&model), event_bus.clone()),
            search: SearchSession::new(gateway, event_bus.clone()),
            form: Mutex::new(ClusteringForm::default()),
            preferences,
            model,
            event_bus,
            export_dir: options.export_dir,
        }
    }

    /// Workbench talking HTTP to `service_url`, with file-backed settings
    pub fn from_config(config: &TomlConfig, service_url: &str) -> WorkflowResult<Self> {
        let gateway = HttpGateway::new(service_url, Duration::from_secs(config.request_timeout_secs))?;
        let preferences = JsonFilePreferenceStore::new(config.preferences_path());

        Ok(Self::new(
            Arc::new(gateway),
            Arc::new(preferences),
            WorkbenchOptions {
                progress_interval: Duration::from_millis(config.progress_interval_ms),
                export_dir: config.export_dir(),
                ..WorkbenchOptions::default()
            },
        ))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    // ------------------------------------------------------------------
    // Settings
    // ------------------------------------------------------------------

    /// Restore remembered settings into the form
    ///
    /// Only fields present in the stored snapshot are applied. A restored
    /// directory triggers an image count refresh; its failure is logged,
    /// not returned.
    pub async fn load_settings(&self) -> ClusteringForm {
        let snapshot = match self.preferences.load().await {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => return self.form().await,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load saved settings");
                return self.form().await;
            }
        };

        let form = {
            let mut form = self.form.lock().await;
            form.apply(&snapshot);
            form.clone()
        };

        if let Some(directory) = &snapshot.last_directory {
            if let Err(e) = self.counter.update_image_count(directory).await {
                tracing::debug!(error = %e, "Image count refresh after settings load failed");
            }
        }

        form
    }

    /// Current form state
    pub async fn form(&self) -> ClusteringForm {
        self.form.lock().await.clone()
    }

    /// Edit the form in place
    pub async fn update_form<F>(&self, edit: F) -> ClusteringForm
    where
        F: FnOnce(&mut ClusteringForm),
    {
        let mut form = self.form.lock().await;
        edit(&mut form);
        form.clone()
    }

    // ------------------------------------------------------------------
    // Workflows
    // ------------------------------------------------------------------

    /// Image count for `directory`, served from cache when known
    pub async fn update_image_count(&self, directory: &str) -> WorkflowResult<Option<ImageCount>> {
        self.counter.update_image_count(directory).await
    }

    /// Run clustering with the current form
    pub async fn start_clustering(&self) -> WorkflowResult<SessionOutcome<ClusteringSummary>> {
        let form = self.form().await;
        if self.clustering.is_running() {
            return Ok(SessionOutcome::AlreadyRunning);
        }

        let directory = form.directory.trim();
        if !directory.is_empty() && !is_plausible_directory(directory) {
            tracing::warn!(directory = %directory, "Directory path looks invalid");
        }

        self.clustering.run(&form).await
    }

    pub fn is_clustering(&self) -> bool {
        self.clustering.is_running()
    }

    /// Member images of a cluster in the current model; empty when unknown
    pub async fn get_members(&self, id: &ClusterId) -> Vec<String> {
        self.model.read().await.get_members(id).to_vec()
    }

    /// Copy of the current cluster model
    pub async fn cluster_model(&self) -> ClusterModel {
        self.model.read().await.clone()
    }

    /// Send person names for the labelled clusters
    pub async fn save_metadata(&self, labels: &[LabelAssignment]) -> WorkflowResult<CommitOutcome> {
        self.commit.commit(labels).await
    }

    /// Search `directory` for images of `person_names`
    pub async fn perform_search(
        &self,
        directory: &str,
        person_names: &str,
    ) -> WorkflowResult<SessionOutcome<SearchResult>> {
        self.search.run(directory, person_names).await
    }

    pub fn is_searching(&self) -> bool {
        self.search.is_running()
    }

    /// Export document for the current model and `labels`
    pub async fn export_snapshot(&self, labels: &[LabelAssignment]) -> ExportDocument {
        let model = self.model.read().await;
        ExportDocument::snapshot(&model, model.statistics(), labels, Utc::now())
    }

    /// Write the export document into the export directory
    pub async fn export_results(&self, labels: &[LabelAssignment]) -> WorkflowResult<PathBuf> {
        let now = Utc::now();
        let document = {
            let model = self.model.read().await;
            ExportDocument::snapshot(&model, model.statistics(), labels, now)
        };

        match document.write_to(&self.export_dir, now).await {
            Ok(path) => {
                self.event_bus.emit_lossy(WorkflowEvent::ResultsExported {
                    path: path.display().to_string(),
                    cluster_count: document.clusters.len(),
                    timestamp: now,
                });
                Ok(path)
            }
            Err(e) => {
                tracing::error!(error = %e, "Export failed");
                Err(e)
            }
        }
    }
}
