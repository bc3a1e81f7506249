//! Preference store for remembered clustering settings
//!
//! The store is an opaque get/set of one JSON snapshot. Saving replaces
//! whatever is stored, including a corrupt document.

use crate::error::{WorkflowError, WorkflowResult};
use crate::models::SettingsSnapshot;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

/// Opaque load/save of the settings snapshot
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Stored document, `None` if nothing was saved yet
    async fn load_raw(&self) -> WorkflowResult<Option<String>>;

    /// Replace the stored document
    async fn save_raw(&self, document: String) -> WorkflowResult<()>;

    /// Load and decode the snapshot
    async fn load(&self) -> WorkflowResult<Option<SettingsSnapshot>> {
        match self.load_raw().await? {
            None => Ok(None),
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|e| WorkflowError::Preferences(format!("Corrupt settings: {}", e))),
        }
    }

    /// Replace the stored snapshot verbatim
    async fn save(&self, snapshot: &SettingsSnapshot) -> WorkflowResult<()> {
        let document = serde_json::to_string(snapshot)
            .map_err(|e| WorkflowError::Preferences(e.to_string()))?;
        self.save_raw(document).await
    }
}

/// Settings kept in a JSON file
pub struct JsonFilePreferenceStore {
    path: PathBuf,
}

impl JsonFilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PreferenceStore for JsonFilePreferenceStore {
    async fn load_raw(&self) -> WorkflowResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(WorkflowError::Preferences(format!(
                "Read {} failed: {}",
                self.path.display(),
                e
            ))),
        }
    }

    async fn save_raw(&self, document: String) -> WorkflowResult<()> {
        let write_err = |e: std::io::Error| {
            WorkflowError::Preferences(format!("Write {} failed: {}", self.path.display(), e))
        };

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
            }
        }

        // temp + rename keeps the previous document intact on a failed write
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, document).await.map_err(write_err)?;
        tokio::fs::rename(&tmp_path, &self.path).await.map_err(write_err)?;
        Ok(())
    }
}

/// Settings kept in memory, for tests and ephemeral sessions
#[derive(Default)]
pub struct MemoryPreferenceStore {
    document: Mutex<Option<String>>,
}

impl MemoryPreferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with a raw document
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Mutex::new(Some(document.into())),
        }
    }
}

#[async_trait]
impl PreferenceStore for MemoryPreferenceStore {
    async fn load_raw(&self) -> WorkflowResult<Option<String>> {
        Ok(self.document.lock().await.clone())
    }

    async fn save_raw(&self, document: String) -> WorkflowResult<()> {
        *self.document.lock().await = Some(document);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Algorithm;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let temp_dir = TempDir::new().unwrap();
        let store = JsonFilePreferenceStore::new(temp_dir.path().join("fcw").join("settings.json"));
        assert_eq!(store.load().await.unwrap(), None);

        let snapshot = SettingsSnapshot {
            algorithm: Some(Algorithm::Dbscan),
            eps: Some(0.5),
            min_samples: Some(3),
            num_clusters: Some(20),
            last_directory: Some("C:\\Photos".to_string()),
        };
        store.save(&snapshot).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(snapshot));
        assert!(!store.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_document_is_an_error_on_load() {
        let store = MemoryPreferenceStore::with_document("{not json");
        assert!(matches!(
            store.load().await,
            Err(WorkflowError::Preferences(_))
        ));
    }

    #[tokio::test]
    async fn test_save_replaces_corrupt_document() {
        let store = MemoryPreferenceStore::with_document("{not json");
        let snapshot = SettingsSnapshot {
            eps: Some(0.7),
            num_clusters: Some(4),
            ..SettingsSnapshot::default()
        };

        store.save(&snapshot).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(snapshot));
    }
}
