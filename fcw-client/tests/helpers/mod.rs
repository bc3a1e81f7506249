//! Shared test helpers: scripted gateway, preference stores, fixtures
#![allow(dead_code)]

use async_trait::async_trait;
use fcw_client::gateway::{ApiError, ServiceGateway};
use fcw_client::models::{ClusterModel, SettingsSnapshot};
use fcw_client::services::{MemoryPreferenceStore, PreferenceStore};
use fcw_client::{WorkflowError, WorkflowResult};
use reqwest::Method;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Notify, RwLock};

/// One call observed by the scripted gateway
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub endpoint: String,
    pub method: Method,
    pub body: Option<Value>,
}

/// Gateway answering from a per-endpoint script and recording every call
///
/// A gated gateway holds each call until the test releases it through the
/// returned `Notify`, which keeps a workflow "in flight" on demand.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<HashMap<String, VecDeque<Result<Value, ApiError>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    gate: Option<Arc<Notify>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn gated() -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        let gateway = Self {
            gate: Some(Arc::clone(&gate)),
            ..Self::default()
        };
        (gateway, gate)
    }

    pub fn respond(&self, endpoint: &str, body: Value) {
        self.push(endpoint, Ok(body));
    }

    pub fn fail(&self, endpoint: &str, error: ApiError) {
        self.push(endpoint, Err(error));
    }

    fn push(&self, endpoint: &str, response: Result<Value, ApiError>) {
        self.responses
            .lock()
            .unwrap()
            .entry(endpoint.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, endpoint: &str) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|call| call.endpoint == endpoint)
            .collect()
    }
}

#[async_trait]
impl ServiceGateway for ScriptedGateway {
    async fn call(
        &self,
        endpoint: &str,
        method: Method,
        body: Option<Value>,
    ) -> Result<Value, ApiError> {
        self.calls.lock().unwrap().push(RecordedCall {
            endpoint: endpoint.to_string(),
            method,
            body,
        });

        if let Some(gate) = &self.gate {
            gate.notified().await;
        }

        self.responses
            .lock()
            .unwrap()
            .get_mut(endpoint)
            .and_then(|queue| queue.pop_front())
            .unwrap_or_else(|| {
                Err(ApiError::with_status(
                    format!("No scripted response for {}", endpoint),
                    500,
                ))
            })
    }
}

/// Wait until `gateway` has seen `n` calls (gives up after ~2s)
pub async fn wait_for_calls(gateway: &ScriptedGateway, n: usize) {
    for _ in 0..400 {
        if gateway.call_count() >= n {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {} gateway calls, saw {}", n, gateway.call_count());
}

/// Preference store whose writes always fail
pub struct FailingPreferenceStore;

#[async_trait]
impl PreferenceStore for FailingPreferenceStore {
    async fn load_raw(&self) -> WorkflowResult<Option<String>> {
        Ok(None)
    }

    async fn save_raw(&self, _document: String) -> WorkflowResult<()> {
        Err(WorkflowError::Preferences("disk full".to_string()))
    }
}

pub fn memory_store() -> Arc<MemoryPreferenceStore> {
    Arc::new(MemoryPreferenceStore::new())
}

pub async fn stored_snapshot(store: &MemoryPreferenceStore) -> SettingsSnapshot {
    store.load().await.unwrap().unwrap_or_default()
}

pub fn shared_model() -> Arc<RwLock<ClusterModel>> {
    Arc::new(RwLock::new(ClusterModel::default()))
}

/// Two clusters: "0" → [a, b], "1" → [c]
pub fn two_cluster_response() -> Value {
    json!({
        "clusters": {
            "0": {"count": 2, "faces": ["a", "b"]},
            "1": {"count": 1, "faces": ["c"]}
        },
        "statistics": {
            "totalFaces": 4,
            "clusteredFaces": 3,
            "numClusters": 2,
            "clusteringRate": 0.75
        }
    })
}

/// One cluster: "0" → [a, b]
pub fn one_cluster_response() -> Value {
    json!({
        "clusters": {"0": {"count": 2, "faces": ["a", "b"]}},
        "statistics": {
            "totalFaces": 2,
            "clusteredFaces": 2,
            "numClusters": 1,
            "clusteringRate": 1.0
        }
    })
}
