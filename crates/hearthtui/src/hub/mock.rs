use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::json;
use serde_json::Map;
use serde_json::Value;
use tokio::sync::Notify;

use super::Entity;
use super::Hub;
use super::HubError;

/// In-memory hub for testing the synchronization core.
///
/// Cloning shares state, so a test can keep a handle after handing a clone to
/// the code under test and inspect the recorded calls afterwards.
#[derive(Clone, Default)]
pub struct MockHub {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    states: Mutex<Vec<Value>>,
    calls: Mutex<Vec<String>>,
    open: AtomicBool,
    unreachable: AtomicBool,
    fail_states: AtomicBool,
    fail_service: AtomicBool,
    gate: Mutex<Option<Arc<Gate>>>,
}

/// Holds `get_states` until released, announcing when it has been entered
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

impl MockHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_states(states: Vec<Value>) -> Self {
        let hub = Self::new();
        hub.set_states(states);
        hub
    }

    pub fn set_states(&self, states: Vec<Value>) {
        *self.inner.states.lock().unwrap() = states;
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        self.inner.unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn set_fail_states(&self, fail: bool) {
        self.inner.fail_states.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_service(&self, fail: bool) {
        self.inner.fail_service.store(fail, Ordering::SeqCst);
    }

    /// Make the next `get_states` calls wait on the returned gate
    pub fn install_gate(&self) -> Arc<Gate> {
        let gate = Arc::new(Gate::default());
        *self.inner.gate.lock().unwrap() = Some(gate.clone());
        gate
    }

    /// Every recorded call, in order
    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.lock().unwrap().clone()
    }

    /// Number of recorded calls whose name starts with `prefix`
    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }

    pub fn is_open(&self) -> bool {
        self.inner.open.load(Ordering::SeqCst)
    }

    fn record(&self, call: String) -> Result<(), HubError> {
        self.inner.calls.lock().unwrap().push(call);
        if self.is_open() {
            Ok(())
        } else {
            Err(HubError::SessionNotOpen)
        }
    }

    fn failure(url: &str) -> HubError {
        HubError::Status {
            url: url.to_string(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[async_trait]
impl Hub for MockHub {
    fn open(&mut self) -> Result<(), HubError> {
        self.inner.open.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn close(&mut self) {
        self.inner.open.store(false, Ordering::SeqCst);
    }

    async fn check_connection(&self) -> bool {
        self.record("check_connection".to_string()).is_ok()
            && !self.inner.unreachable.load(Ordering::SeqCst)
    }

    async fn get_states(&self) -> Result<Vec<Entity>, HubError> {
        self.record("get_states".to_string())?;

        let gate = self.inner.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }

        if self.inner.fail_states.load(Ordering::SeqCst) {
            return Err(Self::failure("/api/states"));
        }

        let states = self.inner.states.lock().unwrap().clone();
        Ok(states.iter().map(Entity::from_api).collect())
    }

    async fn get_state(&self, entity_id: &str) -> Result<Entity, HubError> {
        self.record(format!("get_state {}", entity_id))?;
        let states = self.inner.states.lock().unwrap().clone();
        states
            .iter()
            .map(Entity::from_api)
            .find(|e| e.entity_id() == entity_id)
            .ok_or_else(|| HubError::Status {
                url: format!("/api/states/{}", entity_id),
                status: StatusCode::NOT_FOUND,
            })
    }

    async fn get_config(&self) -> Result<Map<String, Value>, HubError> {
        self.record("get_config".to_string())?;
        let Value::Object(config) = json!({ "version": "2026.1.0", "location_name": "Test Home" })
        else {
            unreachable!()
        };
        Ok(config)
    }

    async fn call_service(
        &self,
        domain: &str,
        service: &str,
        entity_id: Option<&str>,
        _params: Map<String, Value>,
    ) -> Result<Value, HubError> {
        self.record(format!(
            "call_service {}.{} {}",
            domain,
            service,
            entity_id.unwrap_or_default()
        ))?;

        if self.inner.fail_service.load(Ordering::SeqCst) {
            return Err(Self::failure("/api/services"));
        }

        if service == "toggle" {
            let mut states = self.inner.states.lock().unwrap();
            for state in states.iter_mut() {
                if state["entity_id"].as_str() == entity_id {
                    let next = if state["state"] == "on" { "off" } else { "on" };
                    state["state"] = Value::from(next);
                }
            }
        }

        Ok(json!([]))
    }
}
