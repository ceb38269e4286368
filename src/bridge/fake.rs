//! In-memory bridge for tests

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{BridgeApi, BridgeError, BridgeSession, LightInfo, LightState};

#[derive(Debug, Default)]
struct FakeState {
    username: String,
    lights: BTreeMap<String, LightInfo>,
    reachable: bool,
    registrations: VecDeque<Result<String, BridgeError>>,
    calls: Vec<String>,
}

/// Bridge double recording every request it receives
#[derive(Debug, Clone, Default)]
pub struct FakeBridge {
    state: Arc<Mutex<FakeState>>,
}

impl FakeBridge {
    /// A reachable bridge accepting `username`
    pub fn new(username: &str) -> Self {
        let bridge = Self::default();
        {
            let mut state = bridge.state.lock().unwrap();
            state.username = username.to_string();
            state.reachable = true;
        }
        bridge
    }

    pub fn with_light(self, device_id: &str, name: &str, on: bool) -> Self {
        self.state.lock().unwrap().lights.insert(
            device_id.to_string(),
            LightInfo {
                name: name.to_string(),
                kind: "Extended color light".to_string(),
                state: LightState {
                    on: Some(on),
                    reachable: Some(true),
                },
            },
        );
        self
    }

    /// Queue the outcome of the next `register` call
    pub fn push_registration(&self, outcome: Result<String, BridgeError>) {
        self.state.lock().unwrap().registrations.push_back(outcome);
    }

    pub fn set_reachable(&self, reachable: bool) {
        self.state.lock().unwrap().reachable = reachable;
    }

    /// Mark a single light offline while the bridge itself stays reachable
    pub fn set_light_reachable(&self, device_id: &str, reachable: bool) {
        if let Some(light) = self.state.lock().unwrap().lights.get_mut(device_id) {
            light.state.reachable = Some(reachable);
        }
    }

    /// Change a light behind the application's back
    pub fn set_on(&self, device_id: &str, on: bool) {
        if let Some(light) = self.state.lock().unwrap().lights.get_mut(device_id) {
            light.state.on = Some(on);
        }
    }

    pub fn is_on(&self, device_id: &str) -> Option<bool> {
        self.state.lock().unwrap().lights.get(device_id)?.state.on
    }

    /// Requests seen so far, e.g. `GET /lights/3` or `PUT /lights/3/state on=false`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|call| call.starts_with(prefix)).count()
    }

    fn begin(&self, session: Option<&BridgeSession>, call: String) -> Result<std::sync::MutexGuard<'_, FakeState>, BridgeError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(call);
        if !state.reachable {
            return Err(BridgeError::unreachable("fake", "connection refused"));
        }
        if let Some(session) = session {
            if session.username != state.username {
                return Err(BridgeError::Unauthorized);
            }
        }
        Ok(state)
    }
}

#[async_trait]
impl BridgeApi for FakeBridge {
    async fn lights(&self, session: &BridgeSession) -> Result<BTreeMap<String, LightInfo>, BridgeError> {
        let state = self.begin(Some(session), "GET /lights".to_string())?;
        Ok(state.lights.clone())
    }

    async fn light(&self, session: &BridgeSession, device_id: &str) -> Result<LightInfo, BridgeError> {
        let state = self.begin(Some(session), format!("GET /lights/{device_id}"))?;
        state
            .lights
            .get(device_id)
            .cloned()
            .ok_or_else(|| BridgeError::device_not_found(device_id))
    }

    async fn set_power(&self, session: &BridgeSession, device_id: &str, on: bool) -> Result<(), BridgeError> {
        let mut state = self.begin(Some(session), format!("PUT /lights/{device_id}/state on={on}"))?;
        let light = state
            .lights
            .get_mut(device_id)
            .ok_or_else(|| BridgeError::device_not_found(device_id))?;
        light.state.on = Some(on);
        Ok(())
    }

    async fn register(&self, _bridge_address: &str, device_type: &str) -> Result<String, BridgeError> {
        let mut state = self.begin(None, format!("POST devicetype={device_type}"))?;
        state
            .registrations
            .pop_front()
            .unwrap_or(Err(BridgeError::LinkButtonNotPressed))
    }
}
