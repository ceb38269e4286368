//! Hue Bridge access
//!
//! [`BridgeApi`] is the seam between the dispatcher and the bridge's local
//! REST API. [`HueClient`] implements it over HTTP.

mod client;
mod error;
#[cfg(test)]
pub mod fake;
mod response;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::HueClient;
pub use error::BridgeError;

/// Bridge address and API username shared by every call in the process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeSession {
    pub bridge_address: String,
    pub username: String,
}

impl BridgeSession {
    pub fn new(bridge_address: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            bridge_address: bridge_address.into(),
            username: username.into(),
        }
    }
}

/// Power state of a light as reported by the bridge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightState {
    #[serde(default)]
    pub on: Option<bool>,
    #[serde(default)]
    pub reachable: Option<bool>,
}

/// A light (or smart plug) known to the bridge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightInfo {
    #[serde(default)]
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub state: LightState,
}

/// Operations the application needs from a Hue Bridge
#[async_trait]
pub trait BridgeApi: Send + Sync {
    /// List all lights, keyed by device id (`GET /api/{username}/lights`)
    async fn lights(&self, session: &BridgeSession) -> Result<BTreeMap<String, LightInfo>, BridgeError>;

    /// Fetch one light (`GET /api/{username}/lights/{id}`)
    async fn light(&self, session: &BridgeSession, device_id: &str) -> Result<LightInfo, BridgeError>;

    /// Switch a light on or off (`PUT /api/{username}/lights/{id}/state`)
    async fn set_power(&self, session: &BridgeSession, device_id: &str, on: bool) -> Result<(), BridgeError>;

    /// Ask the bridge for a new username (`POST /api`)
    async fn register(&self, bridge_address: &str, device_type: &str) -> Result<String, BridgeError>;
}
