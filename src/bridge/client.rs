//! HTTP client for the Hue Bridge v1 REST API

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde_json::{json, Value};
use tracing::debug;

use super::response::{decode, expect_success, registered_username};
use super::{BridgeApi, BridgeError, BridgeSession, LightInfo};

/// Hue Bridge client with a fixed per-request timeout
#[derive(Debug, Clone)]
pub struct HueClient {
    http: reqwest::Client,
}

impl HueClient {
    /// Create a client whose requests give up after `timeout`
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()?;
        Ok(Self { http })
    }

    async fn send(&self, address: &str, request: RequestBuilder) -> Result<Value, BridgeError> {
        let response = request
            .send()
            .await
            .map_err(|e| BridgeError::unreachable(address, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BridgeError::Status {
                status: status.as_u16(),
            });
        }

        let body: Value = response
            .json()
            .await
            .map_err(|e| BridgeError::InvalidResponse(e.to_string()))?;
        debug!(%body, "bridge response");
        Ok(body)
    }
}

/// Base URL of the bridge API; bare hosts are assumed to speak plain HTTP
fn api_url(bridge_address: &str) -> String {
    let address = bridge_address.trim().trim_end_matches('/');
    if address.starts_with("http://") || address.starts_with("https://") {
        format!("{address}/api")
    } else {
        format!("http://{address}/api")
    }
}

fn lights_url(session: &BridgeSession) -> String {
    format!("{}/{}/lights", api_url(&session.bridge_address), session.username)
}

#[async_trait]
impl BridgeApi for HueClient {
    async fn lights(&self, session: &BridgeSession) -> Result<BTreeMap<String, LightInfo>, BridgeError> {
        let request = self.http.get(lights_url(session));
        let body = self.send(&session.bridge_address, request).await?;
        decode(body, None)
    }

    async fn light(&self, session: &BridgeSession, device_id: &str) -> Result<LightInfo, BridgeError> {
        let request = self.http.get(format!("{}/{device_id}", lights_url(session)));
        let body = self.send(&session.bridge_address, request).await?;
        decode(body, Some(device_id))
    }

    async fn set_power(&self, session: &BridgeSession, device_id: &str, on: bool) -> Result<(), BridgeError> {
        let request = self
            .http
            .put(format!("{}/{device_id}/state", lights_url(session)))
            .json(&json!({ "on": on }));
        let body = self.send(&session.bridge_address, request).await?;
        expect_success(&body, Some(device_id))
    }

    async fn register(&self, bridge_address: &str, device_type: &str) -> Result<String, BridgeError> {
        let request = self
            .http
            .post(api_url(bridge_address))
            .json(&json!({ "devicetype": device_type }));
        let body = self.send(bridge_address, request).await?;
        registered_username(&body)
    }
}
