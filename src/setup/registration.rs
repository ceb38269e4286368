//! Username acquisition against the bridge's registration endpoint

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::bridge::{BridgeApi, BridgeError, BridgeSession};

/// `devicetype` announced to the bridge when registering
pub const DEVICE_TYPE: &str = "hue-hotkeys#pc";

/// How long to keep asking the bridge for a username
#[derive(Debug, Clone, Copy)]
pub struct RegistrationPolicy {
    pub timeout: Duration,
    pub interval: Duration,
}

impl Default for RegistrationPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            interval: Duration::from_secs(2),
        }
    }
}

/// Poll the registration endpoint until the link button is pressed.
///
/// Returns `None` when no username was issued before the policy's timeout.
pub async fn register_username<B: BridgeApi>(
    bridge: &B,
    bridge_address: &str,
    policy: RegistrationPolicy,
) -> Option<String> {
    info!(bridge = bridge_address, "registering with the Hue Bridge; press its link button");
    let deadline = Instant::now() + policy.timeout;

    loop {
        match bridge.register(bridge_address, DEVICE_TYPE).await {
            Ok(username) => {
                info!(bridge = bridge_address, "registration successful");
                return Some(username);
            }
            Err(BridgeError::LinkButtonNotPressed) => {
                debug!("waiting for link button press");
            }
            Err(e) => warn!(%e, "registration attempt failed"),
        }

        if Instant::now() + policy.interval > deadline {
            warn!(timeout = ?policy.timeout, "no username issued within the timeout");
            return None;
        }
        tokio::time::sleep(policy.interval).await;
    }
}

/// Check a username by listing lights: valid when at least one is returned
pub async fn validate_username<B: BridgeApi>(bridge: &B, session: &BridgeSession) -> bool {
    match bridge.lights(session).await {
        Ok(lights) => !lights.is_empty(),
        Err(e) => {
            warn!(%e, "username validation failed");
            false
        }
    }
}
