//! Bridge error taxonomy

/// Errors returned by calls against the Hue Bridge
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BridgeError {
    /// Network failure or timeout talking to the bridge
    #[error("bridge at {address} is unreachable: {reason}")]
    Unreachable { address: String, reason: String },

    /// The bridge does not know the requested device
    #[error("device {device_id} was not found on the bridge")]
    DeviceNotFound { device_id: String },

    /// The username is unknown to the bridge or was revoked
    #[error("username was rejected by the bridge")]
    Unauthorized,

    /// Registration attempted before the link button was pressed
    #[error("link button on the bridge has not been pressed")]
    LinkButtonNotPressed,

    /// The bridge answered with a non-success HTTP status
    #[error("bridge answered with HTTP status {status}")]
    Status { status: u16 },

    /// Any other error reported in the bridge's error array
    #[error("bridge error {kind} at '{address}': {description}")]
    Api {
        kind: u16,
        address: String,
        description: String,
    },

    /// The response body did not have the expected shape
    #[error("unexpected bridge response: {0}")]
    InvalidResponse(String),
}

impl BridgeError {
    /// Create a new unreachable error
    pub fn unreachable(address: &str, reason: impl ToString) -> Self {
        BridgeError::Unreachable {
            address: address.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a new device not found error
    pub fn device_not_found(device_id: &str) -> Self {
        BridgeError::DeviceNotFound {
            device_id: device_id.to_string(),
        }
    }
}
