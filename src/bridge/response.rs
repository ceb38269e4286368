//! Decoding of Hue Bridge responses
//!
//! The bridge reports most failures with HTTP 200 and a JSON array of
//! `{"error": {"type", "address", "description"}}` entries; successful
//! writes come back as `{"success": {...}}` entries.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use super::BridgeError;

/// `unauthorized user`
const ERROR_UNAUTHORIZED: u16 = 1;
/// `resource, /lights/<id>, not available`
const ERROR_RESOURCE_NOT_AVAILABLE: u16 = 3;
/// `link button not pressed`
const ERROR_LINK_BUTTON: u16 = 101;

/// One error entry from the bridge
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: u16,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
}

impl ApiError {
    /// Map to a [`BridgeError`], attributing missing resources to `device_id`
    pub fn into_bridge_error(self, device_id: Option<&str>) -> BridgeError {
        match self.kind {
            ERROR_UNAUTHORIZED => BridgeError::Unauthorized,
            ERROR_LINK_BUTTON => BridgeError::LinkButtonNotPressed,
            ERROR_RESOURCE_NOT_AVAILABLE => match device_id {
                Some(id) => BridgeError::device_not_found(id),
                None => BridgeError::device_not_found(
                    self.address.rsplit('/').next().unwrap_or_default(),
                ),
            },
            kind => BridgeError::Api {
                kind,
                address: self.address,
                description: self.description,
            },
        }
    }
}

/// Return the first error entry of an array response, if any
pub fn first_error(body: &Value) -> Option<ApiError> {
    body.as_array()?
        .iter()
        .filter_map(|entry| entry.get("error"))
        .find_map(|error| ApiError::deserialize(error).ok())
}

/// Decode a read response into `T`, surfacing bridge-reported errors
pub fn decode<T: DeserializeOwned>(body: Value, device_id: Option<&str>) -> Result<T, BridgeError> {
    if let Some(error) = first_error(&body) {
        return Err(error.into_bridge_error(device_id));
    }
    serde_json::from_value(body).map_err(|e| BridgeError::InvalidResponse(e.to_string()))
}

/// Check a write response: every entry must be a success
pub fn expect_success(body: &Value, device_id: Option<&str>) -> Result<(), BridgeError> {
    if let Some(error) = first_error(body) {
        return Err(error.into_bridge_error(device_id));
    }
    let has_success = body
        .as_array()
        .is_some_and(|entries| entries.iter().any(|entry| entry.get("success").is_some()));
    if has_success {
        Ok(())
    } else {
        Err(BridgeError::InvalidResponse(body.to_string()))
    }
}

/// Extract the generated username from a registration response
pub fn registered_username(body: &Value) -> Result<String, BridgeError> {
    if let Some(error) = first_error(body) {
        return Err(error.into_bridge_error(None));
    }
    body.as_array()
        .and_then(|entries| {
            entries
                .iter()
                .find_map(|entry| entry.pointer("/success/username")?.as_str())
        })
        .map(str::to_string)
        .ok_or_else(|| BridgeError::InvalidResponse(body.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde_json::json;

    use super::*;
    use crate::bridge::LightInfo;

    fn error_body(kind: u16, address: &str, description: &str) -> Value {
        json!([{"error": {"type": kind, "address": address, "description": description}}])
    }

    #[test]
    fn test_unauthorized_is_distinguished() {
        let body = error_body(1, "/", "unauthorized user");
        let result: Result<BTreeMap<String, LightInfo>, _> = decode(body, None);
        assert_eq!(result.unwrap_err(), BridgeError::Unauthorized);
    }

    #[test]
    fn test_missing_resource_uses_requested_device() {
        let body = error_body(3, "/lights/99", "resource, /lights/99, not available");
        let result: Result<LightInfo, _> = decode(body.clone(), Some("99"));
        assert_eq!(result.unwrap_err(), BridgeError::device_not_found("99"));

        // Without a known id the address tail is used
        let err = first_error(&body).unwrap().into_bridge_error(None);
        assert_eq!(err, BridgeError::device_not_found("99"));
    }

    #[test]
    fn test_other_errors_keep_details() {
        let body = error_body(201, "/lights/3/state/bri", "parameter, bri, is not modifiable");
        let err = expect_success(&body, Some("3")).unwrap_err();
        assert!(matches!(err, BridgeError::Api { kind: 201, .. }));
        assert!(err.to_string().contains("not modifiable"));
    }

    #[test]
    fn test_light_decodes() {
        let body = json!({
            "name": "Desk lamp",
            "type": "Extended color light",
            "state": {"on": true, "bri": 254, "reachable": true}
        });
        let light: LightInfo = decode(body, Some("3")).unwrap();
        assert_eq!(light.name, "Desk lamp");
        assert_eq!(light.kind, "Extended color light");
        assert_eq!(light.state.on, Some(true));
    }

    #[test]
    fn test_write_success() {
        let body = json!([{"success": {"/lights/3/state/on": false}}]);
        assert!(expect_success(&body, Some("3")).is_ok());
        assert!(matches!(
            expect_success(&json!([]), Some("3")),
            Err(BridgeError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_registration() {
        let body = json!([{"success": {"username": "83b7780291a6ceffbe0bd049104df"}}]);
        assert_eq!(registered_username(&body).unwrap(), "83b7780291a6ceffbe0bd049104df");

        let body = error_body(101, "", "link button not pressed");
        assert_eq!(registered_username(&body).unwrap_err(), BridgeError::LinkButtonNotPressed);
    }
}
