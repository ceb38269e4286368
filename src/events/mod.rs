//! Events module for dispatch outcomes
//!
//! Every handled hotkey press produces exactly one [`DispatchEvent`],
//! published on a broadcast channel in processing order.

use serde::{Deserialize, Serialize};

/// Outcome of a dispatched hotkey press
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DispatchEvent {
    /// The device was switched
    Toggled {
        hotkey: String,
        device_id: String,
        label: String,
        /// State read before the switch, if the bridge reported one
        previous_state: Option<bool>,
        new_state: bool,
        /// `Some(false)` when the bridge reported the device offline
        #[serde(default)]
        reachable: Option<bool>,
    },

    /// The toggle failed; nothing was changed by this program
    ToggleFailed {
        hotkey: String,
        device_id: String,
        label: String,
        error: String,
    },
}

fn power(on: bool) -> &'static str {
    if on {
        "ON"
    } else {
        "OFF"
    }
}

impl std::fmt::Display for DispatchEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchEvent::Toggled {
                hotkey,
                device_id,
                label,
                new_state,
                reachable,
                ..
            } => {
                write!(f, "TOGGLED {label} ({device_id}) via {hotkey} -> {}", power(*new_state))?;
                if *reachable == Some(false) {
                    write!(f, " (unreachable)")?;
                }
                Ok(())
            }
            DispatchEvent::ToggleFailed {
                hotkey,
                device_id,
                label,
                error,
            } => write!(f, "TOGGLE_FAILED {label} ({device_id}) via {hotkey}: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serialization() {
        let event = DispatchEvent::Toggled {
            hotkey: "ctrl+alt+1".to_string(),
            device_id: "3".to_string(),
            label: "desk-lamp".to_string(),
            previous_state: Some(true),
            new_state: false,
            reachable: Some(true),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"toggled""#));
        assert!(json.contains(r#""new_state":false"#));
        assert_eq!(event.to_string(), "TOGGLED desk-lamp (3) via ctrl+alt+1 -> OFF");
    }

    #[test]
    fn test_toggled_without_reachability() {
        let json = r#"{"type":"toggled","hotkey":"f5","device_id":"3","label":"x","previous_state":null,"new_state":true}"#;
        let event: DispatchEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, DispatchEvent::Toggled { reachable: None, .. }));
        assert_eq!(event.to_string(), "TOGGLED x (3) via f5 -> ON");
    }

    #[test]
    fn test_event_deserialization() {
        let json = r#"{"type":"toggle_failed","hotkey":"f5","device_id":"99","label":"x","error":"gone"}"#;
        let event: DispatchEvent = serde_json::from_str(json).unwrap();
        assert!(matches!(event, DispatchEvent::ToggleFailed { ref device_id, .. } if device_id == "99"));
    }
}
