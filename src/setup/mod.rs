//! Interactive setup flows
//!
//! - initial setup: bridge address, username, device bindings
//! - `--edit`: re-select device bindings
//! - `--username`: acquire a new username
//!
//! The flows only talk to a [`Console`] and a [`BridgeApi`]; saving the
//! resulting [`Settings`] is left to the caller.

mod prompt;
mod registration;

use std::io::{BufRead, Write};

use thiserror::Error;
use tracing::info;

use crate::bridge::{BridgeApi, BridgeError, BridgeSession};
use crate::config::{ConfigError, Settings};
use crate::dispatch::{BindingMap, DeviceBinding};
use crate::hotkey::Hotkey;

pub use prompt::Console;
pub use registration::{register_username, validate_username, RegistrationPolicy, DEVICE_TYPE};

/// Errors that end a setup flow
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("could not register with the Hue Bridge; was the link button pressed?")]
    RegistrationFailed,

    #[error("the bridge reported no devices")]
    NoDevicesFound,

    #[error("no devices configured")]
    NoDevicesConfigured,

    #[error(transparent)]
    Bridge(#[from] BridgeError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("console error: {0}")]
    Io(#[from] std::io::Error),
}

/// First run: ask for everything and build fresh settings
pub async fn initial_setup<B, R, W>(
    console: &mut Console<R, W>,
    bridge: &B,
    policy: RegistrationPolicy,
) -> Result<Settings, SetupError>
where
    B: BridgeApi,
    R: BufRead,
    W: Write,
{
    let bridge_address = loop {
        let address = console.ask("Enter your Hue Bridge IP address: ")?;
        if !address.is_empty() {
            break address;
        }
    };

    let username = choose_username(console, bridge, &bridge_address, policy).await?;
    let mut settings = Settings::new(bridge_address, username);
    settings.devices = select_devices(console, bridge, &settings.session()).await?;

    info!(devices = settings.devices.len(), "initial setup complete");
    Ok(settings)
}

/// Replace the configured device bindings, keeping everything else
pub async fn edit_devices<B, R, W>(
    console: &mut Console<R, W>,
    bridge: &B,
    settings: &mut Settings,
) -> Result<(), SetupError>
where
    B: BridgeApi,
    R: BufRead,
    W: Write,
{
    if settings.bridge_address.trim().is_empty() {
        return Err(ConfigError::MissingValue("bridge_address").into());
    }
    if settings.username.trim().is_empty() {
        return Err(ConfigError::MissingValue("username").into());
    }

    settings.devices = select_devices(console, bridge, &settings.session()).await?;
    info!(devices = settings.devices.len(), "device configuration updated");
    Ok(())
}

/// Acquire a new username for the configured bridge
pub async fn update_username<B, R, W>(
    console: &mut Console<R, W>,
    bridge: &B,
    settings: &mut Settings,
    policy: RegistrationPolicy,
) -> Result<(), SetupError>
where
    B: BridgeApi,
    R: BufRead,
    W: Write,
{
    let bridge_address = settings.bridge_address.trim().to_string();
    if bridge_address.is_empty() {
        return Err(ConfigError::MissingValue("bridge_address").into());
    }

    settings.username = choose_username(console, bridge, &bridge_address, policy).await?;
    info!("username updated");
    Ok(())
}

/// Use an existing username if it checks out, otherwise register a new one
pub async fn choose_username<B, R, W>(
    console: &mut Console<R, W>,
    bridge: &B,
    bridge_address: &str,
    policy: RegistrationPolicy,
) -> Result<String, SetupError>
where
    B: BridgeApi,
    R: BufRead,
    W: Write,
{
    if console.confirm("Do you want to use an existing Hue API username? (y/n): ")? {
        let username = console.ask("Enter your Hue API username: ")?;
        let session = BridgeSession::new(bridge_address, username.as_str());
        if !username.is_empty() && validate_username(bridge, &session).await {
            console.say("Username is valid.")?;
            return Ok(username);
        }
        console.say("Invalid username or no devices found. Falling back to automatic registration.")?;
    }

    console.say("Please press the link button on your Hue Bridge.")?;
    register_username(bridge, bridge_address, policy)
        .await
        .ok_or(SetupError::RegistrationFailed)
}

/// List the bridge's lights and bind hotkeys to the ones the user picks
pub async fn select_devices<B, R, W>(
    console: &mut Console<R, W>,
    bridge: &B,
    session: &BridgeSession,
) -> Result<Vec<DeviceBinding>, SetupError>
where
    B: BridgeApi,
    R: BufRead,
    W: Write,
{
    let lights = bridge.lights(session).await?;
    if lights.is_empty() {
        return Err(SetupError::NoDevicesFound);
    }

    let mut bindings = BindingMap::default();
    loop {
        console.say("\nAvailable devices:")?;
        for (id, light) in &lights {
            let kind = if light.kind.is_empty() { "N/A" } else { light.kind.as_str() };
            console.say(&format!("ID: {id} - Name: {} (Type: {kind})", display_name(&light.name)))?;
        }

        let device_id =
            console.ask("Enter the ID of the device you want to add (or press Enter to finish): ")?;
        if device_id.is_empty() {
            break;
        }
        let Some(light) = lights.get(&device_id) else {
            console.say("Invalid device ID. Please try again.")?;
            continue;
        };
        let name = display_name(&light.name).to_string();

        loop {
            let raw = console.ask(&format!(
                "Enter your desired keyboard shortcut for '{name}' (e.g., ctrl+shift+l): "
            ))?;
            let hotkey = match Hotkey::parse(&raw) {
                Ok(hotkey) => hotkey,
                Err(e) => {
                    console.say(&format!("Invalid shortcut: {e}"))?;
                    continue;
                }
            };
            match bindings.register(DeviceBinding::new(hotkey, device_id.as_str(), name.as_str())) {
                Ok(()) => break,
                Err(e @ ConfigError::DuplicateHotkey { .. }) => {
                    console.say(&format!("{e}. Choose another shortcut."))?;
                }
                Err(e) => return Err(e.into()),
            }
        }

        if !console.confirm("Would you like to add another device? (y/n): ")? {
            break;
        }
    }

    if bindings.is_empty() {
        return Err(SetupError::NoDevicesConfigured);
    }
    Ok(bindings.into_records())
}

fn display_name(name: &str) -> &str {
    if name.is_empty() {
        "Unknown"
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;
    use std::time::Duration;

    use super::*;
    use crate::bridge::fake::FakeBridge;

    type ScriptedConsole = Console<Cursor<String>, Vec<u8>>;

    fn console(lines: &[&str]) -> ScriptedConsole {
        let mut script = lines.join("\n");
        script.push('\n');
        Console::new(Cursor::new(script), Vec::new())
    }

    fn output(console: ScriptedConsole) -> String {
        String::from_utf8(console.into_output()).unwrap()
    }

    fn quick() -> RegistrationPolicy {
        RegistrationPolicy {
            timeout: Duration::from_millis(30),
            interval: Duration::from_millis(5),
        }
    }

    fn bridge() -> FakeBridge {
        FakeBridge::new("good-user")
            .with_light("3", "Desk lamp", true)
            .with_light("7", "", false)
    }

    #[tokio::test]
    async fn test_initial_setup_with_existing_username() {
        let bridge = bridge();
        let mut console = console(&[
            "10.0.0.2",
            "y",
            "good-user",
            "3",
            "ctrl+alt+1",
            "y",
            "7",
            "ctrl+alt+2",
            "n",
        ]);

        let settings = initial_setup(&mut console, &bridge, quick()).await.unwrap();
        assert_eq!(settings.bridge_address, "10.0.0.2");
        assert_eq!(settings.username, "good-user");
        assert_eq!(settings.devices.len(), 2);
        assert_eq!(settings.devices[0].label, "Desk lamp");
        assert_eq!(settings.devices[1].label, "Unknown");
        assert_eq!(settings.devices[1].hotkey.to_string(), "ctrl+alt+2");
        assert_eq!(bridge.count("POST "), 0);

        let text = output(console);
        assert!(text.contains("ID: 3 - Name: Desk lamp (Type: Extended color light)"));
        assert!(text.contains("Username is valid."));
    }

    #[tokio::test]
    async fn test_invalid_username_falls_back_to_registration() {
        let bridge = bridge();
        bridge.push_registration(Err(BridgeError::LinkButtonNotPressed));
        bridge.push_registration(Ok("good-user".to_string()));
        let mut console = console(&["y", "stale-user"]);

        let username = choose_username(&mut console, &bridge, "10.0.0.2", quick())
            .await
            .unwrap();
        assert_eq!(username, "good-user");
        assert_eq!(bridge.count("POST "), 2);
        assert!(output(console).contains("Falling back to automatic registration."));
    }

    #[tokio::test]
    async fn test_registration_timeout_fails_setup() {
        let bridge = bridge();
        let mut console = console(&["n"]);

        let err = choose_username(&mut console, &bridge, "10.0.0.2", quick())
            .await
            .unwrap_err();
        assert!(matches!(err, SetupError::RegistrationFailed));
    }

    #[tokio::test]
    async fn test_select_devices_reprompts_bad_input() {
        let bridge = bridge();
        let session = BridgeSession::new("10.0.0.2", "good-user");
        let mut console = console(&[
            "42",         // unknown device
            "3",
            "ctrl+alt",   // no key
            "ctrl+alt+1",
            "y",
            "7",
            "alt+ctrl+1", // already bound
            "ctrl+alt+2",
            "n",
        ]);

        let devices = select_devices(&mut console, &bridge, &session).await.unwrap();
        let hotkeys: Vec<String> = devices.iter().map(|d| d.hotkey.to_string()).collect();
        assert_eq!(hotkeys, vec!["ctrl+alt+1", "ctrl+alt+2"]);

        let text = output(console);
        assert!(text.contains("Invalid device ID. Please try again."));
        assert!(text.contains("Invalid shortcut:"));
        assert!(text.contains("Choose another shortcut."));
    }

    #[tokio::test]
    async fn test_select_devices_rejects_keys_the_keyboard_cannot_send() {
        let bridge = bridge();
        let session = BridgeSession::new("10.0.0.2", "good-user");
        let mut console = console(&["3", "ctrl+lamp", "ctrl+l", "n"]);

        let devices = select_devices(&mut console, &bridge, &session).await.unwrap();
        let hotkeys: Vec<String> = devices.iter().map(|d| d.hotkey.to_string()).collect();
        assert_eq!(hotkeys, vec!["ctrl+l"]);

        let text = output(console);
        assert!(text.contains("Invalid shortcut: 'lamp' in hotkey 'ctrl+lamp' is not a supported key"));
    }

    #[tokio::test]
    async fn test_select_devices_requires_one_device() {
        let bridge = bridge();
        let session = BridgeSession::new("10.0.0.2", "good-user");
        let mut console = console(&[""]);

        let err = select_devices(&mut console, &bridge, &session).await.unwrap_err();
        assert!(matches!(err, SetupError::NoDevicesConfigured));
    }

    #[tokio::test]
    async fn test_select_devices_with_rejected_username() {
        let bridge = bridge();
        let session = BridgeSession::new("10.0.0.2", "stale-user");
        let mut console = console(&[]);

        let err = select_devices(&mut console, &bridge, &session).await.unwrap_err();
        assert!(matches!(err, SetupError::Bridge(BridgeError::Unauthorized)));
    }

    #[tokio::test]
    async fn test_edit_devices_keeps_credentials() {
        let bridge = bridge();
        let mut settings = Settings::new("10.0.0.2", "good-user");
        settings.request_timeout_secs = 9;
        let mut console = console(&["7", "f5", "n"]);

        edit_devices(&mut console, &bridge, &mut settings).await.unwrap();
        assert_eq!(settings.username, "good-user");
        assert_eq!(settings.request_timeout_secs, 9);
        assert_eq!(settings.devices.len(), 1);
        assert_eq!(settings.devices[0].device_id, "7");
    }

    #[tokio::test]
    async fn test_update_username_requires_bridge_address() {
        let bridge = bridge();
        let mut settings = Settings::new("", "old");
        let mut console = console(&[]);

        let err = update_username(&mut console, &bridge, &mut settings, quick())
            .await
            .unwrap_err();
        assert!(matches!(err, SetupError::Config(ConfigError::MissingValue("bridge_address"))));
        assert_eq!(settings.username, "old");
    }

    #[tokio::test]
    async fn test_update_username_stores_new_username() {
        let bridge = bridge();
        bridge.push_registration(Ok("new-user".to_string()));
        let mut settings = Settings::new("10.0.0.2", "old");
        let mut console = console(&["n"]);

        update_username(&mut console, &bridge, &mut settings, quick()).await.unwrap();
        assert_eq!(settings.username, "new-user");
    }
}
