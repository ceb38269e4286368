//! Configuration loading and persistence
//!
//! Settings live in a TOML file:
//!
//! ```toml
//! bridge_address = "192.168.1.20"
//! username = "83b7780291a6ceffbe0bd049104df"
//! request_timeout_secs = 5
//!
//! [[devices]]
//! hotkey = "ctrl+alt+1"
//! device_id = "3"
//! label = "desk-lamp"
//! ```

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bridge::BridgeSession;
use crate::dispatch::DeviceBinding;

/// Errors in configuration values or the settings file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("hotkey {hotkey} is already bound to device {device_id} ({label})")]
    DuplicateHotkey {
        hotkey: String,
        device_id: String,
        label: String,
    },

    #[error("binding for hotkey {0} has an empty device id")]
    EmptyDeviceId(String),

    #[error("no devices are configured")]
    NoBindings,

    #[error("missing configuration value: {0}")]
    MissingValue(&'static str),

    #[error("could not determine the configuration directory (HOME is not set)")]
    NoConfigDir,

    #[error("I/O error accessing settings at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse settings: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        ConfigError::Io {
            path: path.to_owned(),
            source,
        }
    }
}

/// Where the application keeps its state
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the settings file
    pub settings_path: PathBuf,
}

impl Config {
    /// Resolve the settings path from an explicit override or the environment
    pub fn load(settings_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        if let Some(settings_path) = settings_override {
            return Ok(Self { settings_path });
        }

        Ok(Self {
            settings_path: default_settings_path(
                std::env::var_os("XDG_CONFIG_HOME"),
                std::env::var_os("HOME"),
            )?,
        })
    }

    /// Whether settings have been saved before
    pub fn has_settings(&self) -> bool {
        self.settings_path.exists()
    }
}

fn default_settings_path(
    xdg_config_home: Option<OsString>,
    home: Option<OsString>,
) -> Result<PathBuf, ConfigError> {
    let config_dir = match xdg_config_home {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(home.ok_or(ConfigError::NoConfigDir)?).join(".config"),
    };
    Ok(config_dir.join("hue-hotkeys").join("settings.toml"))
}

fn default_timeout_secs() -> u64 {
    5
}

/// Persisted bridge credentials and device bindings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub bridge_address: String,
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    pub devices: Vec<DeviceBinding>,
}

impl Settings {
    pub fn new(bridge_address: impl Into<String>, username: impl Into<String>) -> Self {
        Self {
            bridge_address: bridge_address.into(),
            username: username.into(),
            request_timeout_secs: default_timeout_secs(),
            devices: Vec::new(),
        }
    }

    /// Read settings from `path`
    pub fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        Ok(toml::from_str(&text)?)
    }

    /// Write settings to `path`, creating parent directories
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::io(parent, e))?;
        }

        let text = toml::to_string_pretty(self)?;

        // The username is a credential: owner-only (0600) from creation on
        let mut options = std::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(path).map_err(|e| ConfigError::io(path, e))?;

        // mode() only applies to new files
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(std::fs::Permissions::from_mode(0o600))
                .map_err(|e| ConfigError::io(path, e))?;
        }

        file.write_all(text.as_bytes()).map_err(|e| ConfigError::io(path, e))?;
        Ok(())
    }

    /// Check that the values needed to talk to the bridge are present
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bridge_address.trim().is_empty() {
            return Err(ConfigError::MissingValue("bridge_address"));
        }
        if self.username.trim().is_empty() {
            return Err(ConfigError::MissingValue("username"));
        }
        if self.devices.is_empty() {
            return Err(ConfigError::NoBindings);
        }
        Ok(())
    }

    pub fn session(&self) -> BridgeSession {
        BridgeSession::new(self.bridge_address.trim(), self.username.trim())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
