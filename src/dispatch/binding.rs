//! Hotkey to device bindings

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;
use crate::hotkey::Hotkey;

/// A hotkey bound to one bridge device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceBinding {
    pub hotkey: Hotkey,
    pub device_id: String,
    #[serde(default)]
    pub label: String,
}

impl DeviceBinding {
    pub fn new(hotkey: Hotkey, device_id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            hotkey,
            device_id: device_id.into(),
            label: label.into(),
        }
    }
}

/// Bindings keyed by hotkey, kept in registration order
#[derive(Debug, Clone, Default)]
pub struct BindingMap {
    bindings: Vec<DeviceBinding>,
    index: HashMap<Hotkey, usize>,
}

impl BindingMap {
    /// Store a binding; a hotkey that is already bound is rejected
    pub fn register(&mut self, binding: DeviceBinding) -> Result<(), ConfigError> {
        if binding.device_id.trim().is_empty() {
            return Err(ConfigError::EmptyDeviceId(binding.hotkey.to_string()));
        }
        if let Some(existing) = self.get(&binding.hotkey) {
            return Err(ConfigError::DuplicateHotkey {
                hotkey: binding.hotkey.to_string(),
                device_id: existing.device_id.clone(),
                label: existing.label.clone(),
            });
        }

        self.index.insert(binding.hotkey.clone(), self.bindings.len());
        self.bindings.push(binding);
        Ok(())
    }

    pub fn get(&self, hotkey: &Hotkey) -> Option<&DeviceBinding> {
        self.index.get(hotkey).map(|&i| &self.bindings[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &DeviceBinding> {
        self.bindings.iter()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// The set of bound hotkeys, for sources that filter key presses
    pub fn hotkeys(&self) -> HashSet<Hotkey> {
        self.index.keys().cloned().collect()
    }

    pub fn into_records(self) -> Vec<DeviceBinding> {
        self.bindings
    }
}

/// Validate persisted records into a binding map
pub fn build_bindings(records: &[DeviceBinding]) -> Result<BindingMap, ConfigError> {
    if records.is_empty() {
        return Err(ConfigError::NoBindings);
    }

    let mut map = BindingMap::default();
    for record in records {
        map.register(record.clone())?;
    }
    Ok(map)
}
