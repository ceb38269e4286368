//! The dispatch loop: hotkey presses in, bridge toggles out
//!
//! Presses are taken from the channel one at a time and each toggle is
//! awaited to completion before the next press is read, so at most one
//! request is in flight and presses are handled in arrival order.

use std::future::Future;

use tokio::sync::{broadcast, mpsc};
use tracing::{debug, error, info, warn};

use crate::bridge::{BridgeApi, BridgeError, BridgeSession};
use crate::config::ConfigError;
use crate::events::DispatchEvent;
use crate::hotkey::{Hotkey, HotkeyEvent};

use super::binding::{BindingMap, DeviceBinding};

/// Outcome of a successful toggle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToggleResult {
    pub device_id: String,
    /// `None` when the bridge's state object had no power field
    pub previous_state: Option<bool>,
    pub new_state: bool,
    /// Bridge's reachability flag at the time of the toggle; an unreachable
    /// light accepts the write but does not switch
    pub reachable: Option<bool>,
}

/// What the dispatcher knows about the session's username
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthStatus {
    /// Not checked yet, or the last check could not reach the bridge
    Unknown,
    Verified,
    /// The bridge rejected the username; only `--username` can fix this
    Rejected,
}

/// Maps hotkeys to device toggles for the lifetime of the process
pub struct Dispatcher<B> {
    bridge: B,
    session: BridgeSession,
    bindings: BindingMap,
    auth: AuthStatus,
    event_tx: broadcast::Sender<DispatchEvent>,
}

impl<B: BridgeApi> Dispatcher<B> {
    pub fn new(
        bridge: B,
        session: BridgeSession,
        bindings: BindingMap,
        event_tx: broadcast::Sender<DispatchEvent>,
    ) -> Self {
        Self {
            bridge,
            session,
            bindings,
            auth: AuthStatus::Unknown,
            event_tx,
        }
    }

    /// Bind another hotkey; an already bound hotkey is rejected
    pub fn register(&mut self, binding: DeviceBinding) -> Result<(), ConfigError> {
        self.bindings.register(binding)
    }

    pub fn bindings(&self) -> &BindingMap {
        &self.bindings
    }

    pub fn session(&self) -> &BridgeSession {
        &self.session
    }

    pub fn auth_status(&self) -> AuthStatus {
        self.auth
    }

    /// Check the username against the bridge by listing its lights
    pub async fn verify_session(&mut self) -> Result<(), BridgeError> {
        match self.bridge.lights(&self.session).await {
            Ok(lights) => {
                self.auth = AuthStatus::Verified;
                debug!(lights = lights.len(), "username accepted by bridge");
                Ok(())
            }
            Err(e) => Err(self.observe(e)),
        }
    }

    /// Verify the session and log the initial state of every bound device
    pub async fn prepare(&mut self) {
        if let Err(e) = self.verify_session().await {
            match e {
                BridgeError::Unauthorized => error!(
                    bridge = %self.session.bridge_address,
                    "username was rejected by the bridge; re-run with --username to register again"
                ),
                e => warn!(bridge = %self.session.bridge_address, %e, "could not verify username"),
            }
            return;
        }

        for binding in self.bindings.iter() {
            match self.bridge.light(&self.session, &binding.device_id).await {
                Ok(light) => info!(
                    device_id = %binding.device_id,
                    label = %binding.label,
                    on = ?light.state.on,
                    reachable = ?light.state.reachable,
                    "initial device state"
                ),
                Err(e) => warn!(
                    device_id = %binding.device_id,
                    label = %binding.label,
                    %e,
                    "could not read initial device state"
                ),
            }
        }
    }

    /// Read the device's power state and write its negation
    pub async fn toggle(&mut self, device_id: &str) -> Result<ToggleResult, BridgeError> {
        match self.auth {
            AuthStatus::Rejected => return Err(BridgeError::Unauthorized),
            AuthStatus::Unknown => self.verify_session().await?,
            AuthStatus::Verified => {}
        }

        let light = match self.bridge.light(&self.session, device_id).await {
            Ok(light) => light,
            Err(e) => return Err(self.observe(e)),
        };

        let previous_state = light.state.on;
        let new_state = !previous_state.unwrap_or(false);
        debug!(device_id, ?previous_state, new_state, "setting device power");

        if let Err(e) = self.bridge.set_power(&self.session, device_id, new_state).await {
            return Err(self.observe(e));
        }

        let reachable = light.state.reachable;
        if reachable == Some(false) {
            warn!(
                device_id,
                new_state,
                "bridge accepted the change but reports the device unreachable"
            );
        }

        Ok(ToggleResult {
            device_id: device_id.to_string(),
            previous_state,
            new_state,
            reachable,
        })
    }

    /// Toggle the device bound to `hotkey` and report the outcome.
    ///
    /// Returns `None` for hotkeys without a binding.
    pub async fn handle_press(&mut self, hotkey: &Hotkey) -> Option<Result<ToggleResult, BridgeError>> {
        let Some(binding) = self.bindings.get(hotkey).cloned() else {
            debug!(%hotkey, "no binding for hotkey");
            return None;
        };

        let result = self.toggle(&binding.device_id).await;
        self.report(&binding, &result);
        Some(result)
    }

    /// Process hotkey events until `shutdown` resolves or the stream ends.
    ///
    /// Shutdown is only observed between toggles; an in-flight request
    /// always completes.
    pub async fn run<F>(&mut self, mut events: mpsc::Receiver<HotkeyEvent>, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);
        info!(bindings = self.bindings.len(), "dispatcher waiting for hotkeys");

        loop {
            let event = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("dispatcher interrupted");
                    break;
                }
                event = events.recv() => event,
            };

            match event {
                Some(HotkeyEvent::Pressed(hotkey)) => {
                    self.handle_press(&hotkey).await;
                }
                Some(HotkeyEvent::TapDisabled) => {
                    warn!("hotkey tap was disabled, presses may have been missed");
                }
                None => {
                    info!("hotkey stream closed");
                    break;
                }
            }
        }

        info!("dispatcher stopped");
    }

    /// Remember a rejected username so later toggles fail without a request
    fn observe(&mut self, err: BridgeError) -> BridgeError {
        if err == BridgeError::Unauthorized {
            self.auth = AuthStatus::Rejected;
        }
        err
    }

    fn report(&self, binding: &DeviceBinding, result: &Result<ToggleResult, BridgeError>) {
        let hotkey = binding.hotkey.to_string();
        let event = match result {
            Ok(toggled) => {
                info!(
                    %hotkey,
                    device_id = %binding.device_id,
                    label = %binding.label,
                    previous = ?toggled.previous_state,
                    on = toggled.new_state,
                    reachable = ?toggled.reachable,
                    "device toggled"
                );
                DispatchEvent::Toggled {
                    hotkey,
                    device_id: binding.device_id.clone(),
                    label: binding.label.clone(),
                    previous_state: toggled.previous_state,
                    new_state: toggled.new_state,
                    reachable: toggled.reachable,
                }
            }
            Err(e) => {
                match e {
                    BridgeError::Unauthorized => error!(
                        %hotkey,
                        device_id = %binding.device_id,
                        label = %binding.label,
                        "username was rejected by the bridge; re-run with --username"
                    ),
                    BridgeError::DeviceNotFound { .. } => error!(
                        %hotkey,
                        device_id = %binding.device_id,
                        label = %binding.label,
                        "device no longer exists on the bridge; re-run with --edit"
                    ),
                    BridgeError::Status { status } => error!(
                        %hotkey,
                        device_id = %binding.device_id,
                        label = %binding.label,
                        status,
                        "bridge rejected the request"
                    ),
                    e => error!(
                        %hotkey,
                        device_id = %binding.device_id,
                        label = %binding.label,
                        %e,
                        "toggle failed"
                    ),
                }
                DispatchEvent::ToggleFailed {
                    hotkey,
                    device_id: binding.device_id.clone(),
                    label: binding.label.clone(),
                    error: e.to_string(),
                }
            }
        };

        let _ = self.event_tx.send(event);
    }
}
