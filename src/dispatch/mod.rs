//! Dispatch module: hotkey bindings and the toggle loop

mod binding;
mod dispatcher;

pub use binding::{build_bindings, BindingMap, DeviceBinding};
pub use dispatcher::{AuthStatus, Dispatcher, ToggleResult};
