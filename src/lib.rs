//! Calibrated, named access to game controllers.
//!
//! Raw evdev samples are normalised into stable values (`-1.0..=1.0` for sticks,
//! `0.0..=1.0` for triggers), buttons get press/release history and hold times, and
//! the device nodes making up one physical controller are grouped, grabbed and read
//! by a background binder thread.
//!
//! ```text
//! hardware ─► EventSource ─► discovery (groups nodes) ─► Binder thread ─► Controller
//!                                                                         ▲
//!                                            application reads values ────┘
//! ```

pub mod axis;
pub mod binder;
pub mod builtin;
pub mod buttons;
pub mod calibration;
pub mod config;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod input;
pub mod profile;
pub mod sysfs;

pub use axis::{Axes, Axis, AxisControl, BinaryAxis, CentredAxis, CircularCentredAxis, TriggerAxis};
pub use binder::{bind_controllers, BindOptions, Binder, BoundEvent, ControllerResource};
pub use buttons::{Button, ButtonKey, ButtonPresses, Buttons, HandlerRegistration};
pub use config::InputConfig;
pub use controller::{Control, ControlStream, ControlValue, Controller, Zones};
pub use discovery::{
    find_all_controllers, find_matching_controllers, unique_name, ControllerDiscovery,
    ControllerRequirement,
};
pub use error::{InputError, Result};
pub use input::{DeviceInfo, EventCode, EventKind, EventSource, RawEvent, SourceProvider};
pub use profile::{ControlSpec, ControllerProfile, ControllerRegistry, DeviceId};
pub use sysfs::SysfsCache;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// State behind these mutexes stays valid even if a handler panicked mid-update.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
