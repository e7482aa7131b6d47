//! Command dispatch to the device or host side
//!
//! The session decodes inbound frames; a [`Handler`] decides what each
//! command means for its side of the link.

pub mod device;
pub mod handler;
pub mod host;

pub use device::{BoardControl, DeviceHandler, SettingsStore, StorageError, TelemetrySource};
pub use handler::{Context, Handler};
pub use host::HostHandler;
