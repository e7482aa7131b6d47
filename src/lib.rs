#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod commands;
pub mod config;
pub mod dispatcher;
pub mod link;
pub mod protocol;
pub mod session;
pub mod transport;

// These modules depend on embassy/async features only available with embedded feature
#[cfg(feature = "embedded")]
pub mod debug;
#[cfg(feature = "embedded")]
pub mod tasks;

pub use session::{Session, SessionConfig, SessionEvent};
