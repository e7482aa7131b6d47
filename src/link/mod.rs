pub mod reliability;
pub mod timers;
pub mod tracker;

pub use reliability::{Link, LinkConfig, LinkFailure, LinkState};
pub use timers::{Millis, TimerId, Timers};
pub use tracker::{RequestKind, RequestTracker, TrackerStep};
