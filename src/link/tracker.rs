//! Request/response exchange tracking
//!
//! A link-level ACK only proves a frame arrived intact. The tracker checks
//! that the expected reply command actually comes back, retrying the request
//! on timeout and giving up after [`MAX_REQUEST_FAULTS`] retries.

use crate::commands::Command;
use crate::config::request::{BUSY_RECHECK_MS, MAX_REQUEST_FAULTS, REQUEST_TIMEOUT_MS};
use crate::link::timers::{Millis, TimerId, Timers};

/// Tracked request types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// `Get`, answered by `Set`
    Settings,
    /// `FE`, answered by `FE` with a feature list
    Features,
}

impl RequestKind {
    /// Command that starts the exchange
    pub fn request(self) -> Command {
        match self {
            RequestKind::Settings => Command::GetSettings,
            RequestKind::Features => Command::GetFeatures,
        }
    }

    /// Whether `command` is the reply this exchange waits for
    pub fn is_reply(self, command: &Command) -> bool {
        matches!(
            (self, command),
            (RequestKind::Settings, Command::Settings(_))
                | (RequestKind::Features, Command::Features(_))
        )
    }

    pub fn timer(self) -> TimerId {
        match self {
            RequestKind::Settings => TimerId::SettingsRetry,
            RequestKind::Features => TimerId::FeaturesRetry,
        }
    }
}

/// What the caller must do after a tracker transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerStep {
    /// Send the request command; `first` when a new exchange starts
    Send { first: bool },
    /// Exchange abandoned; `report` only the first time
    GiveUp { report: bool },
    /// Our own outgoing data is still queued, check again later
    Wait,
    /// No exchange in progress
    Idle,
}

/// Retry state of one request type
#[derive(Debug)]
pub struct RequestTracker {
    kind: RequestKind,
    faults: u8,
    failure_reported: bool,
    pending: bool,
}

impl RequestTracker {
    pub fn new(kind: RequestKind) -> Self {
        Self {
            kind,
            faults: 0,
            failure_reported: false,
            pending: false,
        }
    }

    pub fn kind(&self) -> RequestKind {
        self.kind
    }

    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// Waiting for a reply
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Issue (or reissue) the request.
    pub fn request(&mut self, timers: &mut Timers, now: Millis) -> TrackerStep {
        if self.faults > MAX_REQUEST_FAULTS {
            timers.cancel(self.kind.timer());
            self.pending = false;
            let report = !self.failure_reported;
            self.failure_reported = true;
            if report {
                log::error!("{:?} request failed after {} retries", self.kind, MAX_REQUEST_FAULTS);
            }
            return TrackerStep::GiveUp { report };
        }

        self.pending = true;
        timers.arm(self.kind.timer(), now, REQUEST_TIMEOUT_MS);
        TrackerStep::Send {
            first: self.faults == 0,
        }
    }

    /// The retry timer fired.
    ///
    /// `link_busy` means our request may not have left yet, which is not the
    /// peer's fault.
    pub fn on_timeout(&mut self, link_busy: bool, timers: &mut Timers, now: Millis) -> TrackerStep {
        if !self.pending {
            return TrackerStep::Idle;
        }

        if link_busy {
            log::debug!("{:?} reply overdue but link busy, rechecking", self.kind);
            timers.arm(self.kind.timer(), now, BUSY_RECHECK_MS);
            return TrackerStep::Wait;
        }

        self.faults = self.faults.saturating_add(1);
        log::warn!("{:?} reply timed out ({})", self.kind, self.faults);
        self.request(timers, now)
    }

    /// The reply arrived.
    ///
    /// Returns true if an exchange was in progress.
    pub fn on_response(&mut self, timers: &mut Timers) -> bool {
        let was_pending = self.pending;
        timers.cancel(self.kind.timer());
        self.faults = 0;
        self.failure_reported = false;
        self.pending = false;
        was_pending
    }

    pub fn reset(&mut self, timers: &mut Timers) {
        self.on_response(timers);
    }
}
