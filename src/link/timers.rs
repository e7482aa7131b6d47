//! Named one-shot timers polled by the session loop
//!
//! Time is supplied by the caller as monotonic milliseconds; nothing here
//! reads a clock.

/// Monotonic milliseconds
pub type Millis = u64;

/// Every timer the session can arm
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerId {
    /// Idle heartbeat
    Keepalive,
    /// No ACK/NAK for the outstanding frame
    AckTimeout,
    /// Pause before resending a NAKed frame
    Retransmit,
    /// Settings reply overdue
    SettingsRetry,
    /// Features reply overdue
    FeaturesRetry,
    /// Send coalesced subscription changes
    SubscriptionFlush,
    /// Next live data push
    DataPush,
}

impl TimerId {
    const COUNT: usize = 7;

    const ALL: [TimerId; Self::COUNT] = [
        TimerId::Keepalive,
        TimerId::AckTimeout,
        TimerId::Retransmit,
        TimerId::SettingsRetry,
        TimerId::FeaturesRetry,
        TimerId::SubscriptionFlush,
        TimerId::DataPush,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

/// One optional deadline per [`TimerId`]
#[derive(Debug, Clone, Default)]
pub struct Timers {
    deadlines: [Option<Millis>; TimerId::COUNT],
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm (or re-arm) a timer to fire `delay` ms after `now`
    pub fn arm(&mut self, id: TimerId, now: Millis, delay: Millis) {
        self.deadlines[id.index()] = Some(now.saturating_add(delay));
    }

    pub fn cancel(&mut self, id: TimerId) {
        self.deadlines[id.index()] = None;
    }

    pub fn cancel_all(&mut self) {
        self.deadlines = [None; TimerId::COUNT];
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.deadlines[id.index()].is_some()
    }

    pub fn deadline(&self, id: TimerId) -> Option<Millis> {
        self.deadlines[id.index()]
    }

    /// Earliest armed deadline
    pub fn next_deadline(&self) -> Option<Millis> {
        self.deadlines.iter().flatten().copied().min()
    }

    /// Disarm and return the earliest timer due at `now`.
    ///
    /// Timers due at the same instant come out in declaration order.
    pub fn pop_expired(&mut self, now: Millis) -> Option<TimerId> {
        let id = TimerId::ALL
            .iter()
            .copied()
            .filter_map(|id| self.deadline(id).map(|deadline| (deadline, id)))
            .filter(|&(deadline, _)| deadline <= now)
            .min_by_key(|&(deadline, id)| (deadline, id.index()))
            .map(|(_, id)| id)?;
        self.cancel(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_arm_and_expire() {
        let mut timers = Timers::new();
        timers.arm(TimerId::Keepalive, 1000, 1000);

        assert!(timers.is_armed(TimerId::Keepalive));
        assert_eq!(timers.pop_expired(1999), None);
        assert_eq!(timers.pop_expired(2000), Some(TimerId::Keepalive));
        assert!(!timers.is_armed(TimerId::Keepalive));
        assert_eq!(timers.pop_expired(5000), None);
    }

    #[test]
    fn test_earliest_first() {
        let mut timers = Timers::new();
        timers.arm(TimerId::Keepalive, 0, 300);
        timers.arm(TimerId::SettingsRetry, 0, 100);
        timers.arm(TimerId::AckTimeout, 0, 100);
        timers.arm(TimerId::DataPush, 0, 50);

        assert_eq!(timers.next_deadline(), Some(50));
        assert_eq!(timers.pop_expired(1000), Some(TimerId::DataPush));
        assert_eq!(timers.pop_expired(1000), Some(TimerId::AckTimeout));
        assert_eq!(timers.pop_expired(1000), Some(TimerId::SettingsRetry));
        assert_eq!(timers.pop_expired(1000), Some(TimerId::Keepalive));
        assert_eq!(timers.pop_expired(1000), None);
    }

    #[test]
    fn test_rearm_replaces_deadline() {
        let mut timers = Timers::new();
        timers.arm(TimerId::Retransmit, 0, 100);
        timers.arm(TimerId::Retransmit, 50, 100);
        assert_eq!(timers.deadline(TimerId::Retransmit), Some(150));
        assert_eq!(timers.pop_expired(100), None);
    }

    #[test]
    fn test_cancel_all() {
        let mut timers = Timers::new();
        timers.arm(TimerId::Keepalive, 0, 1);
        timers.arm(TimerId::FeaturesRetry, 0, 1);
        timers.cancel_all();
        assert_eq!(timers.next_deadline(), None);
    }

    #[test]
    fn test_saturating_deadline() {
        let mut timers = Timers::new();
        timers.arm(TimerId::AckTimeout, Millis::MAX - 1, 10);
        assert_eq!(timers.deadline(TimerId::AckTimeout), Some(Millis::MAX));
    }
}
