//! Stop-and-wait reliability layer
//!
//! At most one data frame is unacknowledged at a time. Frames sent while one
//! is outstanding wait in a FIFO queue. A NAK resends the outstanding frame
//! byte for byte after a short pause; too many NAKs, or no answer at all,
//! raise a [`LinkFailure`] that is reported once until an ACK clears it.

use crate::config::link::{ACK_TIMEOUT_MS, KEEPALIVE_MS, MAX_TX_FAULTS, TX_FAULT_PAUSE_MS};
use crate::config::protocol::{ACK, LINE_END, NAK};
use crate::link::timers::{Millis, TimerId, Timers};
use crate::protocol::FrameBuf;
use crate::transport::{Transport, TransportError};
use alloc::collections::VecDeque;

/// Which directions of traffic are acknowledged
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LinkConfig {
    /// Wait for ACK/NAK after every outgoing data frame
    pub await_ack: bool,
    /// Answer every inbound data frame with ACK or NAK
    pub ack_inbound: bool,
    /// Send a heartbeat after this much idle time
    pub keepalive_ms: Option<Millis>,
}

impl LinkConfig {
    /// Host side: waits for ACKs, never sends them, keeps the device alive
    pub const fn host() -> Self {
        Self {
            await_ack: true,
            ack_inbound: false,
            keepalive_ms: Some(KEEPALIVE_MS),
        }
    }

    /// Device side: acknowledges everything it receives, streams freely
    pub const fn device() -> Self {
        Self {
            await_ack: false,
            ack_inbound: true,
            keepalive_ms: None,
        }
    }

    /// Both directions acknowledged
    pub const fn symmetric() -> Self {
        Self {
            await_ack: true,
            ack_inbound: true,
            keepalive_ms: Some(KEEPALIVE_MS),
        }
    }
}

/// Link state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Nothing outstanding
    Idle,
    /// One frame sent, waiting for ACK/NAK
    AwaitingAck,
    /// Gave up on the outstanding frame; new frames are queued
    Disconnected,
}

/// Fatal transmission failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum LinkFailure {
    /// Peer NAKed the same frame too many times
    #[error("frame rejected {0} times")]
    TooManyFaults(u8),
    /// Peer never answered the outstanding frame
    #[error("no response from peer")]
    NoResponse,
}

/// Stop-and-wait sender plus inbound acknowledgement
pub struct Link {
    config: LinkConfig,
    state: LinkState,
    outstanding: Option<FrameBuf>,
    queue: VecDeque<FrameBuf>,
    faults: u8,
    failure_reported: bool,
}

impl Link {
    pub fn new(config: LinkConfig) -> Self {
        Self {
            config,
            state: LinkState::Idle,
            outstanding: None,
            queue: VecDeque::new(),
            faults: 0,
            failure_reported: false,
        }
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// Consecutive NAKs for the outstanding frame
    pub fn faults(&self) -> u8 {
        self.faults
    }

    /// Frames waiting behind the outstanding one
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn has_backlog(&self) -> bool {
        !self.queue.is_empty()
    }

    /// Nothing outstanding and nothing queued
    pub fn is_idle(&self) -> bool {
        self.state == LinkState::Idle && self.queue.is_empty()
    }

    /// Send an encoded data frame, or queue it behind the outstanding one.
    ///
    /// A transport error is returned for immediate writes only. When ACKs
    /// are awaited the frame stays outstanding so the ACK timeout still
    /// catches it.
    pub fn send(
        &mut self,
        frame: FrameBuf,
        transport: &mut dyn Transport,
        timers: &mut Timers,
        now: Millis,
    ) -> Result<(), TransportError> {
        if !self.config.await_ack {
            return self.transmit(&frame, transport, timers, now);
        }

        if self.state != LinkState::Idle {
            self.queue.push_back(frame);
            return Ok(());
        }

        self.state = LinkState::AwaitingAck;
        let result = self.transmit(&frame, transport, timers, now);
        self.outstanding = Some(frame);
        result
    }

    /// Peer accepted the outstanding frame
    pub fn on_ack(&mut self, transport: &mut dyn Transport, timers: &mut Timers, now: Millis) {
        if self.outstanding.is_none() && self.state == LinkState::Idle {
            log::debug!("ACK with nothing outstanding");
            return;
        }

        timers.cancel(TimerId::AckTimeout);
        timers.cancel(TimerId::Retransmit);
        self.outstanding = None;
        self.faults = 0;
        self.failure_reported = false;
        self.state = LinkState::Idle;

        self.send_next(transport, timers, now);
    }

    /// Peer rejected the outstanding frame.
    ///
    /// Returns a failure the first time the fault threshold is reached.
    pub fn on_nak(&mut self, timers: &mut Timers, now: Millis) -> Option<LinkFailure> {
        if self.outstanding.is_none() {
            log::debug!("NAK with nothing outstanding");
            return None;
        }

        timers.cancel(TimerId::AckTimeout);
        self.faults = self.faults.saturating_add(1);
        log::warn!("frame rejected by peer ({}/{})", self.faults, MAX_TX_FAULTS);

        if self.faults >= MAX_TX_FAULTS {
            timers.cancel(TimerId::Retransmit);
            return self.fail(LinkFailure::TooManyFaults(self.faults));
        }

        timers.arm(TimerId::Retransmit, now, TX_FAULT_PAUSE_MS);
        self.arm_keepalive(timers, now);
        None
    }

    /// Pause after a NAK is over; resend the outstanding frame verbatim
    pub fn on_retransmit(&mut self, transport: &mut dyn Transport, timers: &mut Timers, now: Millis) {
        if self.state != LinkState::AwaitingAck {
            return;
        }
        if let Some(frame) = self.outstanding.take() {
            log::debug!("resending {} byte frame", frame.len());
            let _ = self.transmit(&frame, transport, timers, now);
            self.outstanding = Some(frame);
        }
    }

    /// No ACK or NAK arrived for the outstanding frame
    pub fn on_ack_timeout(&mut self, timers: &mut Timers) -> Option<LinkFailure> {
        if self.outstanding.is_none() {
            return None;
        }
        timers.cancel(TimerId::Retransmit);
        self.fail(LinkFailure::NoResponse)
    }

    /// Answer an inbound data frame, if this side acknowledges
    pub fn acknowledge(&self, accepted: bool, transport: &mut dyn Transport) {
        if !self.config.ack_inbound {
            return;
        }
        let control = if accepted { ACK } else { NAK };
        let mut reply = [0u8; 3];
        reply[0] = control;
        reply[1..].copy_from_slice(LINE_END);
        if let Err(e) = transport.write_bytes(&reply) {
            log::debug!("could not send acknowledgement: {}", e);
        }
    }

    /// Arm the idle heartbeat, if configured
    pub fn arm_keepalive(&self, timers: &mut Timers, now: Millis) {
        if let Some(interval) = self.config.keepalive_ms {
            timers.arm(TimerId::Keepalive, now, interval);
        }
    }

    /// Drop everything and start over
    pub fn reset(&mut self, timers: &mut Timers) {
        self.outstanding = None;
        self.queue.clear();
        self.faults = 0;
        self.failure_reported = false;
        self.state = LinkState::Idle;
        timers.cancel(TimerId::AckTimeout);
        timers.cancel(TimerId::Retransmit);
        timers.cancel(TimerId::Keepalive);
    }

    fn send_next(&mut self, transport: &mut dyn Transport, timers: &mut Timers, now: Millis) {
        if let Some(frame) = self.queue.pop_front() {
            self.state = LinkState::AwaitingAck;
            let _ = self.transmit(&frame, transport, timers, now);
            self.outstanding = Some(frame);
        }
    }

    fn fail(&mut self, failure: LinkFailure) -> Option<LinkFailure> {
        self.state = LinkState::Disconnected;
        if self.failure_reported {
            return None;
        }
        self.failure_reported = true;
        log::error!("link failure: {}", failure);
        Some(failure)
    }

    fn transmit(
        &self,
        frame: &[u8],
        transport: &mut dyn Transport,
        timers: &mut Timers,
        now: Millis,
    ) -> Result<(), TransportError> {
        if self.config.await_ack {
            timers.arm(TimerId::AckTimeout, now, ACK_TIMEOUT_MS);
        }
        self.arm_keepalive(timers, now);

        transport.write_bytes(frame).map_err(|e| {
            log::warn!("dropped {} byte frame: {}", frame.len(), e);
            e
        })
    }
}
