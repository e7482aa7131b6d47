//! Command handler trait and the context handlers run in
//!
//! The session parses every inbound frame into a [`Command`] and hands it to
//! one [`Handler`]. A handler answers synchronously through [`Context::reply`],
//! which encodes the reply and queues it on the link like any other send.

use crate::commands::{Command, CommandError, ResponseSerialiser};
use crate::link::{Link, Millis, Timers};
use crate::session::SessionEvent;
use crate::transport::Transport;
use alloc::collections::VecDeque;

/// Everything a handler may touch while handling one command
pub struct Context<'a> {
    link: &'a mut Link,
    transport: &'a mut dyn Transport,
    timers: &'a mut Timers,
    events: &'a mut VecDeque<SessionEvent>,
    now: Millis,
}

impl<'a> Context<'a> {
    pub fn new(
        link: &'a mut Link,
        transport: &'a mut dyn Transport,
        timers: &'a mut Timers,
        events: &'a mut VecDeque<SessionEvent>,
        now: Millis,
    ) -> Self {
        Self {
            link,
            transport,
            timers,
            events,
            now,
        }
    }

    /// Current time as supplied to the session
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Encode and queue a command on the link.
    pub fn send(&mut self, command: &Command) -> Result<(), CommandError> {
        let frame = ResponseSerialiser::new().serialise(command)?;
        // Transport faults are logged by the link and recovered by its timers
        let _ = self
            .link
            .send(frame, &mut *self.transport, &mut *self.timers, self.now);
        Ok(())
    }

    /// Send a reply, logging commands that cannot be encoded
    pub fn reply(&mut self, command: &Command) {
        if let Err(e) = self.send(command) {
            log::error!("cannot send {}: {}", command.name().as_wire(), e);
        }
    }

    /// Report something to the application
    pub fn emit(&mut self, event: SessionEvent) {
        self.events.push_back(event);
    }
}

/// Command handler for one side of the link
pub trait Handler {
    /// Handle a parsed inbound command
    fn handle(&mut self, command: Command, ctx: &mut Context<'_>);

    /// Peer attached
    fn on_connect(&mut self, _ctx: &mut Context<'_>) {}

    /// Peer detached; the link is already reset
    fn on_disconnect(&mut self) {}

    /// Interval between [`Handler::poll`] calls while connected
    fn poll_interval(&self) -> Option<Millis> {
        None
    }

    /// Periodic work such as live data pushes
    fn poll(&mut self, _ctx: &mut Context<'_>) {}
}
