//! One end of the link
//!
//! A [`Session`] owns the transport, the frame accumulator, the stop-and-wait
//! link, the request trackers and every timer. It is driven by three calls
//! from a single loop:
//!
//! - [`Session::receive`] with bytes read from the transport
//! - [`Session::poll`] whenever [`Session::next_deadline`] passes
//! - [`Session::poll_event`] to collect what happened
//!
//! Nothing inside blocks or reads a clock; `now` is always supplied.

use crate::commands::{
    Body, BoardFeatures, Command, CommandError, CommandParser, FirmwareInfo, LiveData,
};
use crate::config::request::SUBSCRIPTION_DEBOUNCE_MS;
use crate::dispatcher::{Context, Handler};
use crate::link::{
    Link, LinkConfig, LinkFailure, LinkState, Millis, RequestKind, RequestTracker, TimerId, Timers,
    TrackerStep,
};
use crate::protocol::{FrameAccumulator, StreamEvent};
use crate::transport::Transport;
use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;

/// Something the application should know about
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Peer attached
    Connected,
    /// Peer detached; all link state was dropped
    Disconnected,
    /// A tracked request was sent for the first time
    ExchangeStarted(RequestKind),
    /// Its reply arrived
    ExchangeComplete(RequestKind),
    /// Its retries ran out
    ExchangeFailed(RequestKind),
    /// The link gave up on a frame
    LinkFailure(LinkFailure),
    /// Diagnostic text from the peer
    Log(String),
    /// Firmware identification received
    BoardDiscovered(FirmwareInfo),
    /// Settings received
    Settings(Body),
    /// Board features received
    Features(BoardFeatures),
    /// Live data received
    LiveData(LiveData),
    /// Data item list received
    DataList(Body),
}

/// Session tuning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub link: LinkConfig,
    /// Subscription changes within this window go out as one `RD`
    pub subscription_debounce_ms: Millis,
}

impl SessionConfig {
    pub const fn host() -> Self {
        Self {
            link: LinkConfig::host(),
            subscription_debounce_ms: SUBSCRIPTION_DEBOUNCE_MS,
        }
    }

    pub const fn device() -> Self {
        Self {
            link: LinkConfig::device(),
            subscription_debounce_ms: SUBSCRIPTION_DEBOUNCE_MS,
        }
    }
}

/// Protocol state for one peer
pub struct Session<T, H> {
    config: SessionConfig,
    transport: T,
    handler: H,
    accumulator: FrameAccumulator,
    parser: CommandParser,
    link: Link,
    settings: RequestTracker,
    features: RequestTracker,
    timers: Timers,
    events: VecDeque<SessionEvent>,
    subscriptions: Vec<(String, bool)>,
    connected: bool,
}

impl<T: Transport, H: Handler> Session<T, H> {
    pub fn new(transport: T, handler: H, config: SessionConfig) -> Self {
        Self {
            config,
            transport,
            handler,
            accumulator: FrameAccumulator::new(),
            parser: CommandParser::new(),
            link: Link::new(config.link),
            settings: RequestTracker::new(RequestKind::Settings),
            features: RequestTracker::new(RequestKind::Features),
            timers: Timers::new(),
            events: VecDeque::new(),
            subscriptions: Vec::new(),
            connected: false,
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }

    pub fn link(&self) -> &Link {
        &self.link
    }

    pub fn tracker(&self, kind: RequestKind) -> &RequestTracker {
        match kind {
            RequestKind::Settings => &self.settings,
            RequestKind::Features => &self.features,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Earliest time [`Session::poll`] has work to do
    pub fn next_deadline(&self) -> Option<Millis> {
        self.timers.next_deadline()
    }

    /// Next queued event
    pub fn poll_event(&mut self) -> Option<SessionEvent> {
        self.events.pop_front()
    }

    /// Feed bytes read from the transport
    pub fn receive(&mut self, bytes: &[u8], now: Millis) {
        for &byte in bytes {
            if let Some(event) = self.accumulator.push(byte) {
                self.on_stream_event(event, now);
            }
        }
    }

    /// Track the transport connection and run every expired timer
    pub fn poll(&mut self, now: Millis) {
        let connected = self.transport.is_connected();
        if connected != self.connected {
            self.connection_changed(connected, now);
        }

        while let Some(id) = self.timers.pop_expired(now) {
            self.on_timer(id, now);
        }
    }

    /// Encode a command and queue it on the link
    pub fn send(&mut self, command: &Command, now: Millis) -> Result<(), CommandError> {
        Context::new(
            &mut self.link,
            &mut self.transport,
            &mut self.timers,
            &mut self.events,
            now,
        )
        .send(command)
    }

    /// Start a tracked request/response exchange
    pub fn request(&mut self, kind: RequestKind, now: Millis) {
        let step = match kind {
            RequestKind::Settings => self.settings.request(&mut self.timers, now),
            RequestKind::Features => self.features.request(&mut self.timers, now),
        };
        self.apply_step(kind, step, now);
    }

    /// Change one data item subscription.
    ///
    /// Changes are collected and sent together as a single `RD` once no
    /// further change arrives within the debounce window.
    pub fn set_data_item(&mut self, item: &str, enabled: bool, now: Millis) {
        match self.subscriptions.iter_mut().find(|(name, _)| name == item) {
            Some((_, state)) => *state = enabled,
            None => self.subscriptions.push((item.into(), enabled)),
        }
        self.timers.arm(
            TimerId::SubscriptionFlush,
            now,
            self.config.subscription_debounce_ms,
        );
    }

    /// Peer attached or detached
    pub fn connection_changed(&mut self, connected: bool, now: Millis) {
        if connected == self.connected {
            return;
        }
        self.connected = connected;

        if connected {
            log::info!("peer connected");
            self.events.push_back(SessionEvent::Connected);
            self.link.arm_keepalive(&mut self.timers, now);
            if let Some(interval) = self.handler.poll_interval() {
                self.timers.arm(TimerId::DataPush, now, interval);
            }
            let mut ctx = Context::new(
                &mut self.link,
                &mut self.transport,
                &mut self.timers,
                &mut self.events,
                now,
            );
            self.handler.on_connect(&mut ctx);
        } else {
            log::info!("peer disconnected");
            self.reset();
            self.handler.on_disconnect();
            self.events.push_back(SessionEvent::Disconnected);
        }
    }

    /// Drop every queued frame, counter, pending change and timer
    pub fn reset(&mut self) {
        self.link.reset(&mut self.timers);
        self.settings.reset(&mut self.timers);
        self.features.reset(&mut self.timers);
        self.subscriptions.clear();
        self.timers.cancel_all();
        self.accumulator.reset();
    }

    fn on_stream_event(&mut self, event: StreamEvent, now: Millis) {
        match event {
            StreamEvent::Data(Ok(payload)) => {
                self.link.acknowledge(true, &mut self.transport);
                self.dispatch(&payload, now);
            }
            StreamEvent::Data(Err(e)) => {
                log::warn!("bad frame: {}", e);
                self.link.acknowledge(false, &mut self.transport);
            }
            StreamEvent::Log(text) => {
                log::info!("peer: {}", text);
                self.events.push_back(SessionEvent::Log(text));
            }
            StreamEvent::Ack => self.link.on_ack(&mut self.transport, &mut self.timers, now),
            StreamEvent::Nak => {
                if let Some(failure) = self.link.on_nak(&mut self.timers, now) {
                    self.events.push_back(SessionEvent::LinkFailure(failure));
                }
            }
            StreamEvent::Overflow => log::warn!("frame too long, discarded"),
        }
    }

    fn dispatch(&mut self, payload: &[u8], now: Millis) {
        let command = match self.parser.parse(payload) {
            Ok(command) => command,
            Err(CommandError::UnknownCommand(name)) => {
                log::warn!("unknown command {}", name);
                return;
            }
            Err(e) => {
                log::error!("invalid command: {}", e);
                return;
            }
        };

        for tracker in [&mut self.settings, &mut self.features] {
            let kind = tracker.kind();
            if kind.is_reply(&command) && tracker.on_response(&mut self.timers) {
                self.events.push_back(SessionEvent::ExchangeComplete(kind));
            }
        }

        let mut ctx = Context::new(
            &mut self.link,
            &mut self.transport,
            &mut self.timers,
            &mut self.events,
            now,
        );
        self.handler.handle(command, &mut ctx);
    }

    fn on_timer(&mut self, id: TimerId, now: Millis) {
        match id {
            TimerId::Keepalive => {
                if self.link.is_idle() {
                    let _ = self.send(&Command::KeepAlive, now);
                } else {
                    self.link.arm_keepalive(&mut self.timers, now);
                }
            }
            TimerId::AckTimeout => {
                if let Some(failure) = self.link.on_ack_timeout(&mut self.timers) {
                    self.events.push_back(SessionEvent::LinkFailure(failure));
                }
            }
            TimerId::Retransmit => {
                self.link
                    .on_retransmit(&mut self.transport, &mut self.timers, now);
            }
            TimerId::SettingsRetry => self.on_request_timeout(RequestKind::Settings, now),
            TimerId::FeaturesRetry => self.on_request_timeout(RequestKind::Features, now),
            TimerId::SubscriptionFlush => self.flush_subscriptions(now),
            TimerId::DataPush => {
                if !self.connected {
                    return;
                }
                let mut ctx = Context::new(
                    &mut self.link,
                    &mut self.transport,
                    &mut self.timers,
                    &mut self.events,
                    now,
                );
                self.handler.poll(&mut ctx);
                if let Some(interval) = self.handler.poll_interval() {
                    self.timers.arm(TimerId::DataPush, now, interval);
                }
            }
        }
    }

    fn on_request_timeout(&mut self, kind: RequestKind, now: Millis) {
        // A failed link never drains its queue, so it cannot count as busy
        let busy = self.link.state() != LinkState::Disconnected
            && (self.link.has_backlog() || self.transport.backlog() > 0);
        let step = match kind {
            RequestKind::Settings => self.settings.on_timeout(busy, &mut self.timers, now),
            RequestKind::Features => self.features.on_timeout(busy, &mut self.timers, now),
        };
        self.apply_step(kind, step, now);
    }

    fn apply_step(&mut self, kind: RequestKind, step: TrackerStep, now: Millis) {
        match step {
            TrackerStep::Send { first } => {
                if first {
                    self.events.push_back(SessionEvent::ExchangeStarted(kind));
                }
                if let Err(e) = self.send(&kind.request(), now) {
                    log::error!("cannot send {:?} request: {}", kind, e);
                }
            }
            TrackerStep::GiveUp { report: true } => {
                self.events.push_back(SessionEvent::ExchangeFailed(kind));
            }
            TrackerStep::GiveUp { report: false } | TrackerStep::Wait | TrackerStep::Idle => {}
        }
    }

    fn flush_subscriptions(&mut self, now: Millis) {
        if self.subscriptions.is_empty() {
            return;
        }
        let items = core::mem::take(&mut self.subscriptions);
        if let Err(e) = self.send(&Command::RequestData(items), now) {
            log::error!("cannot send data subscriptions: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::link::{MAX_TX_FAULTS, TX_FAULT_PAUSE_MS};
    use crate::config::protocol::{ACK, NAK};
    use crate::config::request::{MAX_REQUEST_FAULTS, REQUEST_TIMEOUT_MS};
    use crate::commands::{ResponseSerialiser, Value};
    use crate::dispatcher::device::mock::{MockBoard, MockSettings, MockTelemetry};
    use crate::dispatcher::{DeviceHandler, HostHandler};
    use crate::protocol::encode_log_frame;
    use crate::transport::mock::MockTransport;

    type Device = Session<MockTransport, DeviceHandler<MockSettings, MockTelemetry, MockBoard>>;
    type Host = Session<MockTransport, HostHandler>;

    fn device() -> Device {
        let mut settings = MockSettings::default();
        settings.applied.insert("tltgain", 5.0);
        settings.applied.insert("Hard", "MOCK");
        let handler =
            DeviceHandler::new(settings, MockTelemetry::default(), MockBoard::default());
        Session::new(MockTransport::new(), handler, SessionConfig::device())
    }

    fn host() -> Host {
        Session::new(MockTransport::new(), HostHandler::new(), SessionConfig::host())
    }

    /// Move bytes both ways until neither side has anything left to say
    fn pump(host: &mut Host, device: &mut Device, now: Millis) {
        loop {
            let to_device = host.transport_mut().take_tx_data();
            let to_host = device.transport_mut().take_tx_data();
            if to_device.is_empty() && to_host.is_empty() {
                break;
            }
            device.receive(&to_device, now);
            host.receive(&to_host, now);
        }
    }

    fn events<T: Transport, H: Handler>(session: &mut Session<T, H>) -> Vec<SessionEvent> {
        core::iter::from_fn(|| session.poll_event()).collect()
    }

    fn sent_commands(session: &mut Host) -> Vec<Command> {
        let bytes = session.transport_mut().take_tx_data();
        let mut acc = FrameAccumulator::new();
        let mut commands = Vec::new();
        acc.push_slice(&bytes, |event| {
            if let StreamEvent::Data(Ok(payload)) = event {
                commands.push(CommandParser::new().parse(&payload).unwrap());
            }
        });
        commands
    }

    fn connected_pair() -> (Host, Device) {
        let mut host = host();
        let mut device = device();
        host.poll(0);
        device.poll(0);
        pump(&mut host, &mut device, 0);
        (host, device)
    }

    #[test]
    fn test_connect_discovers_board() {
        let (mut host, mut device) = connected_pair();

        let info = host.handler().firmware().cloned().expect("Should know the board");
        assert_eq!(info.hardware, "MOCK");
        assert_eq!(
            events(&mut host),
            [SessionEvent::Connected, SessionEvent::BoardDiscovered(info)]
        );
        assert_eq!(events(&mut device), [SessionEvent::Connected]);
        assert!(host.link().is_idle());
    }

    #[test]
    fn test_settings_exchange_with_interleaved_data() {
        let (mut host, mut device) = connected_pair();
        events(&mut host);

        host.set_data_item("tiltoff", true, 10);
        host.poll(10 + SUBSCRIPTION_DEBOUNCE_MS);
        pump(&mut host, &mut device, 210);
        assert_eq!(device.handler().telemetry().subscribed, ["tiltoff"]);

        host.request(RequestKind::Settings, 300);
        // Device pushes live data before it has seen the Get
        device.poll(300);
        pump(&mut host, &mut device, 300);

        let events = events(&mut host);
        assert_eq!(events.len(), 4, "{:?}", events);
        assert_eq!(events[0], SessionEvent::ExchangeStarted(RequestKind::Settings));
        assert!(matches!(&events[1], SessionEvent::LiveData(live) if live.values.contains_key("tiltoff")));
        assert_eq!(events[2], SessionEvent::ExchangeComplete(RequestKind::Settings));
        match &events[3] {
            SessionEvent::Settings(body) => assert_eq!(body.get_f64("tltgain"), Some(5.0)),
            other => panic!("Expected Settings, got {:?}", other),
        }

        assert!(!host.tracker(RequestKind::Settings).is_pending());
        assert!(!host.timers.is_armed(TimerId::SettingsRetry));
        assert!(host.link().is_idle());
    }

    #[test]
    fn test_settings_reply_drops_read_only_keys() {
        let (mut host, mut device) = connected_pair();
        host.request(RequestKind::Settings, 0);
        pump(&mut host, &mut device, 0);
        assert!(host.handler().settings().contains_key("tltgain"));
        assert!(!host.handler().settings().contains_key("Hard"));
    }

    #[test]
    fn test_subscription_changes_coalesce() {
        let mut host = host();
        host.poll(0);
        host.receive(&[ACK], 0);
        host.transport_mut().clear_tx_buffer();

        host.set_data_item("tiltoff", true, 0);
        host.set_data_item("panoff", true, 100);
        host.set_data_item("tiltoff", false, 150);

        host.poll(150 + SUBSCRIPTION_DEBOUNCE_MS - 1);
        assert!(host.transport().tx_data().is_empty());

        host.poll(150 + SUBSCRIPTION_DEBOUNCE_MS);
        assert_eq!(
            sent_commands(&mut host),
            [Command::RequestData(alloc::vec![
                ("tiltoff".into(), false),
                ("panoff".into(), true),
            ])]
        );
    }

    #[test]
    fn test_disconnect_clears_everything() {
        let mut host = host();
        host.poll(0);
        host.request(RequestKind::Settings, 0);
        host.request(RequestKind::Features, 0);
        host.set_data_item("tiltoff", true, 0);
        assert!(host.link().has_backlog());

        host.transport_mut().set_connected(false);
        host.poll(10);

        assert!(host.link().is_idle());
        assert_eq!(host.link().queued(), 0);
        assert!(!host.tracker(RequestKind::Settings).is_pending());
        assert!(!host.tracker(RequestKind::Features).is_pending());
        assert_eq!(host.next_deadline(), None);
        assert!(!host.is_connected());
        assert_eq!(events(&mut host).last(), Some(&SessionEvent::Disconnected));
    }

    #[test]
    fn test_device_disconnect_stops_data() {
        let (mut host, mut device) = connected_pair();
        host.set_data_item("tiltoff", true, 0);
        host.poll(SUBSCRIPTION_DEBOUNCE_MS);
        pump(&mut host, &mut device, SUBSCRIPTION_DEBOUNCE_MS);

        device.transport_mut().set_connected(false);
        device.poll(300);
        assert!(device.handler().telemetry().subscribed.is_empty());
        assert_eq!(device.next_deadline(), None);
    }

    #[test]
    fn test_request_gives_up_once() {
        let mut host = host();
        host.poll(0);
        host.request(RequestKind::Settings, 0);

        // Device acknowledges every frame but never replies
        let mut now = 0;
        for _ in 0..=MAX_REQUEST_FAULTS {
            host.receive(&[ACK, ACK, ACK], now);
            now += REQUEST_TIMEOUT_MS;
            host.poll(now);
        }
        host.receive(&[ACK, ACK, ACK], now);

        let failures = events(&mut host)
            .into_iter()
            .filter(|e| *e == SessionEvent::ExchangeFailed(RequestKind::Settings))
            .count();
        assert_eq!(failures, 1);
        assert_eq!(
            host.tracker(RequestKind::Settings).faults(),
            MAX_REQUEST_FAULTS + 1
        );

        host.request(RequestKind::Settings, now);
        assert!(events(&mut host).is_empty());
    }

    #[test]
    fn test_busy_link_is_not_a_fault() {
        let mut host = host();
        host.poll(0);
        host.request(RequestKind::Settings, 0);
        host.send(&Command::ResetCenter, 0).unwrap();

        // Get is still unacknowledged and ResetCenter queued behind it
        host.poll(REQUEST_TIMEOUT_MS);
        assert_eq!(host.tracker(RequestKind::Settings).faults(), 0);
        assert!(host.tracker(RequestKind::Settings).is_pending());
    }

    #[test]
    fn test_nak_retransmits_verbatim() {
        let (mut host, mut device) = connected_pair();
        host.request(RequestKind::Features, 100);

        let mut frame = host.transport_mut().take_tx_data();
        let original = frame.clone();
        frame[4] ^= 0x20;
        device.receive(&frame, 100);
        assert_eq!(device.transport_mut().take_tx_data(), [NAK, b'\r', b'\n']);

        host.receive(&[NAK, b'\r', b'\n'], 110);
        assert!(host.transport().tx_data().is_empty());

        host.poll(110 + TX_FAULT_PAUSE_MS);
        assert_eq!(host.transport().tx_data(), original.as_slice());

        pump(&mut host, &mut device, 250);
        assert!(host.handler().features().is_some_and(|f| f.has("IMU")));
        assert_eq!(host.link().faults(), 0);
    }

    #[test]
    fn test_repeated_naks_fail_link_once() {
        let mut host = host();
        host.poll(0);
        host.send(&Command::GetSettings, 0).unwrap();
        let original = host.transport_mut().take_tx_data();
        assert!(!original.is_empty());

        let mut now = 0;
        for nak in 1..=MAX_TX_FAULTS + 2 {
            host.receive(&[NAK], now);
            now += TX_FAULT_PAUSE_MS;
            host.poll(now);

            let resent = host.transport_mut().take_tx_data();
            if nak < MAX_TX_FAULTS {
                assert_eq!(resent, original, "resend {} differs", nak);
            } else {
                assert!(resent.is_empty(), "resent after {} faults", nak);
            }
        }

        let failures: Vec<_> = events(&mut host)
            .into_iter()
            .filter(|e| matches!(e, SessionEvent::LinkFailure(_)))
            .collect();
        assert_eq!(
            failures,
            [SessionEvent::LinkFailure(LinkFailure::TooManyFaults(MAX_TX_FAULTS))]
        );
        assert_eq!(host.link().state(), crate::link::LinkState::Disconnected);
    }

    #[test]
    fn test_failed_link_lets_request_give_up() {
        let mut host = host();
        host.poll(0);
        host.request(RequestKind::Settings, 0);
        assert!(host.link().has_backlog());

        let mut now = 0;
        for _ in 0..MAX_TX_FAULTS {
            host.receive(&[NAK], now);
            now += TX_FAULT_PAUSE_MS;
            host.poll(now);
        }
        assert_eq!(host.link().state(), LinkState::Disconnected);

        for _ in 0..=MAX_REQUEST_FAULTS {
            now += REQUEST_TIMEOUT_MS;
            host.poll(now);
        }
        assert!(events(&mut host).contains(&SessionEvent::ExchangeFailed(RequestKind::Settings)));
        assert!(!host.tracker(RequestKind::Settings).is_pending());
    }

    #[test]
    fn test_null_field_still_delivers_live_data() {
        let (mut host, _device) = connected_pair();
        events(&mut host);

        let frame = crate::protocol::encode_data_frame(
            br#"{"tiltout":1500,"magx":null,"Cmd":"Data"}"#,
        )
        .unwrap();
        host.receive(&frame, 50);

        assert_eq!(host.handler().live().get("tiltout"), Some(&Value::Int(1500)));
        assert!(!host.handler().live().contains_key("magx"));
        assert!(matches!(events(&mut host).as_slice(), [SessionEvent::LiveData(_)]));
    }

    #[test]
    fn test_non_finite_sample_does_not_block_push() {
        let mut host = host();
        host.poll(0);
        host.transport_mut().clear_tx_buffer();

        let mut live = Body::new();
        live.insert("tiltout", 1500);
        live.insert("magx", f64::NAN);
        let frame = ResponseSerialiser::new()
            .serialise(&Command::Data(LiveData {
                values: live,
                arrays: Vec::new(),
            }))
            .unwrap();
        host.receive(&frame, 10);

        assert_eq!(host.handler().live().get("tiltout"), Some(&Value::Int(1500)));
    }

    #[test]
    fn test_keepalive_when_idle() {
        let mut host = host();
        host.poll(0);
        host.receive(&[ACK], 0);
        host.transport_mut().clear_tx_buffer();

        host.poll(999);
        assert!(host.transport().tx_data().is_empty());
        host.poll(1000);
        assert_eq!(sent_commands(&mut host), [Command::KeepAlive]);
    }

    #[test]
    fn test_unknown_command_acknowledged_and_ignored() {
        let mut device = device();
        device.poll(0);

        let mut body = Body::new();
        body.insert("Cmd", "Launch");
        let frame = crate::protocol::encode_data_frame(&body.to_json().unwrap()).unwrap();
        device.receive(&frame, 0);

        assert_eq!(device.transport().tx_data(), [ACK, b'\r', b'\n']);
        assert_eq!(events(&mut device), [SessionEvent::Connected]);
    }

    #[test]
    fn test_log_frames_become_events() {
        let mut host = host();
        host.receive(&encode_log_frame("<inf> Storing settings"), 0);
        assert_eq!(
            events(&mut host),
            [SessionEvent::Log("<inf> Storing settings".into())]
        );
    }

    #[test]
    fn test_device_answers_get_with_set() {
        let mut device = device();
        device.poll(0);
        let frame = ResponseSerialiser::new().serialise(&Command::GetSettings).unwrap();
        device.receive(&frame, 0);

        let tx = device.transport_mut().take_tx_data();
        assert_eq!(&tx[..3], [ACK, b'\r', b'\n']);
        let payload = crate::protocol::decode_data_frame(&tx[3..]).unwrap();
        assert!(matches!(
            CommandParser::new().parse(payload),
            Ok(Command::Settings(_))
        ));
    }
}
