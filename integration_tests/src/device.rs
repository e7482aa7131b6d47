//! Device communication client.
//!
//! Runs a host [`Session`] over a real serial port. Every wait is a loop of
//! short port reads followed by `Session::poll`, so retries, keepalives and
//! ACK timeouts behave as they do in the desktop application.

use std::io::{Read, Write};
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use headtracker_link::commands::{Body, BoardFeatures, Command, FirmwareInfo};
use headtracker_link::dispatcher::HostHandler;
use headtracker_link::link::{Millis, RequestKind};
use headtracker_link::transport::{Transport, TransportError};
use headtracker_link::{Session, SessionConfig, SessionEvent};
use serialport::SerialPort;

/// Read timeout of a single poll step
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Default time allowed for a reply
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Serial port as a session transport
pub struct PortTransport {
    port: Box<dyn SerialPort>,
}

impl Transport for PortTransport {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        self.port
            .write_all(data)
            .and_then(|()| self.port.flush())
            .map_err(|e| {
                log::warn!("serial write failed: {}", e);
                TransportError::Disconnected
            })
    }

    fn is_connected(&self) -> bool {
        true
    }

    fn backlog(&self) -> usize {
        self.port.bytes_to_write().unwrap_or(0) as usize
    }
}

/// Find ports that answer a firmware request.
pub fn find_data_ports(baud_rate: u32) -> Result<Vec<String>> {
    let ports = serialport::available_ports()?;
    let mut data_ports = Vec::new();

    for port_info in ports {
        // Filter to CDC-ACM style devices
        if !port_info.port_name.contains("ttyACM") && !port_info.port_name.contains("ttyUSB") {
            continue;
        }

        if let Ok(mut client) = DeviceClient::new(&port_info.port_name, baud_rate) {
            client.set_timeout(Duration::from_millis(1500));
            if client.connect().is_ok() {
                data_ports.push(port_info.port_name.clone());
            }
        }
    }

    Ok(data_ports)
}

/// Resolve a port argument - returns the port path if not "auto", otherwise auto-detects.
pub fn resolve_port(port_arg: &str, baud_rate: u32) -> Result<String> {
    if port_arg != "auto" {
        return Ok(port_arg.to_string());
    }
    match find_data_ports(baud_rate)?.into_iter().next() {
        Some(port) => Ok(port),
        None => bail!("No tracker found - ensure device is connected"),
    }
}

/// Client for communicating with the head tracker.
pub struct DeviceClient {
    session: Session<PortTransport, HostHandler>,
    started: Instant,
    timeout: Duration,
}

impl DeviceClient {
    /// Open the port; the session connects on the first poll.
    pub fn new(port_name: &str, baud_rate: u32) -> Result<Self> {
        let port = serialport::new(port_name, baud_rate)
            .timeout(POLL_INTERVAL)
            .open()?;

        Ok(Self {
            session: Session::new(PortTransport { port }, HostHandler::new(), SessionConfig::host()),
            started: Instant::now(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the reply timeout.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Clear any pending data in the serial buffer.
    pub fn clear_buffer(&mut self) -> Result<()> {
        self.port().clear(serialport::ClearBuffer::All)?;
        Ok(())
    }

    pub fn handler(&self) -> &HostHandler {
        self.session.handler()
    }

    fn port(&mut self) -> &mut Box<dyn SerialPort> {
        &mut self.session.transport_mut().port
    }

    fn now(&self) -> Millis {
        self.started.elapsed().as_millis() as Millis
    }

    /// One read/poll step; returns the events it produced.
    fn step(&mut self) -> Result<Vec<SessionEvent>> {
        let mut buf = [0u8; 256];
        let received = match self.port().read(&mut buf) {
            Ok(n) => n,
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => 0,
            Err(e) => return Err(e.into()),
        };

        let now = self.now();
        self.session.receive(&buf[..received], now);
        self.session.poll(now);

        let mut events = Vec::new();
        while let Some(event) = self.session.poll_event() {
            if let SessionEvent::Log(text) = &event {
                log::info!("device: {}", text);
            }
            events.push(event);
        }
        Ok(events)
    }

    /// Poll until `matches` picks an event or the timeout passes.
    pub fn run_until<T>(&mut self, mut matches: impl FnMut(&SessionEvent) -> Option<T>) -> Result<T> {
        let start = Instant::now();
        while start.elapsed() < self.timeout {
            for event in self.step()? {
                if let SessionEvent::LinkFailure(failure) = &event {
                    // Start the next test from a clean link
                    self.session.reset();
                    bail!("link failure: {}", failure);
                }
                if let Some(found) = matches(&event) {
                    return Ok(found);
                }
            }
        }
        bail!("Timeout after {:?}", self.timeout)
    }

    /// Keep the session running for a while, collecting events.
    pub fn run_for(&mut self, duration: Duration) -> Result<Vec<SessionEvent>> {
        let start = Instant::now();
        let mut events = Vec::new();
        while start.elapsed() < duration {
            events.extend(self.step()?);
        }
        Ok(events)
    }

    /// Attach and wait for the firmware identification.
    pub fn connect(&mut self) -> Result<FirmwareInfo> {
        if let Some(info) = self.handler().firmware() {
            return Ok(info.clone());
        }
        self.run_until(|event| match event {
            SessionEvent::BoardDiscovered(info) => Some(info.clone()),
            _ => None,
        })
    }

    /// Run a tracked exchange to completion.
    pub fn exchange(&mut self, kind: RequestKind) -> Result<()> {
        let now = self.now();
        self.session.request(kind, now);
        self.run_until(|event| match event {
            SessionEvent::ExchangeComplete(k) if *k == kind => Some(Ok(())),
            SessionEvent::ExchangeFailed(k) if *k == kind => Some(Err(kind)),
            _ => None,
        })?
        .map_err(|kind| anyhow::anyhow!("{:?} exchange failed", kind))
    }

    pub fn fetch_settings(&mut self) -> Result<Body> {
        self.exchange(RequestKind::Settings)?;
        Ok(self.handler().settings().clone())
    }

    pub fn fetch_features(&mut self) -> Result<BoardFeatures> {
        self.exchange(RequestKind::Features)?;
        match self.handler().features() {
            Some(features) => Ok(features.clone()),
            None => bail!("features reply not recorded"),
        }
    }

    /// Send a command that has no reply.
    pub fn send(&mut self, command: &Command) -> Result<()> {
        let now = self.now();
        self.session.send(command, now)?;
        Ok(())
    }

    pub fn data_list(&mut self) -> Result<Body> {
        self.send(&Command::GetDataList)?;
        self.run_until(|event| match event {
            SessionEvent::DataList(items) => Some(items.clone()),
            _ => None,
        })
    }

    /// Change a data item subscription; goes out after the debounce window.
    pub fn set_data_item(&mut self, item: &str, enabled: bool) {
        let now = self.now();
        self.session.set_data_item(item, enabled, now);
    }

    /// Write raw bytes around the session and collect whatever comes back.
    pub fn send_raw(&mut self, bytes: &[u8], listen: Duration) -> Result<Vec<u8>> {
        let port = self.port();
        port.write_all(bytes)?;
        port.flush()?;

        let start = Instant::now();
        let mut reply = Vec::new();
        let mut buf = [0u8; 256];
        while start.elapsed() < listen {
            match self.port().read(&mut buf) {
                Ok(n) => reply.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(reply)
    }
}
