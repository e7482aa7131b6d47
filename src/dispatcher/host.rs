//! Host-side command handling
//!
//! Keeps the latest state reported by the device and turns every reply into
//! a [`SessionEvent`] for the application.

use crate::commands::{Body, BoardFeatures, Command, FirmwareInfo};
use crate::dispatcher::handler::{Context, Handler};
use crate::session::SessionEvent;

/// What the host knows about the attached device
#[derive(Debug, Default)]
pub struct HostHandler {
    firmware: Option<FirmwareInfo>,
    features: Option<BoardFeatures>,
    settings: Body,
    live: Body,
    data_list: Body,
}

impl HostHandler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Firmware identification, once the board answered `FW`
    pub fn firmware(&self) -> Option<&FirmwareInfo> {
        self.firmware.as_ref()
    }

    pub fn features(&self) -> Option<&BoardFeatures> {
        self.features.as_ref()
    }

    /// Last settings received from the device
    pub fn settings(&self) -> &Body {
        &self.settings
    }

    /// Latest value of every live data item seen so far
    pub fn live(&self) -> &Body {
        &self.live
    }

    pub fn data_list(&self) -> &Body {
        &self.data_list
    }
}

impl Handler for HostHandler {
    fn handle(&mut self, command: Command, ctx: &mut Context<'_>) {
        match command {
            Command::FirmwareInfo(info) => {
                log::info!("board {} firmware {} ({})", info.hardware, info.version, info.git);
                self.firmware = Some(info.clone());
                ctx.emit(SessionEvent::BoardDiscovered(info));
            }
            Command::Settings(settings) => {
                self.settings = settings.clone();
                ctx.emit(SessionEvent::Settings(settings));
            }
            Command::Features(features) => {
                self.features = Some(features.clone());
                ctx.emit(SessionEvent::Features(features));
            }
            Command::Data(live) => {
                self.live.merge(live.values.clone());
                ctx.emit(SessionEvent::LiveData(live));
            }
            Command::DataList(items) => {
                self.data_list = items.clone();
                ctx.emit(SessionEvent::DataList(items));
            }
            other => log::debug!("ignoring {} from device", other.name().as_wire()),
        }
    }

    fn on_connect(&mut self, ctx: &mut Context<'_>) {
        ctx.reply(&Command::GetFirmware);
    }

    fn on_disconnect(&mut self) {
        self.firmware = None;
        self.features = None;
        self.live = Body::new();
    }
}
