//! Device-side command handling
//!
//! The tracker firmware owns the settings, sensors and board. This handler
//! only routes commands to them through three collaborator traits, so the
//! same code runs on hardware and against mocks.

use crate::commands::{Body, BoardFeatures, Command, FirmwareInfo, LiveData};
use crate::config::telemetry::DATA_PERIOD_MS;
use crate::dispatcher::handler::{Context, Handler};
use crate::link::Millis;
use alloc::string::String;

/// Errors reported by settings storage
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StorageError {
    /// A setting was rejected
    #[error("invalid setting {0:?}")]
    Invalid(String),
    /// Flash could not be read or written
    #[error("storage unavailable")]
    Unavailable,
}

/// Tracker settings and their persistent copy
pub trait SettingsStore {
    /// Current settings
    fn load(&self) -> Body;

    /// Apply received settings; unknown keys are ignored
    fn apply(&mut self, settings: &Body) -> Result<(), StorageError>;

    /// Write the applied settings to flash
    fn persist(&mut self) -> Result<(), StorageError>;

    /// Erase the flash copy
    fn erase(&mut self) -> Result<(), StorageError>;
}

/// Live data items the host can subscribe to
pub trait TelemetrySource {
    /// Every item the device can stream, name to description
    fn data_list(&self) -> Body;

    /// Enable or disable one item
    fn subscribe(&mut self, item: &str, enabled: bool);

    /// Disable every item
    fn stop_all(&mut self);

    /// Current values of the subscribed items
    fn sample(&mut self) -> LiveData;
}

/// Board level actions and identification
pub trait BoardControl {
    fn reset_center(&mut self);
    fn reboot(&mut self);
    fn enter_bootloader(&mut self);
    fn firmware(&self) -> FirmwareInfo;
    fn features(&self) -> BoardFeatures;
}

/// Handles host commands on the device
pub struct DeviceHandler<S, T, B> {
    settings: S,
    telemetry: T,
    board: B,
}

impl<S, T, B> DeviceHandler<S, T, B>
where
    S: SettingsStore,
    T: TelemetrySource,
    B: BoardControl,
{
    pub fn new(settings: S, telemetry: T, board: B) -> Self {
        Self {
            settings,
            telemetry,
            board,
        }
    }

    pub fn settings(&self) -> &S {
        &self.settings
    }

    pub fn telemetry(&self) -> &T {
        &self.telemetry
    }

    pub fn board(&self) -> &B {
        &self.board
    }
}

impl<S, T, B> Handler for DeviceHandler<S, T, B>
where
    S: SettingsStore,
    T: TelemetrySource,
    B: BoardControl,
{
    fn handle(&mut self, command: Command, ctx: &mut Context<'_>) {
        match command {
            Command::ResetCenter => {
                log::info!("Resetting center");
                self.board.reset_center();
            }
            Command::Settings(body) => {
                log::info!("Storing settings");
                if let Err(e) = self.settings.apply(&body) {
                    log::error!("settings not applied: {}", e);
                }
            }
            Command::SaveToFlash => {
                log::info!("Saving to flash");
                if let Err(e) = self.settings.persist() {
                    log::error!("save failed: {}", e);
                }
            }
            Command::EraseFlash => {
                log::info!("Clearing flash");
                if let Err(e) = self.settings.erase() {
                    log::error!("erase failed: {}", e);
                }
            }
            Command::Reboot => self.board.reboot(),
            Command::EnterBootloader => self.board.enter_bootloader(),
            Command::GetSettings => {
                log::info!("Sending settings");
                ctx.reply(&Command::Settings(self.settings.load()));
            }
            Command::KeepAlive => {}
            Command::GetDataList => ctx.reply(&Command::DataList(self.telemetry.data_list())),
            Command::StopAllData => {
                log::info!("Clearing data list");
                self.telemetry.stop_all();
            }
            Command::RequestData(items) => {
                log::info!("Data added/removed");
                for (item, enabled) in items {
                    self.telemetry.subscribe(&item, enabled);
                }
            }
            Command::GetFirmware => ctx.reply(&Command::FirmwareInfo(self.board.firmware())),
            Command::GetFeatures => ctx.reply(&Command::Features(self.board.features())),
            Command::DataList(_)
            | Command::FirmwareInfo(_)
            | Command::Features(_)
            | Command::Data(_) => {
                log::debug!("ignoring {} from host", command.name().as_wire());
            }
        }
    }

    fn on_disconnect(&mut self) {
        self.telemetry.stop_all();
    }

    fn poll_interval(&self) -> Option<Millis> {
        Some(DATA_PERIOD_MS)
    }

    fn poll(&mut self, ctx: &mut Context<'_>) {
        let sample = self.telemetry.sample();
        if !sample.is_empty() {
            ctx.reply(&Command::Data(sample));
        }
    }
}
