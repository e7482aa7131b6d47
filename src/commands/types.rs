//! Command types for the JSON protocol
//!
//! # Protocol Format
//!
//! Every data frame carries one compact JSON object. The reserved key `Cmd`
//! names the command; the remaining keys are its arguments:
//!
//! ```text
//! {"tiltgain":5.0,"rllrev":false,"Cmd":"Set"}
//! ```
//!
//! # Commands
//!
//! | Wire name  | Command                                  |
//! |------------|------------------------------------------|
//! | `RstCnt`   | [`Command::ResetCenter`]                 |
//! | `Set`      | [`Command::Settings`]                    |
//! | `Flash`    | [`Command::SaveToFlash`]                 |
//! | `Erase`    | [`Command::EraseFlash`]                  |
//! | `Reboot`   | [`Command::Reboot`]                      |
//! | `Boot`     | [`Command::EnterBootloader`]             |
//! | `Get`      | [`Command::GetSettings`]                 |
//! | `IH`       | [`Command::KeepAlive`]                   |
//! | `DatLst`   | [`Command::GetDataList`]                 |
//! | `DataList` | [`Command::DataList`]                    |
//! | `D--`      | [`Command::StopAllData`]                 |
//! | `RD`       | [`Command::RequestData`]                 |
//! | `FW`       | [`Command::GetFirmware`] / [`Command::FirmwareInfo`] |
//! | `FE`       | [`Command::GetFeatures`] / [`Command::Features`]     |
//! | `Data`     | [`Command::Data`]                        |
//!
//! `FW` and `FE` share a name between request and reply; the reply is told
//! apart by its payload keys.

use crate::commands::body::Body;
use crate::commands::telemetry::TelemetryArray;
use alloc::string::String;
use alloc::vec::Vec;

/// Firmware version key of a `FW` reply
pub const KEY_VERSION: &str = "Vers";
/// Board name key of a `FW` reply
pub const KEY_HARDWARE: &str = "Hard";
/// Source revision key of a `FW` reply
pub const KEY_GIT: &str = "Git";
/// Feature list key of a `FE` reply
pub const KEY_FEATURES: &str = "FEAT";
/// Pin map key of a `FE` reply
pub const KEY_PINS: &str = "PINS";

/// Keys the device reports but never accepts back in `Set`
pub const READ_ONLY_KEYS: [&str; 3] = [KEY_HARDWARE, KEY_VERSION, KEY_GIT];

/// Wire names of the command set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandName {
    ResetCenter,
    Settings,
    SaveToFlash,
    EraseFlash,
    Reboot,
    EnterBootloader,
    GetSettings,
    KeepAlive,
    GetDataList,
    DataList,
    StopAllData,
    RequestData,
    Firmware,
    Features,
    Data,
}

impl CommandName {
    /// Look up a wire name
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "RstCnt" => Some(Self::ResetCenter),
            "Set" => Some(Self::Settings),
            "Flash" => Some(Self::SaveToFlash),
            "Erase" => Some(Self::EraseFlash),
            "Reboot" => Some(Self::Reboot),
            "Boot" => Some(Self::EnterBootloader),
            "Get" => Some(Self::GetSettings),
            "IH" => Some(Self::KeepAlive),
            "DatLst" => Some(Self::GetDataList),
            "DataList" => Some(Self::DataList),
            "D--" => Some(Self::StopAllData),
            "RD" => Some(Self::RequestData),
            "FW" => Some(Self::Firmware),
            "FE" => Some(Self::Features),
            "Data" => Some(Self::Data),
            _ => None,
        }
    }

    /// The `Cmd` value sent on the wire
    pub fn as_wire(self) -> &'static str {
        match self {
            Self::ResetCenter => "RstCnt",
            Self::Settings => "Set",
            Self::SaveToFlash => "Flash",
            Self::EraseFlash => "Erase",
            Self::Reboot => "Reboot",
            Self::EnterBootloader => "Boot",
            Self::GetSettings => "Get",
            Self::KeepAlive => "IH",
            Self::GetDataList => "DatLst",
            Self::DataList => "DataList",
            Self::StopAllData => "D--",
            Self::RequestData => "RD",
            Self::Firmware => "FW",
            Self::Features => "FE",
            Self::Data => "Data",
        }
    }
}

/// Firmware identification sent in a `FW` reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FirmwareInfo {
    pub version: String,
    pub hardware: String,
    pub git: String,
}

/// Board capabilities sent in a `FE` reply
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoardFeatures {
    /// Feature names the board supports
    pub features: Vec<String>,
    /// Pin assignments, name to pin description
    pub pins: Body,
}

impl BoardFeatures {
    pub fn has(&self, feature: &str) -> bool {
        self.features.iter().any(|f| f == feature)
    }
}

/// One live data push
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LiveData {
    /// Scalar values, arrays expanded to `name[i]` on receipt
    pub values: Body,
    /// Typed arrays carried by the push
    pub arrays: Vec<TelemetryArray>,
}

impl LiveData {
    pub fn is_empty(&self) -> bool {
        self.values.is_empty() && self.arrays.is_empty()
    }
}

/// Parsed command with associated data
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Re-zero the tracker orientation
    ResetCenter,

    /// Settings body: host to device applies, device to host replies to `Get`
    Settings(Body),

    /// Persist the applied settings
    SaveToFlash,

    /// Erase persisted settings
    EraseFlash,

    /// Cold restart
    Reboot,

    /// Restart into the bootloader
    EnterBootloader,

    /// Ask the device for its settings
    GetSettings,

    /// Heartbeat, no reply
    KeepAlive,

    /// Ask for every data item the device can stream
    GetDataList,

    /// Available data items
    DataList(Body),

    /// Unsubscribe every data item
    StopAllData,

    /// Per-item subscription changes, in body order
    RequestData(Vec<(String, bool)>),

    /// Ask for firmware identification
    GetFirmware,

    /// Firmware identification reply
    FirmwareInfo(FirmwareInfo),

    /// Ask for board features
    GetFeatures,

    /// Board features reply
    Features(BoardFeatures),

    /// Live data push
    Data(LiveData),
}

impl Command {
    /// Get the wire name for this command
    pub fn name(&self) -> CommandName {
        match self {
            Command::ResetCenter => CommandName::ResetCenter,
            Command::Settings(_) => CommandName::Settings,
            Command::SaveToFlash => CommandName::SaveToFlash,
            Command::EraseFlash => CommandName::EraseFlash,
            Command::Reboot => CommandName::Reboot,
            Command::EnterBootloader => CommandName::EnterBootloader,
            Command::GetSettings => CommandName::GetSettings,
            Command::KeepAlive => CommandName::KeepAlive,
            Command::GetDataList => CommandName::GetDataList,
            Command::DataList(_) => CommandName::DataList,
            Command::StopAllData => CommandName::StopAllData,
            Command::RequestData(_) => CommandName::RequestData,
            Command::GetFirmware | Command::FirmwareInfo(_) => CommandName::Firmware,
            Command::GetFeatures | Command::Features(_) => CommandName::Features,
            Command::Data(_) => CommandName::Data,
        }
    }
}
