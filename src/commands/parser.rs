//! Command parser for verified frame payloads
//!
//! Parses JSON bodies into typed [`Command`]s.

use crate::commands::body::{Body, Value};
use crate::commands::telemetry::decode_arrays;
use crate::commands::types::{
    BoardFeatures, Command, CommandName, FirmwareInfo, LiveData, KEY_FEATURES, KEY_GIT,
    KEY_HARDWARE, KEY_PINS, KEY_VERSION,
};
use crate::config::protocol::COMMAND_KEY;
use crate::protocol::FrameError;
use alloc::format;
use alloc::string::{String, ToString};
use alloc::vec::Vec;

/// Errors turning a payload into a command, or a command into a frame
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// Payload is not a JSON object of supported values
    #[error("malformed body: {0}")]
    Malformed(String),

    /// Body has no `Cmd` key
    #[error("body has no command")]
    MissingCommand,

    /// `Cmd` is present but not text
    #[error("command name is not a string")]
    InvalidCommand,

    /// `Cmd` names no known command
    #[error("unknown command {0:?}")]
    UnknownCommand(String),

    /// Encoded command does not fit a frame
    #[error(transparent)]
    Frame(#[from] FrameError),
}

/// Parser for JSON protocol commands
pub struct CommandParser;

impl CommandParser {
    /// Create a new command parser
    pub fn new() -> Self {
        Self
    }

    /// Parse a verified payload into a command
    pub fn parse(&self, payload: &[u8]) -> Result<Command, CommandError> {
        let body =
            Body::from_json(payload).map_err(|e| CommandError::Malformed(format!("{}", e)))?;
        self.parse_body(body)
    }

    /// Turn a decoded body into a command.
    ///
    /// The `Cmd` key is removed; everything else is the command's argument.
    pub fn parse_body(&self, mut body: Body) -> Result<Command, CommandError> {
        let name = match body.remove(COMMAND_KEY) {
            None => return Err(CommandError::MissingCommand),
            Some(Value::Text(name)) => name,
            Some(_) => return Err(CommandError::InvalidCommand),
        };

        let name = CommandName::from_wire(&name).ok_or(CommandError::UnknownCommand(name))?;

        let command = match name {
            CommandName::ResetCenter => Command::ResetCenter,
            CommandName::Settings => Command::Settings(body),
            CommandName::SaveToFlash => Command::SaveToFlash,
            CommandName::EraseFlash => Command::EraseFlash,
            CommandName::Reboot => Command::Reboot,
            CommandName::EnterBootloader => Command::EnterBootloader,
            CommandName::GetSettings => Command::GetSettings,
            CommandName::KeepAlive => Command::KeepAlive,
            CommandName::GetDataList => Command::GetDataList,
            CommandName::DataList => Command::DataList(body),
            CommandName::StopAllData => Command::StopAllData,
            CommandName::RequestData => Command::RequestData(Self::parse_subscriptions(body)),
            CommandName::Firmware => Self::parse_firmware(body),
            CommandName::Features => Self::parse_features(body),
            CommandName::Data => {
                let (values, arrays) = decode_arrays(&body);
                Command::Data(LiveData { values, arrays })
            }
        };

        Ok(command)
    }

    fn parse_subscriptions(body: Body) -> Vec<(String, bool)> {
        body.into_iter()
            .map(|(item, value)| {
                let enabled = value.as_bool().unwrap_or_else(|| {
                    log::warn!("data item {} has non-boolean state, disabling", item);
                    false
                });
                (item, enabled)
            })
            .collect()
    }

    fn parse_firmware(body: Body) -> Command {
        let is_reply = [KEY_VERSION, KEY_HARDWARE, KEY_GIT]
            .iter()
            .any(|key| body.contains_key(key));
        if !is_reply {
            return Command::GetFirmware;
        }

        let text = |key: &str| body.get(key).map(value_text).unwrap_or_default();
        Command::FirmwareInfo(FirmwareInfo {
            version: text(KEY_VERSION),
            hardware: text(KEY_HARDWARE),
            git: text(KEY_GIT),
        })
    }

    fn parse_features(mut body: Body) -> Command {
        let features = match body.remove(KEY_FEATURES) {
            None => return Command::GetFeatures,
            Some(Value::List(items)) => items.iter().map(value_text).collect(),
            Some(other) => {
                log::warn!("feature list is not an array");
                alloc::vec![value_text(&other)]
            }
        };

        let pins = match body.remove(KEY_PINS) {
            Some(Value::Object(pins)) => pins,
            _ => Body::new(),
        };

        Command::Features(BoardFeatures { features, pins })
    }
}

impl Default for CommandParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Text form of a value the way a loose reader would coerce it
fn value_text(value: &Value) -> String {
    match value {
        Value::Text(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Int(int) => int.to_string(),
        Value::Float(float) => float.to_string(),
        Value::List(_) | Value::Object(_) => String::new(),
    }
}
