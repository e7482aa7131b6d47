//! Command serialiser
//!
//! Turns typed commands into bodies, compact JSON and finally data frames.

use crate::commands::body::{Body, Value};
use crate::commands::parser::CommandError;
use crate::commands::telemetry::encode_arrays;
use crate::commands::types::{
    Command, KEY_FEATURES, KEY_GIT, KEY_HARDWARE, KEY_PINS, KEY_VERSION, READ_ONLY_KEYS,
};
use crate::config::protocol::COMMAND_KEY;
use crate::protocol::{encode_data_frame, FrameBuf};
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

/// Serialiser for outgoing commands
pub struct ResponseSerialiser;

impl ResponseSerialiser {
    /// Create a new serialiser
    pub fn new() -> Self {
        Self
    }

    /// Serialise a command to a complete data frame
    pub fn serialise(&self, command: &Command) -> Result<FrameBuf, CommandError> {
        let payload = self.to_json(command)?;
        Ok(encode_data_frame(&payload)?)
    }

    /// Compact JSON payload of a command
    pub fn to_json(&self, command: &Command) -> Result<Vec<u8>, CommandError> {
        self.to_body(command)
            .to_json()
            .map_err(|e| CommandError::Malformed(format!("{}", e)))
    }

    /// Build the body of a command with `Cmd` as its last key
    pub fn to_body(&self, command: &Command) -> Body {
        let mut body = match command {
            Command::Settings(settings) => {
                let mut body = settings.clone();
                for key in READ_ONLY_KEYS {
                    body.remove(key);
                }
                body
            }
            Command::DataList(items) => items.clone(),
            Command::RequestData(items) => items
                .iter()
                .map(|(item, enabled)| (item.clone(), *enabled))
                .collect(),
            Command::FirmwareInfo(info) => [
                (KEY_VERSION, &info.version),
                (KEY_HARDWARE, &info.hardware),
                (KEY_GIT, &info.git),
            ]
            .into_iter()
            .map(|(key, text)| (key, text.clone()))
            .collect(),
            Command::Features(features) => {
                let list = features.features.iter().cloned().map(Value::Text).collect();
                let mut body = Body::new();
                body.insert(KEY_FEATURES, Value::List(list));
                body.insert(KEY_PINS, features.pins.clone());
                body
            }
            Command::Data(live) => {
                // Parsed pushes hold each array twice; it goes out packed only
                let expanded: Vec<String> = live
                    .arrays
                    .iter()
                    .flat_map(|array| array.expand())
                    .map(|(key, _)| key)
                    .collect();
                let mut body: Body = live
                    .values
                    .iter()
                    .filter(|(key, _)| !expanded.iter().any(|e| e == key))
                    .map(|(key, value)| (key, value.clone()))
                    .collect();
                encode_arrays(&mut body, &live.arrays);
                body
            }
            _ => Body::new(),
        };

        body.remove(COMMAND_KEY);
        body.insert(COMMAND_KEY, command.name().as_wire());
        body
    }
}

impl Default for ResponseSerialiser {
    fn default() -> Self {
        Self::new()
    }
}
