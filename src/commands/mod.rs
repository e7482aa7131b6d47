pub mod body;
pub mod parser;
pub mod serialiser;
pub mod telemetry;
pub mod types;

pub use body::{Body, Value};
pub use parser::{CommandError, CommandParser};
pub use serialiser::ResponseSerialiser;
pub use telemetry::{ArrayKind, ArrayValues, TelemetryArray, TelemetryError};
pub use types::{BoardFeatures, Command, CommandName, FirmwareInfo, LiveData};
