//! Log output as log frames.
//!
//! Implements the `log` facade for the device: every record becomes one log
//! frame in the serial transmit queue, so the host can show it without
//! mistaking it for protocol data. Output is non-blocking and is dropped if
//! the queue is full or no host is attached.

use core::fmt::Write;

use heapless::String;
use log::{LevelFilter, Log, Metadata, Record, SetLoggerError};

use crate::protocol::encode_log_frame;
use crate::tasks::serial::{is_connected, push_tx};

/// Maximum length of a single log message
const MAX_LOG_MSG_LEN: usize = 256;

struct FrameLogger;

static LOGGER: FrameLogger = FrameLogger;

/// Install the log frame backend.
///
/// Must be called once during startup before anything logs.
pub fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
    log::set_logger(&LOGGER)?;
    log::set_max_level(level);
    Ok(())
}

/// Short level tag shown by the host
fn level_tag(level: log::Level) -> &'static str {
    match level {
        log::Level::Error => "err",
        log::Level::Warn => "wrn",
        log::Level::Info => "inf",
        log::Level::Debug | log::Level::Trace => "dbg",
    }
}

impl Log for FrameLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) || !is_connected() {
            return;
        }

        // Truncates if the message is too long
        let mut text: String<MAX_LOG_MSG_LEN> = String::new();
        let _ = write!(
            text,
            "<{}> {}: {}",
            level_tag(record.level()),
            record.target(),
            record.args()
        );

        let _ = push_tx(&encode_log_frame(&text));
    }

    fn flush(&self) {}
}
