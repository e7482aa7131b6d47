//! Frame accumulator for the serial byte stream
//!
//! Rebuilds data frames, log frames and ACK/NAK control bytes from bytes
//! arriving in arbitrary chunks.

use crate::config::protocol::{ACK, DATA_START, FRAME_END, LOG_START, NAK, RX_BUFFER_SIZE};
use crate::protocol::frame::{decode_log_frame, split_checksum, FrameError};
use alloc::string::String;
use heapless::Vec;

/// Verified data frame payload
pub type RxPayload = Vec<u8, RX_BUFFER_SIZE>;

/// Something recognised in the byte stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// A data frame ended; its payload if the checksum matched
    Data(Result<RxPayload, FrameError>),
    /// A log frame ended
    Log(String),
    /// Peer accepted our frame
    Ack,
    /// Peer rejected our frame
    Nak,
    /// Frame exceeded the accumulation buffer and was discarded
    Overflow,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Idle,
    Data,
    Log,
}

/// Accumulates incoming bytes and extracts complete frames.
///
/// A data start marker always discards whatever was being accumulated. ACK
/// and NAK are reported wherever they appear since neither can occur raw
/// inside a valid frame. Bytes outside a frame (line endings, noise) are
/// ignored.
pub struct FrameAccumulator {
    buffer: Vec<u8, RX_BUFFER_SIZE>,
    mode: Mode,
}

impl FrameAccumulator {
    /// Create a new empty frame accumulator.
    pub fn new() -> Self {
        Self {
            buffer: Vec::new(),
            mode: Mode::Idle,
        }
    }

    /// Push a byte into the accumulator.
    ///
    /// Returns `Some(event)` when a frame ends or a control byte is seen.
    pub fn push(&mut self, byte: u8) -> Option<StreamEvent> {
        match byte {
            ACK => return Some(StreamEvent::Ack),
            NAK => return Some(StreamEvent::Nak),
            DATA_START => {
                if !self.buffer.is_empty() {
                    log::debug!("discarding {} byte partial frame", self.buffer.len());
                }
                self.start(Mode::Data);
                return None;
            }
            LOG_START if self.mode != Mode::Data => {
                self.start(Mode::Log);
                return None;
            }
            FRAME_END => return self.finish(),
            _ => {}
        }

        if self.mode == Mode::Idle {
            return None;
        }

        if self.buffer.push(byte).is_err() {
            // Buffer overflow - reset and drop this frame
            self.reset();
            return Some(StreamEvent::Overflow);
        }

        None
    }

    /// Push a chunk of bytes, handing every event to `on_event`.
    pub fn push_slice(&mut self, bytes: &[u8], mut on_event: impl FnMut(StreamEvent)) {
        for &byte in bytes {
            if let Some(event) = self.push(byte) {
                on_event(event);
            }
        }
    }

    fn start(&mut self, mode: Mode) {
        self.buffer.clear();
        self.mode = mode;
    }

    fn finish(&mut self) -> Option<StreamEvent> {
        let mode = core::mem::replace(&mut self.mode, Mode::Idle);
        let mut frame = core::mem::take(&mut self.buffer);

        match mode {
            Mode::Idle => None,
            Mode::Log => Some(StreamEvent::Log(decode_log_frame(&frame))),
            Mode::Data => {
                let verified = split_checksum(&frame).map(|payload| payload.len());
                Some(StreamEvent::Data(verified.map(|len| {
                    frame.truncate(len);
                    frame
                })))
            }
        }
    }

    /// Reset the accumulator, discarding any partial frame.
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.mode = Mode::Idle;
    }

    /// Returns true if no partial frame is in progress.
    pub fn is_empty(&self) -> bool {
        self.mode == Mode::Idle
    }

    /// Returns the current number of bytes in the buffer.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }
}

impl Default for FrameAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
