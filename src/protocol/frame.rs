//! Data and log frame encoding
//!
//! # Data frame
//!
//! ```text
//! [0x02][payload...][crc_hi][crc_lo][0x03][\r][\n]
//! ```
//!
//! The payload is a compact JSON body and is sent verbatim. The checksum is
//! computed over the payload only and escaped with [`escape_checksum`], high
//! byte first.
//!
//! # Log frame
//!
//! ```text
//! [0x01][escaped text...][0x03][\r][\n]
//! ```
//!
//! Control bytes in the text are replaced by `0x1B, byte ^ 0xFF`. Log frames
//! carry no checksum and are never acknowledged.
//!
//! [`escape_checksum`]: crate::protocol::crc::escape_checksum

use crate::config::protocol::{
    CHECKSUM_LEN, DATA_START, ESCAPE_FLIP, FRAME_END, LINE_END, LOG_ESCAPE, LOG_RESERVED,
    LOG_START, TX_BUFFER_SIZE,
};
use crate::protocol::crc::frame_checksum;
use alloc::string::String;
use alloc::vec::Vec;
use heapless::Vec as BoundedVec;

/// An encoded frame ready for the transport
pub type FrameBuf = BoundedVec<u8, TX_BUFFER_SIZE>;

/// Bytes a data frame adds around its payload
pub const DATA_FRAME_OVERHEAD: usize = 1 + CHECKSUM_LEN + 1 + LINE_END.len();

/// Errors raised while encoding or decoding frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    /// Encoded frame does not fit the transmit buffer
    #[error("frame too long ({len} bytes, max {max})")]
    TooLong { len: usize, max: usize },

    /// Frame content shorter than its checksum
    #[error("frame truncated")]
    Truncated,

    /// Leading or trailing marker missing
    #[error("frame delimiter missing")]
    MissingDelimiter,

    /// Received checksum differs from the recomputed one
    #[error("checksum mismatch (expected {expected:#06x}, received {received:#06x})")]
    ChecksumMismatch { expected: u16, received: u16 },
}

/// Encode a payload as a checksummed data frame.
pub fn encode_data_frame(payload: &[u8]) -> Result<FrameBuf, FrameError> {
    let len = payload.len() + DATA_FRAME_OVERHEAD;
    if len > TX_BUFFER_SIZE {
        return Err(FrameError::TooLong {
            len,
            max: TX_BUFFER_SIZE,
        });
    }

    let crc = frame_checksum(payload);
    let mut frame = FrameBuf::new();
    // Length checked above, none of these pushes can fail
    let _ = frame.push(DATA_START);
    let _ = frame.extend_from_slice(payload);
    let _ = frame.extend_from_slice(&crc.to_be_bytes());
    let _ = frame.push(FRAME_END);
    let _ = frame.extend_from_slice(LINE_END);
    Ok(frame)
}

/// Decode a complete data frame as written by [`encode_data_frame`].
///
/// The trailing line ending is optional. Returns the verified payload.
pub fn decode_data_frame(frame: &[u8]) -> Result<&[u8], FrameError> {
    let frame = trim_line_end(frame);
    match frame {
        [DATA_START, inner @ .., FRAME_END] => split_checksum(inner),
        _ => Err(FrameError::MissingDelimiter),
    }
}

/// Verify the trailing checksum of the bytes between the frame markers.
///
/// Returns the payload with the checksum stripped.
pub fn split_checksum(inner: &[u8]) -> Result<&[u8], FrameError> {
    if inner.len() < CHECKSUM_LEN {
        return Err(FrameError::Truncated);
    }

    let (payload, crc) = inner.split_at(inner.len() - CHECKSUM_LEN);
    let received = u16::from_be_bytes([crc[0], crc[1]]);
    let expected = frame_checksum(payload);
    if expected != received {
        return Err(FrameError::ChecksumMismatch { expected, received });
    }

    Ok(payload)
}

/// Encode diagnostic text as a log frame.
pub fn encode_log_frame(text: &str) -> Vec<u8> {
    let mut frame = Vec::with_capacity(text.len() + 4);
    frame.push(LOG_START);
    escape_log_into(text.as_bytes(), &mut frame);
    frame.push(FRAME_END);
    frame.extend_from_slice(LINE_END);
    frame
}

/// Escape log text bytes into `out` without markers.
pub fn escape_log_into(text: &[u8], out: &mut Vec<u8>) {
    for &byte in text {
        if LOG_RESERVED.contains(&byte) {
            out.push(LOG_ESCAPE);
            out.push(byte ^ ESCAPE_FLIP);
        } else {
            out.push(byte);
        }
    }
}

/// Reverse the log escaping of the bytes between the log markers.
///
/// A lone escape byte at the end is dropped. Invalid UTF-8 is replaced
/// rather than rejected since the log channel is best effort.
pub fn decode_log_frame(escaped: &[u8]) -> String {
    let mut raw = Vec::with_capacity(escaped.len());
    let mut bytes = escaped.iter();
    while let Some(&byte) = bytes.next() {
        if byte == LOG_ESCAPE {
            if let Some(&next) = bytes.next() {
                raw.push(next ^ ESCAPE_FLIP);
            }
        } else {
            raw.push(byte);
        }
    }
    String::from_utf8_lossy(&raw).into_owned()
}

fn trim_line_end(mut frame: &[u8]) -> &[u8] {
    while let [rest @ .., b'\r' | b'\n'] = frame {
        frame = rest;
    }
    frame
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_frame_layout() {
        let payload = br#"{"Cmd":"Get"}"#;
        let frame = encode_data_frame(payload).expect("Should encode");

        assert_eq!(frame[0], DATA_START);
        assert_eq!(&frame[1..1 + payload.len()], payload);
        let crc = frame_checksum(payload).to_be_bytes();
        assert_eq!(&frame[1 + payload.len()..3 + payload.len()], &crc);
        assert_eq!(&frame[frame.len() - 3..], &[FRAME_END, b'\r', b'\n']);
    }

    #[test]
    fn test_data_frame_roundtrip() {
        let payloads: [&[u8]; 3] = [b"", br#"{"Cmd":"Get"}"#, br#"{"rll":1.5,"Cmd":"Set"}"#];
        for payload in payloads {
            let frame = encode_data_frame(payload).expect("Should encode");
            assert_eq!(decode_data_frame(&frame), Ok(payload));
        }
    }

    #[test]
    fn test_decode_without_line_end() {
        let payload = br#"{"Cmd":"FW"}"#;
        let frame = encode_data_frame(payload).unwrap();
        let trimmed = &frame[..frame.len() - LINE_END.len()];
        assert_eq!(decode_data_frame(trimmed), Ok(&payload[..]));
    }

    #[test]
    fn test_single_bit_flip_detected() {
        let payload = br#"{"Cmd":"Set","tiltgain":5.0}"#;
        let frame = encode_data_frame(payload).unwrap();

        for index in 1..1 + payload.len() {
            for bit in 0..8 {
                let mut corrupted = frame.clone();
                corrupted[index] ^= 1 << bit;
                assert!(
                    matches!(
                        decode_data_frame(&corrupted),
                        Err(FrameError::ChecksumMismatch { .. })
                    ),
                    "flip at byte {} bit {} accepted",
                    index,
                    bit
                );
            }
        }
    }

    #[test]
    fn test_missing_delimiters() {
        assert_eq!(decode_data_frame(b"abc"), Err(FrameError::MissingDelimiter));
        assert_eq!(
            decode_data_frame(&[DATA_START, b'a', b'b']),
            Err(FrameError::MissingDelimiter)
        );
    }

    #[test]
    fn test_truncated() {
        assert_eq!(split_checksum(&[0x41]), Err(FrameError::Truncated));
    }

    #[test]
    fn test_too_long() {
        let payload = [b'a'; TX_BUFFER_SIZE];
        assert_eq!(
            encode_data_frame(&payload),
            Err(FrameError::TooLong {
                len: TX_BUFFER_SIZE + DATA_FRAME_OVERHEAD,
                max: TX_BUFFER_SIZE
            })
        );

        let fits = [b'a'; TX_BUFFER_SIZE - DATA_FRAME_OVERHEAD];
        assert!(encode_data_frame(&fits).is_ok());
    }

    #[test]
    fn test_log_roundtrip_with_control_bytes() {
        let text = "gyro \u{1b} cal \u{2}\u{3}\u{6}\u{15}\u{1} done";
        let frame = encode_log_frame(text);

        assert_eq!(frame[0], LOG_START);
        assert_eq!(&frame[frame.len() - 3..], &[FRAME_END, b'\r', b'\n']);

        let inner = &frame[1..frame.len() - 3];
        for &byte in inner.iter().filter(|&&b| b != LOG_ESCAPE) {
            assert!(!LOG_RESERVED.contains(&byte));
        }
        assert_eq!(decode_log_frame(inner), text);
    }

    #[test]
    fn test_log_escape_encoding() {
        let frame = encode_log_frame("\u{1b}");
        assert_eq!(frame.as_slice(), &[LOG_START, 0x1B, 0xE4, FRAME_END, b'\r', b'\n']);
    }

    #[test]
    fn test_log_trailing_escape_dropped() {
        assert_eq!(decode_log_frame(&[b'o', b'k', LOG_ESCAPE]), "ok");
    }
}
