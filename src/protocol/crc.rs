//! Frame checksum
//!
//! The checksum is CRC-16/X-25 with its two bytes swapped, which is what the
//! existing firmware and GUI compute. Before it goes on the wire each byte
//! that collides with a control value is flipped with `0xFF`, so the checksum
//! can never be mistaken for a frame marker or an ACK/NAK.

use crate::config::protocol::{CHECKSUM_RESERVED, ESCAPE_FLIP};
use crc::{Crc, CRC_16_IBM_SDLC};

const CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_SDLC);

/// Checksum over the payload bytes (markers excluded)
pub fn checksum(payload: &[u8]) -> u16 {
    CRC.checksum(payload).swap_bytes()
}

/// Flip every checksum byte that equals a reserved control value
pub fn escape_checksum(crc: u16) -> u16 {
    let [high, low] = crc.to_be_bytes();
    u16::from_be_bytes([escape_byte(high), escape_byte(low)])
}

/// Escaped checksum as embedded in a data frame
pub fn frame_checksum(payload: &[u8]) -> u16 {
    escape_checksum(checksum(payload))
}

fn escape_byte(byte: u8) -> u8 {
    if CHECKSUM_RESERVED.contains(&byte) {
        byte ^ ESCAPE_FLIP
    } else {
        byte
    }
}
