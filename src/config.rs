//! Protocol constants shared by the device and host peers
//!
//! Both peers must agree on every value in [`protocol`]. The timing values
//! in the other modules only affect the local side.

/// Wire-level constants
pub mod protocol {
    /// Start of a checksummed data frame
    pub const DATA_START: u8 = 0x02;
    /// End of a data or log frame
    pub const FRAME_END: u8 = 0x03;
    /// Start of a log (diagnostic) frame
    pub const LOG_START: u8 = 0x01;
    /// Frame accepted
    pub const ACK: u8 = 0x06;
    /// Checksum mismatch, resend
    pub const NAK: u8 = 0x15;
    /// Log frame escape: the next byte is `original ^ ESCAPE_FLIP`
    pub const LOG_ESCAPE: u8 = 0x1B;
    pub const ESCAPE_FLIP: u8 = 0xFF;

    /// Line ending appended after frames and control bytes
    pub const LINE_END: &[u8] = b"\r\n";

    /// Checksum bytes carried by a data frame
    pub const CHECKSUM_LEN: usize = 2;

    /// Byte values a checksum byte must never take on the wire
    pub const CHECKSUM_RESERVED: [u8; 5] = [0x00, DATA_START, FRAME_END, ACK, NAK];

    /// Byte values escaped inside log frames
    pub const LOG_RESERVED: [u8; 6] = [LOG_START, DATA_START, FRAME_END, ACK, NAK, LOG_ESCAPE];

    /// Receive accumulation buffer (largest frame content we accept)
    pub const RX_BUFFER_SIZE: usize = 2048;

    /// Largest encoded frame we will transmit
    pub const TX_BUFFER_SIZE: usize = 1024;

    /// Reserved body key naming the command
    pub const COMMAND_KEY: &str = "Cmd";
}

/// Stop-and-wait link timing
pub mod link {
    /// Consecutive NAKs on one frame before the link gives up
    pub const MAX_TX_FAULTS: u8 = 5;

    /// Pause before resending a NAKed frame
    pub const TX_FAULT_PAUSE_MS: u64 = 100;

    /// Idle interval before an `IH` probe is sent
    pub const KEEPALIVE_MS: u64 = 1000;

    /// How long an outstanding frame may wait for ACK/NAK
    pub const ACK_TIMEOUT_MS: u64 = 3000;
}

/// Request/response exchange timing
pub mod request {
    /// Timeouts tolerated before an exchange is reported failed
    pub const MAX_REQUEST_FAULTS: u8 = 3;

    /// Time allowed for the reply to a request
    pub const REQUEST_TIMEOUT_MS: u64 = 800;

    /// Recheck interval while our own request is still unsent
    pub const BUSY_RECHECK_MS: u64 = 500;

    /// Data item changes within this window are sent as one `RD`
    pub const SUBSCRIPTION_DEBOUNCE_MS: u64 = 200;
}

/// Telemetry encoding
pub mod telemetry {
    /// Key prefix marking a base64 typed array
    pub const ARRAY_PREFIX: char = '6';

    /// Device live-data push period
    pub const DATA_PERIOD_MS: u64 = 100;
}

/// Device serial configuration
pub mod serial {
    pub const BAUD_RATE: u32 = 115200;

    /// Protocol task wake-up period
    pub const SERIAL_PERIOD_MS: u64 = 10;

    /// Bytes buffered between the UART producer and the protocol task
    pub const RX_QUEUE_SIZE: usize = 512;

    /// Bytes buffered between the protocol task and the UART writer
    pub const TX_QUEUE_SIZE: usize = 2048;
}

/// Firmware identification reported by `FW`
pub mod firmware {
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}
