pub mod crc;
pub mod frame;
pub mod framing;

pub use frame::{
    decode_data_frame, decode_log_frame, encode_data_frame, encode_log_frame, FrameBuf, FrameError,
};
pub use framing::{FrameAccumulator, RxPayload, StreamEvent};
