//! Embassy tasks module
//!
//! Contains the async tasks that connect a device session to its serial
//! interface.

pub mod serial;

pub use serial::{
    protocol_task, push_tx, serial_reader_task, serial_writer_task, set_connected,
    QueueTransport,
};
