//! Byte transport trait for abstraction and testability
//!
//! The session writes whole encoded frames through this trait, so the real
//! UART/USB buffer can be swapped with a mock for testing.

/// Errors that can occur while handing bytes to the transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// Not enough room for the whole write; nothing was queued
    #[error("transmit buffer full")]
    BufferFull,
    /// No peer is attached
    #[error("transport disconnected")]
    Disconnected,
}

/// Abstract byte transport
pub trait Transport {
    /// Queue bytes for transmission.
    ///
    /// Writes are all-or-nothing: on error no byte of `data` was queued.
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError>;

    /// Whether a peer is attached (DTR high, port open)
    fn is_connected(&self) -> bool;

    /// Bytes queued but not yet sent
    fn backlog(&self) -> usize {
        0
    }
}

impl<T: Transport + ?Sized> Transport for &mut T {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        (**self).write_bytes(data)
    }

    fn is_connected(&self) -> bool {
        (**self).is_connected()
    }

    fn backlog(&self) -> usize {
        (**self).backlog()
    }
}

#[cfg(test)]
pub mod mock {
    //! Mock transport for testing

    use super::*;
    use alloc::vec::Vec;

    /// Mock transport for unit testing
    pub struct MockTransport {
        /// Data written via write_bytes()
        tx_buffer: Vec<u8>,
        /// Reported connection state
        connected: bool,
        /// Reported backlog
        backlog: usize,
        /// Error to return on next write
        next_write_error: Option<TransportError>,
    }

    impl MockTransport {
        /// Create a new connected mock transport
        pub fn new() -> Self {
            Self {
                tx_buffer: Vec::new(),
                connected: true,
                backlog: 0,
                next_write_error: None,
            }
        }

        /// Get all data written via write_bytes()
        pub fn tx_data(&self) -> &[u8] {
            &self.tx_buffer
        }

        /// Take and clear all written data
        pub fn take_tx_data(&mut self) -> Vec<u8> {
            core::mem::take(&mut self.tx_buffer)
        }

        /// Clear the TX buffer
        pub fn clear_tx_buffer(&mut self) {
            self.tx_buffer.clear();
        }

        pub fn set_connected(&mut self, connected: bool) {
            self.connected = connected;
        }

        pub fn set_backlog(&mut self, backlog: usize) {
            self.backlog = backlog;
        }

        /// Set an error to be returned by the next write_bytes() call
        pub fn set_next_write_error(&mut self, error: TransportError) {
            self.next_write_error = Some(error);
        }
    }

    impl Default for MockTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for MockTransport {
        fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
            if let Some(error) = self.next_write_error.take() {
                return Err(error);
            }
            if !self.connected {
                return Err(TransportError::Disconnected);
            }
            self.tx_buffer.extend_from_slice(data);
            Ok(())
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn backlog(&self) -> usize {
            self.backlog
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_mock_write() {
            let mut port = MockTransport::new();
            port.write_bytes(&[0x01, 0x02]).unwrap();
            port.write_bytes(&[0x03, 0x04]).unwrap();
            assert_eq!(port.tx_data(), &[0x01, 0x02, 0x03, 0x04]);
        }

        #[test]
        fn test_mock_write_error() {
            let mut port = MockTransport::new();
            port.set_next_write_error(TransportError::BufferFull);
            assert_eq!(port.write_bytes(&[0x01]), Err(TransportError::BufferFull));

            // Error should be cleared
            port.write_bytes(&[0x01]).unwrap();
            assert_eq!(port.tx_data(), &[0x01]);
        }

        #[test]
        fn test_mock_disconnected() {
            let mut port = MockTransport::new();
            port.set_connected(false);
            assert!(!port.is_connected());
            assert_eq!(port.write_bytes(&[0x01]), Err(TransportError::Disconnected));
            assert!(port.tx_data().is_empty());
        }
    }
}
