//! Serial tasks for the device side of the link.
//!
//! The UART (or USB CDC-ACM) reader and writer only move raw bytes between
//! the interface and two bounded queues. The protocol task wakes every
//! [`SERIAL_PERIOD_MS`], drains the receive queue and runs the [`Session`]
//! without holding any lock. Frames written by the session land in the
//! transmit queue whole or not at all.
//!
//! These tasks are generic over any type implementing embedded_io_async
//! traits, so they work with USB Serial JTAG, USB CDC-ACM or a plain UART.

use core::cell::{Cell, RefCell};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{Duration, Instant, Timer};
use embedded_io_async::{Read, Write};
use heapless::{Deque, Vec};

use crate::config::serial::{RX_QUEUE_SIZE, SERIAL_PERIOD_MS, TX_QUEUE_SIZE};
use crate::dispatcher::Handler;
use crate::session::{Session, SessionEvent};
use crate::transport::{Transport, TransportError};

/// Chunk size moved per interface read or write
const CHUNK_SIZE: usize = 64;

type ByteQueue<const N: usize> = Mutex<CriticalSectionRawMutex, RefCell<Deque<u8, N>>>;

/// Bytes received from the host, not yet seen by the protocol task
static RX_QUEUE: ByteQueue<RX_QUEUE_SIZE> = Mutex::new(RefCell::new(Deque::new()));

/// Encoded frames waiting for the writer task
static TX_QUEUE: ByteQueue<TX_QUEUE_SIZE> = Mutex::new(RefCell::new(Deque::new()));

/// Signal to indicate transmit data is available
static TX_SIGNAL: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Host attached (DTR high on USB CDC, always true on a plain UART)
static CONNECTED: Mutex<CriticalSectionRawMutex, Cell<bool>> = Mutex::new(Cell::new(false));

/// Record a change of the host connection.
///
/// Called by the interface glue; the protocol task picks it up on its next
/// wake-up and resets the link.
pub fn set_connected(connected: bool) {
    CONNECTED.lock(|flag| flag.set(connected));
}

pub fn is_connected() -> bool {
    CONNECTED.lock(|flag| flag.get())
}

/// Queue bytes for the writer task, all or nothing.
pub fn push_tx(data: &[u8]) -> Result<(), TransportError> {
    TX_QUEUE.lock(|queue| {
        let mut queue = queue.borrow_mut();
        if queue.capacity() - queue.len() < data.len() {
            return Err(TransportError::BufferFull);
        }
        for &byte in data {
            // Room checked above
            let _ = queue.push_back(byte);
        }
        Ok(())
    })?;
    TX_SIGNAL.signal(());
    Ok(())
}

/// Bytes waiting in the transmit queue
pub fn tx_backlog() -> usize {
    TX_QUEUE.lock(|queue| queue.borrow().len())
}

/// Session transport backed by the shared transmit queue
#[derive(Debug, Default, Clone, Copy)]
pub struct QueueTransport;

impl Transport for QueueTransport {
    fn write_bytes(&mut self, data: &[u8]) -> Result<(), TransportError> {
        if !is_connected() {
            return Err(TransportError::Disconnected);
        }
        push_tx(data)
    }

    fn is_connected(&self) -> bool {
        is_connected()
    }

    fn backlog(&self) -> usize {
        tx_backlog()
    }
}

/// Task that reads raw bytes from a serial interface into the receive queue.
///
/// Bytes that do not fit are dropped; the frame they belong to fails its
/// checksum and the host resends it.
pub async fn serial_reader_task<R: Read>(mut reader: R) {
    let mut buf = [0u8; CHUNK_SIZE];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => continue,
            Ok(n) => {
                let dropped = RX_QUEUE.lock(|queue| {
                    let mut queue = queue.borrow_mut();
                    buf[..n]
                        .iter()
                        .filter(|&&byte| queue.push_back(byte).is_err())
                        .count()
                });
                if dropped > 0 {
                    log::warn!("receive queue full, dropped {} bytes", dropped);
                }
            }
            Err(_) => {
                // UART error, just continue
                Timer::after(Duration::from_millis(SERIAL_PERIOD_MS)).await;
            }
        }
    }
}

/// Task that writes queued frames to a serial interface.
pub async fn serial_writer_task<W: Write>(mut writer: W) {
    loop {
        TX_SIGNAL.wait().await;

        loop {
            let mut chunk: Vec<u8, CHUNK_SIZE> = Vec::new();
            TX_QUEUE.lock(|queue| {
                let mut queue = queue.borrow_mut();
                while !chunk.is_full() {
                    match queue.pop_front() {
                        Some(byte) => {
                            let _ = chunk.push(byte);
                        }
                        None => break,
                    }
                }
            });

            if chunk.is_empty() {
                break;
            }
            // Ignore errors, the port might not be open
            let _ = writer.write_all(&chunk).await;
        }
    }
}

/// Task that runs the protocol session.
pub async fn protocol_task<H: Handler>(mut session: Session<QueueTransport, H>) {
    loop {
        Timer::after(Duration::from_millis(SERIAL_PERIOD_MS)).await;
        let now = Instant::now().as_millis();

        let mut received: Vec<u8, RX_QUEUE_SIZE> = Vec::new();
        RX_QUEUE.lock(|queue| {
            let mut queue = queue.borrow_mut();
            while let Some(byte) = queue.pop_front() {
                let _ = received.push(byte);
            }
        });

        session.receive(&received, now);
        session.poll(now);

        while let Some(event) = session.poll_event() {
            match event {
                SessionEvent::Connected => log::info!("host connected"),
                SessionEvent::Disconnected => {
                    // Anything still queued was meant for the old connection
                    TX_QUEUE.lock(|queue| queue.borrow_mut().clear());
                }
                SessionEvent::LinkFailure(failure) => log::error!("{}", failure),
                _ => {}
            }
        }
    }
}
