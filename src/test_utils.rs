//! Testing utilities and mock implementations
//!
//! This module provides mock transports for testing the access layer on the
//! host without hardware.
//!
//! Only available when running `cargo test`.

// Note: The #[cfg(test)] attribute is applied in lib.rs where this module is declared
#![allow(missing_docs)]
#![allow(clippy::std_instead_of_core, clippy::std_instead_of_alloc)]

extern crate std;

use core::future::Future;
use core::pin::pin;
use core::task::{Context, Poll, Waker};
use std::collections::HashMap;
use std::vec::Vec;

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, NoAcknowledgeSource, Operation};

use crate::bus::BusTransport;
use crate::bus::asynch::AsyncBusTransport;
use crate::error::{TransportError, TransportResult};
use crate::map::RegisterWidth;

// =============================================================================
// Mock Word Bus
// =============================================================================

/// One transaction seen by [`MockBus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transaction {
    Read { address: usize },
    Write { address: usize, word: u64 },
}

/// Mock word-addressed bus for testing register access without hardware
///
/// Unwritten addresses read as zero. Every attempted transaction is logged,
/// including ones that were made to fail.
///
/// # Example
///
/// ```ignore
/// let mut bus = MockBus::new();
/// bus.set_word(0x630, 0x0001_1234);
///
/// let dev = Device::new(&map, 0, 1);
/// assert_eq!(dev.read_field(&mut bus, "DaughterboardId", "SlotIdVal"), Ok(1));
/// ```
#[derive(Debug, Default)]
pub struct MockBus {
    /// Stored words: address -> word
    words: HashMap<usize, u64>,
    /// Bits that ignore writes: address -> mask
    read_only: HashMap<usize, u64>,
    /// Transaction log in issue order
    log: Vec<Transaction>,
    /// Read failure after N more successful reads
    read_failure: Option<(usize, TransportError)>,
    /// Write failure after N more successful writes
    write_failure: Option<(usize, TransportError)>,
}

impl MockBus {
    /// Create an empty mock bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a word without logging a transaction
    pub fn set_word(&mut self, address: usize, word: u64) {
        self.words.insert(address, word);
    }

    /// Stored word, if the address was ever set or written
    pub fn word(&self, address: usize) -> Option<u64> {
        self.words.get(&address).copied()
    }

    /// Make bits under `mask` at `address` keep their value on writes
    pub fn set_read_only_mask(&mut self, address: usize, mask: u64) {
        self.read_only.insert(address, mask);
    }

    /// Fail the next read with `error`
    pub fn fail_next_read(&mut self, error: TransportError) {
        self.fail_read_after(0, error);
    }

    /// Let `skip` reads succeed, then fail the next one with `error`
    pub fn fail_read_after(&mut self, skip: usize, error: TransportError) {
        self.read_failure = Some((skip, error));
    }

    /// Fail the next write with `error`
    pub fn fail_next_write(&mut self, error: TransportError) {
        self.write_failure = Some((0, error));
    }

    /// All transactions so far
    pub fn transactions(&self) -> Vec<Transaction> {
        self.log.clone()
    }

    /// All writes so far as `(address, word)`
    pub fn writes(&self) -> Vec<(usize, u64)> {
        self.log
            .iter()
            .filter_map(|t| match *t {
                Transaction::Write { address, word } => Some((address, word)),
                Transaction::Read { .. } => None,
            })
            .collect()
    }

    /// Clear the transaction log
    pub fn clear_log(&mut self) {
        self.log.clear();
    }

    fn take_failure(pending: &mut Option<(usize, TransportError)>) -> Option<TransportError> {
        match pending {
            Some((0, error)) => {
                let error = *error;
                *pending = None;
                Some(error)
            }
            Some((skip, _)) => {
                *skip -= 1;
                None
            }
            None => None,
        }
    }
}

impl BusTransport for MockBus {
    fn read(&mut self, address: usize, width: RegisterWidth) -> TransportResult<u64> {
        self.log.push(Transaction::Read { address });
        if let Some(error) = Self::take_failure(&mut self.read_failure) {
            return Err(error);
        }
        Ok(self.word(address).unwrap_or(0) & width.mask())
    }

    fn write(&mut self, address: usize, width: RegisterWidth, word: u64) -> TransportResult<()> {
        self.log.push(Transaction::Write { address, word });
        if let Some(error) = Self::take_failure(&mut self.write_failure) {
            return Err(error);
        }
        let stuck = self.read_only.get(&address).copied().unwrap_or(0);
        let current = self.word(address).unwrap_or(0);
        let stored = ((current & stuck) | (word & !stuck)) & width.mask();
        self.words.insert(address, stored);
        Ok(())
    }
}

impl AsyncBusTransport for MockBus {
    async fn read(&mut self, address: usize, width: RegisterWidth) -> TransportResult<u64> {
        BusTransport::read(self, address, width)
    }

    async fn write(&mut self, address: usize, width: RegisterWidth, word: u64) -> TransportResult<()> {
        BusTransport::write(self, address, width, word)
    }
}

// =============================================================================
// Mock I2C Peripheral
// =============================================================================

/// Mock I2C target with a byte-addressed register file
///
/// The first bytes of each write select the register pointer; any further
/// bytes are stored from there on. Reads continue from the pointer.
#[derive(Debug)]
pub struct MockI2c {
    device_address: u8,
    address_len: usize,
    memory: HashMap<u16, u8>,
    pointer: u16,
    write_log: Vec<Vec<u8>>,
    fail_next: Option<ErrorKind>,
}

impl MockI2c {
    /// Create a target answering at `device_address` with 8-bit register addresses
    pub fn new(device_address: u8) -> Self {
        Self {
            device_address,
            address_len: 1,
            memory: HashMap::new(),
            pointer: 0,
            write_log: Vec::new(),
            fail_next: None,
        }
    }

    /// Use 16-bit register addresses
    pub fn with_two_byte_addresses(mut self) -> Self {
        self.address_len = 2;
        self
    }

    /// Preload bytes starting at `start`
    pub fn load(&mut self, start: u16, bytes: &[u8]) {
        for (offset, &byte) in bytes.iter().enumerate() {
            self.memory.insert(start.wrapping_add(offset as u16), byte);
        }
    }

    /// Stored byte (zero if never written)
    pub fn byte(&self, address: u16) -> u8 {
        self.memory.get(&address).copied().unwrap_or(0)
    }

    /// Every write operation seen, address bytes included
    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.write_log.clone()
    }

    /// Fail the next transaction with `kind`
    pub fn fail_next(&mut self, kind: ErrorKind) {
        self.fail_next = Some(kind);
    }
}

impl ErrorType for MockI2c {
    type Error = ErrorKind;
}

impl I2c for MockI2c {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        if let Some(kind) = self.fail_next.take() {
            return Err(kind);
        }
        if address != self.device_address {
            return Err(ErrorKind::NoAcknowledge(NoAcknowledgeSource::Address));
        }

        for operation in operations.iter_mut() {
            match operation {
                Operation::Write(bytes) => {
                    self.write_log.push(bytes.to_vec());
                    let split = self.address_len.min(bytes.len());
                    let (pointer, data) = bytes.split_at(split);
                    self.pointer = pointer
                        .iter()
                        .fold(0u16, |acc, &byte| (acc << 8) | u16::from(byte));
                    for &byte in data {
                        self.memory.insert(self.pointer, byte);
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
                Operation::Read(buffer) => {
                    for slot in buffer.iter_mut() {
                        *slot = self.byte(self.pointer);
                        self.pointer = self.pointer.wrapping_add(1);
                    }
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// Executor
// =============================================================================

/// Poll `future` to completion on the current thread
///
/// Mock transports never return `Pending`, so a no-op waker is enough.
pub fn block_on<F: Future>(future: F) -> F::Output {
    let mut future = pin!(future);
    let mut cx = Context::from_waker(Waker::noop());
    loop {
        if let Poll::Ready(output) = future.as_mut().poll(&mut cx) {
            return output;
        }
    }
}

// =============================================================================
// Tests for the mocks themselves
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_bus_unwritten_reads_zero() {
        let mut bus = MockBus::new();
        assert_eq!(BusTransport::read(&mut bus, 0x10, RegisterWidth::Bits32), Ok(0));
        assert_eq!(bus.word(0x10), None);
    }

    #[test]
    fn mock_bus_read_only_bits_stick() {
        let mut bus = MockBus::new();
        bus.set_word(0, 0xF0);
        bus.set_read_only_mask(0, 0xF0);
        BusTransport::write(&mut bus, 0, RegisterWidth::Bits8, 0x0F).unwrap();
        assert_eq!(bus.word(0), Some(0xFF));
    }

    #[test]
    fn mock_bus_delayed_failure() {
        let mut bus = MockBus::new();
        bus.fail_read_after(1, TransportError::Link);
        assert!(BusTransport::read(&mut bus, 0, RegisterWidth::Bits8).is_ok());
        assert_eq!(BusTransport::read(&mut bus, 0, RegisterWidth::Bits8), Err(TransportError::Link));
        assert!(BusTransport::read(&mut bus, 0, RegisterWidth::Bits8).is_ok());
    }

    #[test]
    fn mock_bus_log_and_clear() {
        let mut bus = MockBus::new();
        BusTransport::write(&mut bus, 4, RegisterWidth::Bits32, 1).unwrap();
        assert_eq!(bus.writes(), [(4, 1)]);
        bus.clear_log();
        assert!(bus.transactions().is_empty());
    }

    #[test]
    fn mock_i2c_pointer_and_data() {
        let mut i2c = MockI2c::new(0x20);
        i2c.write(0x20, &[0x05, 0xAA, 0xBB]).unwrap();
        let mut buf = [0u8; 2];
        i2c.write_read(0x20, &[0x05], &mut buf).unwrap();
        assert_eq!(buf, [0xAA, 0xBB]);
        assert_eq!(i2c.writes().len(), 2);
    }
}
