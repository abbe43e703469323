//! I2C bus transport
//!
//! Adapts any `embedded_hal::i2c::I2c` implementation to [`BusTransport`].
//! The register address is sent first (one or two big-endian bytes),
//! followed by the word itself, most significant byte first, `width / 8`
//! bytes long.

use embedded_hal::i2c::{Error as _, ErrorKind, I2c};

use super::BusTransport;
use crate::constants::{I2C_MAX_ADDRESS_BYTES, MAX_WORD_BYTES};
use crate::error::{TransportError, TransportResult};
use crate::map::RegisterWidth;

/// Number of bytes used to send the register address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cAddressWidth {
    /// 8-bit register addresses (0x00-0xFF)
    #[default]
    OneByte,
    /// 16-bit register addresses (0x0000-0xFFFF)
    TwoBytes,
}

impl I2cAddressWidth {
    const fn len(self) -> usize {
        match self {
            I2cAddressWidth::OneByte => 1,
            I2cAddressWidth::TwoBytes => 2,
        }
    }
}

/// Register transport over an I2C peripheral
pub struct I2cTransport<I2C> {
    i2c: I2C,
    device_address: u8,
    address_width: I2cAddressWidth,
}

impl<I2C> I2cTransport<I2C> {
    /// Create a transport talking to the 7-bit `device_address`
    pub const fn new(i2c: I2C, device_address: u8) -> Self {
        Self {
            i2c,
            device_address,
            address_width: I2cAddressWidth::OneByte,
        }
    }

    /// Use `width` bytes for register addresses
    #[must_use]
    pub const fn with_address_width(mut self, width: I2cAddressWidth) -> Self {
        self.address_width = width;
        self
    }

    /// 7-bit device address
    pub const fn device_address(&self) -> u8 {
        self.device_address
    }

    /// Consume the transport and return the I2C peripheral
    pub fn release(self) -> I2C {
        self.i2c
    }

    /// Encode `address` big-endian into `buf`, returning the byte count
    fn encode_address(&self, address: usize, buf: &mut [u8]) -> TransportResult<usize> {
        let len = self.address_width.len();
        let limit = 1usize << (8 * len);
        if address >= limit {
            return Err(TransportError::AddressUnmapped);
        }
        let bytes = (address as u16).to_be_bytes();
        buf[..len].copy_from_slice(&bytes[2 - len..]);
        Ok(len)
    }
}

fn map_i2c_error<E: embedded_hal::i2c::Error>(err: E) -> TransportError {
    match err.kind() {
        ErrorKind::NoAcknowledge(_) => TransportError::NoAcknowledge,
        _ => TransportError::Link,
    }
}

impl<I2C: I2c> BusTransport for I2cTransport<I2C> {
    fn read(&mut self, address: usize, width: RegisterWidth) -> TransportResult<u64> {
        let mut addr = [0u8; I2C_MAX_ADDRESS_BYTES];
        let addr_len = self.encode_address(address, &mut addr)?;

        let len = width.bytes();
        let mut data = [0u8; MAX_WORD_BYTES];
        self.i2c
            .write_read(self.device_address, &addr[..addr_len], &mut data[..len])
            .map_err(map_i2c_error)?;

        Ok(data[..len]
            .iter()
            .fold(0u64, |word, &byte| (word << 8) | byte as u64))
    }

    fn write(&mut self, address: usize, width: RegisterWidth, word: u64) -> TransportResult<()> {
        let mut buffer = [0u8; I2C_MAX_ADDRESS_BYTES + MAX_WORD_BYTES];
        let addr_len = self.encode_address(address, &mut buffer)?;

        let len = width.bytes();
        let bytes = word.to_be_bytes();
        buffer[addr_len..addr_len + len].copy_from_slice(&bytes[MAX_WORD_BYTES - len..]);

        self.i2c
            .write(self.device_address, &buffer[..addr_len + len])
            .map_err(map_i2c_error)
    }
}
