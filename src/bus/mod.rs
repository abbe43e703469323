//! Bus transport abstraction
//!
//! The access layer never touches hardware directly. Every register word is
//! read and written through a [`BusTransport`], passed explicitly to each
//! operation, so several devices and test doubles can share or swap buses
//! freely.
//!
//! A transport must complete one word transaction without interleaving it
//! at sub-word granularity with another caller's transaction. It owns any
//! framing, address translation and link-level retry below this interface.

pub mod i2c;

#[cfg(any(test, feature = "async"))]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub mod asynch;

pub use i2c::{I2cAddressWidth, I2cTransport};

use crate::error::TransportResult;
use crate::map::RegisterWidth;

// =============================================================================
// Bus Transport Trait
// =============================================================================

/// Word-level register transport
///
/// Implemented by anything that can move a register word to and from an
/// absolute address: a memory-mapped window, a serial link, a packet
/// transport or a mock.
///
/// # Example Implementation
///
/// ```ignore
/// struct Window { base: *mut u32 }
///
/// impl BusTransport for Window {
///     fn read(&mut self, address: usize, width: RegisterWidth) -> TransportResult<u64> {
///         // ...
///     }
///
///     fn write(&mut self, address: usize, width: RegisterWidth, word: u64) -> TransportResult<()> {
///         // ...
///     }
/// }
/// ```
pub trait BusTransport {
    /// Read one register word of `width` at `address`
    fn read(&mut self, address: usize, width: RegisterWidth) -> TransportResult<u64>;

    /// Write one register word of `width` at `address`
    fn write(&mut self, address: usize, width: RegisterWidth, word: u64) -> TransportResult<()>;
}

impl<T: BusTransport + ?Sized> BusTransport for &mut T {
    #[inline]
    fn read(&mut self, address: usize, width: RegisterWidth) -> TransportResult<u64> {
        T::read(self, address, width)
    }

    #[inline]
    fn write(&mut self, address: usize, width: RegisterWidth, word: u64) -> TransportResult<()> {
        T::write(self, address, width, word)
    }
}
