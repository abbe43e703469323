//! Async bus transport
//!
//! Awaitable twin of [`BusTransport`](super::BusTransport). The masked
//! read-modify-write ordering is unchanged: the read completes and its result
//! is used before the write is issued.

use crate::error::TransportResult;
use crate::map::RegisterWidth;

/// Word-level register transport with awaitable primitives
#[allow(async_fn_in_trait)]
pub trait AsyncBusTransport {
    /// Read one register word of `width` at `address`
    async fn read(&mut self, address: usize, width: RegisterWidth) -> TransportResult<u64>;

    /// Write one register word of `width` at `address`
    async fn write(&mut self, address: usize, width: RegisterWidth, word: u64)
    -> TransportResult<()>;
}

impl<T: AsyncBusTransport + ?Sized> AsyncBusTransport for &mut T {
    #[inline]
    async fn read(&mut self, address: usize, width: RegisterWidth) -> TransportResult<u64> {
        T::read(self, address, width).await
    }

    #[inline]
    async fn write(
        &mut self,
        address: usize,
        width: RegisterWidth,
        word: u64,
    ) -> TransportResult<()> {
        T::write(self, address, width, word).await
    }
}
