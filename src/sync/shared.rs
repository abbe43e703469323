//! Critical-section shared bus.
//!
//! Provides [`SharedBus`], an ISR-safe wrapper that lets several contexts
//! issue transactions on one [`BusTransport`].

use core::cell::RefCell;
use critical_section::Mutex;

use crate::bus::BusTransport;
use crate::error::TransportResult;
use crate::map::RegisterWidth;

/// ISR-safe bus wrapper using critical sections.
///
/// Every transaction runs inside `critical_section::with()`, so a single
/// read or write is never interleaved with another. A read-modify-write is
/// two transactions; use [`LockedDevice`](super::LockedDevice) to keep it
/// atomic with respect to other writers of the same register.
///
/// `&SharedBus<T>` implements [`BusTransport`].
///
/// # Example
///
/// ```ignore
/// static BUS: SharedBus<MyTransport> = SharedBus::new(MyTransport::new());
///
/// let mut bus = &BUS;
/// device.read_field(&mut bus, "DbStatus", "PllLocked")?;
/// ```
pub struct SharedBus<T> {
    inner: Mutex<RefCell<T>>,
}

impl<T> SharedBus<T> {
    /// Wrap `bus` (const, suitable for static initialization).
    pub const fn new(bus: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(bus)),
        }
    }

    /// Execute a closure with exclusive access to the bus.
    ///
    /// Interrupts are disabled for the duration of the closure.
    #[inline]
    pub fn with<R, F>(&self, f: F) -> R
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            let mut bus = self.inner.borrow_ref_mut(cs);
            f(&mut bus)
        })
    }

    /// Try to execute a closure, returning `None` if already borrowed.
    #[inline]
    pub fn try_with<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&mut T) -> R,
    {
        critical_section::with(|cs| {
            self.inner
                .borrow(cs)
                .try_borrow_mut()
                .ok()
                .map(|mut bus| f(&mut bus))
        })
    }

    /// Unwrap the bus.
    pub fn into_inner(self) -> T {
        self.inner.into_inner().into_inner()
    }
}

impl<T: BusTransport> BusTransport for &SharedBus<T> {
    fn read(&mut self, address: usize, width: RegisterWidth) -> TransportResult<u64> {
        self.with(|bus| bus.read(address, width))
    }

    fn write(&mut self, address: usize, width: RegisterWidth, word: u64) -> TransportResult<()> {
        self.with(|bus| bus.write(address, width, word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MockBus;

    #[test]
    fn shared_bus_forwards_transactions() {
        let mut raw = MockBus::new();
        raw.set_word(0x10, 0xAB);
        let shared = SharedBus::new(raw);

        let mut bus = &shared;
        assert_eq!(bus.read(0x10, RegisterWidth::Bits32), Ok(0xAB));
        bus.write(0x14, RegisterWidth::Bits32, 0xCD).unwrap();

        let raw = shared.into_inner();
        assert_eq!(raw.word(0x14), Some(0xCD));
    }

    #[test]
    fn shared_bus_with_mutates() {
        let shared = SharedBus::new(MockBus::new());
        shared.with(|bus| bus.set_word(0x20, 7));
        assert_eq!(shared.with(|bus| bus.word(0x20)), Some(7));
        assert_eq!(shared.try_with(|bus| bus.word(0x20)), Some(Some(7)));
    }
}
