//! Per-register locks.
//!
//! [`RegisterLocks`] is a fixed-capacity table of held register keys behind a
//! critical section. The table itself is only touched for the instant it
//! takes to claim or release a key; the lock is held for as long as the
//! returned [`RegisterGuard`] lives.

use core::cell::RefCell;
use critical_section::Mutex;

/// Identity of one register on one device instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterKey {
    /// Device base address
    pub base_address: usize,
    /// Register offset within the device
    pub register_address: usize,
}

/// Table of locked registers.
///
/// `N` bounds how many registers can be locked at the same time. When the
/// table is full, further claims fail as if the register were busy.
///
/// # Example
///
/// ```ignore
/// static LOCKS: RegisterLocks<4> = RegisterLocks::new();
///
/// if let Some(_guard) = LOCKS.try_lock(key) {
///     // exclusive until _guard drops
/// }
/// ```
pub struct RegisterLocks<const N: usize> {
    held: Mutex<RefCell<[Option<RegisterKey>; N]>>,
}

impl<const N: usize> RegisterLocks<N> {
    /// Create an empty table (const, suitable for static initialization).
    pub const fn new() -> Self {
        Self {
            held: Mutex::new(RefCell::new([None; N])),
        }
    }

    /// Claim `key` if nobody holds it.
    pub fn try_lock(&self, key: RegisterKey) -> Option<RegisterGuard<'_, N>> {
        critical_section::with(|cs| {
            let mut held = self.held.borrow_ref_mut(cs);
            if held.iter().flatten().any(|k| *k == key) {
                return None;
            }
            let free = held.iter_mut().find(|slot| slot.is_none())?;
            *free = Some(key);
            Some(RegisterGuard { locks: self, key })
        })
    }

    /// Claim `key`, spinning until it is released.
    ///
    /// Must not be called from a context that preempts the current holder.
    pub fn lock(&self, key: RegisterKey) -> RegisterGuard<'_, N> {
        loop {
            if let Some(guard) = self.try_lock(key) {
                return guard;
            }
            core::hint::spin_loop();
        }
    }

    /// Whether `key` is currently held.
    pub fn is_locked(&self, key: RegisterKey) -> bool {
        critical_section::with(|cs| self.held.borrow_ref(cs).iter().flatten().any(|k| *k == key))
    }

    /// Number of registers currently held.
    pub fn held(&self) -> usize {
        critical_section::with(|cs| self.held.borrow_ref(cs).iter().flatten().count())
    }

    fn release(&self, key: RegisterKey) {
        critical_section::with(|cs| {
            let mut held = self.held.borrow_ref_mut(cs);
            if let Some(slot) = held.iter_mut().find(|slot| **slot == Some(key)) {
                *slot = None;
            }
        });
    }
}

impl<const N: usize> Default for RegisterLocks<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Held register lock, released on drop.
#[must_use = "the register is unlocked as soon as the guard is dropped"]
pub struct RegisterGuard<'l, const N: usize> {
    locks: &'l RegisterLocks<N>,
    key: RegisterKey,
}

impl<const N: usize> RegisterGuard<'_, N> {
    /// Register this guard holds.
    pub fn key(&self) -> RegisterKey {
        self.key
    }
}

impl<const N: usize> Drop for RegisterGuard<'_, N> {
    fn drop(&mut self) {
        self.locks.release(self.key);
    }
}
