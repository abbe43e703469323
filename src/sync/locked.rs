//! Lock-holding device access.
//!
//! [`LockedDevice`] wraps a [`Device`] and a [`RegisterLocks`] table. Every
//! write holds the register's lock from before the read until after the
//! write (and verify), which removes the lost-update window of two
//! interleaved read-modify-writes.

use super::lock::{RegisterGuard, RegisterKey, RegisterLocks};
use crate::bus::BusTransport;
use crate::device::Device;
use crate::error::{AccessError, Result};
use crate::map::{FieldDescriptor, RegisterDescriptor};
use crate::session::{AccessSession, SessionConfig, StagedWrite, WriteMode};

/// Device access that serializes writers per register
#[derive(Clone, Copy)]
pub struct LockedDevice<'d, 'm, 'l, const N: usize> {
    device: &'d Device<'m>,
    locks: &'l RegisterLocks<N>,
    config: SessionConfig,
}

impl<'d, 'm, 'l, const N: usize> LockedDevice<'d, 'm, 'l, N> {
    /// Serialize writes to `device` through `locks`
    pub const fn new(device: &'d Device<'m>, locks: &'l RegisterLocks<N>) -> Self {
        Self {
            device,
            locks,
            config: SessionConfig::new(),
        }
    }

    /// Replace the session configuration used for every operation
    #[must_use]
    pub const fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    /// Wrapped device
    pub const fn device(&self) -> &'d Device<'m> {
        self.device
    }

    /// Lock key of `register` on this device
    pub const fn key_for(&self, register: &RegisterDescriptor<'_>) -> RegisterKey {
        RegisterKey {
            base_address: self.device.base_address(),
            register_address: register.address(),
        }
    }

    /// Read one field. Reads take no lock.
    pub fn read_field<B: BusTransport>(
        &self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
    ) -> Result<u64> {
        self.session().read_field(bus, register, field)
    }

    /// Read a whole register word. Reads take no lock.
    pub fn read_register<B: BusTransport>(&self, bus: &mut B, register: &'static str) -> Result<u64> {
        self.session().read_register(bus, register)
    }

    /// Set one field, waiting for the register lock
    pub fn write_field<B: BusTransport>(
        &self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
        value: u64,
    ) -> Result<u64> {
        let reg = self.device.register(register)?;
        let _guard = self.locks.lock(self.key_for(reg));
        self.session().write_field(bus, register, field, value)
    }

    /// Set one field, failing with [`AccessError::RegisterBusy`] instead of
    /// waiting when another writer holds the register
    pub fn try_write_field<B: BusTransport>(
        &self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
        value: u64,
    ) -> Result<u64> {
        let _guard = self.try_claim(register)?;
        self.session().write_field(bus, register, field, value)
    }

    /// Write a whole register word, waiting for the register lock
    pub fn write_register_raw<B: BusTransport>(
        &self,
        bus: &mut B,
        register: &'static str,
        word: u64,
        mode: WriteMode,
    ) -> Result<u64> {
        let reg = self.device.register(register)?;
        let _guard = self.locks.lock(self.key_for(reg));
        self.session().write_register_raw(bus, register, word, mode)
    }

    /// Claim the register and run the read and modify phases of a field
    /// write, without waiting
    ///
    /// The lock stays held by the returned [`LockedWrite`] until it is
    /// committed or dropped.
    ///
    /// # Errors
    ///
    /// [`AccessError::RegisterBusy`] if another writer holds the register,
    /// plus everything [`AccessSession::prepare_field_write`] can return.
    pub fn prepare_field_write<B: BusTransport>(
        &self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
        value: u64,
    ) -> Result<LockedWrite<'d, 'm, 'l, N>> {
        let guard = self.try_claim(register)?;
        let mut session = self.session();
        let staged = session.begin_field_write(bus, register, field, value)?;
        Ok(LockedWrite {
            session,
            staged,
            _guard: guard,
        })
    }

    fn session(&self) -> AccessSession<'d, 'm> {
        AccessSession::with_config(self.device, self.config)
    }

    fn try_claim(&self, register: &'static str) -> Result<RegisterGuard<'l, N>> {
        let reg = self.device.register(register)?;
        let locks: &'l RegisterLocks<N> = self.locks;
        match locks.try_lock(self.key_for(reg)) {
            Some(guard) => Ok(guard),
            None => {
                #[cfg(feature = "defmt")]
                defmt::debug!("{} busy", register);
                Err(AccessError::RegisterBusy { register }.into())
            }
        }
    }
}

/// Locked field write whose new word is computed but not yet written
///
/// Dropping it without [`commit`](Self::commit) abandons the write and
/// releases the register.
#[must_use = "a locked write holds the register until committed or dropped"]
pub struct LockedWrite<'d, 'm, 'l, const N: usize> {
    session: AccessSession<'d, 'm>,
    staged: StagedWrite<'m>,
    _guard: RegisterGuard<'l, N>,
}

impl<'m, const N: usize> LockedWrite<'_, 'm, '_, N> {
    /// Field being written
    pub fn field(&self) -> &'m FieldDescriptor {
        self.staged.field
    }

    /// Word read while holding the lock
    pub fn old_word(&self) -> u64 {
        self.staged.old_word
    }

    /// Word that will be written
    pub fn new_word(&self) -> u64 {
        self.staged.new_word
    }

    /// Write the new word and release the register
    pub fn commit<B: BusTransport>(mut self, bus: &mut B) -> Result<u64> {
        let staged = self.staged;
        self.session.finish_write(bus, staged.register, staged.new_word)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
