//! Device instances
//!
//! A [`Device`] binds a shared [`RegisterMap`] to a concrete base address and
//! slot. It caches no register values: every read goes to the bus. Many
//! devices of the same type share one map by reference.
//!
//! Devices are normally produced by [`Discovery`], but can be created
//! directly when the layout and base address are known up front.

pub mod discovery;

pub use discovery::{
    CatalogEntry, DeviceIdent, DeviceTable, Discovery, DiscoveryConfig, IdentLayout,
};

use crate::bus::BusTransport;
use crate::error::{AccessError, AccessResult, Result};
use crate::map::{FieldDescriptor, RegisterDescriptor, RegisterMap};
use crate::session::{AccessSession, SessionConfig, WriteMode};

/// Runtime binding of a register map to a base address and slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Device<'m> {
    map: &'m RegisterMap<'m>,
    base_address: usize,
    slot: u8,
}

impl<'m> Device<'m> {
    /// Bind `map` at `base_address` for the instance in `slot`
    pub const fn new(map: &'m RegisterMap<'m>, base_address: usize, slot: u8) -> Self {
        Self {
            map,
            base_address,
            slot,
        }
    }

    /// Register map shared by all devices of this type
    pub const fn map(&self) -> &'m RegisterMap<'m> {
        self.map
    }

    /// Base address all register offsets are relative to
    pub const fn base_address(&self) -> usize {
        self.base_address
    }

    /// Physical slot of this instance
    pub const fn slot(&self) -> u8 {
        self.slot
    }

    /// Device type of the bound map
    pub const fn device_type(&self) -> &'static str {
        self.map.device_type()
    }

    /// Absolute bus address of `register`, `None` if it overflows `usize`
    #[inline]
    pub const fn address_of(&self, register: &RegisterDescriptor<'_>) -> Option<usize> {
        self.base_address.checked_add(register.address())
    }

    /// Resolve a register by name
    pub fn register(&self, register: &'static str) -> AccessResult<&'m RegisterDescriptor<'m>> {
        self.map
            .register(register)
            .ok_or(AccessError::UnknownRegister { register })
    }

    /// Resolve a register and one of its fields by name
    pub fn field(
        &self,
        register: &'static str,
        field: &'static str,
    ) -> AccessResult<(&'m RegisterDescriptor<'m>, &'m FieldDescriptor)> {
        let reg = self.register(register)?;
        let fld = reg
            .field(field)
            .ok_or(AccessError::UnknownField { register, field })?;
        Ok((reg, fld))
    }

    /// Start a session with the default configuration
    pub fn session(&self) -> AccessSession<'_, 'm> {
        AccessSession::new(self)
    }

    /// Start a session with `config`
    pub fn session_with(&self, config: SessionConfig) -> AccessSession<'_, 'm> {
        AccessSession::with_config(self, config)
    }

    /// Read one field (see [`AccessSession::read_field`])
    pub fn read_field<B: BusTransport>(
        &self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
    ) -> Result<u64> {
        self.session().read_field(bus, register, field)
    }

    /// Write one field (see [`AccessSession::write_field`])
    pub fn write_field<B: BusTransport>(
        &self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
        value: u64,
    ) -> Result<u64> {
        self.session().write_field(bus, register, field, value)
    }

    /// Read a whole register word (see [`AccessSession::read_register`])
    pub fn read_register<B: BusTransport>(&self, bus: &mut B, register: &'static str) -> Result<u64> {
        self.session().read_register(bus, register)
    }

    /// Write a whole register word (see [`AccessSession::write_register_raw`])
    pub fn write_register_raw<B: BusTransport>(
        &self,
        bus: &mut B,
        register: &'static str,
        word: u64,
        mode: WriteMode,
    ) -> Result<u64> {
        self.session().write_register_raw(bus, register, word, mode)
    }
}
