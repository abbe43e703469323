//! Device discovery and slot binding
//!
//! An identification register packs a device-type sub-field and a slot
//! sub-field into one word. It is decoded with ordinary field descriptors
//! ([`IdentLayout`]); the type selects a register map from a catalog and the
//! slot selects the base address of the new [`Device`].
//!
//! # Example
//!
//! ```ignore
//! let map = Daughterboard::register_map()?;
//! let layout = Daughterboard::ident_layout(&map)?;
//! let catalog = [CatalogEntry::new(Daughterboard::TYPE_ID, &map)];
//! let discovery = Discovery::new(layout, &catalog)
//!     .with_config(Daughterboard::discovery_config(0x4000_0000));
//!
//! let mut table: DeviceTable<'_, 2> = DeviceTable::new();
//! discovery.discover_all(&mut bus, &[0x4000_0000, 0x4000_1000], &mut table)?;
//! ```

use super::Device;
use crate::bus::BusTransport;
use crate::constants::DEFAULT_SLOT_STRIDE;
use crate::error::{AccessError, BusPhase, DiscoveryError, DiscoveryResult, Result, TransportError};
use crate::map::{FieldDescriptor, RegisterDescriptor, RegisterMap};
use crate::session::bus_fault;

/// Widest slot sub-field that fits a slot number
const MAX_SLOT_BITS: u8 = 8;

// =============================================================================
// Identification Layout
// =============================================================================

/// Decoded identification word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceIdent {
    /// Device-type sub-field value
    pub device_type: u64,
    /// Slot sub-field value
    pub slot: u8,
}

/// Where the type and slot sub-fields live in the identification register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IdentLayout<'m> {
    register: &'m RegisterDescriptor<'m>,
    device_type: &'m FieldDescriptor,
    slot: &'m FieldDescriptor,
}

impl<'m> IdentLayout<'m> {
    /// Resolve the identification register and its two sub-fields in `map`
    ///
    /// # Errors
    ///
    /// - [`AccessError::UnknownRegister`] / [`AccessError::UnknownField`] if
    ///   a name is not in the map
    /// - [`DiscoveryError::SlotFieldTooWide`] if the slot field is wider than
    ///   8 bits
    pub fn new(
        map: &RegisterMap<'m>,
        register: &'static str,
        type_field: &'static str,
        slot_field: &'static str,
    ) -> Result<Self> {
        let reg = map
            .register(register)
            .ok_or(AccessError::UnknownRegister { register })?;
        let device_type = reg.field(type_field).ok_or(AccessError::UnknownField {
            register,
            field: type_field,
        })?;
        let slot = reg.field(slot_field).ok_or(AccessError::UnknownField {
            register,
            field: slot_field,
        })?;

        if slot.width() > MAX_SLOT_BITS {
            return Err(DiscoveryError::SlotFieldTooWide {
                field: slot_field,
                width: slot.width(),
                max: MAX_SLOT_BITS,
            }
            .into());
        }

        Ok(Self {
            register: reg,
            device_type,
            slot,
        })
    }

    /// Identification register
    pub const fn register(&self) -> &'m RegisterDescriptor<'m> {
        self.register
    }

    /// Split an identification word into type and slot
    pub const fn decode(&self, word: u64) -> DeviceIdent {
        DeviceIdent {
            device_type: self.device_type.unpack(word),
            slot: self.slot.unpack(word) as u8,
        }
    }
}

// =============================================================================
// Catalog and Configuration
// =============================================================================

/// Register map bound to one device-type value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CatalogEntry<'m> {
    /// Device-type sub-field value
    pub type_id: u64,
    /// Map to bind for that type
    pub map: &'m RegisterMap<'m>,
}

impl<'m> CatalogEntry<'m> {
    /// Associate `type_id` with `map`
    pub const fn new(type_id: u64, map: &'m RegisterMap<'m>) -> Self {
        Self { type_id, map }
    }
}

/// Slot addressing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DiscoveryConfig {
    bus_base: usize,
    slot_stride: usize,
}

impl DiscoveryConfig {
    /// Slots start at address 0, [`DEFAULT_SLOT_STRIDE`] apart
    pub const fn new() -> Self {
        Self {
            bus_base: 0,
            slot_stride: DEFAULT_SLOT_STRIDE,
        }
    }

    /// Base address of slot 0
    #[must_use]
    pub const fn with_bus_base(mut self, bus_base: usize) -> Self {
        self.bus_base = bus_base;
        self
    }

    /// Address distance between consecutive slots
    #[must_use]
    pub const fn with_slot_stride(mut self, slot_stride: usize) -> Self {
        self.slot_stride = slot_stride;
        self
    }

    /// Base address of slot 0
    pub const fn bus_base(&self) -> usize {
        self.bus_base
    }

    /// Address distance between consecutive slots
    pub const fn slot_stride(&self) -> usize {
        self.slot_stride
    }

    /// Base address of the device in `slot`, `None` if it overflows `usize`
    pub const fn base_for_slot(&self, slot: u8) -> Option<usize> {
        match (slot as usize).checked_mul(self.slot_stride) {
            Some(offset) => self.bus_base.checked_add(offset),
            None => None,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Discovery
// =============================================================================

/// Identifies devices on a bus and binds them to register maps
#[derive(Debug, Clone, Copy)]
pub struct Discovery<'m> {
    layout: IdentLayout<'m>,
    catalog: &'m [CatalogEntry<'m>],
    config: DiscoveryConfig,
}

impl<'m> Discovery<'m> {
    /// Discover with `layout` against the known maps in `catalog`
    pub const fn new(layout: IdentLayout<'m>, catalog: &'m [CatalogEntry<'m>]) -> Self {
        Self {
            layout,
            catalog,
            config: DiscoveryConfig::new(),
        }
    }

    /// Replace the slot addressing parameters
    #[must_use]
    pub const fn with_config(mut self, config: DiscoveryConfig) -> Self {
        self.config = config;
        self
    }

    /// Slot addressing parameters
    pub const fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Register map for a decoded device-type value
    pub fn lookup(&self, device_type: u64) -> Option<&'m RegisterMap<'m>> {
        let catalog: &'m [CatalogEntry<'m>] = self.catalog;
        catalog
            .iter()
            .find(|entry| entry.type_id == device_type)
            .map(|entry| entry.map)
    }

    /// Read and decode the identification word behind `probe_base`
    ///
    /// # Errors
    ///
    /// [`AccessError::BusFault`] if the read fails, or with
    /// [`TransportError::AddressUnmapped`] if the identification register
    /// lies past `usize::MAX`
    pub fn identify<B: BusTransport>(&self, bus: &mut B, probe_base: usize) -> Result<DeviceIdent> {
        let register = self.layout.register();
        let address = probe_base.checked_add(register.address()).ok_or_else(|| {
            bus_fault(register, probe_base, BusPhase::Read)(TransportError::AddressUnmapped)
        })?;
        let word = bus
            .read(address, register.width())
            .map_err(bus_fault(register, address, BusPhase::Read))?
            & register.width().mask();

        let ident = self.layout.decode(word);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "ident at {:#x}: {:#x} -> type {:#x} slot {}",
            address,
            word,
            ident.device_type,
            ident.slot
        );

        Ok(ident)
    }

    /// Identify the device behind `probe_base` and bind it to its map
    ///
    /// # Errors
    ///
    /// - [`AccessError::BusFault`] if the identification read fails
    /// - [`DiscoveryError::UnrecognizedDeviceType`] if no map matches
    /// - [`DiscoveryError::AddressOverflow`] if the slot's base address does
    ///   not fit in `usize`
    pub fn discover_device<B: BusTransport>(
        &self,
        bus: &mut B,
        probe_base: usize,
    ) -> Result<Device<'m>> {
        let ident = self.identify(bus, probe_base)?;
        let map = self
            .lookup(ident.device_type)
            .ok_or(DiscoveryError::UnrecognizedDeviceType {
                device_type: ident.device_type,
            })?;

        let base_address = self
            .config
            .base_for_slot(ident.slot)
            .ok_or(DiscoveryError::AddressOverflow { slot: ident.slot })?;

        Ok(Device::new(map, base_address, ident.slot))
    }

    /// Discover every probe base and bind the results into `table`
    ///
    /// Stops at the first failure; devices bound before it stay bound.
    /// Returns the number of devices bound.
    pub fn discover_all<B: BusTransport, const N: usize>(
        &self,
        bus: &mut B,
        probe_bases: &[usize],
        table: &mut DeviceTable<'m, N>,
    ) -> Result<usize> {
        let mut bound = 0;
        for &probe_base in probe_bases {
            let device = self.discover_device(bus, probe_base)?;
            table.bind(device)?;
            bound += 1;
        }
        Ok(bound)
    }
}

// =============================================================================
// Device Table
// =============================================================================

/// Bound devices indexed by slot
#[derive(Debug, Clone)]
pub struct DeviceTable<'m, const N: usize> {
    slots: [Option<Device<'m>>; N],
}

impl<'m, const N: usize> DeviceTable<'m, N> {
    /// Create an empty table (const, suitable for static initialization)
    pub const fn new() -> Self {
        Self { slots: [None; N] }
    }

    /// Number of slots
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Bind `device` to its slot
    ///
    /// # Errors
    ///
    /// - [`DiscoveryError::SlotOutOfRange`] if the slot is not in the table
    /// - [`DiscoveryError::SlotConflict`] if the slot is already bound
    pub fn bind(&mut self, device: Device<'m>) -> DiscoveryResult<&Device<'m>> {
        let slot = device.slot();
        let entry = self
            .slots
            .get_mut(slot as usize)
            .ok_or(DiscoveryError::SlotOutOfRange { slot, capacity: N })?;

        if entry.is_some() {
            #[cfg(feature = "defmt")]
            defmt::warn!("slot {} already bound", slot);
            return Err(DiscoveryError::SlotConflict { slot });
        }

        #[cfg(feature = "defmt")]
        defmt::info!(
            "bound {} in slot {} at {:#x}",
            device.device_type(),
            slot,
            device.base_address()
        );

        Ok(&*entry.insert(device))
    }

    /// Remove the device in `slot`
    pub fn unbind(&mut self, slot: u8) -> Option<Device<'m>> {
        let device = self.slots.get_mut(slot as usize)?.take();

        #[cfg(feature = "defmt")]
        if device.is_some() {
            defmt::info!("unbound slot {}", slot);
        }

        device
    }

    /// Device bound in `slot`
    pub fn get(&self, slot: u8) -> Option<&Device<'m>> {
        self.slots.get(slot as usize)?.as_ref()
    }

    /// Bound devices in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Device<'m>> {
        self.slots.iter().flatten()
    }

    /// Number of bound devices
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no device is bound
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }
}

impl<const N: usize> Default for DeviceTable<'_, N> {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
