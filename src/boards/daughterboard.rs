//! Daughterboard register map.
//!
//! Two daughterboard slots share one bus. Each slot exposes the same layout;
//! the identification word at `0x630` carries the board type in its low half
//! and the slot it is plugged into in bit 16.
//!
//! | Register | Offset | Fields |
//! |----------|--------|--------|
//! | `DbControl` | `0x600` | `TxEnable`[0], `RxEnable`[1], `LedMode`[6:4], `Attenuation`[13:8] |
//! | `DbStatus` | `0x604` | `PllLocked`[0], `Temperature`[15:8] |
//! | `DaughterboardId` | `0x630` | `DbIdVal`[15:0], `SlotIdVal`[16] |

use crate::constants::{DEFAULT_SLOT_COUNT, DEFAULT_SLOT_STRIDE};
use crate::device::{DiscoveryConfig, IdentLayout};
use crate::error::{MapResult, Result};
use crate::map::{FieldDescriptor, RegisterDescriptor, RegisterMap, RegisterWidth};

// =============================================================================
// Names
// =============================================================================

/// Control register
pub const DB_CONTROL: &str = "DbControl";
/// Status register
pub const DB_STATUS: &str = "DbStatus";
/// Identification register
pub const DAUGHTERBOARD_ID: &str = "DaughterboardId";

/// Transmit path enable
pub const TX_ENABLE: &str = "TxEnable";
/// Receive path enable
pub const RX_ENABLE: &str = "RxEnable";
/// Front-panel LED mode
pub const LED_MODE: &str = "LedMode";
/// Attenuator setting in 0.5 dB steps
pub const ATTENUATION: &str = "Attenuation";
/// LO synthesizer locked
pub const PLL_LOCKED: &str = "PllLocked";
/// Board temperature in degrees Celsius
pub const TEMPERATURE: &str = "Temperature";
/// Board type identifier
pub const DB_ID_VAL: &str = "DbIdVal";
/// Slot the board is plugged into
pub const SLOT_ID_VAL: &str = "SlotIdVal";

// =============================================================================
// Tables
// =============================================================================

/// `DbControl` fields
pub const CONTROL_FIELDS: [FieldDescriptor; 4] = [
    FieldDescriptor::bit(TX_ENABLE, 0),
    FieldDescriptor::bit(RX_ENABLE, 1),
    FieldDescriptor::new(LED_MODE, 4, 3),
    FieldDescriptor::new(ATTENUATION, 8, 6),
];

/// `DbStatus` fields
pub const STATUS_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::bit(PLL_LOCKED, 0),
    FieldDescriptor::new(TEMPERATURE, 8, 8),
];

/// `DaughterboardId` fields
pub const ID_FIELDS: [FieldDescriptor; 2] = [
    FieldDescriptor::new(DB_ID_VAL, 0, 16),
    FieldDescriptor::bit(SLOT_ID_VAL, 16),
];

/// All daughterboard registers
pub static REGISTERS: [RegisterDescriptor<'static>; 3] = [
    RegisterDescriptor::new(DB_CONTROL, 0x600, RegisterWidth::Bits32, &CONTROL_FIELDS),
    RegisterDescriptor::new(DB_STATUS, 0x604, RegisterWidth::Bits32, &STATUS_FIELDS),
    RegisterDescriptor::new(DAUGHTERBOARD_ID, 0x630, RegisterWidth::Bits32, &ID_FIELDS),
];

// =============================================================================
// Board Helper
// =============================================================================

/// Daughterboard constants and helpers.
pub struct Daughterboard;

impl Daughterboard {
    /// Device type name of the map.
    pub const DEVICE_TYPE: &'static str = "daughterboard";

    /// Value of `DbIdVal` identifying this board.
    pub const TYPE_ID: u64 = 0x0005;

    /// Number of slots on the bus (`SlotIdVal` is one bit).
    pub const SLOT_COUNT: usize = DEFAULT_SLOT_COUNT;

    /// Address distance between the two slots.
    pub const SLOT_STRIDE: usize = DEFAULT_SLOT_STRIDE;

    /// Build the validated register map.
    pub fn register_map() -> MapResult<RegisterMap<'static>> {
        RegisterMap::build(Self::DEVICE_TYPE, &REGISTERS)
    }

    /// Identification layout over `map` (`DbIdVal` + `SlotIdVal`).
    pub fn ident_layout<'m>(map: &RegisterMap<'m>) -> Result<IdentLayout<'m>> {
        IdentLayout::new(map, DAUGHTERBOARD_ID, DB_ID_VAL, SLOT_ID_VAL)
    }

    /// Discovery configuration for slots starting at `bus_base`.
    #[must_use]
    pub const fn discovery_config(bus_base: usize) -> DiscoveryConfig {
        DiscoveryConfig::new()
            .with_bus_base(bus_base)
            .with_slot_stride(Self::SLOT_STRIDE)
    }
}
