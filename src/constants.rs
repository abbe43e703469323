//! Centralized Constants
//!
//! Single source of truth for the numeric defaults and framing limits used
//! by the access layer.

// =============================================================================
// Words
// =============================================================================

/// Largest register word in bytes (64-bit registers)
pub const MAX_WORD_BYTES: usize = 8;

// =============================================================================
// I2C Framing
// =============================================================================

/// Largest register address sent on I2C, in bytes
pub const I2C_MAX_ADDRESS_BYTES: usize = 2;

// =============================================================================
// Discovery
// =============================================================================

/// Default address distance between consecutive slots sharing one bus
pub const DEFAULT_SLOT_STRIDE: usize = 0x1000;

/// Default number of slots in a [`DeviceTable`](crate::device::DeviceTable)
pub const DEFAULT_SLOT_COUNT: usize = 2;
