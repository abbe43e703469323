//! Error types for register map construction and register access
//!
//! Errors are organized by the stage at which they can occur:
//! - [`MapError`]: Register map construction (fatal to the map)
//! - [`FieldError`]: Caller-supplied field value validation
//! - [`TransportError`]: Failures reported by a bus transport
//! - [`AccessError`]: Runtime register access failures
//! - [`DiscoveryError`]: Device discovery and slot binding failures
//!
//! The unified [`Error`] enum wraps all domain errors and is returned
//! by the session and device methods.

use core::fmt;

// =============================================================================
// Map Construction Errors
// =============================================================================

/// Register map construction errors
///
/// Any of these rejects the whole map; a partially valid map is never built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MapError {
    /// Two fields of one register share at least one mask bit
    OverlappingFields {
        /// Register containing both fields
        register: &'static str,
        /// Field declared first
        first: &'static str,
        /// Field declared second
        second: &'static str,
    },
    /// A field has zero width or extends past the register width
    FieldOutOfRange {
        /// Register containing the field
        register: &'static str,
        /// Offending field
        field: &'static str,
        /// Field bit offset
        offset: u8,
        /// Field bit width
        width: u8,
        /// Register width in bits
        register_bits: u8,
    },
    /// Two registers, or two fields of one register, share a name
    DuplicateName {
        /// Register holding the duplicated field, `None` for register names
        register: Option<&'static str>,
        /// The duplicated name
        name: &'static str,
    },
    /// Two registers share an address
    DuplicateAddress {
        /// Register declared first
        first: &'static str,
        /// Register declared second
        second: &'static str,
        /// The shared address offset
        address: usize,
    },
}

impl fmt::Display for MapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MapError::OverlappingFields {
                register,
                first,
                second,
            } => write!(f, "fields {first} and {second} of {register} overlap"),
            MapError::FieldOutOfRange {
                register,
                field,
                offset,
                width,
                register_bits,
            } => write!(
                f,
                "field {register}.{field} (offset {offset}, width {width}) does not fit a {register_bits}-bit register"
            ),
            MapError::DuplicateName {
                register: Some(register),
                name,
            } => write!(f, "duplicate field name {name} in {register}"),
            MapError::DuplicateName {
                register: None,
                name,
            } => write!(f, "duplicate register name {name}"),
            MapError::DuplicateAddress {
                first,
                second,
                address,
            } => write!(f, "registers {first} and {second} share address {address:#x}"),
        }
    }
}

// =============================================================================
// Field Value Errors
// =============================================================================

/// Field value validation errors
///
/// Always recoverable: only the single operation is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldError {
    /// Value needs more bits than the field provides
    ValueOutOfRange {
        /// Field the value was meant for
        field: &'static str,
        /// Offending value
        value: u64,
        /// Largest value the field can hold
        max: u64,
    },
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldError::ValueOutOfRange { field, value, max } => {
                write!(f, "value {value:#x} out of range for {field} (max {max:#x})")
            }
        }
    }
}

// =============================================================================
// Transport Errors
// =============================================================================

/// Failures reported by a [`BusTransport`](crate::bus::BusTransport)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// Transaction did not complete in time
    Timeout,
    /// Device did not acknowledge the transaction
    NoAcknowledge,
    /// Address cannot be reached through this transport
    AddressUnmapped,
    /// Link-level failure (bus error, arbitration loss, framing)
    Link,
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TransportError {
    /// Returns a human-readable description of the error
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            TransportError::Timeout => "bus transaction timed out",
            TransportError::NoAcknowledge => "no acknowledge",
            TransportError::AddressUnmapped => "address unmapped",
            TransportError::Link => "link error",
        }
    }
}

// =============================================================================
// Access Errors
// =============================================================================

/// Bus transaction phase in which a fault occurred
///
/// A `Read` fault means nothing was written. `Write` and `Verify` faults
/// leave the register contents undefined until re-read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BusPhase {
    /// Reading the current word
    Read,
    /// Writing the new word
    Write,
    /// Re-reading the word for verification
    Verify,
}

impl BusPhase {
    /// Returns a short name for the phase
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            BusPhase::Read => "read",
            BusPhase::Write => "write",
            BusPhase::Verify => "verify",
        }
    }
}

/// Runtime register access errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessError {
    /// Register name not present in the device's map
    UnknownRegister {
        /// Requested register name
        register: &'static str,
    },
    /// Field name not present in the register
    UnknownField {
        /// Register that was searched
        register: &'static str,
        /// Requested field name
        field: &'static str,
    },
    /// Transport failed during a transaction
    BusFault {
        /// Register being accessed
        register: &'static str,
        /// Absolute bus address
        address: usize,
        /// Phase of the operation that failed
        phase: BusPhase,
        /// Transport failure reason
        reason: TransportError,
    },
    /// Verification read did not match the written word
    VerifyMismatch {
        /// Register being verified
        register: &'static str,
        /// Expected word (restricted to the write mask)
        expected: u64,
        /// Word read back (restricted to the write mask)
        actual: u64,
    },
    /// Register is locked by another writer
    RegisterBusy {
        /// Register that could not be locked
        register: &'static str,
    },
}

impl fmt::Display for AccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessError::UnknownRegister { register } => write!(f, "unknown register {register}"),
            AccessError::UnknownField { register, field } => {
                write!(f, "unknown field {field} in {register}")
            }
            AccessError::BusFault {
                register,
                address,
                phase,
                reason,
            } => write!(
                f,
                "bus fault on {} of {register} at {address:#x}: {}",
                phase.as_str(),
                reason.as_str()
            ),
            AccessError::VerifyMismatch {
                register,
                expected,
                actual,
            } => write!(
                f,
                "verify mismatch on {register}: expected {expected:#x}, read {actual:#x}"
            ),
            AccessError::RegisterBusy { register } => write!(f, "register {register} is locked"),
        }
    }
}

// =============================================================================
// Discovery Errors
// =============================================================================

/// Device discovery and binding errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscoveryError {
    /// No register map is registered for the decoded device type
    UnrecognizedDeviceType {
        /// Decoded device-type value
        device_type: u64,
    },
    /// Slot already holds a bound device
    SlotConflict {
        /// Contested slot
        slot: u8,
    },
    /// Decoded slot does not fit the device table
    SlotOutOfRange {
        /// Decoded slot
        slot: u8,
        /// Number of slots in the table
        capacity: usize,
    },
    /// Base address of the decoded slot does not fit in `usize`
    AddressOverflow {
        /// Decoded slot
        slot: u8,
    },
    /// Identification slot sub-field is wider than a slot number
    SlotFieldTooWide {
        /// Slot sub-field name
        field: &'static str,
        /// Sub-field width in bits
        width: u8,
        /// Widest supported slot sub-field
        max: u8,
    },
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::UnrecognizedDeviceType { device_type } => {
                write!(f, "unrecognized device type {device_type:#x}")
            }
            DiscoveryError::SlotConflict { slot } => write!(f, "slot {slot} already bound"),
            DiscoveryError::SlotOutOfRange { slot, capacity } => {
                write!(f, "slot {slot} out of range (capacity {capacity})")
            }
            DiscoveryError::AddressOverflow { slot } => {
                write!(f, "base address of slot {slot} overflows the address space")
            }
            DiscoveryError::SlotFieldTooWide { field, width, max } => {
                write!(f, "slot field {field} is {width} bits wide (max {max})")
            }
        }
    }
}

// =============================================================================
// Unified Error Type
// =============================================================================

/// This enum wraps all domain-specific errors for unified error handling.
///
/// Match on the inner domain error for specific handling:
/// ```ignore
/// match result {
///     Err(Error::Field(FieldError::ValueOutOfRange { max, .. })) => { /* ... */ }
///     Err(Error::Access(AccessError::BusFault { phase: BusPhase::Read, .. })) => { /* ... */ }
///     _ => {}
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Map construction error
    Map(MapError),
    /// Field value error
    Field(FieldError),
    /// Register access error
    Access(AccessError),
    /// Discovery error
    Discovery(DiscoveryError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Map(e) => write!(f, "map: {e}"),
            Error::Field(e) => write!(f, "field: {e}"),
            Error::Access(e) => write!(f, "access: {e}"),
            Error::Discovery(e) => write!(f, "discovery: {e}"),
        }
    }
}

impl From<MapError> for Error {
    fn from(e: MapError) -> Self {
        Error::Map(e)
    }
}

impl From<FieldError> for Error {
    fn from(e: FieldError) -> Self {
        Error::Field(e)
    }
}

impl From<AccessError> for Error {
    fn from(e: AccessError) -> Self {
        Error::Access(e)
    }
}

impl From<DiscoveryError> for Error {
    fn from(e: DiscoveryError) -> Self {
        Error::Discovery(e)
    }
}

impl core::error::Error for MapError {}
impl core::error::Error for FieldError {}
impl core::error::Error for TransportError {}
impl core::error::Error for AccessError {}
impl core::error::Error for DiscoveryError {}
impl core::error::Error for Error {}

/// Result type alias for register access operations
pub type Result<T> = core::result::Result<T, Error>;

/// Result type alias for map construction
pub type MapResult<T> = core::result::Result<T, MapError>;

/// Result type alias for field packing
pub type FieldResult<T> = core::result::Result<T, FieldError>;

/// Result type alias for access-only failures
pub type AccessResult<T> = core::result::Result<T, AccessError>;

/// Result type alias for discovery
pub type DiscoveryResult<T> = core::result::Result<T, DiscoveryError>;

/// Result type alias for bus transports
pub type TransportResult<T> = core::result::Result<T, TransportError>;

// =============================================================================
// Unit Tests
// =============================================================================
