//! Typed Register/Field Access
//!
//! A `no_std`, `no_alloc` access layer for hardware registers described by
//! named, validated bit fields.
//!
//! Registers are declared once as static tables of [`FieldDescriptor`]s and
//! [`RegisterDescriptor`]s and validated into a [`RegisterMap`]. A [`Device`]
//! binds a map to a base address and slot; an [`AccessSession`] reads and
//! writes fields by name with masked read-modify-write, so bits outside the
//! target field (reserved bits included) are never disturbed.
//!
//! # Architecture
//!
//! 1. **Map Layer** ([`map`]): field and register descriptors, `pack`/`unpack`
//!    and map validation
//! 2. **Device Layer** ([`device`]): device instances, identification and
//!    slot binding
//! 3. **Session Layer** ([`session`]): read, masked write and raw write with an
//!    explicit `Idle -> ReadPending -> WritePending` state machine
//! 4. **Bus Layer** ([`bus`]): the [`BusTransport`] trait and an I2C adapter
//! 5. **Sync Layer** (`sync`): shared bus and per-register locks for
//!    concurrent writers
//!
//! # Features
//!
//! - `defmt`: Enable defmt formatting for error types and debug logging
//! - `critical-section`: Enable `SharedBus`, `RegisterLocks` and `LockedDevice`
//! - `async`: Enable `AsyncBusTransport` and `AsyncAccessSession`
//!
//! # Example
//!
//! ```ignore
//! use ph_regfield::boards::daughterboard::{Daughterboard, DAUGHTERBOARD_ID, SLOT_ID_VAL};
//! use ph_regfield::{CatalogEntry, DeviceTable, Discovery};
//!
//! let map = Daughterboard::register_map()?;
//! let catalog = [CatalogEntry::new(Daughterboard::TYPE_ID, &map)];
//! let discovery = Discovery::new(Daughterboard::ident_layout(&map)?, &catalog)
//!     .with_config(Daughterboard::discovery_config(0x4000_0000));
//!
//! let device = discovery.discover_device(&mut bus, 0x4000_1000)?;
//! device.write_field(&mut bus, DAUGHTERBOARD_ID, SLOT_ID_VAL, 0)?;
//! ```

#![no_std]
#![deny(missing_docs)]
// Clippy lint levels live here; thresholds and config are in Cargo.toml.
#![deny(clippy::correctness)]
#![warn(
    clippy::suspicious,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::cloned_instead_of_copied,
    clippy::explicit_iter_loop,
    clippy::implicit_clone,
    clippy::inconsistent_struct_constructor,
    clippy::manual_assert,
    clippy::manual_let_else,
    clippy::match_same_arms,
    clippy::needless_pass_by_value,
    clippy::semicolon_if_nothing_returned,
    clippy::uninlined_format_args,
    clippy::unnested_or_patterns,
    clippy::std_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::alloc_instead_of_core
)]
#![allow(
    clippy::mod_module_files,
    clippy::self_named_module_files,
    clippy::similar_names,
    clippy::must_use_candidate,
    clippy::assertions_on_constants,
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_sign_loss,
    clippy::cast_lossless,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::module_name_repetitions,
    clippy::wildcard_imports,
    clippy::items_after_statements
)]

// =============================================================================
// Modules
// =============================================================================

pub mod boards;
pub mod bus;
pub mod constants;
pub mod device;
pub mod error;
pub mod map;
pub mod session;

#[cfg(any(test, feature = "critical-section"))]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub mod sync;

#[cfg(test)]
mod test_utils;

// =============================================================================
// Re-exports
// =============================================================================

// Error types
pub use error::{
    AccessError, AccessResult, BusPhase, DiscoveryError, DiscoveryResult, Error, FieldError,
    FieldResult, MapError, MapResult, Result, TransportError, TransportResult,
};

// Map types
pub use map::{
    FieldDescriptor, RegisterDescriptor, RegisterMap, RegisterWidth, list_fields, list_registers,
};

// Bus types
pub use bus::{BusTransport, I2cAddressWidth, I2cTransport};

#[cfg(any(test, feature = "async"))]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use bus::asynch::AsyncBusTransport;

// Device types
pub use device::{
    CatalogEntry, Device, DeviceIdent, DeviceTable, Discovery, DiscoveryConfig, IdentLayout,
};

// Session types
pub use session::{AccessSession, PendingWrite, SessionConfig, SessionState, WriteMode};

#[cfg(any(test, feature = "async"))]
#[cfg_attr(docsrs, doc(cfg(feature = "async")))]
pub use session::AsyncAccessSession;

// Sync types
#[cfg(any(test, feature = "critical-section"))]
#[cfg_attr(docsrs, doc(cfg(feature = "critical-section")))]
pub use sync::{LockedDevice, LockedWrite, RegisterGuard, RegisterKey, RegisterLocks, SharedBus};
