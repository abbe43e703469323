//! Synchronization and Concurrency Support
//!
//! A plain [`AccessSession`](crate::session::AccessSession) is safe only while
//! one context writes a given register. This module provides the pieces that
//! make concurrent writers safe:
//!
//! - **Shared bus** (`shared`): [`SharedBus`] runs each bus transaction inside
//!   a critical section so several contexts can use one transport.
//! - **Register locks** (`lock`): [`RegisterLocks`] holds a fixed table of
//!   locked `(device, register)` keys; [`RegisterGuard`] releases on drop.
//! - **Locked device** (`locked`): [`LockedDevice`] holds the register lock for
//!   the whole read-modify-write, so concurrent field writes to the same
//!   register never lose an update.
//!
//! # Feature Flags
//!
//! - `critical-section`: Enables this module
//!
//! # Example
//!
//! ```ignore
//! use ph_regfield::sync::{LockedDevice, RegisterLocks, SharedBus};
//!
//! static BUS: SharedBus<MyTransport> = SharedBus::new(MyTransport::new());
//! static LOCKS: RegisterLocks<4> = RegisterLocks::new();
//!
//! let locked = LockedDevice::new(&device, &LOCKS);
//!
//! // Main loop and ISR can both do this safely
//! locked.write_field(&mut &BUS, "DbControl", "TxEnable", 1)?;
//! ```

mod lock;
mod locked;
mod shared;

pub use lock::{RegisterGuard, RegisterKey, RegisterLocks};
pub use locked::{LockedDevice, LockedWrite};
pub use shared::SharedBus;
