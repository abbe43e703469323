//! Board-specific register tables.
//!
//! This module provides ready-made register maps for common devices, in the
//! shape a register-map generator emits: `const` field and register tables
//! plus a small helper type per board.
//!
//! # Supported Boards
//!
//! - Daughterboard (control, status and identification registers, two slots)

pub mod daughterboard;
