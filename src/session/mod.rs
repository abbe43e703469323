//! Access sessions
//!
//! An [`AccessSession`] performs reads, masked read-modify-writes and raw
//! register writes against one [`Device`]. It tracks the in-flight operation
//! as an explicit state machine:
//!
//! ```text
//!            read issued              read returned
//!   Idle ───────────────► ReadPending ──────────────► Idle       (read paths)
//!                              │
//!                              │ new word computed
//!                              ▼
//!                         WritePending ─────────────► Idle       (commit / abandon)
//! ```
//!
//! Any bus failure returns the session to `Idle`. A failed read never issues
//! the write that depended on it.
//!
//! Sessions take no locks. Two sessions interleaving their read and write
//! phases on the same register can lose an update; use
//! [`LockedDevice`](crate::sync::LockedDevice) when more than one context
//! writes the same registers.

#[cfg(any(test, feature = "async"))]
pub mod asynch;

#[cfg(any(test, feature = "async"))]
pub use asynch::AsyncAccessSession;

use crate::bus::BusTransport;
use crate::device::Device;
use crate::error::{AccessError, AccessResult, BusPhase, Result, TransportError};
use crate::map::{FieldDescriptor, RegisterDescriptor};

// =============================================================================
// State and Configuration
// =============================================================================

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SessionState {
    /// No operation in flight
    #[default]
    Idle,
    /// Register read issued, waiting for the word
    ReadPending,
    /// New word computed, write not yet completed
    WritePending,
}

/// How [`AccessSession::write_register_raw`] treats bits outside the write mask
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WriteMode {
    /// Read first and keep the current reserved bits
    #[default]
    Masked,
    /// Write the whole word, reserved bits included, without reading
    Force,
}

/// Session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionConfig {
    verify: bool,
}

impl SessionConfig {
    /// Default configuration: no verification reads
    pub const fn new() -> Self {
        Self { verify: false }
    }

    /// Read every written register back and compare under its write mask
    #[must_use]
    pub const fn with_verify(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// Whether writes are verified
    pub const fn verify(&self) -> bool {
        self.verify
    }
}

// =============================================================================
// Word Helpers
// =============================================================================

/// Combine a caller word with the current word, keeping reserved bits
pub(crate) const fn merge_masked(register: &RegisterDescriptor<'_>, current: u64, word: u64) -> u64 {
    let mask = register.write_mask();
    (current & !mask) | (word & mask)
}

/// Word written by a [`WriteMode::Force`] raw write
pub(crate) const fn force_word(register: &RegisterDescriptor<'_>, word: u64) -> u64 {
    word & register.width().mask()
}

/// Compare a verification read against the written word
pub(crate) const fn check_verify(
    register: &RegisterDescriptor<'_>,
    written: u64,
    read_back: u64,
) -> AccessResult<()> {
    let mask = register.write_mask();
    let expected = written & mask;
    let actual = read_back & mask;
    if expected == actual {
        Ok(())
    } else {
        Err(AccessError::VerifyMismatch {
            register: register.name(),
            expected,
            actual,
        })
    }
}

/// Wrap a transport failure with the register, address and phase it hit
pub(crate) fn bus_fault(
    register: &RegisterDescriptor<'_>,
    address: usize,
    phase: BusPhase,
) -> impl FnOnce(TransportError) -> AccessError + use<> {
    let register = register.name();
    move |reason| {
        #[cfg(feature = "defmt")]
        defmt::warn!(
            "{} {} at {:#x} failed: {}",
            register,
            phase,
            address,
            reason
        );
        AccessError::BusFault {
            register,
            address,
            phase,
            reason,
        }
    }
}

/// Absolute address of `register` on `device`
///
/// An address past `usize::MAX` cannot be reached by any transport and is
/// reported as a [`TransportError::AddressUnmapped`] fault at the device
/// base before any bus traffic.
pub(crate) fn register_address(
    device: &Device<'_>,
    register: &RegisterDescriptor<'_>,
    phase: BusPhase,
) -> AccessResult<usize> {
    device.address_of(register).ok_or_else(|| {
        bus_fault(register, device.base_address(), phase)(TransportError::AddressUnmapped)
    })
}

// =============================================================================
// Staged Writes
// =============================================================================

/// Result of the read and modify phases of a field write
#[derive(Debug, Clone, Copy)]
pub(crate) struct StagedWrite<'m> {
    pub(crate) register: &'m RegisterDescriptor<'m>,
    pub(crate) field: &'m FieldDescriptor,
    pub(crate) old_word: u64,
    pub(crate) new_word: u64,
}

// =============================================================================
// Access Session
// =============================================================================

/// Register access against one device
#[derive(Debug)]
pub struct AccessSession<'d, 'm> {
    device: &'d Device<'m>,
    config: SessionConfig,
    state: SessionState,
    in_flight: Option<u64>,
}

impl<'d, 'm> AccessSession<'d, 'm> {
    /// Start an idle session on `device`
    pub const fn new(device: &'d Device<'m>) -> Self {
        Self::with_config(device, SessionConfig::new())
    }

    /// Start an idle session on `device` with `config`
    pub const fn with_config(device: &'d Device<'m>, config: SessionConfig) -> Self {
        Self {
            device,
            config,
            state: SessionState::Idle,
            in_flight: None,
        }
    }

    /// Current state
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// Word being written while in [`SessionState::WritePending`]
    pub const fn in_flight_word(&self) -> Option<u64> {
        self.in_flight
    }

    /// Device this session accesses
    pub const fn device(&self) -> &'d Device<'m> {
        self.device
    }

    /// Session configuration
    pub const fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Read a whole register word
    pub fn read_register<B: BusTransport>(&mut self, bus: &mut B, register: &'static str) -> Result<u64> {
        let reg = self.device.register(register)?;
        let word = self.read_word(bus, reg)?;
        self.state = SessionState::Idle;
        Ok(word)
    }

    /// Read one field value
    pub fn read_field<B: BusTransport>(
        &mut self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
    ) -> Result<u64> {
        let (reg, fld) = self.device.field(register, field)?;
        let word = self.read_word(bus, reg)?;
        self.state = SessionState::Idle;
        Ok(fld.unpack(word))
    }

    /// Set one field, preserving every other bit of the register
    ///
    /// Reads the register, replaces the field's bits and writes the word
    /// back. The value is checked against the field width before any bus
    /// traffic. Returns the word written.
    ///
    /// # Errors
    ///
    /// - [`AccessError::UnknownRegister`] / [`AccessError::UnknownField`]
    /// - [`FieldError::ValueOutOfRange`](crate::error::FieldError::ValueOutOfRange)
    /// - [`AccessError::BusFault`] from the read, write or verify phase
    /// - [`AccessError::VerifyMismatch`] if verification is enabled
    pub fn write_field<B: BusTransport>(
        &mut self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
        value: u64,
    ) -> Result<u64> {
        self.prepare_field_write(bus, register, field, value)?.commit(bus)
    }

    /// Run the read and modify phases of a field write
    ///
    /// The returned [`PendingWrite`] holds the session in
    /// [`SessionState::WritePending`] until it is committed or dropped.
    pub fn prepare_field_write<'s, B: BusTransport>(
        &'s mut self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
        value: u64,
    ) -> Result<PendingWrite<'s, 'd, 'm>> {
        let staged = self.begin_field_write(bus, register, field, value)?;
        Ok(PendingWrite {
            session: self,
            staged,
        })
    }

    /// Write a whole register word
    ///
    /// In [`WriteMode::Masked`] the current word is read first and only the
    /// bits under the register's write mask are taken from `word`. In
    /// [`WriteMode::Force`] `word` is written as-is. Returns the word written.
    pub fn write_register_raw<B: BusTransport>(
        &mut self,
        bus: &mut B,
        register: &'static str,
        word: u64,
        mode: WriteMode,
    ) -> Result<u64> {
        let reg = self.device.register(register)?;
        let new_word = match mode {
            WriteMode::Masked => {
                let current = self.read_word(bus, reg)?;
                let merged = merge_masked(reg, current, word);

                #[cfg(feature = "defmt")]
                if word & reg.reserved_mask() & reg.width().mask() != 0 {
                    defmt::debug!("{}: reserved bits of {:#x} ignored", reg.name(), word);
                }

                merged
            }
            WriteMode::Force => force_word(reg, word),
        };
        self.finish_write(bus, reg, new_word)
    }

    // -------------------------------------------------------------------------
    // Phases
    // -------------------------------------------------------------------------

    /// Read and modify phases of a field write, leaving the session in
    /// `WritePending`
    pub(crate) fn begin_field_write<B: BusTransport>(
        &mut self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
        value: u64,
    ) -> Result<StagedWrite<'m>> {
        let (reg, fld) = self.device.field(register, field)?;
        fld.pack(value)?;

        let old_word = self.read_word(bus, reg)?;
        let new_word = fld.insert(old_word, value)?;

        self.state = SessionState::WritePending;
        self.in_flight = Some(new_word);

        #[cfg(feature = "defmt")]
        defmt::trace!(
            "{}.{} = {:#x}: {:#x} -> {:#x}",
            reg.name(),
            fld.name(),
            value,
            old_word,
            new_word
        );

        Ok(StagedWrite {
            register: reg,
            field: fld,
            old_word,
            new_word,
        })
    }

    /// Write phase (plus optional verify), ending in `Idle`
    pub(crate) fn finish_write<B: BusTransport>(
        &mut self,
        bus: &mut B,
        register: &RegisterDescriptor<'_>,
        word: u64,
    ) -> Result<u64> {
        self.state = SessionState::WritePending;
        self.in_flight = Some(word);

        let result = self.write_word(bus, register, word);

        self.state = SessionState::Idle;
        self.in_flight = None;
        result.map(|()| word).map_err(Into::into)
    }

    /// Drop a staged write without touching the bus
    pub(crate) fn abandon(&mut self) {
        if self.state != SessionState::Idle {
            #[cfg(feature = "defmt")]
            defmt::debug!("abandoned staged write {:?}", self.in_flight);
            self.state = SessionState::Idle;
            self.in_flight = None;
        }
    }

    /// Issue one read, leaving the session in `ReadPending` on success and
    /// `Idle` on failure
    fn read_word<B: BusTransport>(&mut self, bus: &mut B, register: &RegisterDescriptor<'_>) -> AccessResult<u64> {
        let address = register_address(self.device, register, BusPhase::Read)?;
        self.state = SessionState::ReadPending;

        match bus.read(address, register.width()) {
            Ok(word) => Ok(word & register.width().mask()),
            Err(reason) => {
                self.state = SessionState::Idle;
                Err(bus_fault(register, address, BusPhase::Read)(reason))
            }
        }
    }

    fn write_word<B: BusTransport>(
        &self,
        bus: &mut B,
        register: &RegisterDescriptor<'_>,
        word: u64,
    ) -> AccessResult<()> {
        let address = register_address(self.device, register, BusPhase::Write)?;
        bus.write(address, register.width(), word)
            .map_err(bus_fault(register, address, BusPhase::Write))?;

        if self.config.verify {
            let read_back = bus
                .read(address, register.width())
                .map_err(bus_fault(register, address, BusPhase::Verify))?;
            check_verify(register, word, read_back).map_err(|e| {
                #[cfg(feature = "defmt")]
                defmt::warn!("{}", e);
                e
            })?;
        }
        Ok(())
    }
}

// =============================================================================
// Pending Write
// =============================================================================

/// Field write whose new word is computed but not yet written
///
/// Dropping it without [`commit`](Self::commit) abandons the write and
/// returns the session to `Idle`.
#[derive(Debug)]
#[must_use = "a pending write does nothing until committed"]
pub struct PendingWrite<'s, 'd, 'm> {
    session: &'s mut AccessSession<'d, 'm>,
    staged: StagedWrite<'m>,
}

impl<'m> PendingWrite<'_, '_, 'm> {
    /// Register being written
    pub fn register(&self) -> &'m RegisterDescriptor<'m> {
        self.staged.register
    }

    /// Field being written
    pub fn field(&self) -> &'m FieldDescriptor {
        self.staged.field
    }

    /// Word read during the read phase
    pub fn old_word(&self) -> u64 {
        self.staged.old_word
    }

    /// Word that will be written
    pub fn new_word(&self) -> u64 {
        self.staged.new_word
    }

    /// Write the new word, returning it
    pub fn commit<B: BusTransport>(mut self, bus: &mut B) -> Result<u64> {
        let staged = self.staged;
        self.session.finish_write(bus, staged.register, staged.new_word)
    }
}

impl Drop for PendingWrite<'_, '_, '_> {
    fn drop(&mut self) {
        self.session.abandon();
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
