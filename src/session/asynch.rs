//! Async access session
//!
//! Same operations and state machine as [`AccessSession`](super::AccessSession)
//! over an [`AsyncBusTransport`]. Each read completes before the write that
//! depends on it is issued.

use super::{
    SessionConfig, SessionState, WriteMode, bus_fault, check_verify, force_word, merge_masked,
    register_address,
};
use crate::bus::asynch::AsyncBusTransport;
use crate::device::Device;
use crate::error::{AccessResult, BusPhase, Result};
use crate::map::RegisterDescriptor;

/// Register access against one device over an async bus
#[derive(Debug)]
pub struct AsyncAccessSession<'d, 'm> {
    device: &'d Device<'m>,
    config: SessionConfig,
    state: SessionState,
    in_flight: Option<u64>,
}

impl<'d, 'm> AsyncAccessSession<'d, 'm> {
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

    /// Read a whole register word
    pub async fn read_register<B: AsyncBusTransport>(
        &mut self,
        bus: &mut B,
        register: &'static str,
    ) -> Result<u64> {
        let reg = self.device.register(register)?;
        let word = self.read_word(bus, reg).await?;
        self.state = SessionState::Idle;
        Ok(word)
    }

    /// Read one field value
    pub async fn read_field<B: AsyncBusTransport>(
        &mut self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
    ) -> Result<u64> {
        let (reg, fld) = self.device.field(register, field)?;
        let word = self.read_word(bus, reg).await?;
        self.state = SessionState::Idle;
        Ok(fld.unpack(word))
    }

    /// Set one field, preserving every other bit of the register
    pub async fn write_field<B: AsyncBusTransport>(
        &mut self,
        bus: &mut B,
        register: &'static str,
        field: &'static str,
        value: u64,
    ) -> Result<u64> {
        let (reg, fld) = self.device.field(register, field)?;
        fld.pack(value)?;

        let old_word = self.read_word(bus, reg).await?;
        let new_word = fld.insert(old_word, value)?;
        self.finish_write(bus, reg, new_word).await
    }

    /// Write a whole register word (see [`WriteMode`])
    pub async fn write_register_raw<B: AsyncBusTransport>(
        &mut self,
        bus: &mut B,
        register: &'static str,
        word: u64,
        mode: WriteMode,
    ) -> Result<u64> {
        let reg = self.device.register(register)?;
        let new_word = match mode {
            WriteMode::Masked => {
                let current = self.read_word(bus, reg).await?;
                let merged = merge_masked(reg, current, word);

                #[cfg(feature = "defmt")]
                if word & reg.reserved_mask() & reg.width().mask() != 0 {
                    defmt::debug!("{}: reserved bits of {:#x} ignored", reg.name(), word);
                }

                merged
            }
            WriteMode::Force => force_word(reg, word),
        };
        self.finish_write(bus, reg, new_word).await
    }

    async fn finish_write<B: AsyncBusTransport>(
        &mut self,
        bus: &mut B,
        register: &RegisterDescriptor<'_>,
        word: u64,
    ) -> Result<u64> {
        self.state = SessionState::WritePending;
        self.in_flight = Some(word);

        let result = self.write_word(bus, register, word).await;

        self.state = SessionState::Idle;
        self.in_flight = None;
        result.map(|()| word).map_err(Into::into)
    }

    async fn read_word<B: AsyncBusTransport>(
        &mut self,
        bus: &mut B,
        register: &RegisterDescriptor<'_>,
    ) -> AccessResult<u64> {
        let address = register_address(self.device, register, BusPhase::Read)?;
        self.state = SessionState::ReadPending;

        match bus.read(address, register.width()).await {
            Ok(word) => Ok(word & register.width().mask()),
            Err(reason) => {
                self.state = SessionState::Idle;
                Err(bus_fault(register, address, BusPhase::Read)(reason))
            }
        }
    }

    async fn write_word<B: AsyncBusTransport>(
        &self,
        bus: &mut B,
        register: &RegisterDescriptor<'_>,
        word: u64,
    ) -> AccessResult<()> {
        let address = register_address(self.device, register, BusPhase::Write)?;
        bus.write(address, register.width(), word)
            .await
            .map_err(bus_fault(register, address, BusPhase::Write))?;

        if self.config.verify() {
            let read_back = bus
                .read(address, register.width())
                .await
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
