use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::{
    bus::BusTransport,
    config::BusConfig,
    error::{Error, Result},
    register::{ALL_OUTPUTS, PowerRegisters, read_u16, write_u16},
    types::{Channel, ChannelOutOfRange, PowerMask},
};

/// An open, configured connection to the power switch.
///
/// You can create a PowerSwitch using any bus which implements [`BusTransport`]. It holds no copy of the output
/// state: every read goes to the hardware, and every change is "read the mask, combine, write it back".
///
/// All register access goes through one lock which is held for a whole read-modify-write, so a `PowerSwitch` can be
/// shared between threads without two updates clobbering each other.
pub struct PowerSwitch<B: BusTransport> {
    session: Mutex<Session<B>>,
    slave_address: u8,
    registers: PowerRegisters,
}

struct Session<B> {
    bus: B,
    initialized: bool,
}

impl<B: BusTransport> Session<B> {
    /// The bus, provided the session has not been deinitialized.
    fn bus(&mut self) -> Result<&mut B, B::Error> {
        if self.initialized {
            Ok(&mut self.bus)
        } else {
            Err(Error::NotInitialized)
        }
    }
}

impl<B: BusTransport> PowerSwitch<B> {
    /// Open `bus` at the configured device, select the slave and set all 16 lines to output.
    ///
    /// Failing to open the bus or to select the slave is fatal. Failing to apply the configured timeout or to write
    /// the I/O direction register is only logged, the hardware may already default to outputs.
    pub fn initialize(mut bus: B, config: &BusConfig) -> Result<Self, B::Error> {
        log::info!(
            "Opening {}, at 0x{:02X} with reg 0x{:02X} and ioreg 0x{:02X}",
            config.device().display(),
            config.slave_address,
            config.registers.data,
            config.registers.io_direction
        );

        bus.open(config.device()).map_err(Error::OpenFailed)?;

        if let Err(err) = bus.set_timeout(config.timeout) {
            log::warn!("Could not set bus timeout on {}: {err}", config.device().display());
        }

        if let Err(error) = bus.configure_target(config.slave_address) {
            bus.close();
            return Err(Error::TargetAcquireFailed {
                address: config.slave_address,
                error,
            });
        }

        if let Err(err) = write_u16(&mut bus, config.registers.io_direction, ALL_OUTPUTS) {
            log::warn!("Could not set IO registers to output: {err}");
        }

        Ok(Self {
            session: Mutex::new(Session {
                bus,
                initialized: true,
            }),
            slave_address: config.slave_address,
            registers: config.registers,
        })
    }

    /// Close the bus. Every later operation fails with [`Error::NotInitialized`] without touching the bus.
    ///
    /// Safe to call more than once. Dropping the switch does the same.
    pub fn deinitialize(&self) {
        let mut session = self.lock();
        session.initialized = false;
        session.bus.close();
    }

    pub fn is_initialized(&self) -> bool {
        self.lock().initialized
    }

    pub fn slave_address(&self) -> u8 {
        self.slave_address
    }

    pub fn registers(&self) -> PowerRegisters {
        self.registers
    }

    /// Read the current output mask from the hardware.
    pub fn mask_read(&self) -> Result<PowerMask, B::Error> {
        let mut session = self.lock();
        self.read_mask(session.bus()?)
    }

    /// Write `mask` to the hardware as is. Channels not in `mask` are switched off.
    pub fn mask_set(&self, mask: impl Into<PowerMask>) -> Result<(), B::Error> {
        let mut session = self.lock();
        self.write_mask(session.bus()?, mask.into())
    }

    /// Switch on every channel in `mask`, leaving the others as they are.
    pub fn mask_enable(&self, mask: impl Into<PowerMask>) -> Result<(), B::Error> {
        let mask = mask.into();
        self.modify(|current| {
            log::debug!("Current mask: {current}, enabling mask: {mask}");
            current.union(mask)
        })
    }

    /// Switch off every channel in `mask`, leaving the others as they are.
    pub fn mask_disable(&self, mask: impl Into<PowerMask>) -> Result<(), B::Error> {
        let mask = mask.into();
        self.modify(|current| {
            log::debug!("Current mask: {current}, disabling mask: {mask}");
            current.difference(mask)
        })
    }

    /// Switch on a single channel.
    ///
    /// Accepts a [`Channel`] or a raw channel ID. IDs outside of 1..=16 are rejected before the bus is touched.
    pub fn enable<C>(&self, channel: C) -> Result<(), B::Error>
    where
        C: TryInto<Channel>,
        C::Error: Into<ChannelOutOfRange>,
    {
        let channel = Self::validate(channel)?;
        self.mask_enable(channel.bit())
    }

    /// Switch off a single channel. Same validation as [`enable`](Self::enable).
    pub fn disable<C>(&self, channel: C) -> Result<(), B::Error>
    where
        C: TryInto<Channel>,
        C::Error: Into<ChannelOutOfRange>,
    {
        let channel = Self::validate(channel)?;
        self.mask_disable(channel.bit())
    }

    /// Whether `channel` is currently energized.
    pub fn is_enabled(&self, channel: Channel) -> Result<bool, B::Error> {
        Ok(self.mask_read()?.contains(channel))
    }

    /// Set the outputs from a sequence of per-channel flags, element `i` being channel `i + 1`.
    pub fn set_channels(&self, flags: &[bool]) -> Result<(), B::Error> {
        self.mask_set(PowerMask::from_flags(flags))
    }

    /// Switch on every flagged channel, leaving the others as they are.
    pub fn enable_channels(&self, flags: &[bool]) -> Result<(), B::Error> {
        self.mask_enable(PowerMask::from_flags(flags))
    }

    /// Switch off every flagged channel, leaving the others as they are.
    pub fn disable_channels(&self, flags: &[bool]) -> Result<(), B::Error> {
        self.mask_disable(PowerMask::from_flags(flags))
    }

    pub fn enable_all(&self) -> Result<(), B::Error> {
        self.mask_set(PowerMask::ALL)
    }

    pub fn disable_all(&self) -> Result<(), B::Error> {
        self.mask_set(PowerMask::EMPTY)
    }

    fn validate<C>(channel: C) -> Result<Channel, B::Error>
    where
        C: TryInto<Channel>,
        C::Error: Into<ChannelOutOfRange>,
    {
        channel.try_into().map_err(|err| {
            let err = err.into();
            log::warn!("{err}");
            Error::from(err)
        })
    }

    /// Read-modify-write of the data register, all under one lock.
    fn modify(&self, f: impl FnOnce(PowerMask) -> PowerMask) -> Result<(), B::Error> {
        let mut session = self.lock();
        let bus = session.bus()?;
        let current = self.read_mask(bus)?;
        let next = f(current);
        log::debug!("Setting mask: {next}");
        self.write_mask(bus, next)
    }

    fn read_mask(&self, bus: &mut B) -> Result<PowerMask, B::Error> {
        read_u16(bus, self.registers.data).map(PowerMask::from_bits)
    }

    fn write_mask(&self, bus: &mut B, mask: PowerMask) -> Result<(), B::Error> {
        log::trace!("Writing mask {mask}");
        write_u16(bus, self.registers.data, mask.bits()).inspect_err(|err| {
            log::warn!("Write of mask {mask} failed: {err}");
        })
    }

    fn lock(&self) -> MutexGuard<'_, Session<B>> {
        // Nothing in the session can be left half-updated, a poisoned lock is still usable.
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<B: BusTransport> Drop for PowerSwitch<B> {
    fn drop(&mut self) {
        let session = self
            .session
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner);
        session.initialized = false;
        session.bus.close();
    }
}
