//! PWM controller: the register protocol for both channels.
//!
//! A [`PwmController`] starts uninitialized. Every operation other than
//! initialization fails with [`PwmError::NotInitialized`] until a register
//! block is attached, and touches no memory in that case.

use crate::error::{PwmError, PwmResult};
use crate::platform::{MappedRegisters, map_register_window};
use crate::prescaler::{ClockSetting, compute_clock};
use crate::registers::{Channel, ChannelCtrl, Register, RegisterIo, unpack_period};
use std::fmt;
use sunxi::config::{ChannelConfig, DeviceConfig, Polarity};
use sunxi::consts::{NANOS_PER_SECOND, PRESCALER_TABLE, PWM_SOURCE_CLOCK_HZ};
use tracing::debug;

/// Decoded state of one channel, read back from the registers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelStatus {
    /// Channel the status belongs to
    pub channel: Channel,
    /// Enable bit
    pub enabled: bool,
    /// Active-state bit
    pub polarity: Polarity,
    /// Clock-gating bit
    pub clock_gated: bool,
    /// Prescaler selector
    pub prescaler: u8,
    /// Ticks per period
    pub period_ticks: u32,
    /// Ticks in the active state
    pub duty_ticks: u32,
}

impl ChannelStatus {
    /// Divisor selected by the prescaler field; `None` for a reserved selector.
    pub fn divisor(&self) -> Option<u32> {
        match PRESCALER_TABLE[usize::from(self.prescaler)] {
            0 => None,
            divisor => Some(divisor),
        }
    }

    /// Period in nanoseconds implied by the registers.
    pub fn period_ns(&self) -> Option<u64> {
        self.ticks_to_ns(self.period_ticks)
    }

    /// Duty time in nanoseconds implied by the registers.
    pub fn duty_ns(&self) -> Option<u64> {
        self.ticks_to_ns(self.duty_ticks)
    }

    fn ticks_to_ns(&self, ticks: u32) -> Option<u64> {
        let frequency = PWM_SOURCE_CLOCK_HZ / u64::from(self.divisor()?);
        Some(u64::from(ticks) * NANOS_PER_SECOND / frequency)
    }
}

impl fmt::Display for ChannelStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "ch{}: {} polarity={:?} gating={} prescaler={} ticks={}/{}",
            self.channel.index(),
            if self.enabled { "enabled" } else { "disabled" },
            self.polarity,
            if self.clock_gated { "on" } else { "off" },
            self.prescaler,
            self.duty_ticks,
            self.period_ticks,
        )?;
        if let (Some(period), Some(duty)) = (self.period_ns(), self.duty_ns()) {
            write!(f, " ({duty} ns / {period} ns)")?;
        }
        Ok(())
    }
}

/// Owner of the PWM register block.
///
/// The default backend is the `/dev/mem` window; any [`RegisterIo`] can be
/// attached instead. Not synchronized: share it behind a lock if needed.
pub struct PwmController<R: RegisterIo = MappedRegisters> {
    regs: Option<R>,
}

impl PwmController<MappedRegisters> {
    /// Map the register block described by `device`.
    ///
    /// Requires permission to open the memory device, usually root. Calling
    /// this on an initialized controller keeps the existing mapping.
    ///
    /// # Errors
    ///
    /// `PwmError::Mapping` carrying the OS error from open or mmap.
    pub fn initialize(&mut self, device: &DeviceConfig) -> PwmResult<()> {
        if self.regs.is_some() {
            debug!("PWM interface already initialized, keeping mapping");
            return Ok(());
        }
        self.regs = Some(map_register_window(device)?);
        Ok(())
    }
}

impl<R: RegisterIo> Default for PwmController<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: RegisterIo> PwmController<R> {
    /// Uninitialized controller.
    pub const fn new() -> Self {
        Self { regs: None }
    }

    /// Controller driving an already available register block.
    pub fn with_registers(regs: R) -> Self {
        Self { regs: Some(regs) }
    }

    /// Attach a register block, returning the previous one.
    pub fn attach(&mut self, regs: R) -> Option<R> {
        self.regs.replace(regs)
    }

    /// Detach the register block; for a mapped block this unmaps it.
    pub fn release(&mut self) -> Option<R> {
        self.regs.take()
    }

    /// Whether a register block is attached.
    pub fn is_initialized(&self) -> bool {
        self.regs.is_some()
    }

    /// Attached register block.
    pub fn registers(&self) -> Option<&R> {
        self.regs.as_ref()
    }

    fn regs(&self) -> PwmResult<&R> {
        self.regs.as_ref().ok_or(PwmError::NotInitialized)
    }

    fn regs_mut(&mut self) -> PwmResult<&mut R> {
        self.regs.as_mut().ok_or(PwmError::NotInitialized)
    }

    /// Set the active level of `channel`.
    pub fn set_polarity(&mut self, channel: Channel, polarity: Polarity) -> PwmResult<()> {
        let regs = self.regs_mut()?;
        let bit = channel.ctrl_bits(ChannelCtrl::ACTIVE_STATE);
        match polarity {
            Polarity::Normal => regs.set_bits(Register::Ctrl, bit),
            Polarity::Inversed => regs.clear_bits(Register::Ctrl, bit),
        }
        debug!(channel = channel.index(), ?polarity, "PWM polarity set");
        Ok(())
    }

    /// Program period and duty cycle of `channel`.
    ///
    /// The channel's clock gating is switched off while the prescaler and
    /// period register change and then restored, so this never starts or
    /// stops a channel. Nothing is written when the period is rejected.
    ///
    /// # Errors
    ///
    /// - `PwmError::NotInitialized` without a register block
    /// - `PwmError::InvalidConfiguration` if no prescaler fits the period
    pub fn set_config(
        &mut self,
        channel: Channel,
        period_ns: u64,
        duty_ns: u64,
    ) -> PwmResult<ClockSetting> {
        let regs = self.regs_mut()?;
        let setting = compute_clock(period_ns, duty_ns)?;

        let gating = channel.ctrl_bits(ChannelCtrl::CLOCK_GATING);
        let was_gated = regs.read(Register::Ctrl) & gating != 0;

        regs.clear_bits(Register::Ctrl, gating);
        regs.clear_bits(Register::Ctrl, channel.ctrl_bits(ChannelCtrl::PRESCALER));
        regs.set_bits(Register::Ctrl, channel.prescaler_bits(setting.prescaler));
        regs.write(channel.period_register(), setting.period_register());
        if was_gated {
            regs.set_bits(Register::Ctrl, gating);
        }

        debug!(
            channel = channel.index(),
            prescaler = setting.prescaler,
            ticks = setting.ticks,
            duty_ticks = setting.duty_ticks,
            "PWM period configured"
        );
        Ok(setting)
    }

    /// Start signal generation on `channel` with the latched configuration.
    pub fn enable(&mut self, channel: Channel) -> PwmResult<()> {
        let regs = self.regs_mut()?;
        regs.set_bits(Register::Ctrl, channel.ctrl_bits(ChannelCtrl::ENABLE));
        regs.set_bits(Register::Ctrl, channel.ctrl_bits(ChannelCtrl::CLOCK_GATING));
        debug!(channel = channel.index(), "PWM enabled");
        Ok(())
    }

    /// Stop signal generation on `channel`; configuration is retained.
    pub fn disable(&mut self, channel: Channel) -> PwmResult<()> {
        let regs = self.regs_mut()?;
        regs.clear_bits(Register::Ctrl, channel.ctrl_bits(ChannelCtrl::ENABLE));
        regs.clear_bits(Register::Ctrl, channel.ctrl_bits(ChannelCtrl::CLOCK_GATING));
        debug!(channel = channel.index(), "PWM disabled");
        Ok(())
    }

    /// Read back and decode the state of `channel`.
    pub fn channel_status(&self, channel: Channel) -> PwmResult<ChannelStatus> {
        let regs = self.regs()?;
        let field = channel.ctrl_field(regs.read(Register::Ctrl));
        let (period_ticks, duty_ticks) = unpack_period(regs.read(channel.period_register()));

        Ok(ChannelStatus {
            channel,
            enabled: field.contains(ChannelCtrl::ENABLE),
            polarity: if field.contains(ChannelCtrl::ACTIVE_STATE) {
                Polarity::Normal
            } else {
                Polarity::Inversed
            },
            clock_gated: field.contains(ChannelCtrl::CLOCK_GATING),
            prescaler: (field & ChannelCtrl::PRESCALER).bits() as u8,
            period_ticks,
            duty_ticks,
        })
    }

    /// Bring a channel to the state described by `config`.
    ///
    /// Polarity is applied first, then period/duty, then enable or disable.
    pub fn apply(&mut self, config: &ChannelConfig) -> PwmResult<ClockSetting> {
        let channel = Channel::try_from(u32::from(config.index))?;
        // Reject before the polarity write so a bad entry changes nothing.
        self.regs()?;
        compute_clock(config.period_ns, config.duty_ns)?;

        self.set_polarity(channel, config.polarity)?;
        let setting = self.set_config(channel, config.period_ns, config.duty_ns)?;
        if config.enabled {
            self.enable(channel)?;
        } else {
            self.disable(channel)?;
        }
        Ok(setting)
    }
}
