//! Register layout of the PWM block.
//!
//! The block is three 32-bit words:
//!
//! ```text
//! 0x00  CTRL        ch1 fields at bit 15..=21 | ch0 fields at bit 0..=6
//! 0x04  CH0_PERIOD  (ticks - 1) << 16 | duty_ticks
//! 0x08  CH1_PERIOD  (ticks - 1) << 16 | duty_ticks
//! ```
//!
//! Each channel's control field is `[prescaler:4 | enable | act_state | clk_gating]`,
//! shifted left by `15 * channel`.

use crate::error::{PwmError, PwmResult};
use bitflags::bitflags;
use sunxi::consts::{CHANNEL_BIT_STRIDE, CTRL_REG_OFFSET, PERIOD_REG_OFFSET};

bitflags! {
    /// Per-channel control field, unshifted (channel 0 position).
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ChannelCtrl: u32 {
        /// 4-bit prescaler selector.
        const PRESCALER = 0x0F;
        /// Channel enable.
        const ENABLE = 1 << 4;
        /// Active state: set means active high.
        const ACTIVE_STATE = 1 << 5;
        /// Clock gating: set passes the counting clock to the channel.
        const CLOCK_GATING = 1 << 6;
    }
}

/// One of the two PWM channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Channel {
    /// Channel 0
    Ch0 = 0,
    /// Channel 1
    Ch1 = 1,
}

impl Channel {
    /// Both channels in index order.
    pub const ALL: [Channel; 2] = [Channel::Ch0, Channel::Ch1];

    /// Convert from a raw index. Returns `None` for anything but 0 or 1.
    #[inline]
    pub const fn from_index(index: u32) -> Option<Self> {
        match index {
            0 => Some(Self::Ch0),
            1 => Some(Self::Ch1),
            _ => None,
        }
    }

    /// Raw channel index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Bit position of this channel's control field.
    #[inline]
    pub const fn shift(self) -> u32 {
        CHANNEL_BIT_STRIDE * self as u32
    }

    /// Control-register mask of `field` for this channel.
    #[inline]
    pub const fn ctrl_bits(self, field: ChannelCtrl) -> u32 {
        field.bits() << self.shift()
    }

    /// Control-register bits selecting prescaler `selector` for this channel.
    #[inline]
    pub const fn prescaler_bits(self, selector: u8) -> u32 {
        ((selector as u32) & ChannelCtrl::PRESCALER.bits()) << self.shift()
    }

    /// Decode this channel's control field from a raw control word.
    #[inline]
    pub const fn ctrl_field(self, ctrl: u32) -> ChannelCtrl {
        ChannelCtrl::from_bits_truncate(ctrl >> self.shift())
    }

    /// This channel's period register.
    #[inline]
    pub const fn period_register(self) -> Register {
        Register::Period(self)
    }
}

impl TryFrom<u32> for Channel {
    type Error = PwmError;

    fn try_from(index: u32) -> PwmResult<Self> {
        Self::from_index(index).ok_or(PwmError::InvalidChannel { index })
    }
}

/// Addressable register of the block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    /// Shared control register.
    Ctrl,
    /// Period/duty register of one channel.
    Period(Channel),
}

impl Register {
    /// Byte offset from the block base.
    #[inline]
    pub const fn offset(self) -> usize {
        match self {
            Self::Ctrl => CTRL_REG_OFFSET,
            Self::Period(channel) => PERIOD_REG_OFFSET + 4 * channel.index(),
        }
    }

    /// Word index from the block base.
    #[inline]
    pub const fn word(self) -> usize {
        self.offset() / 4
    }
}

/// Pack a period register value.
///
/// `ticks` must be in `1..=0x10000`; duty ticks are truncated to 16 bits.
/// Out-of-range tick counts wrap into the 16-bit field, so 0 packs like
/// 0x10000.
#[inline]
pub const fn pack_period(ticks: u32, duty_ticks: u32) -> u32 {
    (ticks.wrapping_sub(1) << 16) | (duty_ticks & 0xFFFF)
}

/// Unpack a period register value into `(ticks, duty_ticks)`.
#[inline]
pub const fn unpack_period(raw: u32) -> (u32, u32) {
    ((raw >> 16) + 1, raw & 0xFFFF)
}

/// Typed 32-bit access to the register block.
///
/// Implemented by the `/dev/mem` window and by the in-memory simulation.
/// Accesses are not synchronized: callers serialize use of one block.
pub trait RegisterIo {
    /// Read a register.
    fn read(&self, reg: Register) -> u32;

    /// Write a register.
    fn write(&mut self, reg: Register, value: u32);

    /// Read-modify-write a register.
    #[inline]
    fn modify<F>(&mut self, reg: Register, f: F)
    where
        F: FnOnce(u32) -> u32,
        Self: Sized,
    {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Set `mask` bits, leaving the rest untouched.
    #[inline]
    fn set_bits(&mut self, reg: Register, mask: u32)
    where
        Self: Sized,
    {
        self.modify(reg, |v| v | mask);
    }

    /// Clear `mask` bits, leaving the rest untouched.
    #[inline]
    fn clear_bits(&mut self, reg: Register, mask: u32)
    where
        Self: Sized,
    {
        self.modify(reg, |v| v & !mask);
    }
}
