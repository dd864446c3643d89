//! Hardware constants for the sunxi PWM block.
//!
//! Single source of truth for the register layout, clock and prescaler
//! table. These are properties of the silicon, not of any request.

use static_assertions::const_assert;

/// Physical address of the PWM control register block.
pub const SUNXI_PWM_IO_BASE: u64 = 0x01c2_0e00;

/// Fixed source clock feeding every prescaler (24 MHz oscillator).
pub const PWM_SOURCE_CLOCK_HZ: u64 = 24_000_000;

/// Nanoseconds in one second.
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Number of PWM channels in the block.
pub const CHANNEL_COUNT: usize = 2;

/// Bit distance between channel 0 and channel 1 fields in the control register.
pub const CHANNEL_BIT_STRIDE: u32 = 15;

/// Prescaler divisors selectable through the 4-bit prescaler field.
///
/// A zero entry is a reserved selector and must never be programmed.
pub const PRESCALER_TABLE: [u32; 16] = [
    120, 180, 240, 360, 480, 0, 0, 0, 12000, 24000, 36000, 48000, 72000, 0, 0, 0,
];

/// Exclusive upper bound on the tick count of one period.
///
/// The period field stores `ticks - 1` in 16 bits.
pub const MAX_PERIOD_TICKS: u64 = 0x1_0000;

/// Number of pages mapped over the register block.
///
/// Two pages cover the block even when it straddles a page boundary.
pub const MAPPING_PAGES: usize = 2;

/// Offset of the control register from the block base.
pub const CTRL_REG_OFFSET: usize = 0x00;

/// Offset of the channel 0 period register; channel 1 follows at +4.
pub const PERIOD_REG_OFFSET: usize = 0x04;

/// Size in bytes of the register block (control + two period registers).
pub const REGISTER_BLOCK_SIZE: usize = PERIOD_REG_OFFSET + 4 * CHANNEL_COUNT;

/// Default physical memory device.
pub const DEFAULT_MEM_DEVICE: &str = "/dev/mem";

/// Default configuration file path.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/sunxi-pwm/pwm.toml";

// Channel 1 fields (prescaler at 15, gating at 21) must stay inside the word.
const_assert!(CHANNEL_BIT_STRIDE + 6 < 32);
const_assert!(PRESCALER_TABLE.len() == 16);
const_assert!(REGISTER_BLOCK_SIZE == 12);
