//! Clock divider search.
//!
//! The counting clock is the 24 MHz source divided by one entry of
//! [`PRESCALER_TABLE`]. The search walks the table from index 0 and takes the
//! first usable divisor whose tick count fits the 16-bit period field, so the
//! highest available resolution wins.

use crate::error::{PwmError, PwmResult};
use crate::registers::pack_period;
use sunxi::consts::{MAX_PERIOD_TICKS, NANOS_PER_SECOND, PRESCALER_TABLE, PWM_SOURCE_CLOCK_HZ};

/// Result of the divider search for one period/duty request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockSetting {
    /// Prescaler selector written to the control register.
    pub prescaler: u8,
    /// Divisor the selector stands for.
    pub divisor: u32,
    /// Counting-clock ticks per period (1..=65536).
    pub ticks: u32,
    /// Counting-clock ticks in the active state.
    pub duty_ticks: u32,
}

impl ClockSetting {
    /// Counting clock frequency after division.
    #[inline]
    pub const fn frequency_hz(&self) -> u64 {
        PWM_SOURCE_CLOCK_HZ / self.divisor as u64
    }

    /// Period register value for this setting.
    #[inline]
    pub const fn period_register(&self) -> u32 {
        pack_period(self.ticks, self.duty_ticks)
    }
}

/// Ticks of one `period_ns` period at `divisor`, or `None` on overflow.
#[inline]
fn period_ticks(divisor: u32, period_ns: u64) -> Option<u64> {
    let frequency = PWM_SOURCE_CLOCK_HZ / u64::from(divisor);
    frequency
        .checked_mul(period_ns)
        .map(|scaled| scaled / NANOS_PER_SECOND)
}

/// Find the prescaler for `period_ns` and derive the duty tick count.
///
/// Duty ticks are scaled from the already-truncated period ticks, so their
/// resolution is that of the chosen period. `duty_ns <= period_ns` is the
/// caller's responsibility.
///
/// # Errors
///
/// `PwmError::InvalidConfiguration` when no divisor yields `1..=65536` ticks,
/// either because the period is too long or too short to count.
pub fn compute_clock(period_ns: u64, duty_ns: u64) -> PwmResult<ClockSetting> {
    let (prescaler, divisor, ticks) = PRESCALER_TABLE
        .iter()
        .enumerate()
        .filter(|(_, divisor)| **divisor != 0)
        .find_map(|(idx, &divisor)| {
            period_ticks(divisor, period_ns)
                .filter(|ticks| (1..=MAX_PERIOD_TICKS).contains(ticks))
                .map(|ticks| (idx as u8, divisor, ticks))
        })
        .ok_or(PwmError::InvalidConfiguration { period_ns })?;

    let duty_ticks = u128::from(ticks) * u128::from(duty_ns) / u128::from(period_ns);

    Ok(ClockSetting {
        prescaler,
        divisor,
        ticks: ticks as u32,
        duty_ticks: u32::try_from(duty_ticks).unwrap_or(u32::MAX),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn servo_pulse_uses_finest_prescaler() {
        // 50 Hz at 200 kHz is 4000 ticks, well inside 16 bits.
        let setting = compute_clock(20_000_000, 1_500_000).unwrap();
        assert_eq!(setting.prescaler, 0);
        assert_eq!(setting.divisor, 120);
        assert_eq!(setting.frequency_hz(), 200_000);
        assert_eq!(setting.ticks, 4000);
        assert_eq!(setting.duty_ticks, 300);
        assert_eq!(setting.period_register(), (3999 << 16) | 300);
    }

    #[test]
    fn longest_period_at_index_zero() {
        let setting = compute_clock(327_680_000, 0).unwrap();
        assert_eq!(setting.prescaler, 0);
        assert_eq!(setting.ticks, 0x1_0000);
        assert_eq!(setting.period_register() >> 16, 0xFFFF);
    }

    #[test]
    fn one_tick_over_advances_prescaler() {
        let setting = compute_clock(327_685_000, 0).unwrap();
        assert_eq!(setting.prescaler, 1);
        assert_eq!(setting.divisor, 180);
        assert_eq!(setting.ticks, 43_691);
    }

    #[test]
    fn reserved_slots_are_skipped() {
        // Too long for 480 (max ~1.31 s); next usable entry is index 8.
        let setting = compute_clock(2_000_000_000, 1_000_000_000).unwrap();
        assert_eq!(setting.prescaler, 8);
        assert_eq!(setting.divisor, 12_000);
        assert_eq!(setting.ticks, 4000);
        assert_eq!(setting.duty_ticks, 2000);
    }

    #[test]
    fn ten_second_period() {
        let setting = compute_clock(10_000_000_000, 0).unwrap();
        assert_eq!(setting.prescaler, 8);
        assert_eq!(setting.ticks, 20_000);
    }

    #[test]
    fn longest_divisor_is_last_resort() {
        // 150 s overflows 48000 (500 Hz -> 75000) but fits 72000 (333 Hz).
        let setting = compute_clock(150_000_000_000, 0).unwrap();
        assert_eq!(setting.prescaler, 12);
        assert_eq!(setting.ticks, 333 * 150);
    }

    #[test]
    fn too_long_period_is_rejected() {
        let result = compute_clock(300_000_000_000, 0);
        assert!(matches!(
            result,
            Err(PwmError::InvalidConfiguration {
                period_ns: 300_000_000_000
            })
        ));
    }

    #[test]
    fn too_short_period_is_rejected() {
        assert!(compute_clock(1, 0).is_err());
        assert!(compute_clock(0, 0).is_err());
        // 5 us is exactly one tick at 200 kHz.
        assert_eq!(compute_clock(5_000, 0).unwrap().ticks, 1);
    }

    #[test]
    fn huge_period_does_not_overflow() {
        assert!(compute_clock(u64::MAX, u64::MAX).is_err());
    }

    #[test]
    fn full_duty_is_truncated_to_sixteen_bits() {
        let setting = compute_clock(327_680_000, 327_680_000).unwrap();
        assert_eq!(setting.duty_ticks, 0x1_0000);
        assert_eq!(setting.period_register() & 0xFFFF, 0);
    }

    #[test]
    fn hand_built_zero_tick_setting_packs() {
        let setting = ClockSetting {
            prescaler: 0,
            divisor: 120,
            ticks: 0,
            duty_ticks: 7,
        };
        assert_eq!(setting.period_register(), 0xFFFF_0007);
    }
}
