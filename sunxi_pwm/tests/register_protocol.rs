//! Register protocol tests against the simulated register block.
//!
//! Complements the inline `mod tests` in `sunxi_pwm::controller` with
//! property checks over arbitrary starting register contents.

use proptest::prelude::*;
use sunxi_pwm::{
    Channel, ChannelCtrl, Polarity, PwmController, PwmError, Register, SimulatedRegisters,
};

fn controller(ctrl: u32) -> PwmController<SimulatedRegisters> {
    PwmController::with_registers(SimulatedRegisters::with_ctrl(ctrl))
}

fn ctrl_of(pwm: &PwmController<SimulatedRegisters>) -> u32 {
    pwm.registers().expect("attached").ctrl()
}

fn any_channel() -> impl Strategy<Value = Channel> {
    prop_oneof![Just(Channel::Ch0), Just(Channel::Ch1)]
}

fn any_polarity() -> impl Strategy<Value = Polarity> {
    prop_oneof![Just(Polarity::Normal), Just(Polarity::Inversed)]
}

/// Periods from one tick at 200 kHz up to the 72000-divisor limit.
fn valid_period() -> impl Strategy<Value = u64> {
    5_000u64..190_000_000_000
}

proptest! {
    #[test]
    fn polarity_touches_only_its_bit(
        initial in any::<u32>(),
        channel in any_channel(),
        polarity in any_polarity(),
    ) {
        let mut pwm = controller(initial);
        pwm.set_polarity(channel, polarity).unwrap();

        let bit = channel.ctrl_bits(ChannelCtrl::ACTIVE_STATE);
        let after = ctrl_of(&pwm);
        prop_assert_eq!(after & !bit, initial & !bit);
        prop_assert_eq!(after & bit != 0, polarity == Polarity::Normal);
    }

    #[test]
    fn enable_then_disable_restores_idle_state(
        initial in any::<u32>(),
        channel in any_channel(),
    ) {
        let run_bits = channel.ctrl_bits(ChannelCtrl::ENABLE | ChannelCtrl::CLOCK_GATING);
        let idle = initial & !run_bits;
        let mut pwm = controller(idle);

        pwm.enable(channel).unwrap();
        prop_assert_eq!(ctrl_of(&pwm), idle | run_bits);

        pwm.disable(channel).unwrap();
        prop_assert_eq!(ctrl_of(&pwm), idle);
    }

    #[test]
    fn set_config_preserves_unrelated_bits(
        initial in any::<u32>(),
        channel in any_channel(),
        period_ns in valid_period(),
        duty_permille in 0u64..=1000,
    ) {
        let duty_ns = period_ns / 1000 * duty_permille;
        let mut pwm = controller(initial);
        let setting = pwm.set_config(channel, period_ns, duty_ns).unwrap();

        let prescaler = channel.ctrl_bits(ChannelCtrl::PRESCALER);
        let after = ctrl_of(&pwm);
        // Gating, enable, polarity and the other channel are untouched.
        prop_assert_eq!(after & !prescaler, initial & !prescaler);
        prop_assert_eq!(after & prescaler, channel.prescaler_bits(setting.prescaler));
        prop_assert!(setting.ticks >= 1 && setting.ticks <= 0x1_0000);
        prop_assert!(setting.duty_ticks <= setting.ticks);
    }

    #[test]
    fn set_config_is_idempotent(
        initial in any::<u32>(),
        channel in any_channel(),
        period_ns in valid_period(),
    ) {
        let mut pwm = controller(initial);
        pwm.set_config(channel, period_ns, period_ns / 2).unwrap();
        let first = pwm.registers().unwrap().clone();
        pwm.set_config(channel, period_ns, period_ns / 2).unwrap();
        let second = pwm.registers().unwrap();

        prop_assert_eq!(first.ctrl(), second.ctrl());
        prop_assert_eq!(first.period(Channel::Ch0), second.period(Channel::Ch0));
        prop_assert_eq!(first.period(Channel::Ch1), second.period(Channel::Ch1));
    }
}

#[test]
fn test_servo_period_register() {
    let mut pwm = controller(0);
    let setting = pwm.set_config(Channel::Ch0, 20_000_000, 1_500_000).unwrap();

    assert_eq!(setting.prescaler, 0);
    assert_eq!(setting.ticks, 4000);
    assert_eq!(setting.duty_ticks, 300);
    assert_eq!(
        pwm.registers().unwrap().period(Channel::Ch0),
        (3999 << 16) | 300
    );
}

#[test]
fn test_gating_is_off_while_period_changes() {
    let gating = Channel::Ch1.ctrl_bits(ChannelCtrl::CLOCK_GATING);
    let mut pwm = controller(0);
    pwm.enable(Channel::Ch1).unwrap();

    let mut regs = pwm.release().unwrap();
    regs.clear_log();
    pwm.attach(regs);

    pwm.set_config(Channel::Ch1, 1_000_000, 500_000).unwrap();
    let writes = pwm.registers().unwrap().writes();

    let period_write = writes
        .iter()
        .position(|(reg, _)| *reg == Register::Period(Channel::Ch1))
        .expect("period register written");
    // Every control write before the period write has gating cleared.
    for (reg, value) in &writes[..period_write] {
        assert_eq!(*reg, Register::Ctrl);
        assert_eq!(value & gating, 0);
    }
    // The last write restores gating.
    let (last_reg, last_value) = writes.last().unwrap();
    assert_eq!(*last_reg, Register::Ctrl);
    assert_ne!(last_value & gating, 0);
}

#[test]
fn test_gating_preserved_across_reconfiguration() {
    for channel in Channel::ALL {
        let gating = channel.ctrl_bits(ChannelCtrl::CLOCK_GATING);
        let mut pwm = controller(0);

        pwm.enable(channel).unwrap();
        pwm.set_config(channel, 20_000_000, 1_000_000).unwrap();
        assert_ne!(ctrl_of(&pwm) & gating, 0, "gating must stay on");

        pwm.disable(channel).unwrap();
        pwm.set_config(channel, 10_000_000, 1_000_000).unwrap();
        assert_eq!(ctrl_of(&pwm) & gating, 0, "gating must stay off");
    }
}

#[test]
fn test_unrepresentable_period_writes_nothing() {
    let mut pwm = controller(0x0012_3456);
    let result = pwm.set_config(Channel::Ch0, 300_000_000_000, 0);

    let err = result.unwrap_err();
    assert!(matches!(err, PwmError::InvalidConfiguration { .. }));
    assert_eq!(err.code(), -libc::EINVAL);

    let regs = pwm.registers().unwrap();
    assert!(regs.writes().is_empty());
    assert_eq!(regs.ctrl(), 0x0012_3456);
}

#[test]
fn test_channels_are_independent() {
    let mut pwm = controller(0);
    pwm.set_polarity(Channel::Ch0, Polarity::Normal).unwrap();
    pwm.set_config(Channel::Ch0, 20_000_000, 1_500_000).unwrap();
    pwm.enable(Channel::Ch0).unwrap();

    pwm.set_config(Channel::Ch1, 10_000_000_000, 5_000_000_000).unwrap();
    pwm.enable(Channel::Ch1).unwrap();
    pwm.disable(Channel::Ch1).unwrap();

    let ch0 = pwm.channel_status(Channel::Ch0).unwrap();
    assert!(ch0.enabled && ch0.clock_gated);
    assert_eq!(ch0.polarity, Polarity::Normal);
    assert_eq!((ch0.period_ticks, ch0.duty_ticks), (4000, 300));

    let ch1 = pwm.channel_status(Channel::Ch1).unwrap();
    assert!(!ch1.enabled && !ch1.clock_gated);
    assert_eq!(ch1.prescaler, 8);
    assert_eq!((ch1.period_ticks, ch1.duty_ticks), (20_000, 10_000));
}
