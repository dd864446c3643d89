//! # Sunxi PWM Register Interface
//!
//! Direct control of the two-channel PWM block found on Allwinner (sunxi)
//! SoCs, by read-modify-write of its memory-mapped registers through
//! `/dev/mem`.
//!
//! ## Register Block
//!
//! ```text
//! phys 0x01c20e00
//! ┌──────────────┬──────────────┬──────────────┐
//! │ CTRL         │ CH0_PERIOD   │ CH1_PERIOD   │
//! │ +0x00        │ +0x04        │ +0x08        │
//! └──────────────┴──────────────┴──────────────┘
//! ```
//!
//! The counting clock is 24 MHz divided by a hardware prescaler; the period
//! register holds a 16-bit tick count and a 16-bit duty count. See
//! [`prescaler`] for how a period in nanoseconds is turned into both.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use sunxi_pwm::{Channel, DeviceConfig, Polarity, PwmController, PwmResult};
//!
//! # fn main() -> PwmResult<()> {
//! let mut pwm: PwmController = PwmController::new();
//! pwm.initialize(&DeviceConfig::default())?;
//!
//! // 50 Hz servo, 1.5 ms centre pulse
//! pwm.set_polarity(Channel::Ch0, Polarity::Normal)?;
//! pwm.set_config(Channel::Ch0, 20_000_000, 1_500_000)?;
//! pwm.enable(Channel::Ch0)?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing Without Hardware
//!
//! ```rust
//! use sunxi_pwm::{Channel, PwmController, SimulatedRegisters};
//!
//! let mut pwm = PwmController::with_registers(SimulatedRegisters::new());
//! pwm.enable(Channel::Ch1).unwrap();
//! assert!(pwm.channel_status(Channel::Ch1).unwrap().enabled);
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, PwmError>`; [`PwmError::code`] gives the
//! negative errno for callers that speak C-style status codes.
//!
//! ## Thread Safety
//!
//! Both channels share one control register and every operation is an
//! unsynchronized read-modify-write. `PwmController` takes `&mut self`;
//! wrap it in a mutex to share it between threads.

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod controller;
pub mod error;
pub mod platform;
pub mod prescaler;
pub mod registers;
pub mod simulation;

pub use controller::{ChannelStatus, PwmController};
pub use error::{PwmError, PwmResult};
pub use platform::MappedRegisters;
pub use prescaler::{ClockSetting, compute_clock};
pub use registers::{Channel, ChannelCtrl, Register, RegisterIo};
pub use simulation::SimulatedRegisters;
pub use sunxi::config::{ChannelConfig, DeviceConfig, Polarity};

/// Initialize tracing for embedders that have no subscriber of their own.
pub fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_line_number(true)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
