//! Prelude module for common re-exports.
//!
//! ```rust
//! use sunxi_common::prelude::*;
//! ```

// ─── Logging ────────────────────────────────────────────────────────
pub use crate::config::LogLevel;

// ─── Configuration ──────────────────────────────────────────────────
pub use crate::config::{
    ChannelConfig, ConfigError, ConfigLoader, DeviceConfig, Polarity, PwmConfig, SharedConfig,
};

// ─── Hardware Constants ─────────────────────────────────────────────
pub use crate::consts::{CHANNEL_COUNT, PRESCALER_TABLE, PWM_SOURCE_CLOCK_HZ, SUNXI_PWM_IO_BASE};
