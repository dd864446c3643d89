//! Configuration loading traits and types.
//!
//! This module provides a standardized way to load the TOML configuration
//! describing which PWM channels to program and how.
//!
//! # Usage
//!
//! ```rust,no_run
//! use sunxi_common::config::{ConfigLoader, ConfigError, PwmConfig};
//! use std::path::Path;
//!
//! fn main() -> Result<(), ConfigError> {
//!     let config = PwmConfig::load(Path::new("pwm.toml"))?;
//!     config.validate()?;
//!     println!("Service: {}", config.shared.service_name);
//!     Ok(())
//! }
//! ```

use crate::consts::{CHANNEL_COUNT, DEFAULT_MEM_DEVICE, SUNXI_PWM_IO_BASE};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for configuration loading operations.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// Configuration file not found at specified path.
    #[error("Configuration file not found")]
    FileNotFound,

    /// TOML parsing failed.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Semantic validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Log level for application logging.
///
/// Uses lowercase serde values for TOML compatibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Most verbose, detailed tracing information.
    Trace,
    /// Debug information useful during development.
    Debug,
    /// General information about application operation.
    #[default]
    Info,
    /// Warning messages for potentially problematic situations.
    Warn,
    /// Error messages for serious problems.
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// Electrical sense of a channel's active portion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    /// Active high: the active-state bit is set.
    #[default]
    Normal,
    /// Active low: the active-state bit is cleared.
    Inversed,
}

/// Common configuration fields.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "servo-pan"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedConfig {
    /// Logging verbosity level.
    #[serde(default)]
    pub log_level: LogLevel,

    /// Application instance identifier.
    pub service_name: String,
}

impl SharedConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if `service_name` is empty.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.is_empty() {
            return Err(ConfigError::ValidationError(
                "service_name cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Where the register block lives.
///
/// Defaults to the hardware constants; overriding is useful for boards
/// with a relocated block and for tests that map a plain file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// Physical memory device to map.
    #[serde(default = "default_mem_path")]
    pub mem_path: PathBuf,

    /// Physical address of the control register.
    #[serde(default = "default_base_address")]
    pub base_address: u64,
}

fn default_mem_path() -> PathBuf {
    PathBuf::from(DEFAULT_MEM_DEVICE)
}

fn default_base_address() -> u64 {
    SUNXI_PWM_IO_BASE
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            mem_path: default_mem_path(),
            base_address: default_base_address(),
        }
    }
}

/// Desired state of one PWM channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Channel index (0 or 1).
    pub index: u8,
    /// Signal period in nanoseconds.
    pub period_ns: u64,
    /// Active time per period in nanoseconds.
    pub duty_ns: u64,
    /// Active level.
    #[serde(default)]
    pub polarity: Polarity,
    /// Start signal generation after configuring.
    #[serde(default)]
    pub enabled: bool,
}

impl ChannelConfig {
    /// Validate a single channel entry.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if usize::from(self.index) >= CHANNEL_COUNT {
            return Err(ConfigError::ValidationError(format!(
                "channel index {} out of range (0..{CHANNEL_COUNT})",
                self.index
            )));
        }
        if self.period_ns == 0 {
            return Err(ConfigError::ValidationError(format!(
                "channel {}: period_ns must be non-zero",
                self.index
            )));
        }
        if self.duty_ns > self.period_ns {
            return Err(ConfigError::ValidationError(format!(
                "channel {}: duty_ns {} exceeds period_ns {}",
                self.index, self.duty_ns, self.period_ns
            )));
        }
        Ok(())
    }
}

/// Top-level PWM configuration file.
///
/// # TOML Example
///
/// ```toml
/// [shared]
/// service_name = "servo-pan"
///
/// [device]
/// base_address = 0x01c20e00
///
/// [[channel]]
/// index = 0
/// period_ns = 20000000
/// duty_ns = 1500000
/// enabled = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PwmConfig {
    /// Common fields.
    pub shared: SharedConfig,

    /// Register block location.
    #[serde(default)]
    pub device: DeviceConfig,

    /// Channels to program, in file order.
    #[serde(default, rename = "channel")]
    pub channels: Vec<ChannelConfig>,
}

impl PwmConfig {
    /// Validate the whole file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationError` if:
    /// - `service_name` is empty
    /// - a channel entry is invalid
    /// - a channel index appears twice
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.shared.validate()?;

        let mut seen = [false; CHANNEL_COUNT];
        for channel in &self.channels {
            channel.validate()?;
            let slot = &mut seen[usize::from(channel.index)];
            if *slot {
                return Err(ConfigError::ValidationError(format!(
                    "channel {} configured more than once",
                    channel.index
                )));
            }
            *slot = true;
        }
        Ok(())
    }

    /// Load and validate in one step.
    pub fn load_validated(path: &Path) -> Result<Self, ConfigError> {
        let config = Self::load(path)?;
        config.validate()?;
        Ok(config)
    }
}

/// Trait for loading configuration from TOML files.
///
/// # Contract
///
/// - Returns `ConfigError::FileNotFound` if the file does not exist
/// - Returns `ConfigError::ParseError` if TOML syntax is invalid
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    /// Load configuration from a TOML file.
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::FileNotFound
            } else {
                ConfigError::ParseError(e.to_string())
            }
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

// Blanket implementation for all types that implement DeserializeOwned.
impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
