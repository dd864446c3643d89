//! Error types for PWM register operations

use nix::errno::Errno;
use sunxi::config::ConfigError;
use thiserror::Error;

/// Errors that can occur while driving the PWM block
#[derive(Error, Debug)]
pub enum PwmError {
    /// Opening or mapping the physical memory device failed
    #[error("Failed to {stage} physical memory: {source}")]
    Mapping {
        /// Step that failed ("open" or "map")
        stage: &'static str,
        /// Underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// Register access attempted before `initialize`
    #[error("PWM interface not initialized")]
    NotInitialized,

    /// No prescaler keeps the period within 16 bits
    #[error("Period of {period_ns} ns cannot be represented by any prescaler")]
    InvalidConfiguration {
        /// Requested period
        period_ns: u64,
    },

    /// Raw channel index outside the block
    #[error("Invalid PWM channel: {index}")]
    InvalidChannel {
        /// Offending index
        index: u32,
    },

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl PwmError {
    /// Negative errno describing this error.
    ///
    /// Mapping failures carry the OS error code unchanged.
    pub fn code(&self) -> i32 {
        match self {
            Self::Mapping { source, .. } => {
                -source.raw_os_error().unwrap_or(Errno::EIO as i32)
            }
            Self::NotInitialized => -(Errno::EPERM as i32),
            Self::InvalidConfiguration { .. } | Self::InvalidChannel { .. } | Self::Config(_) => {
                -(Errno::EINVAL as i32)
            }
        }
    }
}

/// Result type for PWM operations
pub type PwmResult<T> = Result<T, PwmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(PwmError::NotInitialized.code(), -libc::EPERM);
        assert_eq!(
            PwmError::InvalidConfiguration { period_ns: 0 }.code(),
            -libc::EINVAL
        );
        assert_eq!(PwmError::InvalidChannel { index: 7 }.code(), -libc::EINVAL);
    }

    #[test]
    fn test_mapping_error_keeps_os_code() {
        let err = PwmError::Mapping {
            stage: "open",
            source: std::io::Error::from_raw_os_error(libc::EACCES),
        };
        assert_eq!(err.code(), -libc::EACCES);
        assert!(err.to_string().starts_with("Failed to open physical memory"));
    }
}
