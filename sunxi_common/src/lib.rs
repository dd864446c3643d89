//! Sunxi PWM Common Library
//!
//! This crate provides shared constants and configuration loading utilities
//! for the sunxi PWM workspace crates.
//!
//! # Module Structure
//!
//! - [`consts`] - Hardware constants (base address, clock, prescaler table)
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! ```rust
//! use sunxi_common::consts::*;
//! use sunxi_common::config::{ConfigLoader, PwmConfig};
//! ```

pub mod config;
pub mod consts;
pub mod prelude;
