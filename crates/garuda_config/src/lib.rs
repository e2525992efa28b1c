//! Parsing and validation of `harness.toml`.
//!
//! Produces a strongly-typed [`HarnessConfig`] covering the DUT datapath
//! width and latency, clock and reset ports, the edge deadline, and
//! randomized-regression settings. Every key has a default, so an empty or
//! absent file yields a usable configuration.

#![warn(missing_docs)]

pub mod error;
pub mod loader;
pub mod types;

pub use error::ConfigError;
pub use loader::{
    load_config, load_config_from_str, load_config_or_default, validate_config, CONFIG_FILE_NAME,
};
pub use types::*;
