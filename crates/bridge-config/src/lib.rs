//! # Bridge Configuration
//!
//! Persisted JSON configuration with defaults-on-failure semantics and a
//! typed change notification for the pacing interval.
//!
//! A malformed or missing config file is never fatal to the pipeline: the
//! store logs the problem, falls back to defaults, and writes the defaults
//! back so the next start has a well-formed file.

pub mod store;
pub mod values;

pub use store::ConfigStore;
pub use values::ConfigValues;

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "LOGBRIDGE_CONFIG_PATH";

/// Default config file location relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config.json";
