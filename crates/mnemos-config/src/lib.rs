//! Configuration models and layered config loading.
//!
//! This crate owns the Mnemos config schema, its validation, and the
//! discovery and merging of `mnemos.json5` files.

mod error;
mod loader;
mod model;

/// Public error type returned by config loading and validation APIs.
pub use error::ConfigError;
/// Config file discovery and load results.
pub use loader::{ConfigFile, ConfigOrigin, ConfigSearch, LoadedConfig};
/// Configuration schema models.
pub use model::*;
