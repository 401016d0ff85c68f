//! Public SDK surface for Mnemos.
//!
//! This crate re-exports the building blocks, wires them into a [`Mnemos`]
//! service, and provides a small initialization helper to keep consumer
//! setup consistent.

mod error;
mod service;

/// Re-export for convenience.
pub use mnemos_config as config;
/// Re-export for convenience.
pub use mnemos_extractors as extractors;
/// Re-export for convenience.
pub use mnemos_llm as llm;
/// Re-export for convenience.
pub use mnemos_memory as memory;

pub use error::MnemosError;
pub use service::Mnemos;

#[inline]
/// Initialize logging using env_logger.
///
/// Safe to call more than once; later calls are no-ops. Verbosity follows
/// `RUST_LOG`.
pub fn init_logging() {
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .parse_default_env()
        .try_init();
}
