//! Error type for the Mnemos service facade.

use thiserror::Error;

/// Errors returned by [`crate::Mnemos`].
#[derive(Debug, Error)]
pub enum MnemosError {
    #[error("config error: {0}")]
    Config(#[from] mnemos_config::ConfigError),
    #[error("memory error: {0}")]
    Memory(#[from] mnemos_memory::MemoryError),
    #[error("llm error: {0}")]
    Llm(#[from] mnemos_llm::LlmError),
    #[error("extractor error: {0}")]
    Extractor(#[from] mnemos_extractors::ExtractorError),
    /// No memory store path is configured and no home directory was found.
    #[error("no memory store path configured")]
    MissingStorePath,
}
