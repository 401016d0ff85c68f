//! Extractor runtime for Mnemos.
//!
//! This crate owns the extractor capability, the bounded worker pool that
//! runs extractors in the background, and the summary extractor that keeps
//! each session's uncovered transcript below the configured window.

pub mod context;
pub mod error;
pub mod extractor;
pub mod locks;
pub mod pool;
pub mod prompt;
pub mod registry;
pub mod state;
pub mod summarizer;

pub use context::ExtractContext;
pub use error::{BoxError, ExtractorError};
pub use extractor::{Extractor, launch};
pub use locks::{SessionGuard, SessionLocks};
/// Background execution and outcome reporting.
pub use pool::{ExtractReport, LogReportSink, ReportSink, WorkerPool};
pub use prompt::{DEFAULT_SUMMARY_TEMPLATE, PromptBuilder};
pub use registry::ExtractorRegistry;
pub use state::AppState;
pub use summarizer::{DEFAULT_PROMPT_TOKENS, SUMMARY_MAX_OUTPUT_TOKENS, SummaryExtractor};
