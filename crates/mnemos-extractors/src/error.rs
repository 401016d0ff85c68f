//! Error type for extractor runs.

use std::error::Error as StdError;

/// Boxed underlying cause.
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// Failure of an extractor stage.
///
/// Every failure is terminal for the current run, so there is a single kind
/// carrying the stage description and, when available, the underlying cause.
/// The cause is rendered inline by `Display` and is not exposed again through
/// `Error::source`, so chain printers show it once.
#[derive(Debug, thiserror::Error)]
#[error("{message}{}", .cause.as_ref().map(|cause| format!(": {cause}")).unwrap_or_default())]
pub struct ExtractorError {
    message: String,
    cause: Option<BoxError>,
}

impl ExtractorError {
    /// Error without an underlying cause.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    /// Error wrapping `cause`.
    pub fn with_cause(message: impl Into<String>, cause: impl Into<BoxError>) -> Self {
        Self {
            message: message.into(),
            cause: Some(cause.into()),
        }
    }

    /// Stage description without the cause.
    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> Option<&(dyn StdError + Send + Sync + 'static)> {
        self.cause.as_deref()
    }
}
