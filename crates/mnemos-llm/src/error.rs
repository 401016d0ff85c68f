//! Error types for completion and tokenizer backends.

/// Errors returned by LLM collaborators.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport failure talking to the backend.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    /// Backend answered with a non-success status.
    #[error("completion backend returned {status}: {body}")]
    Status { status: u16, body: String },
    /// Backend is throttling requests.
    #[error("completion backend rate limited: {0}")]
    RateLimited(String),
    /// Response body did not match the expected shape.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
    /// Response carried no choices.
    #[error("completion response has no choices")]
    EmptyResponse,
    /// Token counting failed.
    #[error("tokenizer error: {0}")]
    Tokenizer(String),
}
