//! LLM collaborators used by the summarizer: token counting, chat
//! completion, and the model capacity table.

pub mod completion;
pub mod error;
pub mod models;
pub mod openai;
pub mod tokenizer;

pub use completion::{ChatMessage, Choice, CompletionResponse, CompletionService, Usage};
pub use error::LlmError;
pub use models::{known_models, max_model_tokens};
pub use openai::OpenAiCompletionService;
pub use tokenizer::{EstimatingTokenizer, Tokenizer};
