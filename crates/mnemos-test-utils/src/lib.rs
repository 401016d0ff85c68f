//! Test helpers shared across Mnemos crates.

pub mod fixtures;
pub mod llm;
pub mod memory;
pub mod report;

pub use fixtures::{test_config, test_state, transcript};
pub use llm::{CompletionCall, ScriptedCompletion, WordTokenizer};
pub use memory::StubStore;
pub use report::CollectingSink;
