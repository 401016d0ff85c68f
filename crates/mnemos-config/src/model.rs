//! Configuration schema for Mnemos.

use serde::{Deserialize, Serialize};

/// Root config for a Mnemos deployment.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MnemosConfig {
    #[serde(default, rename = "$schema")]
    pub schema: Option<String>,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub extractors: ExtractorsConfig,
}

impl MnemosConfig {
    /// Start building a config programmatically with defaults applied.
    pub fn builder() -> MnemosConfigBuilder {
        MnemosConfigBuilder::new()
    }
}

/// Builder for assembling a `MnemosConfig` in code.
#[derive(Debug, Default, Clone)]
pub struct MnemosConfigBuilder {
    config: MnemosConfig,
}

impl MnemosConfigBuilder {
    /// Create a new builder seeded with default config values.
    pub fn new() -> Self {
        Self {
            config: MnemosConfig::default(),
        }
    }

    /// Replace the memory configuration.
    pub fn memory(mut self, memory: MemoryConfig) -> Self {
        self.config.memory = memory;
        self
    }

    /// Set the message window that triggers summarization.
    pub fn message_window(mut self, message_window: usize) -> Self {
        self.config.memory.message_window = message_window;
        self
    }

    /// Replace the completion backend configuration.
    pub fn llm(mut self, llm: LlmConfig) -> Self {
        self.config.llm = llm;
        self
    }

    /// Set the completion model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.llm.model = model.into();
        self
    }

    /// Replace the extractor configuration.
    pub fn extractors(mut self, extractors: ExtractorsConfig) -> Self {
        self.config.extractors = extractors;
        self
    }

    /// Set the fixed prompt overhead reserved by the summarizer.
    pub fn prompt_tokens(mut self, prompt_tokens: usize) -> Self {
        self.config.extractors.summarizer.prompt_tokens = prompt_tokens;
        self
    }

    /// Override the summarizer prompt template.
    pub fn prompt_template(mut self, template: impl Into<String>) -> Self {
        self.config.extractors.summarizer.prompt_template = Some(template.into());
        self
    }

    /// Finalize the builder into a config.
    pub fn build(self) -> MnemosConfig {
        self.config
    }
}

/// Session memory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Uncovered message count that triggers summarization.
    #[serde(default = "default_message_window")]
    pub message_window: usize,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            message_window: default_message_window(),
            store: StoreConfig::default(),
        }
    }
}

fn default_message_window() -> usize {
    12
}

/// Memory store location.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Root directory for the file store; defaults to `~/.mnemos/memory`.
    #[serde(default)]
    pub path: Option<String>,
}

/// Completion backend settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: default_base_url(),
            api_key_env: default_api_key_env(),
            timeout_secs: default_llm_timeout_secs(),
        }
    }
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_llm_timeout_secs() -> u64 {
    60
}

/// Extractor pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ExtractorsConfig {
    #[serde(default)]
    pub summarizer: SummarizerConfig,
    #[serde(default)]
    pub workers: WorkersConfig,
    /// Optional deadline applied to each background extraction.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Summary extractor settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummarizerConfig {
    #[serde(default = "default_summarizer_enabled")]
    pub enabled: bool,
    /// Token headroom reserved for the prompt itself; 0 selects the built-in estimate.
    #[serde(default)]
    pub prompt_tokens: usize,
    /// Optional tera template overriding the built-in summary prompt.
    #[serde(default)]
    pub prompt_template: Option<String>,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            enabled: default_summarizer_enabled(),
            prompt_tokens: 0,
            prompt_template: None,
        }
    }
}

fn default_summarizer_enabled() -> bool {
    true
}

/// Background worker pool sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
        }
    }
}

fn default_max_concurrent() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    256
}
