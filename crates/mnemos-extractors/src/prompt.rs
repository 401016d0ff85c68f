//! Summarization prompt rendering.

use crate::error::ExtractorError;
use tera::{Context, Tera};

const TEMPLATE_NAME: &str = "summary";

/// Built-in progressive summarization prompt.
pub const DEFAULT_SUMMARY_TEMPLATE: &str = "\
Progressively summarize the lines of conversation provided, adding onto the previous summary and \
returning a new summary. Keep names, dates, facts, and decisions. Do not invent details. If the \
new lines add nothing of substance, return the current summary unchanged.

Current summary:
{{ prev_summary }}

New lines of conversation:
{{ messages_joined }}

New summary:
";

/// Renders the summarization prompt from the previous summary and new lines.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    tera: Tera,
}

impl PromptBuilder {
    /// Builder using the built-in template.
    pub fn new() -> Result<Self, ExtractorError> {
        Self::with_template(DEFAULT_SUMMARY_TEMPLATE)
    }

    /// Builder using `template`, or the built-in one when `None`.
    pub fn from_config(template: Option<&str>) -> Result<Self, ExtractorError> {
        Self::with_template(template.unwrap_or(DEFAULT_SUMMARY_TEMPLATE))
    }

    /// Compile a custom template. It must render `messages_joined`.
    pub fn with_template(template: &str) -> Result<Self, ExtractorError> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, template)
            .map_err(|err| ExtractorError::with_cause("invalid summary prompt template", err))?;
        let builder = Self { tera };

        const PROBE: &str = "\u{1f}messages\u{1f}";
        let probe = builder.render("", PROBE)?;
        if !probe.contains(PROBE) {
            return Err(ExtractorError::new(
                "summary prompt template does not render messages_joined",
            ));
        }
        Ok(builder)
    }

    /// Render the prompt. `prev_summary` may be empty.
    pub fn render(&self, prev_summary: &str, messages_joined: &str) -> Result<String, ExtractorError> {
        let mut context = Context::new();
        context.insert("prev_summary", prev_summary);
        context.insert("messages_joined", messages_joined);
        self.tera
            .render(TEMPLATE_NAME, &context)
            .map_err(|err| ExtractorError::with_cause("failed to render summary prompt", err))
    }
}
