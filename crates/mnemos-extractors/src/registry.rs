//! Ordered set of extractors notified for each message event.

use crate::context::ExtractContext;
use crate::error::ExtractorError;
use crate::extractor::Extractor;
use crate::state::AppState;
use log::{info, warn};
use mnemos_memory::MessageEvent;
use std::sync::Arc;

/// Extractors in registration order.
#[derive(Clone, Default)]
pub struct ExtractorRegistry {
    extractors: Vec<Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        info!("registered extractor (name={})", extractor.name());
        self.extractors.push(extractor);
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|extractor| extractor.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }

    /// Notify every extractor in order.
    ///
    /// All extractors are attempted even if one refuses; the first refusal is
    /// returned.
    pub fn notify_all(
        &self,
        ctx: &ExtractContext,
        state: &Arc<AppState>,
        event: Option<&MessageEvent>,
    ) -> Result<(), ExtractorError> {
        let mut first_error = None;
        for extractor in &self.extractors {
            let result = extractor
                .clone()
                .notify(ctx.clone(), state.clone(), event.cloned());
            if let Err(err) = result {
                warn!(
                    "extractor refused event (name={}, error={})",
                    extractor.name(),
                    err
                );
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}
