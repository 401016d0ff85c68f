//! Extractor capability and the background launch shared by implementations.

use crate::context::ExtractContext;
use crate::error::ExtractorError;
use crate::state::AppState;
use async_trait::async_trait;
use futures_util::FutureExt;
use log::debug;
use mnemos_memory::MessageEvent;
use std::sync::Arc;

/// Unit of work triggered by message events.
#[async_trait]
pub trait Extractor: Send + Sync + 'static {
    /// Stable name used in reports and logs.
    fn name(&self) -> &'static str;

    /// Do the work for `event` and wait for it to finish.
    async fn extract(
        &self,
        ctx: &ExtractContext,
        state: &AppState,
        event: &MessageEvent,
    ) -> Result<(), ExtractorError>;

    /// Queue `extract` on the worker pool and return immediately.
    ///
    /// Errors from the background run go to the pool's report sink. This
    /// fails only for a missing event or when the pool refuses the job.
    fn notify(
        self: Arc<Self>,
        ctx: ExtractContext,
        state: Arc<AppState>,
        event: Option<MessageEvent>,
    ) -> Result<(), ExtractorError>;
}

/// Submit `extractor.extract(..)` to `state.workers`.
pub fn launch(
    extractor: Arc<dyn Extractor>,
    ctx: ExtractContext,
    state: Arc<AppState>,
    event: Option<MessageEvent>,
) -> Result<(), ExtractorError> {
    let Some(event) = event else {
        return Err(ExtractorError::new(format!(
            "{} notified without a message event",
            extractor.name()
        )));
    };
    let name = extractor.name();
    let session_id = event.session_id.clone();
    debug!(
        "queueing extractor (extractor={}, session_id={}, messages={})",
        name,
        session_id,
        event.messages.len()
    );
    let workers = state.workers.clone();
    let task = async move { extractor.extract(&ctx, &state, &event).await }.boxed();
    workers.submit(name, session_id, task)
}
