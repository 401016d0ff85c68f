use mnemos_extractors::{ExtractReport, ReportSink};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Report sink that keeps every report and lets tests wait for them.
#[derive(Clone, Default)]
pub struct CollectingSink {
    reports: Arc<Mutex<Vec<ExtractReport>>>,
    notify: Arc<Notify>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drain collected reports.
    pub fn take(&self) -> Vec<ExtractReport> {
        std::mem::take(&mut *self.reports.lock())
    }

    /// Wait until at least `count` reports arrived. Returns false on timeout.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> bool {
        tokio::time::timeout(timeout, async {
            loop {
                let notified = self.notify.notified();
                if self.len() >= count {
                    return;
                }
                notified.await;
            }
        })
        .await
        .is_ok()
    }
}

impl ReportSink for CollectingSink {
    fn report(&self, report: ExtractReport) {
        self.reports.lock().push(report);
        self.notify.notify_waiters();
    }
}
