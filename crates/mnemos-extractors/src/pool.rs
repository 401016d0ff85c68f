//! Bounded worker pool for background extractor runs.

use crate::error::ExtractorError;
use futures_util::future::BoxFuture;
use log::{debug, error, info};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Semaphore, mpsc};
use tokio::task::{JoinHandle, JoinSet};

/// Outcome of one background extractor run.
#[derive(Debug)]
pub struct ExtractReport {
    pub extractor: &'static str,
    pub session_id: String,
    pub elapsed: Duration,
    /// `None` on success.
    pub error: Option<ExtractorError>,
}

impl ExtractReport {
    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Receives the outcome of every background run.
pub trait ReportSink: Send + Sync {
    fn report(&self, report: ExtractReport);
}

/// Sink writing reports through the `log` facade.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogReportSink;

impl ReportSink for LogReportSink {
    fn report(&self, report: ExtractReport) {
        match &report.error {
            Some(err) => error!(
                "extractor failed (extractor={}, session_id={}, elapsed_ms={}, error={})",
                report.extractor,
                report.session_id,
                report.elapsed.as_millis(),
                err
            ),
            None => debug!(
                "extractor finished (extractor={}, session_id={}, elapsed_ms={})",
                report.extractor,
                report.session_id,
                report.elapsed.as_millis()
            ),
        }
    }
}

struct Job {
    extractor: &'static str,
    session_id: String,
    task: BoxFuture<'static, Result<(), ExtractorError>>,
}

/// Bounded queue drained by a dispatcher task that runs at most
/// `max_concurrent` jobs at once. Clones share the same pool.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

struct PoolInner {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    dispatcher: Mutex<Option<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Start a pool. Must be called from within a tokio runtime.
    pub fn new(max_concurrent: usize, queue_capacity: usize, sink: Arc<dyn ReportSink>) -> Self {
        let max_concurrent = max_concurrent.max(1);
        let (sender, receiver) = mpsc::channel(queue_capacity.max(1));
        let semaphore = Arc::new(Semaphore::new(max_concurrent));
        let dispatcher = tokio::spawn(dispatch(receiver, semaphore, sink));
        info!(
            "worker pool started (max_concurrent={}, queue_capacity={})",
            max_concurrent, queue_capacity
        );
        Self {
            inner: Arc::new(PoolInner {
                sender: Mutex::new(Some(sender)),
                dispatcher: Mutex::new(Some(dispatcher)),
            }),
        }
    }

    /// Queue a job without waiting for it to start.
    ///
    /// Fails when the queue is full or the pool has been shut down.
    pub fn submit(
        &self,
        extractor: &'static str,
        session_id: impl Into<String>,
        task: BoxFuture<'static, Result<(), ExtractorError>>,
    ) -> Result<(), ExtractorError> {
        let sender = self.inner.sender.lock();
        let Some(sender) = sender.as_ref() else {
            return Err(ExtractorError::new("worker pool is shut down"));
        };
        let job = Job {
            extractor,
            session_id: session_id.into(),
            task,
        };
        match sender.try_send(job) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(job)) => Err(ExtractorError::new(format!(
                "worker pool queue is full (extractor={}, session_id={})",
                job.extractor, job.session_id
            ))),
            Err(TrySendError::Closed(_)) => Err(ExtractorError::new("worker pool is shut down")),
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.inner.sender.lock().is_none()
    }

    /// Stop intake, then wait for queued and running jobs to finish.
    pub async fn shutdown(&self) {
        self.inner.sender.lock().take();
        let dispatcher = self.inner.dispatcher.lock().take();
        if let Some(dispatcher) = dispatcher {
            if let Err(err) = dispatcher.await {
                error!("worker pool dispatcher failed (error={})", err);
            }
            info!("worker pool stopped");
        }
    }
}

async fn dispatch(
    mut receiver: mpsc::Receiver<Job>,
    semaphore: Arc<Semaphore>,
    sink: Arc<dyn ReportSink>,
) {
    let mut running = JoinSet::new();
    while let Some(job) = receiver.recv().await {
        let Ok(permit) = semaphore.clone().acquire_owned().await else {
            break;
        };
        let sink = sink.clone();
        running.spawn(async move {
            let _permit = permit;
            let started = Instant::now();
            let result = job.task.await;
            sink.report(ExtractReport {
                extractor: job.extractor,
                session_id: job.session_id,
                elapsed: started.elapsed(),
                error: result.err(),
            });
        });
        while let Some(finished) = running.try_join_next() {
            log_join_failure(finished);
        }
    }
    while let Some(finished) = running.join_next().await {
        log_join_failure(finished);
    }
}

fn log_join_failure(result: Result<(), tokio::task::JoinError>) {
    if let Err(err) = result {
        error!("extractor job aborted (error={})", err);
    }
}
