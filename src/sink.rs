//! Persistence handoff for fired alerts.
//!
//! Storage lives outside this crate. It is reached through [`AlertSink`], and
//! the evaluation path never waits on it: [`AlertDispatcher`] pushes batches
//! onto a bounded queue that a background task drains. When the queue is full
//! the batch is dropped and counted.

use async_trait::async_trait;
use log::{debug, error, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::analytics::alerts::AlertRecord;
use crate::error::GreenflowResult;
use crate::monitoring::metrics::AnalyticsMetrics;

/// Best-effort destination for fired alerts
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn persist(&self, alerts: &[AlertRecord]) -> GreenflowResult<()>;
}

/// Sink that keeps everything in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    stored: Mutex<Vec<AlertRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stored(&self) -> Vec<AlertRecord> {
        self.stored.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.stored.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl AlertSink for MemorySink {
    async fn persist(&self, alerts: &[AlertRecord]) -> GreenflowResult<()> {
        self.stored.lock().extend_from_slice(alerts);
        Ok(())
    }
}

/// Hand `alerts` to `sink`, logging instead of propagating any failure
pub async fn persist_best_effort(
    sink: &dyn AlertSink,
    alerts: &[AlertRecord],
    metrics: Option<&AnalyticsMetrics>,
) -> bool {
    if alerts.is_empty() {
        return true;
    }
    match sink.persist(alerts).await {
        Ok(()) => {
            debug!("Persisted {} alert(s)", alerts.len());
            true
        }
        Err(e) => {
            error!("Failed to persist alerts: {}", e);
            if let Some(metrics) = metrics {
                metrics.persistence_failures_total.inc();
            }
            false
        }
    }
}

/// Bounded fire-and-forget queue in front of an [`AlertSink`]
pub struct AlertDispatcher {
    tx: mpsc::Sender<Vec<AlertRecord>>,
    dropped: Arc<AtomicU64>,
    worker: JoinHandle<()>,
}

impl AlertDispatcher {
    /// Start the drain task. Must be called inside a tokio runtime.
    pub fn spawn(
        sink: Arc<dyn AlertSink>,
        capacity: usize,
        metrics: Option<Arc<AnalyticsMetrics>>,
    ) -> Self {
        let (tx, mut rx) = mpsc::channel::<Vec<AlertRecord>>(capacity.max(1));

        let worker = tokio::spawn(async move {
            while let Some(batch) = rx.recv().await {
                persist_best_effort(sink.as_ref(), &batch, metrics.as_deref()).await;
            }
            debug!("Alert dispatcher drained and stopped");
        });

        Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            worker,
        }
    }

    /// Queue a batch without waiting. Returns false if it had to be dropped.
    pub fn dispatch(&self, alerts: Vec<AlertRecord>) -> bool {
        if alerts.is_empty() {
            return true;
        }
        match self.tx.try_send(alerts) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(batch)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Persistence queue full, dropping {} alert(s)", batch.len());
                false
            }
            Err(mpsc::error::TrySendError::Closed(batch)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!("Persistence worker gone, dropping {} alert(s)", batch.len());
                false
            }
        }
    }

    /// False once the drain task has exited, e.g. after a sink panicked
    pub fn is_running(&self) -> bool {
        !self.worker.is_finished()
    }

    /// Batches dropped because the queue was full or closed
    pub fn dropped_batches(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Close the queue and wait until everything queued has been handed over
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker.await {
            error!("Alert dispatcher task failed: {}", e);
        }
    }
}
