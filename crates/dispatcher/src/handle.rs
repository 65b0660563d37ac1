//! SinkHandle - manages a sink with isolated queue and worker task

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use contracts::{Batch, BatchSink};

use crate::error::DispatcherError;
use crate::metrics::SinkMetrics;

/// Message consumed by the sink worker
#[derive(Debug)]
enum SinkMessage {
    Deliver(Batch),
    /// Queued behind every batch already accepted, so those are still delivered
    Stop,
}

/// Handle to a running sink worker
///
/// Producers call [`SinkHandle::enqueue`] from any thread; the worker task
/// delivers batches one at a time in the order they were enqueued.
pub struct SinkHandle {
    /// Sink name
    name: String,
    /// Channel to send batches to worker
    tx: mpsc::UnboundedSender<SinkMessage>,
    /// Shared metrics
    metrics: Arc<SinkMetrics>,
    /// Set once the worker has exited
    stopped: Arc<AtomicBool>,
    /// Worker task handle, taken by `stop`
    worker_handle: Mutex<Option<JoinHandle<()>>>,
}

impl SinkHandle {
    /// Create a new SinkHandle and spawn the worker task on the current runtime
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn<S: BatchSink + Send + 'static>(sink: S) -> Self {
        Self::spawn_on(sink, &Handle::current())
    }

    /// Create a new SinkHandle with its worker task on the given runtime
    ///
    /// Callable from any thread.
    #[instrument(name = "sink_handle_spawn", skip(sink, runtime), fields(sink = %sink.name()))]
    pub fn spawn_on<S: BatchSink + Send + 'static>(sink: S, runtime: &Handle) -> Self {
        let name = sink.name().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        let metrics = Arc::new(SinkMetrics::new());
        let stopped = Arc::new(AtomicBool::new(false));

        let worker_metrics = Arc::clone(&metrics);
        let worker_stopped = Arc::clone(&stopped);
        let worker_name = name.clone();

        let worker_handle = runtime.spawn(async move {
            sink_worker(sink, rx, worker_metrics, worker_name).await;
            worker_stopped.store(true, Ordering::Release);
        });

        Self {
            name,
            tx,
            metrics,
            stopped,
            worker_handle: Mutex::new(Some(worker_handle)),
        }
    }

    /// Get sink name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get current metrics
    pub fn metrics(&self) -> &Arc<SinkMetrics> {
        &self.metrics
    }

    /// Queue a batch for delivery (never blocks)
    ///
    /// Returns false if the worker has already been stopped; the batch is
    /// dropped and counted as rejected.
    pub fn enqueue(&self, batch: Batch) -> bool {
        // The worker may dequeue before `send` returns, so count the slot first
        self.metrics.inc_queue_len();
        match self.tx.send(SinkMessage::Deliver(batch)) {
            Ok(()) => {
                self.metrics.inc_enqueued();
                true
            }
            Err(mpsc::error::SendError(message)) => {
                self.metrics.dec_queue_len();
                self.metrics.inc_rejected_count();
                let batch_len = match message {
                    SinkMessage::Deliver(batch) => batch.len(),
                    SinkMessage::Stop => 0,
                };
                warn!(
                    sink = %self.name,
                    batch_len,
                    "Sink worker stopped, batch rejected"
                );
                false
            }
        }
    }

    /// Whether the worker has terminated
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Stop the sink worker gracefully
    ///
    /// Every batch enqueued before this call is delivered first. Returns once
    /// the worker has exited.
    ///
    /// # Errors
    /// [`DispatcherError::AlreadyStopped`] if `stop` was already called.
    #[instrument(name = "sink_handle_stop", skip(self), fields(sink = %self.name))]
    pub async fn stop(&self) -> Result<(), DispatcherError> {
        let worker = self
            .worker_handle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .ok_or_else(|| DispatcherError::already_stopped(&self.name))?;

        // Fails only if the worker is already gone; the join below reports why.
        let _ = self.tx.send(SinkMessage::Stop);

        if let Err(e) = worker.await {
            error!(sink = %self.name, error = ?e, "Worker task panicked");
        }
        self.stopped.store(true, Ordering::Release);
        debug!(sink = %self.name, "SinkHandle stop complete");
        Ok(())
    }
}

impl std::fmt::Debug for SinkHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SinkHandle")
            .field("name", &self.name)
            .field("stopped", &self.is_stopped())
            .field("metrics", &self.metrics.snapshot())
            .finish()
    }
}

/// Worker task that consumes batches and writes to sink
#[instrument(name = "sink_worker_loop", skip(sink, rx, metrics), fields(sink = %name))]
async fn sink_worker<S: BatchSink>(
    mut sink: S,
    mut rx: mpsc::UnboundedReceiver<SinkMessage>,
    metrics: Arc<SinkMetrics>,
    name: String,
) {
    debug!(sink = %name, "Sink worker started");

    while let Some(message) = rx.recv().await {
        match message {
            SinkMessage::Deliver(batch) => {
                metrics.dec_queue_len();
                deliver(&mut sink, &batch, &metrics, &name).await;
            }
            SinkMessage::Stop => {
                // Refuse new batches, keep draining what is already queued
                rx.close();
            }
        }
    }

    // Cleanup
    if let Err(e) = sink.flush().await {
        error!(sink = %name, error = %e, "Flush failed on shutdown");
    }
    if let Err(e) = sink.close().await {
        error!(sink = %name, error = %e, "Close failed on shutdown");
    }

    debug!(sink = %name, "Sink worker stopped");
}

async fn deliver<S: BatchSink>(sink: &mut S, batch: &Batch, metrics: &SinkMetrics, name: &str) {
    match sink.write(batch).await {
        Ok(()) => {
            metrics.inc_write_count();
            observability::record_batch_delivered(name, true);
        }
        Err(e) => {
            metrics.inc_failure_count();
            observability::record_batch_delivered(name, false);
            error!(
                sink = %name,
                batch_len = batch.len(),
                error = %e,
                "Write failed"
            );
            // Continue processing - don't crash on single failure
        }
    }
}
