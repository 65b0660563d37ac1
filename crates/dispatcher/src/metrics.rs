//! Sink metrics for observability

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Metrics for a single sink
#[derive(Debug, Default)]
pub struct SinkMetrics {
    /// Batches waiting in the queue
    queue_len: AtomicUsize,
    /// Total batches accepted by the queue
    enqueued_count: AtomicU64,
    /// Total successful writes
    write_count: AtomicU64,
    /// Total write failures
    failure_count: AtomicU64,
    /// Total batches refused because the worker was stopped
    rejected_count: AtomicU64,
}

impl SinkMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Get current queue length
    pub fn queue_len(&self) -> usize {
        self.queue_len.load(Ordering::Relaxed)
    }

    /// Reserve a queue slot; done before the batch is handed to the worker
    pub fn inc_queue_len(&self) {
        self.queue_len.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch accepted by the queue
    pub fn inc_enqueued(&self) {
        self.enqueued_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a batch leaving the queue (or a reserved slot being given back)
    ///
    /// Saturates at zero.
    pub fn dec_queue_len(&self) {
        let _ = self
            .queue_len
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_sub(1));
    }

    pub fn enqueued_count(&self) -> u64 {
        self.enqueued_count.load(Ordering::Relaxed)
    }

    /// Get total write count
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Increment write count
    pub fn inc_write_count(&self) {
        self.write_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get failure count
    pub fn failure_count(&self) -> u64 {
        self.failure_count.load(Ordering::Relaxed)
    }

    /// Increment failure count
    pub fn inc_failure_count(&self) {
        self.failure_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get rejected count
    pub fn rejected_count(&self) -> u64 {
        self.rejected_count.load(Ordering::Relaxed)
    }

    /// Increment rejected count
    pub fn inc_rejected_count(&self) {
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queue_len: self.queue_len(),
            enqueued_count: self.enqueued_count(),
            write_count: self.write_count(),
            failure_count: self.failure_count(),
            rejected_count: self.rejected_count(),
        }
    }
}

/// Snapshot of sink metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub queue_len: usize,
    pub enqueued_count: u64,
    pub write_count: u64,
    pub failure_count: u64,
    pub rejected_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_len_tracks_enqueue_and_dequeue() {
        let metrics = SinkMetrics::new();
        for _ in 0..2 {
            metrics.inc_queue_len();
            metrics.inc_enqueued();
        }
        metrics.dec_queue_len();
        metrics.inc_write_count();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.queue_len, 1);
        assert_eq!(snapshot.enqueued_count, 2);
        assert_eq!(snapshot.write_count, 1);
        assert_eq!(snapshot.failure_count, 0);
    }

    #[test]
    fn test_dec_queue_len_saturates_at_zero() {
        let metrics = SinkMetrics::new();
        metrics.dec_queue_len();
        assert_eq!(metrics.queue_len(), 0);

        metrics.inc_queue_len();
        metrics.dec_queue_len();
        metrics.dec_queue_len();
        assert_eq!(metrics.queue_len(), 0);
    }
}
