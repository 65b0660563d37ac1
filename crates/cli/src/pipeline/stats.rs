//! Pipeline statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use tracing::info;

/// Statistics from a pipeline run
#[derive(Debug, Clone, Default)]
pub struct PipelineStats {
    /// Commands read from input (region tokens included)
    pub commands_received: u64,

    /// Commands the session refused (unbalanced `}`)
    pub commands_rejected: u64,

    /// Total duration of the pipeline run
    pub duration: Duration,

    /// Number of sinks wired into the session
    pub active_sinks: usize,

    /// Final per-sink metrics, taken after the sinks were stopped
    pub sinks: Vec<(String, MetricsSnapshot)>,
}

impl PipelineStats {
    /// Commands per second
    pub fn throughput(&self) -> f64 {
        if self.duration.as_secs_f64() > 0.0 {
            self.commands_received as f64 / self.duration.as_secs_f64()
        } else {
            0.0
        }
    }

    /// Bulks written successfully, summed over all sinks
    pub fn total_delivered(&self) -> u64 {
        self.sinks.iter().map(|(_, m)| m.write_count).sum()
    }

    /// Failed writes, summed over all sinks
    pub fn total_failures(&self) -> u64 {
        self.sinks.iter().map(|(_, m)| m.failure_count).sum()
    }

    /// Log the run summary
    ///
    /// Goes through tracing rather than stdout, which carries the bulk lines.
    pub fn log_summary(&self) {
        info!(
            commands_received = self.commands_received,
            commands_rejected = self.commands_rejected,
            duration_secs = format!("{:.3}", self.duration.as_secs_f64()),
            throughput = format!("{:.1}", self.throughput()),
            active_sinks = self.active_sinks,
            delivered = self.total_delivered(),
            failures = self.total_failures(),
            "Pipeline finished"
        );

        for (name, metrics) in &self.sinks {
            info!(
                sink = %name,
                enqueued = metrics.enqueued_count,
                written = metrics.write_count,
                failed = metrics.failure_count,
                rejected = metrics.rejected_count,
                "Sink summary"
            );
        }
    }
}
