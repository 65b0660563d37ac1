//! Batching and delivery metric recorders
//!
//! Thin wrappers over the `metrics` facade; without an installed recorder they
//! are no-ops.

use metrics::{counter, gauge, histogram};

/// Record one command accepted by a session
pub fn record_command_received() {
    counter!("bulkmt_commands_received_total").increment(1);
}

/// Record a completed, non-empty batch
pub fn record_batch_emitted(batch_len: usize) {
    counter!("bulkmt_batches_emitted_total").increment(1);
    histogram!("bulkmt_batch_size").record(batch_len as f64);
}

/// Record the number of open sessions
pub fn record_sessions_open(count: usize) {
    gauge!("bulkmt_sessions_open").set(count as f64);
}

/// Record a batch delivery attempt on a sink
pub fn record_batch_delivered(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "bulkmt_batches_delivered_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}
