//! LogSink - logs batch summary via tracing

use contracts::{Batch, BatchSink, ContractError};
use tracing::{info, instrument};

/// Sink that logs batch summaries for debugging
pub struct LogSink {
    name: String,
    batches: u64,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            batches: 0,
        }
    }

    fn log_batch_summary(&self, batch: &Batch) {
        info!(
            sink = %self.name,
            seq = self.batches,
            commands = batch.len(),
            first = batch.commands().first().map(String::as_str).unwrap_or_default(),
            last = batch.commands().last().map(String::as_str).unwrap_or_default(),
            "Batch received"
        );
    }
}

impl BatchSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, batch),
        fields(sink = %self.name, batch_len = batch.len())
    )]
    async fn write(&mut self, batch: &Batch) -> Result<(), ContractError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.batches += 1;
        self.log_batch_summary(batch);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, batches = self.batches, "LogSink closed");
        Ok(())
    }
}
