//! BatchSink trait - Dispatcher output interface
//!
//! Defines the abstract interface for sinks.

use crate::{Batch, ContractError};

/// Batch output trait
///
/// All sink implementations must implement this trait. A sink is owned by a
/// single worker task, so methods take `&mut self`.
#[trait_variant::make(BatchSink: Send)]
pub trait LocalBatchSink {
    /// Sink name (used for logging/metrics)
    fn name(&self) -> &str;

    /// Deliver one completed batch
    ///
    /// # Errors
    /// Returns write error (should include context)
    async fn write(&mut self, batch: &Batch) -> Result<(), ContractError>;

    /// Flush buffer (if any)
    async fn flush(&mut self) -> Result<(), ContractError>;

    /// Close sink
    async fn close(&mut self) -> Result<(), ContractError>;
}
