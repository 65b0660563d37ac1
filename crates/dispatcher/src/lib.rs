//! # Dispatcher
//!
//! Session multiplexing and batch fan-out.
//!
//! Responsibilities:
//! - Own the open sessions, each with its own `Batcher`
//! - Fan completed batches out to every wired sink
//! - Isolate slow sinks behind per-sink queues so producers never wait on them

pub mod error;
pub mod handle;
pub mod metrics;
pub mod registry;
pub mod sinks;

pub use contracts::{Batch, BatchSink, SessionId};
pub use error::DispatcherError;
pub use handle::SinkHandle;
pub use metrics::{MetricsSnapshot, SinkMetrics};
pub use registry::{Registry, RegistryBuilder};
pub use sinks::{ConsoleSink, FileSink, FileSinkConfig, LogSink};
