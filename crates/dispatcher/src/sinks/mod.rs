//! Sink implementations
//!
//! Contains ConsoleSink, FileSink, and LogSink.

mod console;
mod file;
mod log;

pub use self::console::ConsoleSink;
pub use self::file::{FileSink, FileSinkConfig};
pub use self::log::LogSink;

use contracts::Batch;

/// One `bulk: cmd1, cmd2` line, without the trailing newline
pub(crate) fn bulk_line(batch: &Batch) -> String {
    format!("bulk: {batch}")
}
