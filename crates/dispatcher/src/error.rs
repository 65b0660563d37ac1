//! Dispatcher error types

use contracts::SessionId;
use thiserror::Error;

/// Dispatcher-specific errors
#[derive(Debug, Error)]
pub enum DispatcherError {
    /// Sink creation error
    #[error("failed to create sink '{name}': {message}")]
    SinkCreation { name: String, message: String },

    /// Session id not (or no longer) registered
    #[error("unknown session {0}")]
    UnknownSession(SessionId),

    /// Freshly issued session id already present
    #[error("session {0} already exists")]
    DuplicateSession(SessionId),

    /// Reset requested while sink workers are still running
    #[error("sinks still running: {}", sinks.join(", "))]
    SinksNotStopped { sinks: Vec<String> },

    /// No tokio runtime available to host a sink worker
    #[error("no tokio runtime available for sink workers")]
    NoRuntime,

    /// Stop requested twice for the same sink
    #[error("sink '{sink_name}' already stopped")]
    AlreadyStopped { sink_name: String },

    /// Batching or sink error (from contract)
    #[error("contract error: {0}")]
    Contract(#[from] contracts::ContractError),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl DispatcherError {
    /// Create a sink creation error
    pub fn sink_creation(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkCreation {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Create an already-stopped error
    pub fn already_stopped(sink_name: impl Into<String>) -> Self {
        Self::AlreadyStopped {
            sink_name: sink_name.into(),
        }
    }
}
