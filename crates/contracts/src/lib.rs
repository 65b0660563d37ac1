//! # Contracts
//!
//! Frozen interface contracts shared by every crate in the workspace.
//! Business crates depend only on this crate, never on each other in reverse.
//!
//! ## Command model
//! - A session feeds plain text commands, one token at a time
//! - `{` and `}` are the only reserved tokens; they delimit dynamic regions
//! - Completed groups of commands travel as [`Batch`] values to [`BatchSink`]s

mod batch;
mod config;
mod error;
mod session_id;
mod sink;

pub use batch::*;
pub use config::*;
pub use error::*;
pub use session_id::SessionId;
pub use sink::*;
