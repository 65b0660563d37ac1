//! # Batcher
//!
//! Per-session batching state machine.
//!
//! Responsibilities:
//! - Size-triggered batches outside dynamic regions
//! - Region-delimited batches for `{ ... }`, which may nest
//! - Final flush when the session closes
//!
//! ## Example
//!
//! ```
//! use batcher::Batcher;
//!
//! let mut batcher = Batcher::new(2).unwrap();
//! assert!(batcher.process("cmd1").unwrap().is_empty());
//! let batch = batcher.process("cmd2").unwrap();
//! assert_eq!(batch.commands(), ["cmd1", "cmd2"]);
//! ```

mod batcher;

pub use batcher::{Batcher, Token};

// Re-export contracts types
pub use contracts::{Batch, ContractError, CLOSE_REGION, OPEN_REGION};
