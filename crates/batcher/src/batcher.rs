//! Batcher state machine implementation.

use contracts::{Batch, ContractError, CLOSE_REGION, OPEN_REGION};
use tracing::trace;

/// Classified input token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token<'a> {
    /// `{`
    OpenRegion,
    /// `}`
    CloseRegion,
    /// Anything else, including the empty string
    Command(&'a str),
}

impl<'a> Token<'a> {
    /// Classify by exact match against the control tokens
    pub fn classify(raw: &'a str) -> Self {
        match raw {
            OPEN_REGION => Self::OpenRegion,
            CLOSE_REGION => Self::CloseRegion,
            other => Self::Command(other),
        }
    }
}

/// Turns a stream of commands into completed batches.
///
/// Outside a dynamic region a batch closes once `capacity` commands are
/// pending. Inside a region the capacity is ignored and the batch closes only
/// when the outermost region closes.
#[derive(Debug)]
pub struct Batcher {
    /// Pending commands in arrival order
    pending: Vec<String>,
    /// Dynamic region nesting depth
    depth: usize,
    /// Size threshold, fixed at creation
    capacity: usize,
}

impl Batcher {
    /// Create a batcher with the given size threshold
    ///
    /// # Errors
    /// A zero capacity is rejected: the size trigger could never fire.
    pub fn new(capacity: usize) -> Result<Self, ContractError> {
        if capacity == 0 {
            return Err(ContractError::config_validation(
                "capacity",
                "batch capacity must be > 0",
            ));
        }
        Ok(Self {
            pending: Vec::with_capacity(capacity),
            depth: 0,
            capacity,
        })
    }

    /// Process one command, returning the batch it completes.
    ///
    /// The returned batch is empty when nothing completed.
    ///
    /// # Errors
    /// [`ContractError::UnbalancedRegion`] for `}` at depth 0; state is unchanged.
    pub fn process(&mut self, command: &str) -> Result<Batch, ContractError> {
        let batch = match Token::classify(command) {
            Token::OpenRegion => {
                self.depth += 1;
                if self.depth == 1 {
                    self.take_pending()
                } else {
                    Batch::empty()
                }
            }
            Token::CloseRegion => {
                if self.depth == 0 {
                    return Err(ContractError::UnbalancedRegion);
                }
                self.depth -= 1;
                if self.depth == 0 {
                    self.take_pending()
                } else {
                    Batch::empty()
                }
            }
            Token::Command(cmd) => {
                self.pending.push(cmd.to_owned());
                if self.depth == 0 && self.pending.len() >= self.capacity {
                    self.take_pending()
                } else {
                    Batch::empty()
                }
            }
        };

        trace!(
            depth = self.depth,
            pending = self.pending.len(),
            emitted = batch.len(),
            "Command processed"
        );
        Ok(batch)
    }

    /// Final flush at session close.
    ///
    /// At depth 0 the pending commands are emitted. Inside an unfinished region
    /// the region is abandoned: its commands are discarded and an empty batch is
    /// returned.
    pub fn flush(&mut self) -> Batch {
        if self.depth == 0 {
            return self.take_pending();
        }
        trace!(
            depth = self.depth,
            discarded = self.pending.len(),
            "Unfinished region abandoned"
        );
        self.pending.clear();
        self.depth = 0;
        Batch::empty()
    }

    /// Current nesting depth
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Number of pending commands
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn take_pending(&mut self) -> Batch {
        Batch::new(std::mem::take(&mut self.pending))
    }
}
