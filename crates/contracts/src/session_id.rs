//! SessionId - opaque session identifier

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of one command stream.
///
/// Issued monotonically by the registry that owns the session and never reused
/// while that registry lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(u64);

impl SessionId {
    #[inline]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw numeric value
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for SessionId {
    #[inline]
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}
