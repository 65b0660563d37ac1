//! Batch - Batcher output
//!
//! An ordered, immutable group of commands delivered to sinks as one unit.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Token that opens a dynamic region
pub const OPEN_REGION: &str = "{";

/// Token that closes a dynamic region
pub const CLOSE_REGION: &str = "}";

/// Completed group of commands
///
/// An empty batch means "nothing to deliver" and is never forwarded to sinks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Batch {
    commands: Vec<String>,
}

impl Batch {
    /// Create a batch from commands in arrival order
    pub fn new(commands: Vec<String>) -> Self {
        Self { commands }
    }

    /// Empty batch
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Commands in arrival order
    pub fn commands(&self) -> &[String] {
        &self.commands
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.commands.iter()
    }

    pub fn into_commands(self) -> Vec<String> {
        self.commands
    }
}

impl From<Vec<String>> for Batch {
    fn from(commands: Vec<String>) -> Self {
        Self::new(commands)
    }
}

impl<'a> From<Vec<&'a str>> for Batch {
    fn from(commands: Vec<&'a str>) -> Self {
        Self::new(commands.into_iter().map(String::from).collect())
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Renders the commands joined by `", "` (the body of a `bulk:` line)
impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, command) in self.commands.iter().enumerate() {
            if idx > 0 {
                f.write_str(", ")?;
            }
            f.write_str(command)?;
        }
        Ok(())
    }
}
