//! Structured result of a posting operation

use serde::{Deserialize, Serialize};

/// What a state-transition operation actually did
///
/// Returned alongside the mutated document so callers can see how many
/// ledger entries were written and which non-critical side effects failed.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PostingOutcome {
    /// Number of ledger entries committed by this operation
    pub ledger_entries: usize,
    /// Non-critical side effects that failed without aborting the operation
    pub warnings: Vec<String>,
}

impl PostingOutcome {
    pub fn new(ledger_entries: usize) -> Self {
        Self {
            ledger_entries,
            warnings: Vec::new(),
        }
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}
