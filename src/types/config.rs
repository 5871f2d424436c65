use std::time::Duration;

use serde::Deserialize;

/// Interpreter settings supplied by the embedding proxy's configuration.
///
/// Every field has a default, so a partial (or empty) config section
/// deserializes cleanly.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InterpreterConfig {
    /// Emit a record for every function entry, condition and action.
    pub trace: bool,

    /// Reverse-resolve IP-literal hosts for site and URL conditions.
    pub reverse_lookups: bool,

    /// Deepest allowed chain of nested function calls. A call beyond it is
    /// refused and yields `false`.
    pub max_call_depth: usize,

    /// Upper bound on a single reverse lookup, in milliseconds.
    pub reverse_lookup_timeout_ms: u64,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        Self {
            trace: false,
            reverse_lookups: false,
            max_call_depth: 64,
            reverse_lookup_timeout_ms: 2000,
        }
    }
}

impl InterpreterConfig {
    #[must_use]
    pub fn reverse_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.reverse_lookup_timeout_ms)
    }
}
