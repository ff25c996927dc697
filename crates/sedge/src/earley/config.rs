//! Configuration for the recognizer.

/// Options controlling a parse.
#[derive(Debug, Clone)]
pub struct EarleyConfig {
    /// Repair dead charts with insertion/deletion/mutation states.
    pub error_recovery: bool,

    /// Abort the parse once the state arena grows past this bound. The
    /// outcome is flagged unsuccessful; chart structural invariants still
    /// hold.
    pub max_states: Option<usize>,
}

impl Default for EarleyConfig {
    fn default() -> Self {
        Self {
            error_recovery: true,
            max_states: Some(1_000_000),
        }
    }
}

impl EarleyConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_error_recovery(mut self, enabled: bool) -> Self {
        self.error_recovery = enabled;
        self
    }

    #[must_use]
    pub fn with_max_states(mut self, bound: Option<usize>) -> Self {
        self.max_states = bound;
        self
    }
}
