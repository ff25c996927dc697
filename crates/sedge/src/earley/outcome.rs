//! Persistent record of a parse.

use crate::earley::chart::Chart;
use crate::earley::state::{StateArena, StateData, StateId, StateKind};
use crate::error::Marker;
use crate::grammar::{ProdId, RuleId};
use crate::lexer::Token;

/// Counters recorded during recognition.
#[derive(Debug, Clone, Default)]
pub struct ParseMetrics {
    pub states: usize,
    pub recovery_rounds: usize,
    pub parse_time: std::time::Duration,
}

/// Everything a parse produced: the charts, the state arena, lexical-error
/// markers and the error tokens. Read-only once recognition returns; trees
/// and completions are both derived from it.
pub struct ParseOutcome {
    pub(crate) text: String,
    pub(crate) charts: Vec<Chart>,
    pub(crate) arena: StateArena,
    pub(crate) markers: Vec<Marker>,
    pub(crate) error_tokens: Vec<Token>,
    pub(crate) axiom_prod: ProdId,
    pub(crate) axiom_rule: RuleId,
    pub(crate) success: bool,
    pub(crate) metrics: ParseMetrics,
}

impl ParseOutcome {
    /// Whether a zero-error, feature-compatible derivation spans the whole
    /// input. Recovered inputs still yield trees but report `false` here.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    /// Lexical-error markers recorded during recognition.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Tokens that matched no terminal.
    #[must_use]
    pub fn error_tokens(&self) -> &[Token] {
        &self.error_tokens
    }

    /// Number of charts: token count plus one.
    #[must_use]
    pub fn chart_count(&self) -> usize {
        self.charts.len()
    }

    /// Number of states in the arena.
    #[must_use]
    pub fn state_count(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub const fn metrics(&self) -> &ParseMetrics {
        &self.metrics
    }

    /// The token at a chart position.
    #[must_use]
    pub fn token(&self, index: usize) -> &Token {
        self.charts[index].token()
    }

    pub(crate) fn state(&self, id: StateId) -> &StateData {
        self.arena.get(id)
    }

    pub(crate) const fn axiom_rule(&self) -> RuleId {
        self.axiom_rule
    }

    /// Completed axiom states spanning the whole input, any error count.
    pub(crate) fn success_states(&self) -> Vec<StateId> {
        let Some(last) = self.charts.last() else {
            return Vec::new();
        };
        last.states()
            .iter()
            .copied()
            .filter(|&id| {
                let data = self.arena.get(id);
                data.prod == self.axiom_prod && data.begin == 0 && data.dot == 1
            })
            .collect()
    }

    /// Success states with the minimum error count, excluding incompatible
    /// ones. These are the roots the navigator expands.
    pub(crate) fn best_success_states(&self) -> Vec<StateId> {
        let candidates: Vec<StateId> = self
            .success_states()
            .into_iter()
            .filter(|&id| self.arena.get(id).kind != StateKind::Incompatible)
            .collect();
        let min = candidates
            .iter()
            .map(|&id| self.arena.get(id).errors)
            .min();
        match min {
            Some(min) => candidates
                .into_iter()
                .filter(|&id| self.arena.get(id).errors == min)
                .collect(),
            None => Vec::new(),
        }
    }

    pub(crate) fn chart(&self, index: usize) -> &Chart {
        &self.charts[index]
    }
}
