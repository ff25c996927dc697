//! Chart data structure: one state set per input position.

use crate::earley::state::StateId;
use crate::grammar::RuleId;
use crate::lexer::Token;
use hashbrown::HashMap;
use smallvec::SmallVec;

/// The states ending at one input position, in insertion order, indexed by
/// the rule each incomplete state is waiting on. The chart also carries the
/// token at its position (the end-of-stream token for the last chart).
pub(crate) struct Chart {
    pub(crate) index: u32,
    token: Token,
    states: Vec<StateId>,
    by_next_rule: HashMap<RuleId, SmallVec<[StateId; 4]>, ahash::RandomState>,
    /// Zero-width completions recorded at this position, so states that
    /// start waiting on a nullable rule after it completed still advance.
    nullable_done: HashMap<RuleId, SmallVec<[StateId; 2]>, ahash::RandomState>,
}

impl Chart {
    pub(crate) fn new(index: u32, token: Token) -> Self {
        Self {
            index,
            token,
            states: Vec::new(),
            by_next_rule: HashMap::default(),
            nullable_done: HashMap::default(),
        }
    }

    pub(crate) fn token(&self) -> &Token {
        &self.token
    }

    pub(crate) fn states(&self) -> &[StateId] {
        &self.states
    }

    pub(crate) fn register(&mut self, id: StateId, next_rule: Option<RuleId>) {
        self.states.push(id);
        if let Some(rule) = next_rule {
            self.by_next_rule.entry(rule).or_default().push(id);
        }
    }

    /// States whose next symbol is the given rule.
    pub(crate) fn waiting_on(&self, rule: RuleId) -> &[StateId] {
        self.by_next_rule.get(&rule).map_or(&[], |v| v.as_slice())
    }

    pub(crate) fn record_nullable(&mut self, rule: RuleId, id: StateId) {
        let done = self.nullable_done.entry(rule).or_default();
        if !done.contains(&id) {
            done.push(id);
        }
    }

    /// Completed zero-width states for the given rule at this position.
    pub(crate) fn nullable_completions(&self, rule: RuleId) -> &[StateId] {
        self.nullable_done.get(&rule).map_or(&[], |v| v.as_slice())
    }
}
