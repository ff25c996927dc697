//! Parser states, back-pointers and the state arena.
//!
//! States form a DAG threaded by back-pointers; everything is arena-allocated
//! and addressed by integer ids so the forest navigator can walk the graph
//! without owning pointers.

use crate::grammar::{Feature, Grammar, ProdId, Symbol, TerminalId};
use crate::text::{TextRange, TextSize};
use compact_str::CompactString;
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::sync::Arc;

/// Index of a state in the arena of one parse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StateId(pub(crate) u32);

impl StateId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// How a state was reached, best path so far. Lower discriminants are
/// better; once a better kind is observed it sticks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StateKind {
    /// Seeded at initialization.
    Kernel = 0,
    /// Reached by a regular predict/scan/complete step.
    Processed = 1,
    /// Reached only through an incompatible feature merge; excluded from
    /// clean derivations but available to recovery.
    Incompatible = 2,
    /// Reached only through a repair.
    ErrorRecovery = 3,
}

/// How a terminal position was satisfied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOrigin {
    /// The input token matched the expected terminal.
    Scanned,
    /// A missing terminal was synthesized with zero width.
    Inserted,
    /// The input token was skipped without advancing the dot. `lexical`
    /// distinguishes unknown-token deletions, which are already reported as
    /// lexical errors and produce no second marker.
    Deleted { lexical: bool },
    /// The input token was consumed as the expected terminal.
    Mutated,
}

impl MatchOrigin {
    #[must_use]
    pub const fn is_repair(&self) -> bool {
        !matches!(self, Self::Scanned)
    }
}

/// A consumed terminal position: a real token, or one of the repair
/// variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalMatch {
    /// Token position in the input.
    pub index: u32,
    /// The terminal this position was consumed as. `None` only for deleted
    /// unknown tokens.
    pub terminal: Option<TerminalId>,
    pub text: CompactString,
    pub style: Option<CompactString>,
    pub offset: TextSize,
    pub origin: MatchOrigin,
}

impl TerminalMatch {
    /// Text range covered; zero-width for insertions.
    #[must_use]
    pub fn range(&self) -> TextRange {
        if matches!(self.origin, MatchOrigin::Inserted) {
            TextRange::empty(self.offset)
        } else {
            TextRange::at(self.offset, TextSize::of(&self.text))
        }
    }

    /// Token positions consumed from the input (0 for insertions).
    #[must_use]
    pub const fn consumed(&self) -> u32 {
        if matches!(self.origin, MatchOrigin::Inserted) {
            0
        } else {
            1
        }
    }

    /// Syntactic-error cost of this match.
    #[must_use]
    pub const fn errors(&self) -> u32 {
        if self.origin.is_repair() {
            1
        } else {
            0
        }
    }
}

/// The item consumed when a state advanced: a completed child state or a
/// terminal position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Causal {
    Completed(StateId),
    Token(TerminalMatch),
}

/// One way a state was reached: the state before the step, plus what the
/// step consumed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackPtr {
    pub pred: StateId,
    pub causal: Causal,
}

/// An Earley item plus its context: kind, minimum error count and the
/// back-pointers achieving it.
pub(crate) struct StateData {
    pub prod: ProdId,
    pub begin: u32,
    pub end: u32,
    pub dot: u16,
    pub feature: Arc<dyn Feature>,
    pub kind: StateKind,
    /// Minimum syntactic errors over all known derivations. `u32::MAX`
    /// until the first back-pointer arrives.
    pub errors: u32,
    /// Only back-pointers achieving `errors`; worse ones are discarded,
    /// equal ones deduplicated.
    pub back_ptrs: SmallVec<[BackPtr; 2]>,
}

impl StateData {
    pub(crate) fn next_symbol(&self, grammar: &Grammar) -> Option<Symbol> {
        grammar
            .production(self.prod)
            .symbols()
            .get(self.dot as usize)
            .copied()
    }

    pub(crate) fn is_completed(&self, grammar: &Grammar) -> bool {
        self.dot as usize == grammar.production(self.prod).len()
    }

    /// Take the better of the current and observed kind.
    pub(crate) fn improve_kind(&mut self, observed: StateKind) -> bool {
        if observed < self.kind {
            self.kind = observed;
            true
        } else {
            false
        }
    }

    /// Merge a back-pointer carrying the given error count.
    ///
    /// Returns `(decreased, added)`: whether the state's minimum dropped,
    /// and whether the pointer was retained.
    pub(crate) fn merge_back_ptr(&mut self, bp: BackPtr, bp_errors: u32) -> (bool, bool) {
        if bp_errors < self.errors {
            self.errors = bp_errors;
            self.back_ptrs.clear();
            self.back_ptrs.push(bp);
            (true, true)
        } else if bp_errors == self.errors && !self.back_ptrs.contains(&bp) {
            self.back_ptrs.push(bp);
            (false, true)
        } else {
            (false, false)
        }
    }
}

type StateKey = (ProdId, u32, u32, u16, u64);

/// Arena of all states of one parse, interned by identity (production,
/// span, dot, feature fingerprint).
pub(crate) struct StateArena {
    states: Vec<StateData>,
    index: HashMap<StateKey, StateId, ahash::RandomState>,
}

impl StateArena {
    pub(crate) fn new() -> Self {
        Self {
            states: Vec::new(),
            index: HashMap::default(),
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.states.len()
    }

    pub(crate) fn get(&self, id: StateId) -> &StateData {
        &self.states[id.index()]
    }

    pub(crate) fn get_mut(&mut self, id: StateId) -> &mut StateData {
        &mut self.states[id.index()]
    }

    /// Find or create a state. New states start at the worst kind and
    /// `u32::MAX` errors; the caller improves both.
    pub(crate) fn intern(
        &mut self,
        prod: ProdId,
        begin: u32,
        end: u32,
        dot: u16,
        feature: Arc<dyn Feature>,
    ) -> (StateId, bool) {
        let key = (prod, begin, end, dot, feature.fingerprint());
        if let Some(&id) = self.index.get(&key) {
            return (id, false);
        }
        let id = StateId(self.states.len() as u32);
        self.states.push(StateData {
            prod,
            begin,
            end,
            dot,
            feature,
            kind: StateKind::ErrorRecovery,
            errors: u32::MAX,
            back_ptrs: SmallVec::new(),
        });
        self.index.insert(key, id);
        (id, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::feature::neutral;

    #[test]
    fn test_state_kind_ordering() {
        assert!(StateKind::Kernel < StateKind::Processed);
        assert!(StateKind::Processed < StateKind::Incompatible);
        assert!(StateKind::Incompatible < StateKind::ErrorRecovery);
    }

    #[test]
    fn test_terminal_match_costs() {
        let scanned = TerminalMatch {
            index: 0,
            terminal: Some(TerminalId(0)),
            text: "1".into(),
            style: None,
            offset: TextSize::zero(),
            origin: MatchOrigin::Scanned,
        };
        assert_eq!(scanned.errors(), 0);
        assert_eq!(scanned.consumed(), 1);

        let inserted = TerminalMatch {
            origin: MatchOrigin::Inserted,
            ..scanned.clone()
        };
        assert_eq!(inserted.errors(), 1);
        assert_eq!(inserted.consumed(), 0);
        assert!(inserted.range().is_empty());
    }

    #[test]
    fn test_arena_interns_by_identity() {
        let mut arena = StateArena::new();
        let (a, new_a) = arena.intern(ProdId(0), 0, 0, 0, neutral());
        let (b, new_b) = arena.intern(ProdId(0), 0, 0, 0, neutral());
        let (c, new_c) = arena.intern(ProdId(0), 0, 1, 0, neutral());

        assert!(new_a);
        assert!(!new_b);
        assert!(new_c);
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_merge_back_ptr_keeps_minimum() {
        let mut arena = StateArena::new();
        let (pred, _) = arena.intern(ProdId(0), 0, 0, 0, neutral());
        let (id, _) = arena.intern(ProdId(0), 0, 1, 1, neutral());

        let token = |origin| {
            Causal::Token(TerminalMatch {
                index: 0,
                terminal: Some(TerminalId(0)),
                text: "x".into(),
                style: None,
                offset: TextSize::zero(),
                origin,
            })
        };

        let data = arena.get_mut(id);
        let (dec, added) = data.merge_back_ptr(
            BackPtr {
                pred,
                causal: token(MatchOrigin::Inserted),
            },
            1,
        );
        assert!(dec && added);
        assert_eq!(data.errors, 1);

        // A strictly better pointer replaces the list.
        let (dec, _) = data.merge_back_ptr(
            BackPtr {
                pred,
                causal: token(MatchOrigin::Scanned),
            },
            0,
        );
        assert!(dec);
        assert_eq!(data.errors, 0);
        assert_eq!(data.back_ptrs.len(), 1);

        // A worse pointer is discarded, an equal duplicate too.
        let (dec, added) = data.merge_back_ptr(
            BackPtr {
                pred,
                causal: token(MatchOrigin::Mutated),
            },
            2,
        );
        assert!(!dec && !added);
        let (dec, added) = data.merge_back_ptr(
            BackPtr {
                pred,
                causal: token(MatchOrigin::Scanned),
            },
            0,
        );
        assert!(!dec && !added);
        assert_eq!(data.back_ptrs.len(), 1);
    }

    #[test]
    fn test_improve_kind_is_monotonic() {
        let mut arena = StateArena::new();
        let (id, _) = arena.intern(ProdId(0), 0, 0, 0, neutral());
        let data = arena.get_mut(id);

        assert!(data.improve_kind(StateKind::Processed));
        assert!(!data.improve_kind(StateKind::ErrorRecovery));
        assert!(data.improve_kind(StateKind::Kernel));
        assert_eq!(data.kind, StateKind::Kernel);
    }
}
