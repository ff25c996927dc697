//! Error recovery: repairs applied when a chart row produces no advance.
//!
//! Three repairs are tried for every stuck state expecting a terminal:
//! insertion (a zero-width synthesized token), deletion (the input token is
//! skipped without moving the dot) and mutation (the input token is consumed
//! as the expected terminal). Each repair costs one syntactic error and
//! marks its back-pointer `ErrorRecovery`; the navigator's minimum-error
//! bookkeeping keeps only the cheapest repairs in the end.

use crate::earley::parser::Run;
use crate::earley::state::{BackPtr, Causal, MatchOrigin, StateId, StateKind, TerminalMatch};
use crate::grammar::{Axiom, Symbol, TerminalId};
use compact_str::CompactString;

impl<'g> Run<'g> {
    /// Consume an unknown token as a lexical deletion: every state of the
    /// current chart is carried over unchanged. The lexical error itself was
    /// already recorded on the outcome, so these deletions produce no
    /// second marker.
    pub(crate) fn delete_unknown(&mut self) {
        let i = self.current;
        let token = self.charts[i].token().clone();
        let ids: Vec<StateId> = self.charts[i].states().to_vec();

        for id in ids {
            let (prod, begin, dot, feature, errors) = self.snapshot(id);
            let matched = TerminalMatch {
                index: i as u32,
                terminal: None,
                text: token.text.clone(),
                style: None,
                offset: token.offset,
                origin: MatchOrigin::Deleted { lexical: true },
            };
            self.add_state(
                prod,
                begin,
                i as u32 + 1,
                dot,
                feature,
                StateKind::ErrorRecovery,
                Some((
                    BackPtr {
                        pred: id,
                        causal: Causal::Token(matched),
                    },
                    errors.saturating_add(1),
                )),
            );
        }
    }

    /// Repair a dead chart in rounds until something reaches the next chart
    /// or no repair adds a state. Insertions land in the current chart and
    /// are drained again; deletions and mutations land in the next one.
    pub(crate) fn recover_stuck(&mut self) {
        let i = self.current;
        loop {
            let mut added = false;
            let ids: Vec<StateId> = self.charts[i].states().to_vec();
            for id in ids {
                let Some(Symbol::Terminal(expected)) =
                    self.arena.get(id).next_symbol(self.grammar)
                else {
                    continue;
                };
                added |= self.insert_repair(id, expected);
                added |= self.delete_repair(id);
                added |= self.mutate_repair(id, expected);
            }
            self.recovery_rounds += 1;
            if !added {
                break;
            }
            self.drain();
            if self.budget_exceeded || !self.charts[i + 1].states().is_empty() {
                break;
            }
        }
    }

    /// At the end-of-stream chart only insertions make sense: repair in
    /// rounds until the axiom completes over the whole input or nothing new
    /// appears.
    pub(crate) fn recover_at_end(&mut self, axiom: &Axiom) {
        let i = self.current;
        while self.success_state_ids(axiom).is_empty() {
            let mut added = false;
            let ids: Vec<StateId> = self.charts[i].states().to_vec();
            for id in ids {
                let Some(Symbol::Terminal(expected)) =
                    self.arena.get(id).next_symbol(self.grammar)
                else {
                    continue;
                };
                added |= self.insert_repair(id, expected);
            }
            self.recovery_rounds += 1;
            if !added {
                break;
            }
            self.drain();
            if self.budget_exceeded {
                break;
            }
        }
    }

    /// Pretend the expected terminal appeared with zero width.
    fn insert_repair(&mut self, id: StateId, expected: TerminalId) -> bool {
        let i = self.current;
        let offset = self.charts[i].token().offset;
        let text = self
            .grammar
            .terminal_default_text(expected)
            .cloned()
            .unwrap_or_else(CompactString::default);
        let (prod, begin, dot, feature, errors) = self.snapshot(id);

        let matched = TerminalMatch {
            index: i as u32,
            terminal: Some(expected),
            text,
            style: None,
            offset,
            origin: MatchOrigin::Inserted,
        };
        self.add_state(
            prod,
            begin,
            i as u32,
            dot + 1,
            feature,
            StateKind::ErrorRecovery,
            Some((
                BackPtr {
                    pred: id,
                    causal: Causal::Token(matched),
                },
                errors.saturating_add(1),
            )),
        )
    }

    /// Skip the input token, leaving the dot where it is.
    fn delete_repair(&mut self, id: StateId) -> bool {
        let i = self.current;
        let token = self.charts[i].token().clone();
        let (prod, begin, dot, feature, errors) = self.snapshot(id);

        let matched = TerminalMatch {
            index: i as u32,
            terminal: token.terminal,
            text: token.text.clone(),
            style: token.style.clone(),
            offset: token.offset,
            origin: MatchOrigin::Deleted { lexical: false },
        };
        self.add_state(
            prod,
            begin,
            i as u32 + 1,
            dot,
            feature,
            StateKind::ErrorRecovery,
            Some((
                BackPtr {
                    pred: id,
                    causal: Causal::Token(matched),
                },
                errors.saturating_add(1),
            )),
        )
    }

    /// Consume the input token as the expected terminal.
    fn mutate_repair(&mut self, id: StateId, expected: TerminalId) -> bool {
        let i = self.current;
        let token = self.charts[i].token().clone();
        let (prod, begin, dot, feature, errors) = self.snapshot(id);

        let matched = TerminalMatch {
            index: i as u32,
            terminal: Some(expected),
            text: token.text.clone(),
            style: None,
            offset: token.offset,
            origin: MatchOrigin::Mutated,
        };
        self.add_state(
            prod,
            begin,
            i as u32 + 1,
            dot + 1,
            feature,
            StateKind::ErrorRecovery,
            Some((
                BackPtr {
                    pred: id,
                    causal: Causal::Token(matched),
                },
                errors.saturating_add(1),
            )),
        )
    }

    fn snapshot(
        &self,
        id: StateId,
    ) -> (
        crate::grammar::ProdId,
        u32,
        u16,
        std::sync::Arc<dyn crate::grammar::Feature>,
        u32,
    ) {
        let data = self.arena.get(id);
        (
            data.prod,
            data.begin,
            data.dot,
            data.feature.clone(),
            data.errors,
        )
    }
}
