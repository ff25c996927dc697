//! The recognizer: Earley predict/scan/complete over a chart row per token.

use crate::earley::chart::Chart;
use crate::earley::config::EarleyConfig;
use crate::earley::outcome::{ParseMetrics, ParseOutcome};
use crate::earley::state::{BackPtr, Causal, MatchOrigin, StateArena, StateId, StateKind, TerminalMatch};
use crate::error::Marker;
use crate::grammar::feature::{apply_merge, neutral};
use crate::grammar::{Axiom, Feature, Grammar, ProdId, RuleId, Symbol, TerminalId};
use crate::lexer::Token;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::Arc;

/// Chart-based recognizer for a grammar.
///
/// `parse` never fails for syntactic errors: invalid input produces an
/// outcome carrying markers and `success == false`.
pub struct Recognizer<'g> {
    grammar: &'g Grammar,
    config: EarleyConfig,
}

impl<'g> Recognizer<'g> {
    #[must_use]
    pub fn new(grammar: &'g Grammar, config: EarleyConfig) -> Self {
        Self { grammar, config }
    }

    /// Run the recognizer over a token stream (which must end with the
    /// end-of-stream token) for the given axiom.
    #[must_use]
    pub fn parse(&self, text: &str, tokens: Vec<Token>, axiom: &Axiom) -> ParseOutcome {
        debug_assert!(tokens.last().is_some_and(|t| t.eos));
        let start_time = std::time::Instant::now();

        let mut run = Run {
            grammar: self.grammar,
            config: self.config.clone(),
            arena: StateArena::new(),
            charts: tokens
                .into_iter()
                .enumerate()
                .map(|(i, t)| Chart::new(i as u32, t))
                .collect(),
            queue: VecDeque::new(),
            current: 0,
            markers: Vec::new(),
            error_tokens: Vec::new(),
            budget_exceeded: false,
            recovery_rounds: 0,
        };

        // Lexical errors are recorded up front; recognition then treats the
        // offending tokens as deletions.
        for chart in &run.charts {
            let token = chart.token();
            if token.terminal.is_none() {
                run.markers
                    .push(Marker::unknown_token(token.range(), token.text.clone()));
                run.error_tokens.push(token.clone());
            }
        }

        // Seed: axiom → · target
        run.add_state(
            axiom.production(),
            0,
            0,
            0,
            neutral(),
            StateKind::Kernel,
            None,
        );

        let last = run.charts.len() - 1;
        for i in 0..run.charts.len() {
            run.current = i;
            run.queue.extend(run.charts[i].states().iter().copied());
            run.drain();
            if run.budget_exceeded {
                break;
            }
            if !run.config.error_recovery {
                continue;
            }
            if i < last {
                if run.charts[i + 1].states().is_empty() {
                    if run.charts[i].token().terminal.is_none() {
                        run.delete_unknown();
                    } else {
                        run.recover_stuck();
                    }
                }
            } else if run.success_state_ids(axiom).is_empty() {
                run.recover_at_end(axiom);
            }
        }

        let success = !run.budget_exceeded
            && run.success_state_ids(axiom).iter().any(|&id| {
                let data = run.arena.get(id);
                data.errors == 0 && data.kind != StateKind::Incompatible
            });

        let metrics = ParseMetrics {
            states: run.arena.len(),
            recovery_rounds: run.recovery_rounds,
            parse_time: start_time.elapsed(),
        };

        ParseOutcome {
            text: text.to_string(),
            charts: run.charts,
            arena: run.arena,
            markers: run.markers,
            error_tokens: run.error_tokens,
            axiom_prod: axiom.production(),
            axiom_rule: axiom.wrapper_rule(),
            success,
            metrics,
        }
    }
}

/// Working state of one recognition.
pub(crate) struct Run<'g> {
    pub(crate) grammar: &'g Grammar,
    pub(crate) config: EarleyConfig,
    pub(crate) arena: StateArena,
    pub(crate) charts: Vec<Chart>,
    pub(crate) queue: VecDeque<StateId>,
    pub(crate) current: usize,
    pub(crate) markers: Vec<Marker>,
    pub(crate) error_tokens: Vec<Token>,
    pub(crate) budget_exceeded: bool,
    pub(crate) recovery_rounds: usize,
}

impl<'g> Run<'g> {
    /// Idempotent state registration: merge the back-pointer and improve the
    /// kind on an existing state, insert and enqueue a new one. Returns
    /// whether anything changed.
    pub(crate) fn add_state(
        &mut self,
        prod: ProdId,
        begin: u32,
        end: u32,
        dot: u16,
        feature: Arc<dyn Feature>,
        kind: StateKind,
        back_ptr: Option<(BackPtr, u32)>,
    ) -> bool {
        let (id, is_new) = self.arena.intern(prod, begin, end, dot, feature);

        let data = self.arena.get_mut(id);
        let improved_kind = data.improve_kind(kind);
        let (mut decreased, mut added) = (false, false);
        match back_ptr {
            Some((bp, errors)) => {
                (decreased, added) = data.merge_back_ptr(bp, errors);
            }
            None => {
                // Seeded and predicted states start clean.
                if data.errors > 0 {
                    decreased = !is_new && data.errors != u32::MAX;
                    data.errors = 0;
                }
            }
        }

        if is_new {
            let next_rule = match self.grammar.production(prod).symbols().get(dot as usize) {
                Some(Symbol::Rule(rule)) => Some(*rule),
                _ => None,
            };
            self.charts[end as usize].register(id, next_rule);
            if end as usize == self.current {
                self.queue.push_back(id);
            }
        } else if (decreased || improved_kind) && end as usize == self.current {
            // Reprocess so the improvement propagates downstream.
            self.queue.push_back(id);
        }

        is_new || improved_kind || decreased || added
    }

    pub(crate) fn drain(&mut self) {
        while let Some(id) = self.queue.pop_front() {
            if let Some(bound) = self.config.max_states {
                if self.arena.len() > bound {
                    self.budget_exceeded = true;
                    self.queue.clear();
                    return;
                }
            }
            let next = self.arena.get(id).next_symbol(self.grammar);
            match next {
                None => self.complete(id),
                Some(Symbol::Rule(rule)) => self.predict(id, rule),
                Some(Symbol::Terminal(terminal)) => self.scan(id, terminal),
            }
        }
    }

    /// Completer: fold a finished production into every state waiting on
    /// its rule at the start chart.
    fn complete(&mut self, id: StateId) {
        let (begin, end, prod) = {
            let data = self.arena.get(id);
            (data.begin, data.end, data.prod)
        };
        let rule = self.grammar.production(prod).rule();
        debug_assert_eq!(self.charts[end as usize].index, end);

        if begin == end {
            self.charts[end as usize].record_nullable(rule, id);
        }

        let waiters: SmallVec<[StateId; 8]> = self.charts[begin as usize]
            .waiting_on(rule)
            .iter()
            .copied()
            .collect();
        for waiter in waiters {
            self.advance_over(waiter, id, end);
        }
    }

    /// Advance a waiter over a completed child, merging features.
    fn advance_over(&mut self, waiter: StateId, completed: StateId, new_end: u32) {
        let (w_prod, w_begin, w_dot, w_feature, w_errors) = {
            let data = self.arena.get(waiter);
            (
                data.prod,
                data.begin,
                data.dot,
                data.feature.clone(),
                data.errors,
            )
        };
        let (c_kind, c_errors, c_prod) = {
            let data = self.arena.get(completed);
            (data.kind, data.errors, data.prod)
        };

        let child_feature = self.grammar.production(c_prod).feature().clone();
        let (feature, kind) = if c_kind == StateKind::Incompatible {
            (w_feature, StateKind::Incompatible)
        } else {
            match apply_merge(&w_feature, w_dot as usize, &child_feature) {
                Some(merged) => (merged, StateKind::Processed),
                None => (w_feature, StateKind::Incompatible),
            }
        };

        self.add_state(
            w_prod,
            w_begin,
            new_end,
            w_dot + 1,
            feature,
            kind,
            Some((
                BackPtr {
                    pred: waiter,
                    causal: Causal::Completed(completed),
                },
                w_errors.saturating_add(c_errors),
            )),
        );
    }

    /// Predictor: seed every production of the awaited rule at the current
    /// position, and advance over zero-width completions already recorded
    /// here (the nullable case, in either arrival order).
    fn predict(&mut self, id: StateId, rule: RuleId) {
        let grammar = self.grammar;
        let i = self.current as u32;

        let prods: SmallVec<[ProdId; 4]> = grammar.productions_of(rule).iter().copied().collect();
        for prod in prods {
            let feature = grammar.production(prod).feature().clone();
            self.add_state(prod, i, i, 0, feature, StateKind::Processed, None);
        }

        let done: SmallVec<[StateId; 2]> = self.charts[self.current]
            .nullable_completions(rule)
            .iter()
            .copied()
            .collect();
        for completed in done {
            self.advance_over(id, completed, i);
        }
    }

    /// Scanner: consume the chart's token when it matches the expected
    /// terminal. Never steps past the end-of-stream token.
    fn scan(&mut self, id: StateId, terminal: TerminalId) {
        let token = self.charts[self.current].token();
        if token.eos || !token.matches(terminal) {
            return;
        }
        let matched = TerminalMatch {
            index: self.current as u32,
            terminal: Some(terminal),
            text: token.text.clone(),
            style: token.style.clone(),
            offset: token.offset,
            origin: MatchOrigin::Scanned,
        };

        let (prod, begin, dot, feature, errors) = {
            let data = self.arena.get(id);
            (
                data.prod,
                data.begin,
                data.dot,
                data.feature.clone(),
                data.errors,
            )
        };
        self.add_state(
            prod,
            begin,
            self.current as u32 + 1,
            dot + 1,
            feature,
            StateKind::Processed,
            Some((
                BackPtr {
                    pred: id,
                    causal: Causal::Token(matched),
                },
                errors,
            )),
        );
    }

    /// Completed axiom states spanning the input so far, any error count.
    pub(crate) fn success_state_ids(&self, axiom: &Axiom) -> Vec<StateId> {
        let Some(last) = self.charts.last() else {
            return Vec::new();
        };
        last.states()
            .iter()
            .copied()
            .filter(|&id| {
                let data = self.arena.get(id);
                data.prod == axiom.production() && data.begin == 0 && data.dot == 1
            })
            .collect()
    }
}
