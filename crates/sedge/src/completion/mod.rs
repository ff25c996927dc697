//! # Completion Processor
//!
//! Ranked completion proposals for a cursor offset.
//!
//! ## Overview
//!
//! Completion reuses the charts of a finished parse: the processor picks the
//! chart at (or just after) the cursor, then walks the continuations of
//! every incomplete state there. Terminals contribute their default text;
//! non-terminals are expanded production by production, pruned by the
//! feature algebra and a visited set that stops left-recursive expansion.
//!
//! Per-element [`CompletionProvider`]s override the walk for their
//! construct, a compute filter can veto whole subtrees, and
//! [`CompletionFilter`]s post-process the final list with access to the
//! reconstructed tree.
//!
//! Proposals are deduplicated by exact text, first occurrence wins — a
//! collision drops the later proposal's element and replace metadata, so
//! callers needing element-tagged completions must dedup upstream.

use crate::earley::state::StateKind;
use crate::earley::ParseOutcome;
use crate::forest::{Navigator, NodeId, ParseTree};
use crate::grammar::feature::apply_merge;
use crate::grammar::{ElementId, Feature, Grammar, ProdId, RuleId, Symbol, Value};
use crate::text::{TextRange, TextSize};
use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};
use std::sync::Arc;

/// Default delimiter set: a cursor right after one of these characters
/// completes what may follow it, not the delimiter itself.
pub const DEFAULT_DELIMITERS: &str = ":(){}.,+-*/[];";

/// A completion proposal.
#[derive(Debug, Clone)]
pub struct CompletionProposal {
    pub element: Option<ElementId>,
    pub text: CompactString,
    /// Span the proposal should replace; defaults to the computed prefix.
    pub replace: Option<TextRange>,
    pub user_data: Option<Value>,
    pub documentation: Option<CompactString>,
    /// Rule chains the continuation walk went through to reach this
    /// proposal.
    pub predictor_paths: Vec<Vec<RuleId>>,
}

impl CompletionProposal {
    #[must_use]
    pub fn new(text: impl Into<CompactString>) -> Self {
        Self {
            element: None,
            text: text.into(),
            replace: None,
            user_data: None,
            documentation: None,
            predictor_paths: Vec::new(),
        }
    }
}

/// What a provider sees about the cursor position.
pub struct PredictionContext<'a> {
    pub element: Option<ElementId>,
    pub prefix: &'a str,
    pub replace: TextRange,
    pub chart_index: u32,
    pub offset: TextSize,
}

/// Supplies proposals for one element tag, overriding the grammar walk.
pub trait CompletionProvider {
    fn proposals(&self, ctx: &PredictionContext<'_>) -> Vec<CompletionProposal>;
}

/// Post-processes the deduplicated proposal list. `tree` and `node` locate
/// the cursor in the reconstructed derivation when one exists.
pub trait CompletionFilter {
    fn filter(
        &self,
        proposals: Vec<CompletionProposal>,
        tree: Option<&ParseTree>,
        node: Option<NodeId>,
    ) -> Vec<CompletionProposal>;
}

/// Enumerates the symbols the grammar expects at a cursor offset.
pub struct CompletionProcessor<'a> {
    grammar: &'a Grammar,
    outcome: &'a ParseOutcome,
    delimiters: CompactString,
    providers: HashMap<ElementId, Box<dyn CompletionProvider>, ahash::RandomState>,
    compute_filter: Option<Box<dyn Fn(ElementId) -> bool>>,
    filters: Vec<Box<dyn CompletionFilter>>,
}

impl<'a> CompletionProcessor<'a> {
    #[must_use]
    pub fn new(grammar: &'a Grammar, outcome: &'a ParseOutcome) -> Self {
        Self {
            grammar,
            outcome,
            delimiters: DEFAULT_DELIMITERS.into(),
            providers: HashMap::default(),
            compute_filter: None,
            filters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_delimiters(mut self, delimiters: &str) -> Self {
        self.delimiters = delimiters.into();
        self
    }

    /// Register a provider for an element tag.
    #[must_use]
    pub fn with_provider(
        mut self,
        element: ElementId,
        provider: impl CompletionProvider + 'static,
    ) -> Self {
        self.providers.insert(element, Box::new(provider));
        self
    }

    /// Veto expansion of tagged productions; return `false` to skip.
    #[must_use]
    pub fn with_compute_filter(mut self, filter: impl Fn(ElementId) -> bool + 'static) -> Self {
        self.compute_filter = Some(Box::new(filter));
        self
    }

    /// Append a post-processing filter.
    #[must_use]
    pub fn with_filter(mut self, filter: impl CompletionFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Proposals for the cursor offset, insertion-ordered, deduplicated by
    /// text.
    #[must_use]
    pub fn complete(&self, offset: TextSize) -> Vec<CompletionProposal> {
        let chart_index = self.chart_index_for(offset);
        let prefix = self.prefix_at(offset);
        let replace = TextRange::at(
            TextSize::from(offset.into() - TextSize::of(&prefix).into()),
            TextSize::of(&prefix),
        );

        let mut raw = Vec::new();
        for &sid in self.outcome.chart(chart_index).states() {
            let data = self.outcome.state(sid);
            if data.kind == StateKind::ErrorRecovery {
                continue;
            }
            let production = self.grammar.production(data.prod);
            let dot = data.dot as usize;
            // Prediction states: the axiom seed, or anything already begun.
            let seeded_axiom = dot == 0 && production.rule() == self.outcome.axiom_rule();
            if !(seeded_axiom || dot > 0) || dot >= production.len() {
                continue;
            }
            let ctx = PredictionContext {
                element: production.element(),
                prefix: &prefix,
                replace,
                chart_index: chart_index as u32,
                offset,
            };
            match production.symbols()[dot] {
                Symbol::Terminal(_) => self.emit_chain(data.prod, dot, &[], &mut raw),
                Symbol::Rule(rule) => {
                    let mut visited: HashSet<RuleId, ahash::RandomState> = HashSet::default();
                    let mut path = Vec::new();
                    self.descend(rule, &data.feature, dot, &mut visited, &mut path, &ctx, &mut raw);
                }
            }
        }

        let mut seen: HashSet<CompactString, ahash::RandomState> = HashSet::default();
        let mut proposals = Vec::new();
        for mut proposal in raw {
            if seen.insert(proposal.text.clone()) {
                if proposal.replace.is_none() {
                    proposal.replace = Some(replace);
                }
                proposals.push(proposal);
            }
        }

        if !self.filters.is_empty() {
            let tree = Navigator::new(self.grammar, self.outcome).single_tree().ok();
            let node = tree
                .as_ref()
                .and_then(|t| t.find_node_at_index(chart_index as u32))
                .map(|n| n.id());
            for filter in &self.filters {
                proposals = filter.filter(proposals, tree.as_ref(), node);
            }
        }

        proposals
    }

    /// Chart at or after the offset. A delimiter right before the cursor
    /// selects the chart strictly after it; otherwise the chart containing
    /// the offset (or the next one when none does).
    fn chart_index_for(&self, offset: TextSize) -> usize {
        let off = offset.into();
        // A lexical-error token ending at the cursor is the word being
        // typed: predict from the chart where it would be consumed.
        for i in 0..self.outcome.chart_count() {
            let token = self.outcome.token(i);
            if token.terminal.is_none() && token.end_offset() == offset {
                return i;
            }
        }
        let after_delimiter = off > 0
            && self
                .outcome
                .text()
                .as_bytes()
                .get(off as usize - 1)
                .is_some_and(|b| self.delimiters.as_bytes().contains(b));

        let count = self.outcome.chart_count();
        (0..count)
            .find(|&i| {
                let token = self.outcome.token(i);
                if after_delimiter {
                    token.offset.into() >= off
                } else {
                    token.end_offset().into() > off
                }
            })
            .unwrap_or(count - 1)
    }

    /// Portion of the token at the cursor preceding the offset, or an error
    /// token ending exactly at it.
    fn prefix_at(&self, offset: TextSize) -> CompactString {
        let off = offset.into();
        for i in 0..self.outcome.chart_count() {
            let token = self.outcome.token(i);
            if token.eos {
                break;
            }
            let start = token.offset.into();
            if start < off && off < token.end_offset().into() {
                return token.text.as_str()[..(off - start) as usize].into();
            }
        }
        for error in self.outcome.error_tokens() {
            if error.end_offset() == offset {
                return error.text.clone();
            }
        }
        CompactString::default()
    }

    fn descend(
        &self,
        rule: RuleId,
        feature: &Arc<dyn Feature>,
        from_index: usize,
        visited: &mut HashSet<RuleId, ahash::RandomState>,
        path: &mut Vec<RuleId>,
        ctx: &PredictionContext<'_>,
        out: &mut Vec<CompletionProposal>,
    ) {
        if !visited.insert(rule) {
            return;
        }
        path.push(rule);
        for &pid in self.grammar.productions_of(rule) {
            let production = self.grammar.production(pid);
            let Some(merged) = apply_merge(feature, from_index, production.feature()) else {
                continue;
            };
            if let Some(element) = production.element() {
                if let Some(provider) = self.providers.get(&element) {
                    let provider_ctx = PredictionContext {
                        element: Some(element),
                        prefix: ctx.prefix,
                        replace: ctx.replace,
                        chart_index: ctx.chart_index,
                        offset: ctx.offset,
                    };
                    out.extend(provider.proposals(&provider_ctx));
                    continue;
                }
                if let Some(filter) = &self.compute_filter {
                    if !filter(element) {
                        continue;
                    }
                }
            }
            match production.symbols().first() {
                None => {}
                Some(Symbol::Terminal(_)) => self.emit_chain(pid, 0, path, out),
                Some(Symbol::Rule(inner)) => {
                    self.descend(*inner, &merged, 0, visited, path, ctx, out);
                }
            }
        }
        path.pop();
    }

    /// Proposal text for a terminal continuation: the expected terminal's
    /// default text plus any following defaulted terminals of the same
    /// production, space-separated, stopping at the first non-terminal.
    fn emit_chain(
        &self,
        pid: ProdId,
        dot: usize,
        path: &[RuleId],
        out: &mut Vec<CompletionProposal>,
    ) {
        let production = self.grammar.production(pid);
        let mut text = String::new();
        for symbol in &production.symbols()[dot..] {
            let Symbol::Terminal(terminal) = symbol else {
                break;
            };
            let Some(default) = self.grammar.terminal_default_text(*terminal) else {
                break;
            };
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(default);
        }
        if text.is_empty() {
            return;
        }
        let mut proposal = CompletionProposal::new(text);
        proposal.element = production.element();
        if !path.is_empty() {
            proposal.predictor_paths.push(path.to_vec());
        }
        out.push(proposal);
    }
}
