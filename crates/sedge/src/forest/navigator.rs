//! Reconstruction of derivation trees from the recognizer's back-pointers.
//!
//! The navigator walks the state DAG in reverse: a completed state is
//! decomposed through each of its back-pointers into (predecessor, causal),
//! predecessors expand to the children built so far, causals to the child
//! consumed last. Ambiguity shows up as multiple back-pointers or multiple
//! causal expansions; the reducer stack collapses candidates at every
//! completed state, so the full forest is never materialized under the
//! default configuration.

use crate::earley::state::{BackPtr, Causal, MatchOrigin, StateId, StateKind, TerminalMatch};
use crate::earley::ParseOutcome;
use crate::error::Marker;
use crate::forest::node::{
    Ambiguity, NodeContext, NodeId, ParseTree, ReduceContext, TreeNodeData, TreeNodeKind,
};
use crate::forest::reducer::Reducer;
use crate::forest::ForestError;
use crate::grammar::{Grammar, ProdId, Value};
use crate::lexer::Token;
use crate::text::TextRange;
use compact_str::CompactString;
use hashbrown::{HashMap, HashSet};
use smallvec::SmallVec;

/// Post-pass producing extra markers from a finished tree.
pub type PostProcessor = Box<dyn Fn(&ParseTree) -> Vec<Marker>>;

/// A candidate subtree during reconstruction.
#[derive(Clone)]
pub(crate) struct Candidate {
    pub range: TextRange,
    pub token_span: (u32, u32),
    pub kind: CandidateKind,
    pub children: Vec<Candidate>,
    pub ctx: NodeContext,
    /// Error-severity markers in this subtree.
    pub error_markers: u32,
    /// Whether any context in this subtree was aborted.
    pub aborted: bool,
}

#[derive(Clone)]
pub(crate) enum CandidateKind {
    Rule {
        prod: ProdId,
        value: Value,
        ambiguity: Option<Ambiguity>,
    },
    Token {
        matched: TerminalMatch,
    },
}

/// Walks a [`ParseOutcome`] into derivation trees.
pub struct Navigator<'a> {
    grammar: &'a Grammar,
    outcome: &'a ParseOutcome,
    reducers: Vec<Reducer>,
    post: Vec<PostProcessor>,
    max_branches: usize,
}

impl<'a> Navigator<'a> {
    /// Navigator with the default reducer stack
    /// `[PreferUnaborted, SelectOne]`.
    #[must_use]
    pub fn new(grammar: &'a Grammar, outcome: &'a ParseOutcome) -> Self {
        Self {
            grammar,
            outcome,
            reducers: vec![Reducer::PreferUnaborted, Reducer::SelectOne],
            post: Vec::new(),
            max_branches: 64,
        }
    }

    /// Replace the reducer stack. An empty stack keeps every candidate.
    #[must_use]
    pub fn with_reducers(mut self, reducers: Vec<Reducer>) -> Self {
        self.reducers = reducers;
        self
    }

    /// Cap on candidates retained per completed state.
    #[must_use]
    pub fn with_max_branches(mut self, max_branches: usize) -> Self {
        self.max_branches = max_branches.max(1);
        self
    }

    /// Append a marker post-processor, run after each root is built.
    #[must_use]
    pub fn with_post_processor(
        mut self,
        post: impl Fn(&ParseTree) -> Vec<Marker> + 'static,
    ) -> Self {
        self.post.push(Box::new(post));
        self
    }

    /// Every tree surviving the reducer stack, in back-pointer order.
    /// Empty when no derivation spans the input.
    #[must_use]
    pub fn trees(&self) -> Vec<ParseTree> {
        let roots = self.outcome.best_success_states();
        if roots.is_empty() {
            return Vec::new();
        }

        let mut pass = BuildPass {
            grammar: self.grammar,
            outcome: self.outcome,
            reducers: &self.reducers,
            max_branches: self.max_branches,
            memo_completed: HashMap::default(),
            memo_prefix: HashMap::default(),
            in_progress: HashSet::default(),
            shared: HashMap::default(),
        };

        let mut candidates = Vec::new();
        for root in roots {
            let back_ptrs: SmallVec<[BackPtr; 2]> =
                self.outcome.state(root).back_ptrs.iter().cloned().collect();
            for bp in &back_ptrs {
                if let Causal::Completed(target) = &bp.causal {
                    candidates.extend(pass.expand_completed(*target));
                }
            }
        }

        let survivors = pass.reduce(candidates, true);
        survivors
            .into_iter()
            .map(|candidate| self.materialize(candidate))
            .collect()
    }

    /// The single tree expected under the default reducers.
    ///
    /// # Errors
    ///
    /// [`ForestError::Empty`] when no derivation exists,
    /// [`ForestError::AmbiguousForest`] when more than one survives the
    /// configured stack — a diagnostic, never a silent pick.
    pub fn single_tree(&self) -> Result<ParseTree, ForestError> {
        let mut trees = self.trees();
        match trees.len() {
            0 => Err(ForestError::Empty),
            1 => Ok(trees.pop().expect("length checked")),
            count => Err(ForestError::AmbiguousForest { count }),
        }
    }

    fn materialize(&self, candidate: Candidate) -> ParseTree {
        let value = match &candidate.kind {
            CandidateKind::Rule { value, .. } => value.clone(),
            CandidateKind::Token { .. } => Value::None,
        };
        let mut nodes = Vec::new();
        let root = flatten(&mut nodes, candidate, None);
        let mut tree = ParseTree {
            nodes,
            root,
            markers: Vec::new(),
            value,
        };
        let mut markers = collect_markers(&tree);
        for post in &self.post {
            markers.extend(post(&tree));
        }
        tree.markers = markers;
        tree
    }
}

fn flatten(nodes: &mut Vec<TreeNodeData>, candidate: Candidate, parent: Option<NodeId>) -> NodeId {
    let id = NodeId(nodes.len() as u32);
    nodes.push(TreeNodeData {
        parent,
        children: SmallVec::new(),
        range: candidate.range,
        token_span: candidate.token_span,
        kind: match candidate.kind {
            CandidateKind::Rule {
                prod,
                value,
                ambiguity,
            } => TreeNodeKind::Rule {
                prod,
                value,
                ambiguity,
            },
            CandidateKind::Token { matched } => TreeNodeKind::Token { matched },
        },
        ctx: candidate.ctx,
    });
    for child in candidate.children {
        let child_id = flatten(nodes, child, Some(id));
        nodes[id.index()].children.push(child_id);
    }
    id
}

fn collect_markers(tree: &ParseTree) -> Vec<Marker> {
    fn visit(tree: &ParseTree, id: NodeId, out: &mut Vec<Marker>) {
        let data = tree.data(id);
        out.extend(data.ctx.markers.iter().cloned());
        for &child in &data.children {
            visit(tree, child, out);
        }
    }
    let mut out = Vec::new();
    visit(tree, tree.root, &mut out);
    out
}

struct BuildPass<'a> {
    grammar: &'a Grammar,
    outcome: &'a ParseOutcome,
    reducers: &'a [Reducer],
    max_branches: usize,
    memo_completed: HashMap<StateId, Vec<Candidate>, ahash::RandomState>,
    memo_prefix: HashMap<StateId, Vec<Vec<Candidate>>, ahash::RandomState>,
    /// Completed states currently being expanded; re-entering one means a
    /// cyclic (infinite) derivation, which contributes nothing.
    in_progress: HashSet<StateId, ahash::RandomState>,
    shared: HashMap<CompactString, Value, ahash::RandomState>,
}

impl BuildPass<'_> {
    /// All reduced candidates for a completed state.
    fn expand_completed(&mut self, sid: StateId) -> Vec<Candidate> {
        if let Some(hit) = self.memo_completed.get(&sid) {
            return hit.clone();
        }
        if !self.in_progress.insert(sid) {
            return Vec::new();
        }
        let data = self.outcome.state(sid);
        if data.kind == StateKind::Incompatible {
            // Soundness: no tree may pass through an incompatible merge.
            self.in_progress.remove(&sid);
            self.memo_completed.insert(sid, Vec::new());
            return Vec::new();
        }
        let prod = data.prod;
        let back_ptrs: SmallVec<[BackPtr; 2]> = data.back_ptrs.iter().cloned().collect();

        let mut candidates = Vec::new();
        if back_ptrs.is_empty() {
            // Empty production: a node with no children.
            candidates.push(self.finish(sid, Vec::new()));
        } else {
            'expand: for bp in &back_ptrs {
                for children in self.child_lists(bp) {
                    if candidates.len() >= self.max_branches {
                        break 'expand;
                    }
                    candidates.push(self.finish(sid, children));
                }
            }
        }

        let site = self.grammar.production(prod).element().is_some();
        let reduced = self.reduce(candidates, site);
        self.in_progress.remove(&sid);
        self.memo_completed.insert(sid, reduced.clone());
        reduced
    }

    /// Child lists reachable through one back-pointer: the predecessor's
    /// children extended with the causal's expansions.
    fn child_lists(&mut self, bp: &BackPtr) -> Vec<Vec<Candidate>> {
        let prefixes = self.expand_prefix(bp.pred);
        let causals: Vec<Candidate> = match &bp.causal {
            Causal::Completed(child) => self.expand_completed(*child),
            Causal::Token(matched) => vec![self.token_leaf(matched)],
        };
        if causals.is_empty() {
            return Vec::new();
        }
        let mut lists = Vec::new();
        for prefix in &prefixes {
            for causal in &causals {
                if lists.len() >= self.max_branches {
                    return lists;
                }
                let mut list = prefix.clone();
                list.push(causal.clone());
                lists.push(list);
            }
        }
        lists
    }

    /// Child lists built so far for a (possibly incomplete) state.
    fn expand_prefix(&mut self, sid: StateId) -> Vec<Vec<Candidate>> {
        if let Some(hit) = self.memo_prefix.get(&sid) {
            return hit.clone();
        }
        let back_ptrs: SmallVec<[BackPtr; 2]> =
            self.outcome.state(sid).back_ptrs.iter().cloned().collect();
        let lists = if back_ptrs.is_empty() {
            vec![Vec::new()]
        } else {
            let mut lists = Vec::new();
            'expand: for bp in &back_ptrs {
                for list in self.child_lists(bp) {
                    if lists.len() >= self.max_branches {
                        break 'expand;
                    }
                    lists.push(list);
                }
            }
            lists
        };
        self.memo_prefix.insert(sid, lists.clone());
        lists
    }

    fn token_leaf(&self, matched: &TerminalMatch) -> Candidate {
        let mut ctx = NodeContext::default();
        match matched.origin {
            MatchOrigin::Scanned | MatchOrigin::Deleted { lexical: true } => {}
            MatchOrigin::Inserted => {
                let name = matched
                    .terminal
                    .map_or("?", |t| self.grammar.terminal_name(t));
                ctx.markers.push(Marker::inserted_token(matched.range(), name));
            }
            MatchOrigin::Deleted { lexical: false } => {
                ctx.markers
                    .push(Marker::missing_token(matched.range(), matched.text.clone()));
            }
            MatchOrigin::Mutated => {
                let name = matched
                    .terminal
                    .map_or("?", |t| self.grammar.terminal_name(t));
                ctx.markers.push(Marker::token_mutation(
                    matched.range(),
                    matched.text.clone(),
                    name,
                ));
            }
        }
        let error_markers = ctx.markers.iter().filter(|m| m.is_error()).count() as u32;
        Candidate {
            range: matched.range(),
            token_span: (matched.index, matched.index + matched.consumed()),
            kind: CandidateKind::Token {
                matched: matched.clone(),
            },
            children: Vec::new(),
            ctx,
            error_markers,
            aborted: false,
        }
    }

    /// Close a completed state over a child list: compute the span, run the
    /// reduction action, aggregate the subtree counters.
    fn finish(&mut self, sid: StateId, children: Vec<Candidate>) -> Candidate {
        let grammar = self.grammar;
        let outcome = self.outcome;
        let (prod_id, begin, end) = {
            let data = outcome.state(sid);
            (data.prod, data.begin, data.end)
        };
        let production = grammar.production(prod_id);

        let range = match (children.first(), children.last()) {
            (Some(first), Some(last)) => TextRange::new(first.range.start(), last.range.end()),
            // Empty derivation: zero length at the begin token's offset.
            _ => TextRange::empty(outcome.token(begin as usize).offset),
        };

        let mut args = Vec::new();
        let mut arg_ranges = Vec::new();
        for child in &children {
            match &child.kind {
                CandidateKind::Token { matched } => match matched.origin {
                    MatchOrigin::Scanned | MatchOrigin::Mutated => {
                        args.push(Value::Token(token_from_match(matched)));
                        arg_ranges.push(child.range);
                    }
                    // Inserted and deleted tokens never become arguments;
                    // their markers still travel with the child node.
                    _ => {}
                },
                CandidateKind::Rule { value, .. } => {
                    args.push(value.clone());
                    arg_ranges.push(child.range);
                }
            }
        }

        let mut ctx = NodeContext::default();
        let value = match production.action() {
            Some(action) => {
                let mut reduce_ctx = ReduceContext {
                    ctx: &mut ctx,
                    node_range: range,
                    arg_ranges: &arg_ranges,
                    shared: &mut self.shared,
                };
                (action.as_ref())(&mut reduce_ctx, args)
            }
            None => Value::None,
        };

        let error_markers = children.iter().map(|c| c.error_markers).sum::<u32>()
            + ctx.markers.iter().filter(|m| m.is_error()).count() as u32;
        let aborted = ctx.aborted || children.iter().any(|c| c.aborted);

        Candidate {
            range,
            token_span: (begin, end),
            kind: CandidateKind::Rule {
                prod: prod_id,
                value,
                ambiguity: None,
            },
            children,
            ctx,
            error_markers,
            aborted,
        }
    }

    /// Run the reducer tournament. `site` marks positions where ambiguity
    /// is recorded: the success state and element-tagged productions.
    fn reduce(&mut self, mut candidates: Vec<Candidate>, site: bool) -> Vec<Candidate> {
        if candidates.len() <= 1 {
            return candidates;
        }
        let ambiguity = site.then(|| Ambiguity::new(candidates.len() as u32));
        // The Ambiguous marker is reserved for clean ambiguity; branches that
        // differ only in repairs collapse silently.
        let clean = candidates.iter().filter(|c| c.error_markers == 0).count() >= 2;

        for reducer in self.reducers {
            let before = candidates.len();
            candidates = reducer.apply(candidates);
            if let Some(ambiguity) = &ambiguity {
                for _ in candidates.len()..before {
                    ambiguity.drop_branch();
                }
            }
            if candidates.len() <= 1 {
                break;
            }
        }

        if let Some(ambiguity) = ambiguity {
            if ambiguity.was_ambiguous() {
                for candidate in &mut candidates {
                    if let CandidateKind::Rule { ambiguity: slot, .. } = &mut candidate.kind {
                        *slot = Some(ambiguity.clone());
                    }
                    if clean {
                        candidate
                            .ctx
                            .markers
                            .push(Marker::ambiguous(candidate.range, ambiguity.branches()));
                    }
                }
            }
        }
        candidates
    }
}

fn token_from_match(matched: &TerminalMatch) -> Token {
    Token {
        terminal: matched.terminal,
        offset: matched.offset,
        text: matched.text.clone(),
        style: matched.style.clone(),
        eos: false,
    }
}
