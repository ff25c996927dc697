//! Derivation trees and their per-node context.

use crate::earley::state::{MatchOrigin, TerminalMatch};
use crate::error::{Marker, Severity, Style};
use crate::grammar::{ProdId, Value};
use crate::text::{TextRange, TextSize};
use compact_str::CompactString;
use hashbrown::HashMap;
use smallvec::SmallVec;
use std::cell::Cell;
use std::rc::Rc;

/// Index of a node within a [`ParseTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// Side-data attached to every node: markers, styles, the abort flag set by
/// reduction actions, and a user value slot.
#[derive(Debug, Clone, Default)]
pub struct NodeContext {
    pub(crate) markers: Vec<Marker>,
    pub(crate) styles: Vec<Style>,
    pub(crate) aborted: bool,
    pub(crate) user: Option<Value>,
}

impl NodeContext {
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    #[must_use]
    pub fn styles(&self) -> &[Style] {
        &self.styles
    }

    #[must_use]
    pub const fn is_aborted(&self) -> bool {
        self.aborted
    }

    #[must_use]
    pub const fn user(&self) -> Option<&Value> {
        self.user.as_ref()
    }
}

/// Shared record of an ambiguity site: how many branches existed, how many a
/// reducer dropped. The counters are shared between every clone, so a
/// subtree reused across candidates reports consistently.
#[derive(Debug, Clone)]
pub struct Ambiguity {
    inner: Rc<AmbiguityInner>,
}

#[derive(Debug)]
struct AmbiguityInner {
    branches: u32,
    aborted: Cell<u32>,
}

impl Ambiguity {
    pub(crate) fn new(branches: u32) -> Self {
        Self {
            inner: Rc::new(AmbiguityInner {
                branches,
                aborted: Cell::new(0),
            }),
        }
    }

    pub(crate) fn drop_branch(&self) {
        self.inner.aborted.set(self.inner.aborted.get() + 1);
    }

    #[must_use]
    pub fn branches(&self) -> u32 {
        self.inner.branches
    }

    #[must_use]
    pub fn aborted_branches(&self) -> u32 {
        self.inner.aborted.get()
    }

    /// More than one branch existed originally.
    #[must_use]
    pub fn was_ambiguous(&self) -> bool {
        self.inner.branches > 1
    }

    /// More than one branch survived reduction.
    #[must_use]
    pub fn has_ambiguity(&self) -> bool {
        self.inner.branches - self.inner.aborted.get() > 1
    }
}

#[derive(Debug)]
pub(crate) enum TreeNodeKind {
    Rule {
        prod: ProdId,
        value: Value,
        ambiguity: Option<Ambiguity>,
    },
    Token {
        matched: TerminalMatch,
    },
}

#[derive(Debug)]
pub(crate) struct TreeNodeData {
    pub parent: Option<NodeId>,
    pub children: SmallVec<[NodeId; 4]>,
    pub range: TextRange,
    /// Chart positions spanned: `begin..=end`.
    pub token_span: (u32, u32),
    pub kind: TreeNodeKind,
    pub ctx: NodeContext,
}

/// An immutable derivation tree: the root node, the aggregated markers and
/// the root value produced by the reduction actions.
#[derive(Debug)]
pub struct ParseTree {
    pub(crate) nodes: Vec<TreeNodeData>,
    pub(crate) root: NodeId,
    pub(crate) markers: Vec<Marker>,
    pub(crate) value: Value,
}

impl ParseTree {
    #[must_use]
    pub fn root(&self) -> TreeNode<'_> {
        TreeNode {
            tree: self,
            id: self.root,
        }
    }

    /// All markers of this tree, in source order, post-processor markers
    /// last.
    #[must_use]
    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    /// Value produced by the root's reduction action.
    #[must_use]
    pub const fn value(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn node(&self, id: NodeId) -> TreeNode<'_> {
        TreeNode { tree: self, id }
    }

    /// Deepest node whose chart span contains the given position.
    #[must_use]
    pub fn find_node_at_index(&self, index: u32) -> Option<TreeNode<'_>> {
        let root = self.root();
        let (begin, end) = self.data(self.root).token_span;
        if index < begin || index > end {
            return None;
        }
        let mut current = root;
        'descend: loop {
            for child in current.children() {
                let (begin, end) = self.data(child.id).token_span;
                if begin <= index && index <= end {
                    current = child;
                    continue 'descend;
                }
            }
            return Some(current);
        }
    }

    pub(crate) fn data(&self, id: NodeId) -> &TreeNodeData {
        &self.nodes[id.index()]
    }
}

/// A cursor into a [`ParseTree`].
#[derive(Clone, Copy)]
pub struct TreeNode<'t> {
    tree: &'t ParseTree,
    id: NodeId,
}

impl<'t> TreeNode<'t> {
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    #[must_use]
    pub fn parent(&self) -> Option<TreeNode<'t>> {
        self.tree.data(self.id).parent.map(|id| TreeNode {
            tree: self.tree,
            id,
        })
    }

    pub fn children(self) -> impl Iterator<Item = TreeNode<'t>> {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| TreeNode { tree, id })
    }

    #[must_use]
    pub fn range(&self) -> TextRange {
        self.tree.data(self.id).range
    }

    #[must_use]
    pub fn offset(&self) -> TextSize {
        self.range().start()
    }

    #[must_use]
    pub fn length(&self) -> TextSize {
        self.range().len()
    }

    #[must_use]
    pub fn is_token(&self) -> bool {
        matches!(self.tree.data(self.id).kind, TreeNodeKind::Token { .. })
    }

    /// The consumed terminal for token leaves.
    #[must_use]
    pub fn token(&self) -> Option<&'t TerminalMatch> {
        match &self.tree.data(self.id).kind {
            TreeNodeKind::Token { matched } => Some(matched),
            TreeNodeKind::Rule { .. } => None,
        }
    }

    /// Whether this leaf consumed a real input token (scanned or mutated).
    #[must_use]
    pub fn is_real_token(&self) -> bool {
        self.token().is_some_and(|m| {
            matches!(m.origin, MatchOrigin::Scanned | MatchOrigin::Mutated)
        })
    }

    #[must_use]
    pub fn production(&self) -> Option<ProdId> {
        match &self.tree.data(self.id).kind {
            TreeNodeKind::Rule { prod, .. } => Some(*prod),
            TreeNodeKind::Token { .. } => None,
        }
    }

    /// Value produced by this node's reduction action.
    #[must_use]
    pub fn value(&self) -> Option<&'t Value> {
        match &self.tree.data(self.id).kind {
            TreeNodeKind::Rule { value, .. } => Some(value),
            TreeNodeKind::Token { .. } => None,
        }
    }

    #[must_use]
    pub fn context(&self) -> &'t NodeContext {
        &self.tree.data(self.id).ctx
    }

    #[must_use]
    pub fn ambiguity(&self) -> Option<&'t Ambiguity> {
        match &self.tree.data(self.id).kind {
            TreeNodeKind::Rule { ambiguity, .. } => ambiguity.as_ref(),
            TreeNodeKind::Token { .. } => None,
        }
    }

    #[must_use]
    pub fn was_ambiguous(&self) -> bool {
        self.ambiguity().is_some_and(Ambiguity::was_ambiguous)
    }

    #[must_use]
    pub fn has_ambiguity(&self) -> bool {
        self.ambiguity().is_some_and(Ambiguity::has_ambiguity)
    }
}

/// Restricted capability view handed to reduction actions.
///
/// Actions never see the node itself: they get the context being built, the
/// argument spans for token styling, and the per-parse scratch pad.
pub struct ReduceContext<'a> {
    pub(crate) ctx: &'a mut NodeContext,
    pub(crate) node_range: TextRange,
    pub(crate) arg_ranges: &'a [TextRange],
    pub(crate) shared: &'a mut HashMap<CompactString, Value, ahash::RandomState>,
}

impl ReduceContext<'_> {
    /// Attach a marker to the node under construction.
    pub fn add_marker(&mut self, marker: Marker) {
        self.ctx.markers.push(marker);
    }

    /// Convenience for a custom marker spanning the whole node.
    pub fn add_message(&mut self, severity: Severity, message: &str) {
        self.ctx
            .markers
            .push(Marker::custom(self.node_range, severity, message));
    }

    /// Style the whole node.
    pub fn set_style(&mut self, name: &str) {
        self.ctx.styles.push(Style::new(self.node_range, name));
    }

    /// Style the argument at the given index. Out-of-range indices (an
    /// argument synthesized away by recovery) are ignored.
    pub fn set_token_style(&mut self, arg: usize, name: &str) {
        if let Some(&range) = self.arg_ranges.get(arg) {
            self.ctx.styles.push(Style::new(range, name));
        }
    }

    /// Reject this subtree as semantically invalid. The branch still
    /// exists; reducers preferring unaborted branches will drop it when an
    /// alternative survives.
    pub fn abort(&mut self) {
        self.ctx.aborted = true;
    }

    /// Store a value on this node's context.
    pub fn set_user(&mut self, value: Value) {
        self.ctx.user = Some(value);
    }

    /// Per-parse scratch pad, shared across all actions of one navigation.
    pub fn set_data(&mut self, key: &str, value: Value) {
        self.shared.insert(key.into(), value);
    }

    #[must_use]
    pub fn data(&self, key: &str) -> Option<&Value> {
        self.shared.get(key)
    }

    #[must_use]
    pub const fn node_range(&self) -> TextRange {
        self.node_range
    }
}
