//! # Forest Navigator
//!
//! Derivation trees reconstructed from the recognizer's back-pointers.
//!
//! ## Overview
//!
//! A successful (or recovered) parse leaves a DAG of states behind. The
//! [`Navigator`] walks it from the success state, expanding back-pointers
//! into candidate subtrees and running a configurable [`Reducer`] stack at
//! every completed state to collapse ambiguity. Reduction actions fire as
//! nodes are closed, building user values and writing markers and styles
//! into each node's [`NodeContext`].
//!
//! The default stack `[PreferUnaborted, SelectOne]` yields at most one tree;
//! [`Navigator::single_tree`] surfaces anything else as a [`ForestError`]
//! rather than silently picking.

pub mod navigator;
pub mod node;
pub mod reducer;
pub mod style;

pub use navigator::{Navigator, PostProcessor};
pub use node::{Ambiguity, NodeContext, NodeId, ParseTree, ReduceContext, TreeNode};
pub use reducer::{Preference, Reducer};
pub use style::collect_styles;

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Failures extracting trees from a parse.
#[derive(Debug, Error, PartialEq, Eq)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum ForestError {
    /// No derivation spans the input.
    #[error("no derivation tree")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(sedge::forest::empty)))]
    Empty,

    /// More than one tree survived the configured reducer stack.
    #[error("{count} derivation trees survived reduction")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(sedge::forest::ambiguous)))]
    AmbiguousForest { count: usize },
}
