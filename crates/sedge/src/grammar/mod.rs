//! # Grammar Module
//!
//! Runtime definition of context-free grammars.
//!
//! ## Overview
//!
//! This module provides the types for defining and working with grammars at
//! runtime:
//!
//! - **Terminals**: lexical classes with an optional default text (used to
//!   materialize completion proposals) and an optional style name
//! - **Rules and productions**: named non-terminals with one or more ordered
//!   symbol sequences
//! - **Axioms**: designated entry points; a grammar may declare several, each
//!   addressable by name
//! - **Features**: opaque constraint values propagated through derivations,
//!   able to reject a derivation at recognition time
//! - **Reduction actions**: per-production callbacks building user values
//!   while a tree is constructed
//!
//! ## Usage
//!
//! ```rust
//! use sedge::grammar::{GrammarBuilder, ProductionDef, Symbol, TerminalDef};
//! use sedge::lexer::{CharSet, TokenPattern};
//!
//! let mut builder = GrammarBuilder::new();
//! let int = builder.terminal(
//!     TerminalDef::new("int")
//!         .pattern(TokenPattern::repeat(CharSet::digits(), 1, None))
//!         .default_text("0"),
//! );
//! let plus = builder.terminal(TerminalDef::literal("plus", "+"));
//! let expr = builder.rule("expr");
//! builder.production(ProductionDef::new(
//!     expr,
//!     [Symbol::Rule(expr), Symbol::Terminal(plus), Symbol::Terminal(int)],
//! ));
//! builder.production(ProductionDef::new(expr, [Symbol::Terminal(int)]));
//! builder.axiom("root", expr);
//! let grammar = builder.build()?;
//! assert_eq!(grammar.axioms().len(), 1);
//! # Ok::<(), sedge::grammar::GrammarError>(())
//! ```
//!
//! A grammar is built once and is immutable afterwards; it can be shared
//! freely between parses.

pub mod analysis;
pub mod builder;
pub mod feature;

pub use builder::{
    Axiom, Grammar, GrammarBuilder, GrammarError, Production, ProductionDef, Rule, Terminal,
    TerminalDef,
};
pub use feature::{neutral, Feature, FeatureMerge, Neutral};

use crate::forest::ReduceContext;
use crate::lexer::Token;
use compact_str::CompactString;
use std::fmt;
use std::sync::Arc;

/// Index of a terminal in a [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TerminalId(pub(crate) u32);

/// Index of a rule (non-terminal) in a [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(pub(crate) u32);

/// Index of a production in a [`Grammar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProdId(pub(crate) u32);

/// Index of a user-level element tag in a [`Grammar`].
///
/// Element tags identify the user-facing construct a production belongs to;
/// completion providers and filters are registered against them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) u32);

impl TerminalId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl RuleId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl ProdId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl ElementId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

/// One position of a production body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    Terminal(TerminalId),
    Rule(RuleId),
}

/// Value produced by reduction actions.
///
/// Terminal children arrive as [`Value::Token`]; non-terminal children as
/// whatever their own action returned. Domain values that don't fit the
/// scalar arms go through [`Value::User`] and are recovered by downcasting.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    None,
    Token(Token),
    Int(i64),
    Float(f64),
    Str(CompactString),
    Bool(bool),
    User(Arc<dyn std::any::Any + Send + Sync>),
}

impl Value {
    /// Downcast a [`Value::User`] payload to a concrete type.
    #[must_use]
    pub fn downcast<T: 'static>(&self) -> Option<&T> {
        match self {
            Self::User(any) => any.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Wrap a domain value.
    #[must_use]
    pub fn user<T: Send + Sync + 'static>(value: T) -> Self {
        Self::User(Arc::new(value))
    }

    #[must_use]
    pub const fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => write!(f, "None"),
            Self::Token(t) => write!(f, "Token({:?})", t.text),
            Self::Int(v) => write!(f, "Int({v})"),
            Self::Float(v) => write!(f, "Float({v})"),
            Self::Str(v) => write!(f, "Str({v:?})"),
            Self::Bool(v) => write!(f, "Bool({v})"),
            Self::User(_) => write!(f, "User(..)"),
        }
    }
}

/// Reduction action attached to a production.
///
/// Receives a restricted view of the node under construction and the ordered
/// child values. Synthesized (inserted) and skipped (deleted) tokens are not
/// part of the argument list.
pub type ReduceAction = Arc<dyn Fn(&mut ReduceContext<'_>, Vec<Value>) -> Value + Send + Sync>;
