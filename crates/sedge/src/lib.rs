//! # Sedge
//!
//! A general context-free parsing engine for language tooling: syntax-aware
//! editors, code assistants and DSL interpreters.
//!
//! ## Overview
//!
//! Sedge takes a runtime grammar description plus an input text and
//! produces a parse forest annotated with recovered errors, semantic
//! markers and styling hints — and, for a cursor offset, a ranked list of
//! completion proposals. It supports:
//!
//! - **Arbitrary CFGs**: ambiguous, left-recursive and nullable grammars,
//!   via chart-based Earley recognition
//! - **Error recovery**: insertion, deletion and mutation repairs, so a
//!   parse table exists even for invalid input
//! - **Ambiguity reduction**: pluggable reducers collapse the forest to the
//!   preferred derivation
//! - **Feature constraints**: per-production features merged through
//!   derivations, rejecting semantically inadmissible combinations
//! - **Completion**: grammar-driven proposals for the symbols expected at a
//!   cursor
//!
//! ## Quick Start
//!
//! ```rust
//! use sedge::api::Engine;
//! use sedge::grammar::{GrammarBuilder, ProductionDef, Symbol, TerminalDef};
//! use sedge::lexer::{CharSet, TokenPattern};
//!
//! // A tiny sum grammar: expr → expr '+' int | int
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
//!
//! let engine = Engine::new(builder.build().expect("valid grammar"));
//! let report = engine.parse("1 + 2 + 3", None).expect("axiom exists");
//! assert!(report.success);
//! assert!(report.markers.is_empty());
//!
//! let prediction = engine.predict("1 + ", 4, None).expect("offset in range");
//! assert!(prediction.proposals.iter().any(|p| p.text == "0"));
//! ```
//!
//! ## Modules
//!
//! - [`grammar`] - Grammar definition: terminals, rules, features, actions
//! - [`lexer`] - Tokenization driven by terminal patterns
//! - [`earley`] - The recognizer: charts, states, error recovery
//! - [`forest`] - Tree reconstruction, reducers, styles
//! - [`completion`] - Completion proposals at a cursor offset
//! - [`error`] - Markers, styles and facade errors
//! - [`api`] - The parse/predict facade

pub mod api;
pub mod completion;
pub mod earley;
pub mod error;
pub mod forest;
pub mod grammar;
pub mod lexer;
pub mod text;

// Re-export commonly used types
pub use api::{Engine, ParseReport, PredictReport, Proposal};
pub use completion::{CompletionProcessor, CompletionProposal};
pub use earley::{EarleyConfig, ParseOutcome, Recognizer};
pub use error::{EngineError, Marker, MarkerKind, Severity, Style};
pub use forest::{Ambiguity, Navigator, ParseTree, Reducer, TreeNode};
pub use grammar::{Grammar, GrammarBuilder, GrammarError, Value};
pub use lexer::{Lexer, Token};
pub use text::{TextRange, TextSize};
