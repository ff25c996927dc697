//! # Sedge LSP Integration
//!
//! Conversion traits for wiring sedge parse results into a Language Server
//! Protocol implementation.
//!
//! ## Features
//!
//! - Convert [`Marker`](sedge::error::Marker) to `lsp_types::Diagnostic`
//!   (locale-resolved messages, severity mapping)
//! - Convert completion [`Proposal`](sedge::api::Proposal)s to
//!   `lsp_types::CompletionItem` (replace spans become text edits)
//! - Convert [`TextRange`](sedge::text::TextRange) to `lsp_types::Range`,
//!   with or without a source text for line/column accuracy
//!
//! ## Usage
//!
//! ```rust,ignore
//! use sedge_lsp::{ToCompletionItem, ToDiagnostic};
//!
//! let report = engine.parse(text, None)?;
//! let diagnostics: Vec<lsp_types::Diagnostic> = report
//!     .markers
//!     .iter()
//!     .map(|m| m.to_diagnostic(text, "en"))
//!     .collect();
//! ```

pub mod conversions;
pub mod line_index;

pub use conversions::{ToCompletionItem, ToDiagnostic, ToRange, ToRangeWithSource};
pub use line_index::LineIndex;
