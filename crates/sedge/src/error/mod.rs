//! # Error Types
//!
//! Diagnostics and failure modes.
//!
//! ## Overview
//!
//! Two very different things live here:
//!
//! - [`Marker`] and [`Style`]: side-data produced by a parse. Syntactic and
//!   semantic problems never fail a call; they surface as markers on the
//!   outcome or the tree.
//! - [`EngineError`]: configuration failures at the facade boundary (unknown
//!   axiom, no derivation tree). These are real `Err` values.
//!
//! When the `diagnostics` feature is enabled, [`EngineError`] integrates with
//! [`miette`] for rich terminal reporting.

pub mod marker;

pub use marker::{Marker, MarkerKind, Severity, Style};

use thiserror::Error;

#[cfg(feature = "diagnostics")]
use miette::Diagnostic;

/// Facade-level failures.
#[derive(Debug, Error)]
#[cfg_attr(feature = "diagnostics", derive(Diagnostic))]
pub enum EngineError {
    #[error("no axiom matching `{0}`")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(sedge::missing_axiom)))]
    MissingAxiom(String),

    #[error("offset {offset} is beyond the input (length {len})")]
    #[cfg_attr(feature = "diagnostics", diagnostic(code(sedge::invalid_offset)))]
    InvalidOffset { offset: u32, len: u32 },

    #[error(transparent)]
    #[cfg_attr(feature = "diagnostics", diagnostic(transparent))]
    Forest(#[from] crate::forest::ForestError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forest::ForestError;

    #[test]
    fn test_missing_axiom_display() {
        let err = EngineError::MissingAxiom("stmt".to_string());
        assert_eq!(format!("{err}"), "no axiom matching `stmt`");
    }

    #[test]
    fn test_forest_error_is_transparent() {
        let err = EngineError::from(ForestError::Empty);
        assert_eq!(format!("{err}"), format!("{}", ForestError::Empty));
    }

    #[test]
    fn test_invalid_offset_display() {
        let err = EngineError::InvalidOffset { offset: 9, len: 4 };
        assert!(format!("{err}").contains("offset 9"));
    }
}
