//! Feature constraints propagated through derivations.
//!
//! A feature is an opaque value carried by every production and every parser
//! state. When a completed production is folded into its parent, the parent's
//! feature is merged with the production's feature at the parent's current
//! child index. A merge is total: instead of failing it returns
//! [`FeatureMerge::Incompatible`], which rejects the derivation while leaving
//! the state available to error recovery.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// Outcome of merging two features.
pub enum FeatureMerge {
    /// The merge produced a new feature.
    Merged(Arc<dyn Feature>),
    /// The merge leaves the left-hand feature as-is.
    Unchanged,
    /// The combination is semantically inadmissible.
    Incompatible,
}

/// A constraint value propagated left-to-right through a production's
/// children.
///
/// Implementations must keep `merge` total and make [`fingerprint`] stable:
/// the fingerprint participates in parser-state identity, so two features
/// that compare differently under `merge` must fingerprint differently.
///
/// [`fingerprint`]: Feature::fingerprint
pub trait Feature: fmt::Debug + Send + Sync {
    /// Merge `other` (the feature of a completed child production) into this
    /// feature, at child position `from_index`.
    fn merge(&self, from_index: usize, other: &Arc<dyn Feature>) -> FeatureMerge;

    /// Stable identity hash. The neutral feature fingerprints to 0.
    fn fingerprint(&self) -> u64;

    /// Downcast support for user algebras.
    fn as_any(&self) -> &dyn Any;
}

/// The top feature: compatible with everything, adopts the other side.
#[derive(Debug, Clone, Copy, Default)]
pub struct Neutral;

impl Feature for Neutral {
    fn merge(&self, _from_index: usize, other: &Arc<dyn Feature>) -> FeatureMerge {
        if other.fingerprint() == 0 {
            FeatureMerge::Unchanged
        } else {
            FeatureMerge::Merged(other.clone())
        }
    }

    fn fingerprint(&self) -> u64 {
        0
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Shared handle to the neutral feature.
#[must_use]
pub fn neutral() -> Arc<dyn Feature> {
    Arc::new(Neutral)
}

/// Apply a merge, returning `None` for incompatible combinations.
pub(crate) fn apply_merge(
    parent: &Arc<dyn Feature>,
    from_index: usize,
    child: &Arc<dyn Feature>,
) -> Option<Arc<dyn Feature>> {
    match parent.merge(from_index, child) {
        FeatureMerge::Merged(feature) => Some(feature),
        FeatureMerge::Unchanged => Some(parent.clone()),
        FeatureMerge::Incompatible => None,
    }
}
