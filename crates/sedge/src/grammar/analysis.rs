//! Grammar analysis passes run at build time.

use crate::grammar::builder::{Production, Rule};
use crate::grammar::{RuleId, Symbol};
use hashbrown::HashSet;

/// Compute the nullable set: every rule that derives the empty string.
///
/// Standard fixed point: a production is nullable when all of its symbols are
/// nullable rules (trivially so for an empty body); a rule is nullable when
/// any of its productions is.
pub(crate) fn compute_nullable(
    rules: &[Rule],
    productions: &[Production],
) -> HashSet<RuleId, ahash::RandomState> {
    let mut nullable: HashSet<RuleId, ahash::RandomState> = HashSet::default();

    let mut changed = true;
    while changed {
        changed = false;

        for (index, rule) in rules.iter().enumerate() {
            let id = RuleId(index as u32);
            if nullable.contains(&id) {
                continue;
            }

            let derives_empty = rule.productions.iter().any(|prod| {
                productions[prod.index()]
                    .symbols
                    .iter()
                    .all(|symbol| match symbol {
                        Symbol::Terminal(_) => false,
                        Symbol::Rule(r) => nullable.contains(r),
                    })
            });

            if derives_empty {
                nullable.insert(id);
                changed = true;
            }
        }
    }

    nullable
}
