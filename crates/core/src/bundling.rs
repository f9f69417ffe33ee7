//! Bundling edit checker.

use std::collections::HashSet;

use billing_types::Severity;
use rule_tables::RuleTables;
use serde::{Deserialize, Serialize};

/// Two codes in the selection that are bundled under a CCI-style edit.
///
/// Always advisory: the severity is fixed at [`Severity::Warning`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundlingViolation {
    pub primary_code: String,
    pub bundled_code: String,
    pub description: String,
    /// Whether an appropriate modifier may override the edit.
    pub modifier_exception: bool,
    pub severity: Severity,
}

/// Reports every bundling pair whose two codes are both present in `codes`.
///
/// Output follows table order, so it does not depend on how the caller ordered the input, and
/// duplicates in `codes` collapse to one occurrence each.
pub fn check_bundling<S: AsRef<str>>(tables: &RuleTables, codes: &[S]) -> Vec<BundlingViolation> {
    let present: HashSet<&str> = codes.iter().map(|c| c.as_ref().trim()).collect();

    tables
        .bundling_pairs
        .iter()
        .filter(|pair| pair.is_triggered_by(|code| present.contains(code)))
        .map(|pair| BundlingViolation {
            primary_code: pair.primary.clone(),
            bundled_code: pair.bundled.clone(),
            description: pair.description.clone(),
            modifier_exception: pair.modifier_exception,
            severity: Severity::Warning,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rule_tables::builtin_tables;

    #[test]
    fn scenario_a_left_heart_cath_bundles_angiography() {
        let violations = check_bundling(builtin_tables(), &["93458", "93454"]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].primary_code, "93458");
        assert_eq!(violations[0].bundled_code, "93454");
        assert!(!violations[0].modifier_exception);
        assert_eq!(violations[0].severity, Severity::Warning);
    }

    #[test]
    fn scenario_b_overlapping_caths_report_both_components() {
        let violations = check_bundling(builtin_tables(), &["93459", "93454", "93458"]);
        assert!(violations.len() >= 2);
        let bundled: HashSet<_> = violations.iter().map(|v| v.bundled_code.as_str()).collect();
        assert!(bundled.contains("93454"));
        assert!(bundled.contains("93458"));
    }

    #[test]
    fn scenario_c_unrelated_codes_are_clean() {
        assert!(check_bundling(builtin_tables(), &["93000", "99213"]).is_empty());
    }

    #[test]
    fn scenario_d_pci_pair_allows_modifier() {
        let violations = check_bundling(builtin_tables(), &["92928", "92924"]);
        assert_eq!(violations.len(), 1);
        assert!(violations[0].modifier_exception);
    }

    #[test]
    fn scenario_e_duplicates_report_once() {
        let violations = check_bundling(builtin_tables(), &["93458", "93454", "93458", "93454"]);
        assert_eq!(violations.len(), 1);
    }

    #[test]
    fn pair_detection_is_order_independent() {
        let tables = builtin_tables();
        for pair in &tables.bundling_pairs {
            let forward = check_bundling(tables, &[pair.primary.as_str(), pair.bundled.as_str()]);
            let reverse = check_bundling(tables, &[pair.bundled.as_str(), pair.primary.as_str()]);
            assert_eq!(forward, reverse);
            let matching = forward
                .iter()
                .filter(|v| pair.links(&v.primary_code, &v.bundled_code))
                .count();
            assert_eq!(matching, 1, "pair {} / {}", pair.primary, pair.bundled);
        }
    }

    #[test]
    fn codes_outside_every_pair_yield_nothing() {
        let tables = builtin_tables();
        let in_table: HashSet<&str> = tables
            .bundling_pairs
            .iter()
            .flat_map(|p| [p.primary.as_str(), p.bundled.as_str()])
            .collect();
        let outside: Vec<&str> = ["93000", "99213", "93306", "36415", "93503"]
            .into_iter()
            .filter(|c| !in_table.contains(c))
            .collect();
        assert!(!outside.is_empty());
        assert!(check_bundling(tables, &outside).is_empty());
    }
}
