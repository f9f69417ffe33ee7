//! Bundling edit pair types.
//!
//! A bundling edit states that a comprehensive (column 1) code includes a component (column 2)
//! code, so the two should not normally be billed together. The pair is directional in meaning
//! but detection is order-independent.

use serde::{Deserialize, Serialize};

/// One bundling edit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BundlingEditPair {
    /// Comprehensive (column 1) code.
    pub primary: String,

    /// Component (column 2) code bundled into `primary`.
    pub bundled: String,

    /// Whether a distinct-service modifier may legitimately override the edit.
    pub modifier_exception: bool,

    pub description: String,

    pub category: BundlingCategory,
}

impl BundlingEditPair {
    /// Whether both members of the pair are present according to `contains`.
    pub fn is_triggered_by(&self, contains: impl Fn(&str) -> bool) -> bool {
        contains(&self.primary) && contains(&self.bundled)
    }

    /// Whether this pair links `a` and `b`, in either order.
    pub fn links(&self, a: &str, b: &str) -> bool {
        (self.primary == a && self.bundled == b) || (self.primary == b && self.bundled == a)
    }
}

/// Clinical family a bundling edit belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundlingCategory {
    CathPci,
    Echo,
    Ep,
    EmProcedure,
    Peripheral,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> BundlingEditPair {
        BundlingEditPair {
            primary: "93458".into(),
            bundled: "93454".into(),
            modifier_exception: false,
            description: "test".into(),
            category: BundlingCategory::CathPci,
        }
    }

    #[test]
    fn links_is_order_independent() {
        let p = pair();
        assert!(p.links("93458", "93454"));
        assert!(p.links("93454", "93458"));
        assert!(!p.links("93458", "93452"));
    }

    #[test]
    fn triggered_only_when_both_present() {
        let p = pair();
        assert!(p.is_triggered_by(|c| c == "93458" || c == "93454"));
        assert!(!p.is_triggered_by(|c| c == "93458"));
    }
}
