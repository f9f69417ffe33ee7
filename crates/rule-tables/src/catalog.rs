//! Selectable inpatient code catalog types.
//!
//! The catalog is the static "code metadata" collaborator: per code, the selection category it
//! belongs to, its RVU weight, and whether it is an add-on, time-based, or restricted to the
//! first encounter of an admission.

use serde::{Deserialize, Serialize};

/// Static metadata for one selectable code.
#[derive(Clone, Debug, PartialEq)]
pub struct CodeMetadata {
    pub code: String,

    pub category: SelectionCategory,

    /// Relative value units. Carried as data only; payment is not computed here.
    pub rvu: f64,

    /// Add-on codes toggle independently and need a qualifying primary.
    pub add_on: bool,

    /// Time-based codes need documented minutes.
    pub time_based: bool,

    /// Only offered on the first encounter of an admission (initial hospital care, consults).
    pub initial_encounter: bool,
}

/// Mutually-exclusive selection category. At most one non-add-on code per category.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionCategory {
    NoCharge,
    InitialHospital,
    Subsequent,
    ObservationSameDay,
    ObservationSubsequent,
    Discharge,
    Consult,
    CriticalCare,
    Prolonged,
}

impl SelectionCategory {
    /// Coarser exclusivity group the category belongs to.
    pub fn billing_group(self) -> BillingGroup {
        match self {
            SelectionCategory::NoCharge => BillingGroup::NoCharge,
            SelectionCategory::InitialHospital
            | SelectionCategory::Subsequent
            | SelectionCategory::Consult => BillingGroup::PrimaryEm,
            SelectionCategory::ObservationSameDay => BillingGroup::Observation,
            SelectionCategory::ObservationSubsequent => BillingGroup::ObservationSubsequent,
            SelectionCategory::Discharge => BillingGroup::Discharge,
            SelectionCategory::CriticalCare => BillingGroup::CriticalCare,
            SelectionCategory::Prolonged => BillingGroup::Prolonged,
        }
    }
}

/// Exclusivity group across selection categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingGroup {
    /// Initial hospital, subsequent and consult categories.
    PrimaryEm,
    Observation,
    ObservationSubsequent,
    Discharge,
    CriticalCare,
    Prolonged,
    NoCharge,
}

impl BillingGroup {
    /// Whether a prolonged-services add-on may attach to a code in this group.
    pub fn qualifies_for_prolonged(self) -> bool {
        matches!(self, BillingGroup::PrimaryEm | BillingGroup::Discharge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_em_categories_share_a_group() {
        assert_eq!(
            SelectionCategory::InitialHospital.billing_group(),
            BillingGroup::PrimaryEm
        );
        assert_eq!(SelectionCategory::Consult.billing_group(), BillingGroup::PrimaryEm);
        assert_eq!(
            SelectionCategory::CriticalCare.billing_group(),
            BillingGroup::CriticalCare
        );
    }

    #[test]
    fn only_primary_em_and_discharge_qualify_for_prolonged() {
        assert!(BillingGroup::PrimaryEm.qualifies_for_prolonged());
        assert!(BillingGroup::Discharge.qualifies_for_prolonged());
        assert!(!BillingGroup::CriticalCare.qualifies_for_prolonged());
        assert!(!BillingGroup::Observation.qualifies_for_prolonged());
    }
}
