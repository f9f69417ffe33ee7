//! Charge code selection state machine.
//!
//! Responsibilities:
//! - Compute the next selection from the current one and a requested code, enforcing category
//!   exclusivity, the no-charge rule and add-on dependencies.
//! - Answer pairwise billing compatibility questions for the selection UI.
//!
//! Notes:
//! - Transitions are pure: they take the current selection by reference and return a new one.
//! - A rejected request returns the selection unchanged; there is no error path.

use std::collections::BTreeMap;

use rule_tables::{BillingGroup, RuleTables, SelectionCategory};
use serde::{Deserialize, Serialize};

use crate::code_sets;
use crate::constants::{CRITICAL_CARE_ADD_ON, CRITICAL_CARE_BASE, NO_CHARGE_CODE};

// ============================================================================
// Selection value
// ============================================================================

/// One selected code and the modifiers already attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedCode {
    pub code: String,
    #[serde(default)]
    pub modifiers: Vec<String>,
}

impl SelectedCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            modifiers: Vec::new(),
        }
    }

    pub fn with_modifiers(code: impl Into<String>, modifiers: Vec<String>) -> Self {
        Self {
            code: code.into(),
            modifiers,
        }
    }
}

/// The working set of codes, diagnoses and documented time for one charge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeSelection {
    #[serde(default)]
    codes: Vec<SelectedCode>,
    #[serde(default)]
    diagnoses: Vec<String>,
    #[serde(default)]
    time_minutes: Option<u32>,
}

impl ChargeSelection {
    /// Build a selection from already-billed codes, e.g. a stored charge.
    ///
    /// No exclusivity rules are applied: stored data is evaluated as it was billed.
    pub fn from_codes(codes: Vec<SelectedCode>) -> Self {
        Self {
            codes,
            ..Default::default()
        }
    }

    pub fn with_diagnoses(mut self, diagnoses: Vec<String>) -> Self {
        self.diagnoses = diagnoses
            .into_iter()
            .map(|dx| normalize(&dx))
            .filter(|dx| !dx.is_empty())
            .collect();
        self
    }

    pub fn with_time_minutes(mut self, time_minutes: Option<u32>) -> Self {
        self.time_minutes = time_minutes;
        self
    }

    /// Attach a modifier to a selected code. Unknown codes are ignored.
    pub fn with_modifier(mut self, code: &str, modifier: &str) -> Self {
        let modifier = rule_tables::normalize_modifier_id(modifier);
        if let Some(entry) = self.codes.iter_mut().find(|c| c.code == code) {
            if !entry.modifiers.contains(&modifier) {
                entry.modifiers.push(modifier);
            }
        }
        self
    }

    pub fn codes(&self) -> &[SelectedCode] {
        &self.codes
    }

    pub fn diagnoses(&self) -> &[String] {
        &self.diagnoses
    }

    pub fn time_minutes(&self) -> Option<u32> {
        self.time_minutes
    }

    /// Base codes in selection order.
    pub fn code_list(&self) -> Vec<&str> {
        self.codes.iter().map(|c| c.code.as_str()).collect()
    }

    pub fn contains(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c.code == code)
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    fn remove(&mut self, code: &str) {
        self.codes.retain(|c| c.code != code);
    }

    fn remove_where(&mut self, mut predicate: impl FnMut(&str) -> bool) {
        self.codes.retain(|c| !predicate(&c.code));
    }
}

fn normalize(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

// ============================================================================
// Pairwise compatibility
// ============================================================================

/// Whether two codes may be billed together, and any modifier that makes it so.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingCompatibility {
    pub can_bill: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requires_modifier: Option<String>,
    /// The code that needs `requires_modifier`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modifier_applies_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl BillingCompatibility {
    fn allowed() -> Self {
        Self {
            can_bill: true,
            requires_modifier: None,
            modifier_applies_to: None,
            reason: None,
        }
    }

    fn blocked(reason: &str) -> Self {
        Self {
            can_bill: false,
            requires_modifier: None,
            modifier_applies_to: None,
            reason: Some(reason.to_owned()),
        }
    }
}

fn is_own_add_on(a: &str, b: &str) -> bool {
    let primary_of = |add_on: &str, primary: &str| {
        code_sets::add_on_primaries(add_on).is_some_and(|p| p.contains(&primary))
    };
    primary_of(a, b) || primary_of(b, a)
}

/// Checks whether two catalog codes can be billed on the same encounter.
pub fn check_billing_compatibility(tables: &RuleTables, a: &str, b: &str) -> BillingCompatibility {
    use BillingGroup::*;

    let (Some(meta_a), Some(meta_b)) = (tables.metadata(a), tables.metadata(b)) else {
        return BillingCompatibility::blocked("Unknown code category");
    };
    let (group_a, group_b) = (meta_a.category.billing_group(), meta_b.category.billing_group());
    let either = |g: BillingGroup| group_a == g || group_b == g;
    let other_than = |g: BillingGroup| if group_a == g { group_b } else { group_a };

    if either(NoCharge) {
        return BillingCompatibility {
            can_bill: a == b,
            ..BillingCompatibility::blocked("No Charge cannot be combined with other codes")
        };
    }

    if meta_a.category == meta_b.category {
        if a == b || is_own_add_on(a, b) {
            return BillingCompatibility::allowed();
        }
        return BillingCompatibility::blocked("Only one code allowed per category");
    }

    if group_a == PrimaryEm && group_b == PrimaryEm {
        return BillingCompatibility::blocked(
            "Cannot bill Initial, Subsequent, and Consult codes together",
        );
    }

    if either(Observation)
        && matches!(
            other_than(Observation),
            PrimaryEm | Discharge | ObservationSubsequent
        )
    {
        return BillingCompatibility::blocked(
            "Observation same-day codes (99234-99236) include both admission and discharge. They cannot be combined with Initial Hospital, Subsequent, Consult, Discharge, or Observation Subsequent codes",
        );
    }

    if either(ObservationSubsequent) && other_than(ObservationSubsequent) == PrimaryEm {
        return BillingCompatibility::blocked(
            "Observation subsequent codes (99224-99226) cannot be combined with inpatient E/M codes. Use observation codes for patients in observation status, inpatient codes for admitted patients",
        );
    }

    if either(PrimaryEm) && either(Discharge) {
        return BillingCompatibility::blocked("Cannot bill E/M and Discharge on same encounter");
    }

    if either(CriticalCare) && either(Discharge) {
        return BillingCompatibility::allowed();
    }

    if either(CriticalCare) && either(PrimaryEm) {
        let em_code = if group_a == PrimaryEm { a } else { b };
        return BillingCompatibility {
            can_bill: true,
            requires_modifier: Some("-25".to_owned()),
            modifier_applies_to: Some(em_code.to_owned()),
            reason: Some("E/M service performed before patient required critical care".to_owned()),
        };
    }

    if a == CRITICAL_CARE_ADD_ON || b == CRITICAL_CARE_ADD_ON {
        if a == CRITICAL_CARE_BASE || b == CRITICAL_CARE_BASE {
            return BillingCompatibility::allowed();
        }
        return BillingCompatibility::blocked("99292 requires 99291 as primary code");
    }

    if either(Prolonged) {
        if other_than(Prolonged).qualifies_for_prolonged() {
            return BillingCompatibility::allowed();
        }
        return BillingCompatibility::blocked("Prolonged services require E/M or Discharge code");
    }

    BillingCompatibility::allowed()
}

fn has_prolonged_anchor(tables: &RuleTables, codes: &[&str]) -> bool {
    codes.iter().any(|c| {
        tables
            .metadata(c)
            .is_some_and(|m| m.category.billing_group().qualifies_for_prolonged())
    })
}

/// Whether `code` may be added to `selection`.
///
/// The code must be compatible with every selected code, an add-on needs one of its primaries,
/// and prolonged services need a primary E/M or discharge code.
pub fn can_add_code(tables: &RuleTables, code: &str, selection: &ChargeSelection) -> bool {
    let selected = selection.code_list();
    if selected.is_empty() {
        return code_sets::add_on_primaries(code).is_none()
            && tables
                .metadata(code)
                .is_none_or(|m| m.category != SelectionCategory::Prolonged);
    }

    if selected
        .iter()
        .any(|other| !check_billing_compatibility(tables, code, other).can_bill)
    {
        return false;
    }

    if let Some(primaries) = code_sets::add_on_primaries(code) {
        if !primaries.iter().any(|p| selected.contains(p)) {
            return false;
        }
    }

    let is_prolonged = tables
        .metadata(code)
        .is_some_and(|m| m.category == SelectionCategory::Prolonged);
    if is_prolonged && !has_prolonged_anchor(tables, &selected) {
        return false;
    }

    true
}

/// Code to modifier map implied by pairwise compatibility (e.g. `-25` on an E/M billed with
/// critical care).
pub fn required_modifiers(
    tables: &RuleTables,
    selection: &ChargeSelection,
) -> BTreeMap<String, String> {
    let codes = selection.code_list();
    let mut out = BTreeMap::new();
    for (i, a) in codes.iter().enumerate() {
        for b in &codes[i + 1..] {
            let compat = check_billing_compatibility(tables, a, b);
            if let (Some(modifier), Some(target)) =
                (compat.requires_modifier, compat.modifier_applies_to)
            {
                out.insert(target, modifier);
            }
        }
    }
    out
}

/// Catalog add-on codes that could be added to `selection` right now.
pub fn available_add_ons(tables: &RuleTables, selection: &ChargeSelection) -> Vec<String> {
    tables
        .catalog
        .iter()
        .filter(|m| m.add_on && !selection.contains(&m.code))
        .filter(|m| can_add_code(tables, &m.code, selection))
        .map(|m| m.code.clone())
        .collect()
}

// ============================================================================
// Transitions
// ============================================================================

fn groups_displaced_by(group: BillingGroup) -> &'static [BillingGroup] {
    use BillingGroup::*;
    match group {
        PrimaryEm => &[PrimaryEm, Discharge, Observation, ObservationSubsequent],
        Discharge => &[PrimaryEm, Observation],
        Observation => &[PrimaryEm, Discharge, ObservationSubsequent],
        ObservationSubsequent => &[PrimaryEm, Observation],
        CriticalCare | Prolonged | NoCharge => &[],
    }
}

fn has_primary_for(code: &str, present: &[String]) -> bool {
    code_sets::add_on_primaries(code)
        .is_none_or(|primaries| primaries.iter().any(|p| present.iter().any(|c| c == p)))
}

/// Drops add-ons whose primaries are gone, repeating until stable.
fn prune_orphaned_add_ons(selection: &mut ChargeSelection) {
    loop {
        let present: Vec<String> = selection.codes.iter().map(|c| c.code.clone()).collect();
        let orphan = present.iter().find(|code| !has_primary_for(code, &present));
        match orphan {
            Some(code) => selection.remove(code),
            None => break,
        }
    }
}

/// Computes the selection that results from the user requesting `code`.
///
/// Add-ons toggle on their own (adding only when [`can_add_code`] allows). Other codes replace
/// any code in their category and displace codes from exclusive groups; requesting a selected
/// code deselects it. `00000` clears everything else.
pub fn transition(tables: &RuleTables, current: &ChargeSelection, code: &str) -> ChargeSelection {
    let code = normalize(code);
    if code.is_empty() {
        return current.clone();
    }
    let mut next = current.clone();

    let Some(meta) = tables.metadata(&code) else {
        if code == NO_CHARGE_CODE {
            next.codes = vec![SelectedCode::new(code)];
            return next;
        }
        if next.contains(&code) {
            next.remove(&code);
        } else {
            next.remove(NO_CHARGE_CODE);
            let present: Vec<String> = next.codes.iter().map(|c| c.code.clone()).collect();
            if !has_primary_for(&code, &present) {
                tracing::debug!("ignoring add-on {} without a selected primary", code);
                return current.clone();
            }
            next.codes.push(SelectedCode::new(code));
        }
        prune_orphaned_add_ons(&mut next);
        return next;
    };

    if meta.add_on {
        if next.contains(&code) {
            next.remove(&code);
            prune_orphaned_add_ons(&mut next);
        } else if can_add_code(tables, &code, current) {
            next.codes.push(SelectedCode::new(code));
        }
        return next;
    }

    let category = meta.category;
    let group = category.billing_group();

    next.remove_where(|c| {
        c != code
            && tables
                .metadata(c)
                .is_some_and(|m| m.category == category && !m.add_on)
    });

    if group == BillingGroup::NoCharge {
        next.codes = vec![SelectedCode::new(code)];
        return next;
    }
    next.remove(NO_CHARGE_CODE);

    let displaced = groups_displaced_by(group);
    next.remove_where(|c| {
        c != code
            && tables
                .metadata(c)
                .is_some_and(|m| !m.add_on && displaced.contains(&m.category.billing_group()))
    });

    if next.contains(&code) {
        next.remove(&code);
        if code == CRITICAL_CARE_BASE {
            next.remove(CRITICAL_CARE_ADD_ON);
        }
    } else {
        next.codes.push(SelectedCode::new(code));
    }

    let codes = next.code_list();
    if !has_prolonged_anchor(tables, &codes) {
        next.remove_where(|c| {
            tables
                .metadata(c)
                .is_some_and(|m| m.category == SelectionCategory::Prolonged)
        });
    }
    prune_orphaned_add_ons(&mut next);

    next
}

/// Toggles a diagnosis. Adding is refused once `cap` diagnoses are attached.
pub fn toggle_diagnosis(current: &ChargeSelection, diagnosis: &str, cap: usize) -> ChargeSelection {
    let diagnosis = normalize(diagnosis);
    if diagnosis.is_empty() {
        return current.clone();
    }
    let mut next = current.clone();
    if let Some(pos) = next.diagnoses.iter().position(|d| *d == diagnosis) {
        next.diagnoses.remove(pos);
    } else if next.diagnoses.len() < cap {
        next.diagnoses.push(diagnosis);
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;
    use rule_tables::builtin_tables;

    fn select(codes: &[&str]) -> ChargeSelection {
        let tables = builtin_tables();
        codes
            .iter()
            .fold(ChargeSelection::default(), |sel, code| transition(tables, &sel, code))
    }

    #[test]
    fn same_category_replaces() {
        assert_eq!(select(&["99231", "99233"]).code_list(), vec!["99233"]);
    }

    #[test]
    fn reselecting_deselects() {
        assert!(select(&["99232", "99232"]).is_empty());
    }

    #[test]
    fn no_charge_clears_everything() {
        let sel = select(&["99232", "99291", "99292", "00000"]);
        assert_eq!(sel.code_list(), vec!["00000"]);
    }

    #[test]
    fn any_code_removes_no_charge() {
        assert_eq!(select(&["00000", "99232"]).code_list(), vec!["99232"]);
        assert_eq!(select(&["00000", "93306"]).code_list(), vec!["93306"]);
    }

    #[test]
    fn primary_em_groups_are_exclusive() {
        assert_eq!(select(&["99221", "99252"]).code_list(), vec!["99252"]);
        assert_eq!(select(&["99232", "99238"]).code_list(), vec!["99238"]);
        assert_eq!(select(&["99238", "99232"]).code_list(), vec!["99232"]);
    }

    #[test]
    fn critical_care_coexists_with_primary_em() {
        let sel = select(&["99232", "99291"]);
        assert_eq!(sel.code_list(), vec!["99232", "99291"]);
        let mods = required_modifiers(builtin_tables(), &sel);
        assert_eq!(mods.get("99232").map(String::as_str), Some("-25"));
    }

    #[test]
    fn observation_displaces_inpatient_em() {
        assert_eq!(select(&["99232", "99235"]).code_list(), vec!["99235"]);
        assert_eq!(select(&["99235", "99225"]).code_list(), vec!["99225"]);
    }

    #[test]
    fn add_on_requires_primary() {
        assert!(select(&["99292"]).is_empty());
        assert_eq!(select(&["99291", "99292"]).code_list(), vec!["99291", "99292"]);
    }

    #[test]
    fn removing_primary_removes_its_add_on() {
        let sel = select(&["99291", "99292", "99291"]);
        assert!(sel.is_empty());
    }

    #[test]
    fn prolonged_needs_em_anchor() {
        assert!(select(&["99356"]).is_empty());
        let sel = select(&["99233", "99356", "99357"]);
        assert_eq!(sel.code_list(), vec!["99233", "99356", "99357"]);

        // Dropping the E/M removes the prolonged chain.
        let sel = transition(builtin_tables(), &sel, "99233");
        assert!(sel.is_empty());
    }

    #[test]
    fn removing_prolonged_base_drops_its_increment() {
        let sel = select(&["99233", "99356", "99357", "99356"]);
        assert_eq!(sel.code_list(), vec!["99233"]);
    }

    #[test]
    fn prolonged_survives_switch_to_critical_care_with_discharge() {
        let sel = select(&["99238", "99356", "99291"]);
        assert_eq!(sel.code_list(), vec!["99238", "99356", "99291"]);
    }

    #[test]
    fn at_most_one_primary_per_category() {
        let tables = builtin_tables();
        let requests = [
            "99221", "99232", "99291", "99292", "99238", "99233", "99254", "99356", "99357",
            "99235", "99225", "99239", "00000", "99231",
        ];
        let mut sel = ChargeSelection::default();
        for code in requests {
            sel = transition(tables, &sel, code);
            let mut categories: Vec<_> = sel
                .code_list()
                .iter()
                .filter_map(|c| tables.metadata(c))
                .filter(|m| !m.add_on)
                .map(|m| m.category)
                .collect();
            let before = categories.len();
            categories.sort();
            categories.dedup();
            assert_eq!(before, categories.len(), "after requesting {code}");
        }
    }

    #[test]
    fn non_catalog_codes_toggle() {
        let sel = select(&["99232", "93306"]);
        assert_eq!(sel.code_list(), vec!["99232", "93306"]);
        assert_eq!(select(&["93306", "93306"]).code_list(), Vec::<&str>::new());
    }

    #[test]
    fn procedure_add_on_without_primary_is_ignored() {
        assert!(select(&["92978"]).is_empty());
        assert_eq!(select(&["00000", "93320"]).code_list(), vec!["00000"]);
    }

    #[test]
    fn removing_echo_drops_its_doppler_add_on() {
        assert!(select(&["93306", "93320", "93306"]).is_empty());
        let sel = select(&["93653", "93655", "93653"]);
        assert!(sel.is_empty());
    }

    #[test]
    fn procedure_add_on_with_primary_is_kept() {
        assert_eq!(select(&["93306", "93320"]).code_list(), vec!["93306", "93320"]);
        assert_eq!(select(&["93306", "93320", "93320"]).code_list(), vec!["93306"]);
    }

    #[test]
    fn compatibility_rules() {
        let tables = builtin_tables();
        assert!(!check_billing_compatibility(tables, "00000", "99232").can_bill);
        assert!(check_billing_compatibility(tables, "99291", "99238").can_bill);
        assert!(check_billing_compatibility(tables, "99292", "99291").can_bill);
        assert!(!can_add_code(tables, "99292", &select(&["99238"])));
        assert!(!check_billing_compatibility(tables, "99356", "99291").can_bill);
        assert!(check_billing_compatibility(tables, "99356", "99238").can_bill);
        let unknown = check_billing_compatibility(tables, "93306", "99232");
        assert!(!unknown.can_bill);
        assert_eq!(unknown.reason.as_deref(), Some("Unknown code category"));
    }

    #[test]
    fn available_add_ons_follow_selection() {
        let tables = builtin_tables();
        assert!(available_add_ons(tables, &ChargeSelection::default()).is_empty());
        let sel = select(&["99291"]);
        assert_eq!(available_add_ons(tables, &sel), vec!["99292".to_owned()]);
    }

    #[test]
    fn diagnosis_cap_is_enforced() {
        let sel = ChargeSelection::default();
        let sel = toggle_diagnosis(&sel, "i25.10", 2);
        let sel = toggle_diagnosis(&sel, "I50.9", 2);
        let capped = toggle_diagnosis(&sel, "R07.9", 2);
        assert_eq!(capped, sel);
        let removed = toggle_diagnosis(&sel, "I25.10", 2);
        assert_eq!(removed.diagnoses(), &["I50.9".to_owned()]);
    }
}
