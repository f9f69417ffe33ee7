//! Modifier suggestion pipeline.
//!
//! Responsibilities:
//! - Hold the ordered list of rule modules and run them over one charge.
//! - Resolve whether a suggested modifier is auto-applied, using the modifier table.
//! - Fold auto-applied modifiers into each code's billed representation.
//!
//! Notes:
//! - Module order is data: [`modules`] returns the list in evaluation order and nothing else
//!   decides it. Later modules may read what earlier ones recorded, never the reverse.
//! - Modules never fail. A missing table entry degrades to "no finding".

mod code_rules;
mod context_rules;

use std::collections::HashSet;

use chrono::{DateTime, NaiveDate, Utc};
use rule_tables::RuleTables;
use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::modifiers::{parse_billed_code, BilledCode};
use crate::result::{Confidence, ModifierSuggestion, ValidationResult};
use crate::selection::ChargeSelection;

// ============================================================================
// Inputs
// ============================================================================

/// Encounter facts the context checks need. Every field is optional; a check whose facts are
/// missing is skipped.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChargeContext {
    /// Date of service.
    #[serde(default)]
    pub charge_date: Option<NaiveDate>,
    /// When the charge was entered.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub admit_date: Option<NaiveDate>,
    #[serde(default)]
    pub discharge_date: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    /// Prior authorisation is on file for this charge.
    #[serde(default)]
    pub prior_auth_documented: bool,
}

/// Everything a rule module may look at, prepared once per evaluation.
pub struct EvalInput<'a> {
    pub tables: &'a RuleTables,
    pub config: &'a CoreConfig,
    pub context: &'a ChargeContext,
    /// Billed codes in selection order, modifiers merged from the selection.
    pub entries: Vec<BilledCode>,
    /// Base codes in selection order, duplicates kept.
    pub codes: Vec<String>,
    /// Base codes in first-seen order without duplicates.
    pub unique: Vec<String>,
    present: HashSet<String>,
    pub diagnoses: Vec<String>,
    pub time_minutes: Option<u32>,
}

impl<'a> EvalInput<'a> {
    pub fn new(
        tables: &'a RuleTables,
        config: &'a CoreConfig,
        selection: &ChargeSelection,
        context: &'a ChargeContext,
    ) -> Self {
        let entries: Vec<BilledCode> = selection
            .codes()
            .iter()
            .map(|selected| {
                let mut billed = parse_billed_code(tables, &selected.code);
                for modifier in &selected.modifiers {
                    let modifier = rule_tables::normalize_modifier_id(modifier);
                    if !billed.modifiers.contains(&modifier) {
                        billed.modifiers.push(modifier);
                    }
                }
                billed
            })
            .filter(|billed| !billed.code.is_empty())
            .collect();

        let codes: Vec<String> = entries.iter().map(|e| e.code.clone()).collect();
        let mut present = HashSet::new();
        let unique = codes
            .iter()
            .filter(|code| present.insert((*code).clone()))
            .cloned()
            .collect();

        Self {
            tables,
            config,
            context,
            entries,
            codes,
            unique,
            present,
            diagnoses: selection.diagnoses().to_vec(),
            time_minutes: selection.time_minutes(),
        }
    }

    pub fn has(&self, code: &str) -> bool {
        self.present.contains(code)
    }

    pub fn has_any(&self, pred: impl Fn(&str) -> bool) -> bool {
        self.unique.iter().any(|c| pred(c))
    }

    /// Codes matching `pred`, duplicates kept.
    pub fn matching(&self, pred: impl Fn(&str) -> bool) -> Vec<&str> {
        self.codes.iter().map(String::as_str).filter(|c| pred(c)).collect()
    }

    /// Codes matching `pred`, each once.
    pub fn matching_unique(&self, pred: impl Fn(&str) -> bool) -> Vec<&str> {
        self.unique.iter().map(String::as_str).filter(|c| pred(c)).collect()
    }

    /// Modifiers already on any occurrence of `code`.
    pub fn modifiers_on(&self, code: &str) -> impl Iterator<Item = &str> + '_ {
        let code = code.to_owned();
        self.entries
            .iter()
            .filter(move |e| e.code == code)
            .flat_map(|e| e.modifiers.iter().map(String::as_str))
    }

    /// A date of service is known.
    pub fn has_charge_date(&self) -> bool {
        self.context.charge_date.is_some()
    }
}

// ============================================================================
// Findings
// ============================================================================

/// A suggestion as a module proposes it, before the modifier table has a say.
pub struct Proposal {
    code: String,
    modifier: Option<String>,
    confidence: Confidence,
    auto: bool,
    rule_id: String,
    reason: String,
    suggested_code: Option<String>,
}

impl Proposal {
    pub fn modifier(
        code: &str,
        modifier: &str,
        confidence: Confidence,
        rule_id: impl Into<String>,
        reason: String,
    ) -> Self {
        Self {
            code: code.to_owned(),
            modifier: Some(rule_tables::normalize_modifier_id(modifier)),
            confidence,
            auto: false,
            rule_id: rule_id.into(),
            reason,
            suggested_code: None,
        }
    }

    /// Replace `code` with `suggested`; no modifier involved.
    pub fn code_change(code: &str, suggested: &str, rule_id: &str, reason: String) -> Self {
        Self {
            code: code.to_owned(),
            modifier: None,
            confidence: Confidence::Recommended,
            auto: false,
            rule_id: rule_id.to_owned(),
            reason,
            suggested_code: Some(suggested.to_owned()),
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Ask for the modifier to be folded in when its definition allows it.
    pub fn auto_apply(mut self) -> Self {
        self.auto = true;
        self
    }

    /// Turns the proposal into a suggestion. Auto-application needs the module's request,
    /// `auto_apply` on the modifier definition, and no incompatible modifier in `existing`.
    pub fn resolve(self, tables: &RuleTables, existing: &[&str]) -> ModifierSuggestion {
        let mut auto_applied = false;
        let mut documentation = None;

        if let Some(modifier) = self.modifier.as_deref() {
            match tables.modifier(modifier) {
                Some(definition) => {
                    documentation = definition.documentation.clone();
                    auto_applied = self.auto
                        && definition.auto_apply
                        && existing
                            .iter()
                            .all(|present| tables.modifiers_compatible(present, modifier));
                }
                None => {
                    tracing::warn!(
                        "suggestion {} names undefined modifier {}; not auto-applied",
                        self.rule_id,
                        modifier
                    );
                }
            }
        }

        ModifierSuggestion {
            code: self.code,
            modifier: self.modifier,
            confidence: self.confidence,
            reason: self.reason,
            auto_applied,
            rule_id: self.rule_id,
            documentation,
            suggested_code: self.suggested_code,
        }
    }
}

/// Accumulates module output for one charge.
#[derive(Debug, Default)]
pub struct Findings {
    result: ValidationResult,
}

impl Findings {
    pub fn error(&mut self, message: impl Into<String>) {
        self.result.errors.push(message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.result.warnings.push(message.into());
    }

    pub fn has_suggestion(&self, code: &str, modifier: &str) -> bool {
        self.result
            .suggestions
            .iter()
            .any(|s| s.code == code && s.modifier.as_deref() == Some(modifier))
    }

    pub fn suggestions(&self) -> &[ModifierSuggestion] {
        &self.result.suggestions
    }

    /// Records a proposal, resolved against the modifiers already on its code.
    pub fn suggest(&mut self, input: &EvalInput<'_>, proposal: Proposal) {
        let existing: Vec<&str> = input.modifiers_on(&proposal.code).collect();
        let suggestion = proposal.resolve(input.tables, &existing);
        self.result.suggestions.push(suggestion);
    }

    fn counts(&self) -> (usize, usize, usize) {
        (
            self.result.errors.len(),
            self.result.warnings.len(),
            self.result.suggestions.len(),
        )
    }
}

// ============================================================================
// Module registry
// ============================================================================

/// One named rule module: an applicability predicate and an evaluation function.
pub struct RuleModule {
    pub name: &'static str,
    pub applies: fn(&EvalInput<'_>) -> bool,
    pub evaluate: fn(&EvalInput<'_>, &mut Findings),
}

fn always(_: &EvalInput<'_>) -> bool {
    true
}

fn several_codes(input: &EvalInput<'_>) -> bool {
    input.codes.len() > 1
}

fn has_time(input: &EvalInput<'_>) -> bool {
    input.time_minutes.is_some_and(|t| t > 0)
}

fn has_discharge_date(input: &EvalInput<'_>) -> bool {
    input.has_charge_date() && input.context.discharge_date.is_some()
}

fn has_entry_time(input: &EvalInput<'_>) -> bool {
    input.has_charge_date() && input.context.created_at.is_some()
}

fn has_birth_date(input: &EvalInput<'_>) -> bool {
    input.has_charge_date() && input.context.date_of_birth.is_some()
}

fn has_diagnoses(input: &EvalInput<'_>) -> bool {
    !input.diagnoses.is_empty()
}

static MODULES: &[RuleModule] = &[
    RuleModule {
        name: "modifier-conflicts",
        applies: always,
        evaluate: code_rules::modifier_conflicts,
    },
    RuleModule {
        name: "duplicate-codes",
        applies: several_codes,
        evaluate: code_rules::duplicate_codes,
    },
    RuleModule {
        name: "bundling-edits",
        applies: several_codes,
        evaluate: code_rules::bundling_edits,
    },
    RuleModule {
        name: "em-with-procedure",
        applies: several_codes,
        evaluate: code_rules::em_with_procedure,
    },
    RuleModule {
        name: "critical-care-with-em",
        applies: several_codes,
        evaluate: code_rules::critical_care_with_em,
    },
    RuleModule {
        name: "prof-tech-split",
        applies: always,
        evaluate: code_rules::prof_tech_split,
    },
    RuleModule {
        name: "laterality",
        applies: always,
        evaluate: code_rules::laterality,
    },
    RuleModule {
        name: "diag-cath-with-pci",
        applies: several_codes,
        evaluate: code_rules::diag_cath_with_pci,
    },
    RuleModule {
        name: "add-on-orphans",
        applies: always,
        evaluate: code_rules::add_on_orphans,
    },
    RuleModule {
        name: "echo-exclusion",
        applies: several_codes,
        evaluate: code_rules::echo_exclusion,
    },
    RuleModule {
        name: "critical-care-bundling",
        applies: several_codes,
        evaluate: code_rules::critical_care_bundling,
    },
    RuleModule {
        name: "sedation-bundling",
        applies: several_codes,
        evaluate: code_rules::sedation_bundling,
    },
    RuleModule {
        name: "catheter-hierarchy",
        applies: several_codes,
        evaluate: code_rules::catheter_hierarchy,
    },
    RuleModule {
        name: "si-pairing",
        applies: always,
        evaluate: code_rules::si_pairing,
    },
    RuleModule {
        name: "peripheral-territory",
        applies: always,
        evaluate: code_rules::peripheral_territory,
    },
    RuleModule {
        name: "multiple-procedures",
        applies: several_codes,
        evaluate: code_rules::multiple_procedures,
    },
    RuleModule {
        name: "discharge-with-procedure",
        applies: several_codes,
        evaluate: code_rules::discharge_with_procedure,
    },
    RuleModule {
        name: "pericardiocentesis-with-cath",
        applies: several_codes,
        evaluate: code_rules::pericardiocentesis_with_cath,
    },
    RuleModule {
        name: "category-iii",
        applies: always,
        evaluate: code_rules::category_iii,
    },
    RuleModule {
        name: "diag-cath-hierarchy",
        applies: several_codes,
        evaluate: code_rules::diag_cath_hierarchy,
    },
    RuleModule {
        name: "ep-study-with-ablation",
        applies: several_codes,
        evaluate: code_rules::ep_study_with_ablation,
    },
    RuleModule {
        name: "device-implant-consistency",
        applies: several_codes,
        evaluate: code_rules::device_implant_consistency,
    },
    RuleModule {
        name: "cardioversion-bundling",
        applies: several_codes,
        evaluate: code_rules::cardioversion_bundling,
    },
    RuleModule {
        name: "structural-tee",
        applies: always,
        evaluate: code_rules::structural_tee,
    },
    RuleModule {
        name: "imaging-without-pci",
        applies: always,
        evaluate: code_rules::imaging_without_pci,
    },
    RuleModule {
        name: "missing-diagnosis",
        applies: always,
        evaluate: context_rules::missing_diagnosis,
    },
    RuleModule {
        name: "diagnosis-support",
        applies: has_diagnoses,
        evaluate: context_rules::diagnosis_support,
    },
    RuleModule {
        name: "time-documentation",
        applies: always,
        evaluate: context_rules::time_documentation,
    },
    RuleModule {
        name: "discharge-date",
        applies: has_discharge_date,
        evaluate: context_rules::discharge_date,
    },
    RuleModule {
        name: "charge-lag",
        applies: has_entry_time,
        evaluate: context_rules::charge_lag,
    },
    RuleModule {
        name: "time-sanity",
        applies: has_time,
        evaluate: context_rules::time_sanity,
    },
    RuleModule {
        name: "prior-authorization",
        applies: always,
        evaluate: context_rules::prior_authorization,
    },
    RuleModule {
        name: "age-restrictions",
        applies: has_birth_date,
        evaluate: context_rules::age_restrictions,
    },
    RuleModule {
        name: "coverage-determinations",
        applies: always,
        evaluate: context_rules::coverage_determinations,
    },
    RuleModule {
        name: "retired-codes",
        applies: always,
        evaluate: context_rules::retired_codes,
    },
    RuleModule {
        name: "em-level",
        applies: has_time,
        evaluate: context_rules::em_level,
    },
    RuleModule {
        name: "unresolved-required-modifiers",
        applies: always,
        evaluate: unresolved_required_modifiers,
    },
];

/// Rule modules in evaluation order.
pub fn modules() -> &'static [RuleModule] {
    MODULES
}

/// A required suggestion that nothing resolved: not auto-applied and not already billed.
fn unresolved_required_modifiers(input: &EvalInput<'_>, findings: &mut Findings) {
    let unresolved: Vec<String> = findings
        .suggestions()
        .iter()
        .filter_map(|s| {
            let existing: Vec<&str> = input.modifiers_on(&s.code).collect();
            unresolved_required(s, &existing)
        })
        .collect();

    for message in unresolved {
        findings.error(message);
    }
}

/// Error text for a required modifier that was neither auto-applied nor already billed.
pub(crate) fn unresolved_required(
    suggestion: &ModifierSuggestion,
    existing: &[&str],
) -> Option<String> {
    if suggestion.confidence != Confidence::Required || suggestion.auto_applied {
        return None;
    }
    let modifier = suggestion.modifier.as_deref()?;
    if existing.contains(&modifier) {
        return None;
    }
    Some(format!(
        "Required modifier {modifier} on {} has not been applied and cannot be added automatically. {}",
        suggestion.code, suggestion.reason
    ))
}

// ============================================================================
// Evaluation
// ============================================================================

/// Runs every applicable module over one charge, in order.
pub fn evaluate(
    tables: &RuleTables,
    config: &CoreConfig,
    selection: &ChargeSelection,
    context: &ChargeContext,
) -> ValidationResult {
    let input = EvalInput::new(tables, config, selection, context);
    if input.codes.is_empty() {
        return ValidationResult::default();
    }

    let mut findings = Findings::default();
    for module in modules() {
        if !(module.applies)(&input) {
            continue;
        }
        let before = findings.counts();
        (module.evaluate)(&input, &mut findings);
        let after = findings.counts();
        if after != before {
            tracing::debug!(
                "rule module {} added {} error(s), {} warning(s), {} suggestion(s)",
                module.name,
                after.0 - before.0,
                after.1 - before.1,
                after.2 - before.2
            );
        }
    }

    let mut result = findings.result;
    result.billed_codes = billed_codes(&input.entries, &result.suggestions);
    result
}

/// Each entry rendered with the auto-applied modifiers for its code appended.
pub fn billed_codes(entries: &[BilledCode], suggestions: &[ModifierSuggestion]) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let mut billed = entry.clone();
            let applied = suggestions
                .iter()
                .filter(|s| s.auto_applied && s.code == entry.code);
            for suggestion in applied {
                if let Some(modifier) = &suggestion.modifier {
                    if !billed.modifiers.contains(modifier) {
                        billed.modifiers.push(modifier.clone());
                    }
                }
            }
            billed.render()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::ValidationStatus;
    use crate::selection::SelectedCode;
    use rule_tables::builtin_tables;

    fn selection(codes: &[&str]) -> ChargeSelection {
        ChargeSelection::from_codes(codes.iter().map(|c| SelectedCode::new(*c)).collect())
    }

    fn run(sel: &ChargeSelection) -> ValidationResult {
        evaluate(builtin_tables(), &CoreConfig::default(), sel, &ChargeContext::default())
    }

    #[test]
    fn module_order_is_fixed() {
        let names: Vec<_> = modules().iter().map(|m| m.name).collect();
        assert_eq!(names.len(), 37);
        assert_eq!(names[0], "modifier-conflicts");
        assert_eq!(names[2], "bundling-edits");
        assert_eq!(names[25], "missing-diagnosis");
        assert_eq!(names.last(), Some(&"unresolved-required-modifiers"));
    }

    #[test]
    fn empty_selection_is_clean() {
        let result = run(&ChargeSelection::default());
        assert_eq!(result.status(), ValidationStatus::Clean);
        assert!(result.billed_codes.is_empty());
    }

    #[test]
    fn em_with_procedure_auto_applies_25() {
        let sel = selection(&["99232", "93306"]).with_diagnoses(vec!["I50.9".into()]);
        let result = run(&sel);
        let s = result
            .suggestions
            .iter()
            .find(|s| s.rule_id == "em-plus-procedure-25")
            .unwrap();
        assert_eq!(s.code, "99232");
        assert!(s.auto_applied);
        assert!(s.documentation.is_some());
        assert!(result.billed_codes.contains(&"99232-25".to_owned()));
    }

    #[test]
    fn conflicting_modifier_blocks_auto_apply() {
        let sel = selection(&["99232", "93306"])
            .with_modifier("99232", "57")
            .with_diagnoses(vec!["I50.9".into()]);
        let result = run(&sel);
        let s = result
            .suggestions
            .iter()
            .find(|s| s.rule_id == "em-plus-procedure-25")
            .unwrap();
        assert!(!s.auto_applied);
        assert!(result.errors.iter().any(|e| e.starts_with("Required modifier -25 on 99232")));
        assert!(result.billed_codes.contains(&"99232-57".to_owned()));
    }

    #[test]
    fn duplicate_code_needs_76() {
        let result = run(&selection(&["93306", "93306"]));
        let s = result.suggestions.iter().find(|s| s.rule_id == "duplicate-code-76").unwrap();
        assert_eq!(s.modifier.as_deref(), Some("-76"));
        assert!(!s.auto_applied);
        assert_eq!(result.status(), ValidationStatus::Errors);

        // Already billed with -76: resolved.
        let sel = ChargeSelection::from_codes(vec![
            SelectedCode::new("93306"),
            SelectedCode::with_modifiers("93306", vec!["-76".into()]),
        ]);
        let result = run(&sel);
        assert!(!result.errors.iter().any(|e| e.starts_with("Required modifier -76")));
    }

    #[test]
    fn modifier_exception_pair_gets_59_on_bundled_code() {
        let result = run(&selection(&["92928", "92924"]).with_diagnoses(vec!["I25.10".into()]));
        let s = result
            .suggestions
            .iter()
            .find(|s| s.rule_id == "ncci-92928-92924-59")
            .unwrap();
        assert_eq!(s.code, "92924");
        assert!(s.auto_applied);
        assert!(result.billed_codes.contains(&"92924-59".to_owned()));
    }

    #[test]
    fn non_exception_pair_warns() {
        let result = run(&selection(&["93458", "93454"]));
        assert!(result
            .warnings
            .iter()
            .any(|w| w.starts_with("CCI edit:") && w.contains("no modifier exception")));
    }

    #[test]
    fn critical_care_with_em_requires_25() {
        let sel = selection(&["99233", "99291"])
            .with_time_minutes(Some(45))
            .with_diagnoses(vec!["I21.4".into()]);
        let result = run(&sel);
        let s = result
            .suggestions
            .iter()
            .find(|s| s.rule_id == "critical-care-em-25")
            .unwrap();
        assert_eq!(s.code, "99233");
        assert_eq!(s.modifier.as_deref(), Some("-25"));
    }

    #[test]
    fn vessel_tag_survives_billing() {
        let result = run(&selection(&["92928-LD"]).with_diagnoses(vec!["I25.10".into()]));
        assert_eq!(result.billed_codes, vec!["92928-LD".to_owned()]);
    }

    #[test]
    fn unknown_code_degrades_quietly() {
        let result = run(&selection(&["ZZZZZ"]));
        assert!(result.errors.is_empty());
        assert!(result.suggestions.is_empty());
    }
}
