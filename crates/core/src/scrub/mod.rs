//! Pre-billing scrub: evaluates a batch of stored charges and gates submission.
//!
//! Responsibilities:
//! - Evaluate every charge independently through the rule pipeline.
//! - Add findings that only appear when charges are compared: same patient and date, or the
//!   same patient across dates.
//! - Summarise the batch and decide whether it may be submitted.
//!
//! Notes:
//! - Per-charge evaluation is pure; with the `parallel` feature it runs on rayon's pool. The
//!   cross-charge passes run afterwards and are sequential.

mod cross_charge;

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use chrono::{DateTime, NaiveDate, Utc};
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use rule_tables::RuleTables;
use serde::{Deserialize, Serialize};

use crate::config::CoreConfig;
use crate::modifiers::{parse_billed_code, split_combined, BilledCode};
use crate::pipeline::{self, ChargeContext, Proposal};
use crate::result::{ValidationResult, ValidationStatus};
use crate::selection::{ChargeSelection, SelectedCode};
use crate::{BillingError, BillingResult};

// ============================================================================
// Inputs and outputs
// ============================================================================

/// A charge as persisted: one code string, possibly combined (`93458 + 92928-LD`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCharge {
    pub id: String,
    pub patient_id: String,
    pub charge_date: NaiveDate,
    pub cpt_code: String,
    #[serde(default)]
    pub diagnoses: Vec<String>,
    #[serde(default)]
    pub time_minutes: Option<u32>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub prior_auth_documented: bool,
}

/// Admission facts for one patient.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientContext {
    #[serde(default)]
    pub admit_date: Option<NaiveDate>,
    #[serde(default)]
    pub discharge_date: Option<NaiveDate>,
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
}

/// A scrub batch as read from a file: charges plus optional per-patient context.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrubBatch {
    pub charges: Vec<StoredCharge>,
    #[serde(default)]
    pub patients: HashMap<String, PatientContext>,
}

impl ScrubBatch {
    /// Reads a batch from JSON, or YAML when the extension is `.yaml`/`.yml`.
    pub fn load(path: &Path) -> BillingResult<Self> {
        let text = std::fs::read_to_string(path).map_err(BillingError::FileRead)?;
        let is_yaml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("yaml") || e.eq_ignore_ascii_case("yml"));
        if is_yaml {
            serde_yaml::from_str(&text).map_err(BillingError::YamlDeserialization)
        } else {
            serde_json::from_str(&text).map_err(BillingError::Deserialization)
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrubSummary {
    pub total: usize,
    pub clean: usize,
    pub warnings_only: usize,
    pub with_errors: usize,
    /// Required and recommended suggestions; optional hints are left out.
    pub total_suggestions: usize,
    /// No charge carries an error.
    pub may_submit: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScrubReport {
    /// Findings keyed by charge id.
    pub results: BTreeMap<String, ValidationResult>,
    pub summary: ScrubSummary,
}

// ============================================================================
// Charge view
// ============================================================================

/// A stored charge with its code string taken apart once.
pub(crate) struct ChargeView<'a> {
    pub charge: &'a StoredCharge,
    pub entries: Vec<BilledCode>,
    /// Base codes in first-seen order.
    pub codes: Vec<String>,
}

impl<'a> ChargeView<'a> {
    fn new(tables: &RuleTables, charge: &'a StoredCharge) -> Self {
        let entries: Vec<BilledCode> = split_combined(&charge.cpt_code)
            .into_iter()
            .map(|part| parse_billed_code(tables, part))
            .filter(|billed| !billed.code.is_empty())
            .collect();
        let mut codes: Vec<String> = Vec::new();
        for entry in &entries {
            if !codes.contains(&entry.code) {
                codes.push(entry.code.clone());
            }
        }
        Self {
            charge,
            entries,
            codes,
        }
    }

    pub fn has(&self, code: &str) -> bool {
        self.codes.iter().any(|c| c == code)
    }

    pub fn has_any(&self, pred: impl Fn(&str) -> bool) -> bool {
        self.codes.iter().any(|c| pred(c))
    }

    pub fn matching(&self, pred: impl Fn(&str) -> bool) -> Vec<&str> {
        self.codes.iter().map(String::as_str).filter(|c| pred(c)).collect()
    }

    pub fn modifiers_on(&self, code: &str) -> Vec<&str> {
        self.entries
            .iter()
            .filter(|e| e.code == code)
            .flat_map(|e| e.modifiers.iter().map(String::as_str))
            .collect()
    }

    fn selection(&self) -> ChargeSelection {
        ChargeSelection::from_codes(
            split_combined(&self.charge.cpt_code)
                .into_iter()
                .map(SelectedCode::new)
                .collect(),
        )
        .with_diagnoses(self.charge.diagnoses.clone())
        .with_time_minutes(self.charge.time_minutes)
    }

    fn context(&self, patient: Option<&PatientContext>) -> ChargeContext {
        ChargeContext {
            charge_date: Some(self.charge.charge_date),
            created_at: self.charge.created_at,
            admit_date: patient.and_then(|p| p.admit_date),
            discharge_date: patient.and_then(|p| p.discharge_date),
            date_of_birth: patient.and_then(|p| p.date_of_birth),
            prior_auth_documented: self.charge.prior_auth_documented,
        }
    }
}

/// Records a cross-charge proposal on one charge's result. A required modifier that cannot be
/// applied is reported as an error, as within a charge.
pub(crate) fn suggest_on(
    tables: &RuleTables,
    view: &ChargeView<'_>,
    result: &mut ValidationResult,
    proposal: Proposal,
) {
    let code = proposal.code().to_owned();
    let existing = view.modifiers_on(&code);
    let suggestion = proposal.resolve(tables, &existing);
    if let Some(message) = pipeline::unresolved_required(&suggestion, &existing) {
        result.errors.push(message);
    }
    result.suggestions.push(suggestion);
}

// ============================================================================
// Orchestration
// ============================================================================

/// Scrubs `charges` without patient context.
pub fn scrub(tables: &RuleTables, config: &CoreConfig, charges: &[StoredCharge]) -> ScrubReport {
    scrub_with_context(tables, config, charges, &HashMap::new())
}

/// Scrubs `charges`, using `patients` (keyed by patient id) for admission-aware checks.
pub fn scrub_with_context(
    tables: &RuleTables,
    config: &CoreConfig,
    charges: &[StoredCharge],
    patients: &HashMap<String, PatientContext>,
) -> ScrubReport {
    let views: Vec<ChargeView<'_>> = charges.iter().map(|c| ChargeView::new(tables, c)).collect();

    let evaluate_one = |view: &ChargeView<'_>| {
        let selection = view.selection();
        let context = view.context(patients.get(&view.charge.patient_id));
        pipeline::evaluate(tables, config, &selection, &context)
    };

    #[cfg(feature = "parallel")]
    let mut results: Vec<ValidationResult> = views.par_iter().map(evaluate_one).collect();
    #[cfg(not(feature = "parallel"))]
    let mut results: Vec<ValidationResult> = views.iter().map(evaluate_one).collect();

    cross_charge::apply(tables, config, &views, patients, &mut results);

    for (view, result) in views.iter().zip(results.iter_mut()) {
        result.billed_codes = pipeline::billed_codes(&view.entries, &result.suggestions);
    }

    let summary = summarize(&results);
    tracing::info!(
        "scrubbed {} charge(s): {} clean, {} with warnings, {} with errors, {} suggestion(s), may_submit={}",
        summary.total,
        summary.clean,
        summary.warnings_only,
        summary.with_errors,
        summary.total_suggestions,
        summary.may_submit
    );

    let results = views
        .iter()
        .zip(results)
        .map(|(view, result)| (view.charge.id.clone(), result))
        .collect();

    ScrubReport { results, summary }
}

fn summarize(results: &[ValidationResult]) -> ScrubSummary {
    let mut summary = ScrubSummary {
        total: results.len(),
        ..Default::default()
    };
    for result in results {
        match result.status() {
            ValidationStatus::Clean => summary.clean += 1,
            ValidationStatus::Warnings => summary.warnings_only += 1,
            ValidationStatus::Errors => summary.with_errors += 1,
        }
        summary.total_suggestions += result.actionable_suggestions().count();
    }
    summary.may_submit = summary.with_errors == 0;
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use rule_tables::builtin_tables;
    use std::io::Write;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    pub(super) fn charge(id: &str, patient: &str, day: &str, cpt: &str) -> StoredCharge {
        StoredCharge {
            id: id.into(),
            patient_id: patient.into(),
            charge_date: date(day),
            cpt_code: cpt.into(),
            diagnoses: vec!["I25.10".into()],
            time_minutes: None,
            created_at: None,
            prior_auth_documented: false,
        }
    }

    #[test]
    fn empty_batch_may_submit() {
        let report = scrub(builtin_tables(), &CoreConfig::default(), &[]);
        assert_eq!(report.summary.total, 0);
        assert!(report.summary.may_submit);
    }

    #[test]
    fn summary_counts_each_status() {
        let charges = vec![
            charge("clean", "p1", "2026-03-01", "93000"),
            charge("error", "p2", "2026-03-01", "92928"),
            charge("warn", "p3", "2026-03-01", "93454 + 93458"),
        ];
        let mut charges = charges;
        charges[1].diagnoses = vec!["E11.9".into()];

        let report = scrub(builtin_tables(), &CoreConfig::default(), &charges);
        assert_eq!(report.summary.total, 3);
        assert_eq!(report.results["clean"].status(), ValidationStatus::Clean);
        assert_eq!(report.results["error"].status(), ValidationStatus::Errors);
        assert!(report.summary.with_errors >= 1);
        assert!(!report.summary.may_submit);
    }

    #[test]
    fn optional_hints_are_not_counted_as_suggestions() {
        let charges = vec![charge("echo", "p1", "2026-03-01", "93306")];
        let report = scrub(builtin_tables(), &CoreConfig::default(), &charges);
        assert!(report.results["echo"]
            .suggestions
            .iter()
            .any(|s| s.rule_id == "prof-tech-split-26"));
        assert_eq!(report.summary.total_suggestions, 0);

        let charges = vec![charge("both", "p1", "2026-03-01", "99232 + 93306")];
        let report = scrub(builtin_tables(), &CoreConfig::default(), &charges);
        let result = &report.results["both"];
        assert!(result.suggestions.len() > result.actionable_suggestions().count());
        assert_eq!(report.summary.total_suggestions, result.actionable_suggestions().count());
        assert!(report.summary.total_suggestions >= 1);
    }

    #[test]
    fn combined_codes_are_split() {
        let charges = vec![charge("c1", "p1", "2026-03-01", "93458 + 92928-LD")];
        let report = scrub(builtin_tables(), &CoreConfig::default(), &charges);
        let result = &report.results["c1"];
        assert!(result.suggestions.iter().any(|s| s.rule_id == "diag-cath-pci-59"));
        assert_eq!(result.billed_codes, vec!["93458-59".to_owned(), "92928-LD".to_owned()]);
    }

    #[test]
    fn batch_loads_from_yaml_and_json() {
        let yaml = "charges:\n  - id: c1\n    patient_id: p1\n    charge_date: 2026-03-01\n    cpt_code: \"99232\"\n    diagnoses: [I50.9]\npatients:\n  p1:\n    discharge_date: 2026-03-04\n";
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();
        let batch = ScrubBatch::load(file.path()).unwrap();
        assert_eq!(batch.charges.len(), 1);
        assert_eq!(batch.patients["p1"].discharge_date, Some(date("2026-03-04")));

        let json = serde_json::to_string(&batch).unwrap();
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        assert_eq!(ScrubBatch::load(file.path()).unwrap(), batch);
    }

    #[test]
    fn unreadable_batch_is_an_error() {
        let err = ScrubBatch::load(Path::new("/nonexistent/charges.json")).expect_err("missing file");
        assert!(matches!(err, BillingError::FileRead(_)));
    }
}
