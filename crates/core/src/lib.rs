//! # Billing Core
//!
//! Compliance engine for cardiology charge capture.
//!
//! This crate contains the pure rule logic:
//! - Code domain classification and the charge selection state machine
//! - Bundling (CCI) edits and diagnosis medical-necessity checks
//! - The ordered modifier suggestion pipeline
//! - The pre-billing scrub over a batch of stored charges
//!
//! **No API concerns**: the CLI and the HTTP service live in `billing-cli` and the root
//! `billing-run` binary. Everything here is synchronous and side-effect free apart from reading
//! rule-table and charge files at construction time.

pub mod bundling;
pub mod code_sets;
pub mod config;
pub mod constants;
pub mod diagnosis;
pub mod domain;
pub mod error;
pub mod modifiers;
pub mod pipeline;
pub mod result;
pub mod scrub;
pub mod selection;

use std::collections::HashMap;
use std::sync::Arc;

pub use billing_types::{CodeDomain, Severity};
pub use bundling::{check_bundling, BundlingViolation};
pub use config::CoreConfig;
pub use diagnosis::{validate_diagnosis, DiagnosisFinding};
pub use domain::classify;
pub use error::{BillingError, BillingResult};
pub use modifiers::BilledCode;
pub use pipeline::ChargeContext;
pub use result::{Confidence, ModifierSuggestion, ValidationResult, ValidationStatus};
pub use rule_tables::RuleTables;
pub use scrub::{PatientContext, ScrubBatch, ScrubReport, ScrubSummary, StoredCharge};
pub use selection::{ChargeSelection, SelectedCode};

/// Rule tables plus runtime configuration, shared by every surface.
#[derive(Clone, Debug)]
pub struct ComplianceEngine {
    tables: Arc<RuleTables>,
    cfg: Arc<CoreConfig>,
}

impl ComplianceEngine {
    /// Builds an engine from `cfg`, loading the rule-table file it names or falling back to the
    /// built-in tables.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::RuleTables`] if the configured file cannot be read or fails
    /// validation.
    pub fn new(cfg: Arc<CoreConfig>) -> BillingResult<Self> {
        let tables = match cfg.rules_file() {
            Some(path) => RuleTables::load(path)?,
            None => {
                tracing::info!("using built-in rule tables");
                RuleTables::builtin()
            }
        };
        Ok(Self::with_tables(Arc::new(tables), cfg))
    }

    pub fn with_tables(tables: Arc<RuleTables>, cfg: Arc<CoreConfig>) -> Self {
        Self { tables, cfg }
    }

    pub fn tables(&self) -> &RuleTables {
        &self.tables
    }

    pub fn config(&self) -> &CoreConfig {
        &self.cfg
    }

    fn base_code(&self, billed: &str) -> String {
        modifiers::parse_billed_code(&self.tables, billed).code
    }

    /// Domain of a billed code; modifiers and vessel tags are ignored.
    pub fn classify(&self, code: &str) -> CodeDomain {
        classify(&self.base_code(code))
    }

    pub fn check_bundling<S: AsRef<str>>(&self, codes: &[S]) -> Vec<BundlingViolation> {
        let base: Vec<String> = codes.iter().map(|c| self.base_code(c.as_ref())).collect();
        check_bundling(&self.tables, &base)
    }

    pub fn validate_diagnosis<S: AsRef<str>>(
        &self,
        code: &str,
        diagnoses: &[S],
    ) -> Option<DiagnosisFinding> {
        validate_diagnosis(&self.tables, &self.base_code(code), diagnoses)
    }

    pub fn transition(&self, current: &ChargeSelection, code: &str) -> ChargeSelection {
        selection::transition(&self.tables, current, code)
    }

    /// Replays `codes` as successive transitions from an empty selection.
    pub fn replay<S: AsRef<str>>(&self, codes: &[S]) -> ChargeSelection {
        codes
            .iter()
            .fold(ChargeSelection::default(), |current, code| {
                self.transition(&current, code.as_ref())
            })
    }

    /// Toggles `diagnosis` on `current`, refusing additions past the configured cap.
    pub fn toggle_diagnosis(&self, current: &ChargeSelection, diagnosis: &str) -> ChargeSelection {
        selection::toggle_diagnosis(current, diagnosis, self.cfg.max_diagnoses())
    }

    /// Attaches each of `diagnoses` to `current`; repeats are attached once.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidInput`] if the diagnoses exceed the configured cap.
    pub fn attach_diagnoses<S: AsRef<str>>(
        &self,
        current: &ChargeSelection,
        diagnoses: &[S],
    ) -> BillingResult<ChargeSelection> {
        let mut next = current.clone();
        for dx in diagnoses {
            let dx = dx.as_ref().trim().to_ascii_uppercase();
            if dx.is_empty() || next.diagnoses().contains(&dx) {
                continue;
            }
            let toggled = self.toggle_diagnosis(&next, &dx);
            if toggled.diagnoses().len() == next.diagnoses().len() {
                return Err(BillingError::InvalidInput(format!(
                    "at most {} diagnoses may be attached to a charge",
                    self.cfg.max_diagnoses()
                )));
            }
            next = toggled;
        }
        Ok(next)
    }

    pub fn evaluate(
        &self,
        selection: &ChargeSelection,
        context: &ChargeContext,
    ) -> ValidationResult {
        pipeline::evaluate(&self.tables, &self.cfg, selection, context)
    }

    pub fn scrub(
        &self,
        charges: &[StoredCharge],
        patients: &HashMap<String, PatientContext>,
    ) -> ScrubReport {
        scrub::scrub_with_context(&self.tables, &self.cfg, charges, patients)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn engine() -> ComplianceEngine {
        ComplianceEngine::new(Arc::new(CoreConfig::default())).unwrap()
    }

    #[test]
    fn builtin_engine_classifies_billed_codes() {
        let engine = engine();
        assert_eq!(engine.classify("93306-26"), CodeDomain::Echo);
        assert_eq!(engine.classify("99232-25"), CodeDomain::Em);
        assert_eq!(engine.classify("92928-LD"), CodeDomain::Pci);
    }

    #[test]
    fn bundling_ignores_billed_modifiers() {
        let violations = engine().check_bundling(&["93458-59", "93454"]);
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].primary_code, "93458");
    }

    #[test]
    fn replay_applies_exclusivity() {
        let selection = engine().replay(&["99222", "99232", "99292"]);
        assert_eq!(selection.code_list(), vec!["99232"]);
    }

    #[test]
    fn diagnoses_past_the_cap_are_rejected() {
        let cfg = CoreConfig::new(None, 7, 30, 2, 30, 4).unwrap();
        let engine = ComplianceEngine::new(Arc::new(cfg)).unwrap();
        let selection = ChargeSelection::default();

        let attached = engine
            .attach_diagnoses(&selection, &["I25.10", "i25.10", "I50.9"])
            .unwrap();
        assert_eq!(attached.diagnoses(), &["I25.10".to_owned(), "I50.9".to_owned()]);

        let err = engine
            .attach_diagnoses(&selection, &["I25.10", "I50.9", "R07.9"])
            .expect_err("third diagnosis exceeds the cap");
        assert!(matches!(err, BillingError::InvalidInput(_)));

        let capped = engine.toggle_diagnosis(&attached, "R07.9");
        assert_eq!(capped, attached);
    }

    #[test]
    fn rules_file_replaces_builtin_tables() {
        let yaml = RuleTables::builtin().render().unwrap();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(yaml.as_bytes()).unwrap();

        let cfg = CoreConfig::new(Some(file.path().to_path_buf()), 7, 30, 24, 30, 4).unwrap();
        let engine = ComplianceEngine::new(Arc::new(cfg)).unwrap();
        assert_eq!(engine.tables().modifiers.len(), RuleTables::builtin().modifiers.len());
    }

    #[test]
    fn unreadable_rules_file_is_an_error() {
        let cfg = CoreConfig::new(Some("/nonexistent/rules.yaml".into()), 7, 30, 24, 30, 4).unwrap();
        let err = ComplianceEngine::new(Arc::new(cfg)).expect_err("missing rules file");
        assert!(matches!(err, BillingError::RuleTables(_)));
    }
}
