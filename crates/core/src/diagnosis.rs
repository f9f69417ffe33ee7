//! Diagnosis support validator.
//!
//! Checks whether the diagnoses attached to a charge justify billing a procedure code. Rules
//! are consulted in table order and the first rule governing the code decides the outcome;
//! later rules for the same code are never evaluated.

use billing_types::Severity;
use rule_tables::RuleTables;
use serde::{Deserialize, Serialize};

/// A medical-necessity finding for one code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisFinding {
    pub rule_id: String,
    pub severity: Severity,
    pub message: String,
}

/// Validates `code` against `diagnoses`.
///
/// Returns `None` when the diagnosis list is empty (necessity cannot be judged), when no rule
/// governs the code, or when the first governing rule is satisfied.
pub fn validate_diagnosis<S: AsRef<str>>(
    tables: &RuleTables,
    code: &str,
    diagnoses: &[S],
) -> Option<DiagnosisFinding> {
    if diagnoses.is_empty() {
        return None;
    }

    let normalized: Vec<String> = diagnoses
        .iter()
        .map(|dx| dx.as_ref().trim().to_ascii_uppercase())
        .collect();

    let rule = tables
        .diagnosis_rules
        .iter()
        .find(|rule| rule.applies_to(code))?;

    if rule.is_satisfied_by(&normalized) {
        return None;
    }

    Some(DiagnosisFinding {
        rule_id: rule.id.clone(),
        severity: rule.severity,
        message: rule.message.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rule_tables::{builtin_tables, Applicability, DiagnosisRule};

    fn rule(id: &str, codes: &[&str], prefixes: &[&str], severity: Severity) -> DiagnosisRule {
        DiagnosisRule {
            id: id.into(),
            name: id.into(),
            applicability: Applicability::Codes(codes.iter().map(|c| (*c).into()).collect()),
            required_prefixes: prefixes.iter().map(|p| (*p).into()).collect(),
            severity,
            message: format!("{id} failed"),
        }
    }

    #[test]
    fn empty_diagnoses_are_silent_for_every_code() {
        let tables = builtin_tables();
        let mut codes: Vec<String> = tables
            .diagnosis_rules
            .iter()
            .flat_map(|r| match &r.applicability {
                Applicability::Codes(codes) => codes.clone(),
                Applicability::NumericRange { start, end } => {
                    vec![start.to_string(), end.to_string()]
                }
            })
            .collect();
        codes.push("99232".into());
        for code in codes {
            assert_eq!(validate_diagnosis::<&str>(tables, &code, &[]), None);
        }
    }

    #[test]
    fn pci_without_cad_is_error() {
        let finding = validate_diagnosis(builtin_tables(), "92928", &["E11.9"]).unwrap();
        assert_eq!(finding.rule_id, "pci-cad-diagnosis");
        assert_eq!(finding.severity, Severity::Error);
    }

    #[test]
    fn supported_code_is_silent() {
        assert_eq!(validate_diagnosis(builtin_tables(), "92928", &["i25.10"]), None);
    }

    #[test]
    fn peripheral_range_rule_applies() {
        let finding = validate_diagnosis(builtin_tables(), "37270", &["I25.10"]).unwrap();
        assert_eq!(finding.rule_id, "peripheral-pvd-diagnosis");
        assert_eq!(finding.severity, Severity::Warning);
    }

    #[test]
    fn ungoverned_code_is_silent() {
        assert_eq!(validate_diagnosis(builtin_tables(), "93000", &["Z00.00"]), None);
    }

    #[test]
    fn first_applicable_rule_wins() {
        let mut tables = builtin_tables().clone();
        tables.diagnosis_rules = vec![
            rule("broad", &["93306"], &["I"], Severity::Warning),
            rule("specific", &["93306"], &["I35"], Severity::Error),
        ];

        // Satisfies the first rule only: the second is never consulted.
        assert_eq!(validate_diagnosis(&tables, "93306", &["I50.9"]), None);

        // Satisfies only the second rule: the first rule's finding is returned.
        tables.diagnosis_rules[0].required_prefixes = vec!["R07".into()];
        let finding = validate_diagnosis(&tables, "93306", &["I35.0"]).unwrap();
        assert_eq!(finding.rule_id, "broad");
        assert_eq!(finding.severity, Severity::Warning);
    }
}
