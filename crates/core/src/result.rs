//! Validation output types.

use serde::{Deserialize, Serialize};

/// How strongly the engine recommends a suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    /// Must be resolved before the charge is clean.
    Required,
    Recommended,
    /// Informational hint (component and laterality reminders).
    Optional,
}

/// A modifier (or code change) suggested for one code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifierSuggestion {
    pub code: String,
    /// Dashed modifier id. `None` for code-change suggestions such as E/M level optimisation.
    pub modifier: Option<String>,
    pub confidence: Confidence,
    pub reason: String,
    /// The modifier has already been folded into the billed representation.
    pub auto_applied: bool,
    pub rule_id: String,
    /// What must be documented to support the modifier at audit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,
    /// Replacement code proposed by a code-change suggestion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggested_code: Option<String>,
}

/// Overall status of a [`ValidationResult`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationStatus {
    Clean,
    Warnings,
    Errors,
}

/// Findings for one charge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub suggestions: Vec<ModifierSuggestion>,
    /// Each code's billed representation with auto-applied modifiers folded in.
    pub billed_codes: Vec<String>,
}

impl ValidationResult {
    /// Errors block submission. Warnings and unresolved required suggestions do not, but keep
    /// the charge from being clean.
    pub fn status(&self) -> ValidationStatus {
        if !self.errors.is_empty() {
            return ValidationStatus::Errors;
        }
        let unresolved_required = self
            .suggestions
            .iter()
            .any(|s| s.confidence == Confidence::Required && !s.auto_applied);
        if !self.warnings.is_empty() || unresolved_required {
            return ValidationStatus::Warnings;
        }
        ValidationStatus::Clean
    }

    /// Suggestions worth surfacing: everything except `Optional` hints.
    pub fn actionable_suggestions(&self) -> impl Iterator<Item = &ModifierSuggestion> {
        self.suggestions
            .iter()
            .filter(|s| s.confidence != Confidence::Optional)
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn suggestion(confidence: Confidence, auto_applied: bool) -> ModifierSuggestion {
        ModifierSuggestion {
            code: "99232".into(),
            modifier: Some("-25".into()),
            confidence,
            reason: "r".into(),
            auto_applied,
            rule_id: "test".into(),
            documentation: None,
            suggested_code: None,
        }
    }

    #[test]
    fn empty_result_is_clean() {
        assert_eq!(ValidationResult::default().status(), ValidationStatus::Clean);
    }

    #[test]
    fn any_error_wins() {
        let result = ValidationResult {
            errors: vec!["e".into()],
            warnings: vec!["w".into()],
            ..Default::default()
        };
        assert_eq!(result.status(), ValidationStatus::Errors);
    }

    #[test]
    fn unresolved_required_suggestion_is_a_warning() {
        let mut result = ValidationResult {
            suggestions: vec![suggestion(Confidence::Required, true)],
            ..Default::default()
        };
        assert_eq!(result.status(), ValidationStatus::Clean);

        result.suggestions.push(suggestion(Confidence::Required, false));
        assert_eq!(result.status(), ValidationStatus::Warnings);
    }

    #[test]
    fn actionable_drops_optional() {
        let result = ValidationResult {
            suggestions: vec![
                suggestion(Confidence::Optional, false),
                suggestion(Confidence::Recommended, false),
            ],
            ..Default::default()
        };
        let actionable: Vec<_> = result.actionable_suggestions().collect();
        assert_eq!(actionable.len(), 1);
        assert_eq!(actionable[0].confidence, Confidence::Recommended);
    }

    #[test]
    fn serialises_without_empty_optionals() {
        let json = serde_json::to_string(&suggestion(Confidence::Required, true)).unwrap();
        assert!(json.contains("\"confidence\":\"required\""));
        assert!(!json.contains("suggested_code"));
    }
}
