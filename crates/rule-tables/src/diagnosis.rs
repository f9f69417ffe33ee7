//! Diagnosis-to-procedure medical necessity rule types.

use billing_types::Severity;

/// Ordered medical-necessity rule: codes it governs, and the diagnoses that justify them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagnosisRule {
    pub id: String,

    pub name: String,

    /// Which procedure codes this rule governs.
    pub applicability: Applicability,

    /// Any diagnosis starting with any of these prefixes satisfies the rule.
    pub required_prefixes: Vec<String>,

    pub severity: Severity,

    pub message: String,
}

impl DiagnosisRule {
    /// Whether this rule governs `code`.
    pub fn applies_to(&self, code: &str) -> bool {
        self.applicability.matches(code)
    }

    /// Whether any of `diagnoses` starts with any required prefix.
    pub fn is_satisfied_by<S: AsRef<str>>(&self, diagnoses: &[S]) -> bool {
        diagnoses.iter().any(|dx| {
            let dx = dx.as_ref();
            self.required_prefixes
                .iter()
                .any(|prefix| dx.starts_with(prefix.as_str()))
        })
    }
}

/// How a rule selects the codes it governs.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Applicability {
    /// An explicit list of codes.
    Codes(Vec<String>),

    /// All purely numeric codes within an inclusive range.
    NumericRange { start: u32, end: u32 },
}

impl Applicability {
    pub fn matches(&self, code: &str) -> bool {
        match self {
            Applicability::Codes(codes) => codes.iter().any(|c| c == code),
            Applicability::NumericRange { start, end } => code
                .parse::<u32>()
                .is_ok_and(|n| (*start..=*end).contains(&n)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_range_ignores_alphanumeric_codes() {
        let range = Applicability::NumericRange {
            start: 37184,
            end: 37299,
        };
        assert!(range.matches("37184"));
        assert!(range.matches("37299"));
        assert!(!range.matches("37300"));
        assert!(!range.matches("0338T"));
    }

    #[test]
    fn satisfied_by_any_prefix() {
        let rule = DiagnosisRule {
            id: "r".into(),
            name: "r".into(),
            applicability: Applicability::Codes(vec!["92928".into()]),
            required_prefixes: vec!["I25".into(), "I21".into()],
            severity: Severity::Error,
            message: "m".into(),
        };
        assert!(rule.is_satisfied_by(&["E11.9", "I21.4"]));
        assert!(!rule.is_satisfied_by(&["E11.9"]));
        assert!(!rule.is_satisfied_by::<&str>(&[]));
    }
}
