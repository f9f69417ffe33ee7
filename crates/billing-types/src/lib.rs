//! Validated primitives shared across the billing workspace.
//!
//! Codes arrive from user input, stored charge files, and rule-table files. Wrapping them in
//! small newtypes means every crate can rely on a normalised form (trimmed, uppercase) once a
//! value has been constructed.

use std::borrow::Borrow;
use std::fmt;

/// Errors that can occur when creating validated code types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CodeError {
    /// The input text was empty or contained only whitespace
    #[error("Code cannot be empty")]
    Empty,

    /// The input contained characters outside the allowed alphabet
    #[error("Code contains invalid characters: {0}")]
    InvalidCharacters(String),

    /// The input had the wrong length for its code system
    #[error("Code has invalid length: {0}")]
    InvalidLength(String),
}

/// A procedure billing code (CPT/HCPCS style).
///
/// Procedure codes are exactly five ASCII alphanumeric characters, for example `99232`,
/// `0913T` or the internal no-charge code `00000`. Input is trimmed and uppercased.
///
/// Modifiers are *not* part of a `CptCode`; see `billing_core::modifiers` for parsing billed
/// representations such as `99232-25`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CptCode(String);

impl CptCode {
    /// Creates a new `CptCode` from the given input.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(CptCode)` holding the trimmed, uppercased code.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError`] if:
    /// - the trimmed input is empty,
    /// - it is not exactly five characters long,
    /// - it contains anything other than ASCII letters and digits.
    pub fn new(input: impl AsRef<str>) -> Result<Self, CodeError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CodeError::Empty);
        }
        if !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(CodeError::InvalidCharacters(trimmed.to_owned()));
        }
        if trimmed.len() != 5 {
            return Err(CodeError::InvalidLength(trimmed.to_owned()));
        }
        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// An ICD-10 diagnosis code such as `I25.10` or `R07.9`.
///
/// The first character must be a letter; the remainder may contain digits, letters and a
/// single decimal point. Input is trimmed and uppercased so prefix matching is reliable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Icd10Code(String);

impl Icd10Code {
    /// Creates a new `Icd10Code` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`CodeError`] if the input is empty, shorter than three or longer than eight
    /// characters, does not start with a letter, or contains characters other than letters,
    /// digits and `.`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, CodeError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(CodeError::Empty);
        }

        let starts_with_letter = trimmed
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_alphabetic());
        let valid_chars = trimmed
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.');
        if !starts_with_letter || !valid_chars || trimmed.matches('.').count() > 1 {
            return Err(CodeError::InvalidCharacters(trimmed.to_owned()));
        }
        if !(3..=8).contains(&trimmed.len()) {
            return Err(CodeError::InvalidLength(trimmed.to_owned()));
        }

        Ok(Self(trimmed.to_ascii_uppercase()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether this diagnosis begins with the given ICD-10 prefix (e.g. `I25`, `R94.31`).
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.0.starts_with(prefix)
    }
}

macro_rules! impl_code_traits {
    ($ty:ident) => {
        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl Borrow<str> for $ty {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl PartialEq<str> for $ty {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $ty {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::str::FromStr for $ty {
            type Err = CodeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $ty::new(s)
            }
        }

        impl serde::Serialize for $ty {
            fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
            where
                S: serde::Serializer,
            {
                serializer.serialize_str(&self.0)
            }
        }

        impl<'de> serde::Deserialize<'de> for $ty {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $ty::new(&s).map_err(serde::de::Error::custom)
            }
        }
    };
}

impl_code_traits!(CptCode);
impl_code_traits!(Icd10Code);

/// Semantic domain of a procedure code.
///
/// The set is closed: every code maps to exactly one domain and unknown codes fall into
/// [`CodeDomain::Misc`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum CodeDomain {
    /// Evaluation and management.
    Em,
    Echo,
    DiagnosticCath,
    Pci,
    /// Electrophysiology, including cardiac device implants.
    Ep,
    PeripheralDx,
    PeripheralInt,
    Structural,
    /// Mechanical circulatory support.
    Mcs,
    Misc,
}

impl CodeDomain {
    /// Stable lowercase identifier, matching the serialised form.
    pub fn as_str(self) -> &'static str {
        match self {
            CodeDomain::Em => "em",
            CodeDomain::Echo => "echo",
            CodeDomain::DiagnosticCath => "diagnostic_cath",
            CodeDomain::Pci => "pci",
            CodeDomain::Ep => "ep",
            CodeDomain::PeripheralDx => "peripheral_dx",
            CodeDomain::PeripheralInt => "peripheral_int",
            CodeDomain::Structural => "structural",
            CodeDomain::Mcs => "mcs",
            CodeDomain::Misc => "misc",
        }
    }

    /// Procedure domains are everything except E/M and misc.
    pub fn is_procedure(self) -> bool {
        !matches!(self, CodeDomain::Em | CodeDomain::Misc)
    }
}

impl fmt::Display for CodeDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Severity of a rule finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks submission until resolved.
    Error,
    /// Advisory only.
    Warning,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpt_code_is_trimmed_and_uppercased() {
        let code = CptCode::new("  0913t ").unwrap();
        assert_eq!(code.as_str(), "0913T");
        assert_eq!(code, "0913T");
    }

    #[test]
    fn cpt_code_rejects_bad_input() {
        assert_eq!(CptCode::new("   ").unwrap_err(), CodeError::Empty);
        assert!(matches!(
            CptCode::new("9928").unwrap_err(),
            CodeError::InvalidLength(_)
        ));
        assert!(matches!(
            CptCode::new("99232-25").unwrap_err(),
            CodeError::InvalidCharacters(_)
        ));
    }

    #[test]
    fn icd10_code_accepts_decimal_forms() {
        let dx = Icd10Code::new("i25.10").unwrap();
        assert_eq!(dx.as_str(), "I25.10");
        assert!(dx.has_prefix("I25"));
        assert!(!dx.has_prefix("I21"));
    }

    #[test]
    fn icd10_code_rejects_leading_digit() {
        let err = Icd10Code::new("25.10").expect_err("expected validation failure");
        assert!(matches!(err, CodeError::InvalidCharacters(_)));
    }

    #[test]
    fn codes_deserialize_through_validation() {
        let code: CptCode = serde_json::from_str("\"93458\"").unwrap();
        assert_eq!(code.as_str(), "93458");
        assert!(serde_json::from_str::<CptCode>("\"\"").is_err());
    }

    #[test]
    fn domain_serialises_as_snake_case() {
        let json = serde_json::to_string(&CodeDomain::DiagnosticCath).unwrap();
        assert_eq!(json, "\"diagnostic_cath\"");
        assert!(CodeDomain::Pci.is_procedure());
        assert!(!CodeDomain::Misc.is_procedure());
    }
}
