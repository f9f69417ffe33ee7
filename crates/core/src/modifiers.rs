//! Billed code representation: base code, modifiers and coronary vessel tags.
//!
//! Stored charges carry strings such as `99232-25`, `92928-LD` or a combined
//! `93458 + 92928-LD`. These helpers take them apart using the active modifier table, so a
//! suffix is only treated as a modifier when it is defined.

use billing_types::{CptCode, Icd10Code};
use rule_tables::{normalize_modifier_id, RuleTables};
use serde::{Deserialize, Serialize};

use crate::constants::COMBINED_CODE_SEPARATOR;
use crate::BillingResult;

/// A billed code taken apart into its pieces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BilledCode {
    /// Base code in normalised form, e.g. `92928`.
    pub code: String,
    /// Modifiers in billed order, dashed and uppercase. Unknown non-vessel suffixes are kept
    /// here as well so downstream checks can see them.
    pub modifiers: Vec<String>,
    /// Trailing alphabetic tag that is not a modifier, e.g. `LD` for the LAD.
    pub vessel: Option<String>,
}

/// Removes a trailing modifier from `code` when the suffix is a known modifier.
///
/// Only the text after the first dash is considered. `99232-25` becomes `99232`, while
/// `92928-LD` is returned unchanged because `LD` is a vessel tag rather than a modifier.
pub fn strip_modifier(tables: &RuleTables, code: &str) -> String {
    let code = code.trim();
    if let Some(dash) = code.find('-').filter(|i| *i > 0) {
        if tables.is_known_modifier(&code[dash..]) {
            return code[..dash].to_owned();
        }
    }
    code.to_owned()
}

/// Replaces any known modifier on `code` with `modifier`, normalising the dash.
pub fn apply_modifier(tables: &RuleTables, code: &str, modifier: &str) -> String {
    let base = strip_modifier(tables, code);
    format!("{base}{}", normalize_modifier_id(modifier))
}

/// Splits a billed code such as `92928-59-LD` into base code, modifiers and vessel tag.
pub fn parse_billed_code(tables: &RuleTables, billed: &str) -> BilledCode {
    let mut parts = billed.trim().split('-').map(str::trim);
    let code = parts.next().unwrap_or_default().to_ascii_uppercase();
    let suffixes: Vec<&str> = parts.filter(|p| !p.is_empty()).collect();

    let mut modifiers = Vec::new();
    let mut vessel = None;
    for (i, suffix) in suffixes.iter().enumerate() {
        let is_last = i + 1 == suffixes.len();
        if tables.is_known_modifier(suffix) {
            modifiers.push(normalize_modifier_id(suffix));
        } else if is_last && suffix.chars().all(|c| c.is_ascii_alphabetic()) {
            vessel = Some(suffix.to_ascii_uppercase());
        } else {
            modifiers.push(normalize_modifier_id(suffix));
        }
    }

    BilledCode {
        code,
        modifiers,
        vessel,
    }
}

/// Parses a billed code typed at an input boundary. The base must be a well-formed procedure
/// code; modifiers and vessel tags are taken as they come.
///
/// # Errors
///
/// Returns [`crate::BillingError::Code`] when the base code is malformed.
pub fn parse_input_code(tables: &RuleTables, billed: &str) -> BillingResult<BilledCode> {
    let parsed = parse_billed_code(tables, billed);
    CptCode::new(&parsed.code)?;
    Ok(parsed)
}

/// Normalises a diagnosis typed at an input boundary.
///
/// # Errors
///
/// Returns [`crate::BillingError::Code`] when the text is not an ICD-10 code.
pub fn parse_input_diagnosis(diagnosis: &str) -> BillingResult<String> {
    Ok(Icd10Code::new(diagnosis)?.as_str().to_owned())
}

/// Splits a stored combined code string on `" + "`. Empty parts are dropped.
pub fn split_combined(cpt: &str) -> Vec<&str> {
    cpt.split(COMBINED_CODE_SEPARATOR)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect()
}

impl BilledCode {
    /// Billed representation: base code, then modifiers, then the vessel tag.
    pub fn render(&self) -> String {
        let mut out = self.code.clone();
        for modifier in &self.modifiers {
            out.push_str(modifier);
        }
        if let Some(vessel) = &self.vessel {
            out.push('-');
            out.push_str(vessel);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BillingError;
    use rule_tables::builtin_tables;

    #[test]
    fn input_codes_are_validated() {
        let tables = builtin_tables();
        let parsed = parse_input_code(tables, " 92928-ld ").unwrap();
        assert_eq!(parsed.code, "92928");
        assert_eq!(parsed.vessel.as_deref(), Some("LD"));

        let err = parse_input_code(tables, "9292-25").expect_err("four-digit base");
        assert!(matches!(err, BillingError::Code(_)));
        assert_eq!(parse_input_diagnosis(" i25.10 ").unwrap(), "I25.10");
        assert!(parse_input_diagnosis("25.10").is_err());
    }

    #[test]
    fn strip_only_removes_known_modifiers() {
        let tables = builtin_tables();
        assert_eq!(strip_modifier(tables, "99232-25"), "99232");
        assert_eq!(strip_modifier(tables, "93306-TC"), "93306");
        assert_eq!(strip_modifier(tables, "92928-LD"), "92928-LD");
        assert_eq!(strip_modifier(tables, "93458"), "93458");
    }

    #[test]
    fn apply_replaces_existing_modifier() {
        let tables = builtin_tables();
        assert_eq!(apply_modifier(tables, "93458-59", "XS"), "93458-XS");
        assert_eq!(apply_modifier(tables, "99232", "-25"), "99232-25");
    }

    #[test]
    fn parse_separates_vessel_tag() {
        let tables = builtin_tables();
        let billed = parse_billed_code(tables, "92928-59-LD");
        assert_eq!(billed.code, "92928");
        assert_eq!(billed.modifiers, vec!["-59".to_owned()]);
        assert_eq!(billed.vessel.as_deref(), Some("LD"));
        assert_eq!(billed.render(), "92928-59-LD");
    }

    #[test]
    fn parse_keeps_unknown_numeric_suffix_as_modifier() {
        let tables = builtin_tables();
        let billed = parse_billed_code(tables, "93458-99");
        assert_eq!(billed.modifiers, vec!["-99".to_owned()]);
        assert_eq!(billed.vessel, None);
    }

    #[test]
    fn split_combined_on_plus() {
        assert_eq!(
            split_combined("93458 + 92928-LD"),
            vec!["93458", "92928-LD"]
        );
        assert_eq!(split_combined("99232"), vec!["99232"]);
        assert!(split_combined("  ").is_empty());
    }
}
