//! Rule-table facade and strict YAML wire format.
//!
//! Responsibilities:
//! - Hold the four swappable tables the engine evaluates against
//! - Provide lookups the engine needs (modifier by id, code metadata, symmetric compatibility)
//! - Parse and render the YAML override format, rejecting unknown keys
//! - Validate table contents when translating from the wire model
//!
//! Notes:
//! - Table order is significant: bundling pairs drive violation order and diagnosis rules are
//!   evaluated first-match. Parsing preserves the order written in the file.

use std::collections::HashSet;
use std::path::Path;

use billing_types::{CptCode, Severity};
use serde::{Deserialize, Serialize};

use crate::bundling::{BundlingCategory, BundlingEditPair};
use crate::catalog::{CodeMetadata, SelectionCategory};
use crate::diagnosis::{Applicability, DiagnosisRule};
use crate::modifiers::{normalize_modifier_id, ModifierDefinition};
use crate::{RuleTablesError, RuleTablesResult};

// ============================================================================
// Public domain-level types
// ============================================================================

/// The complete set of rule tables consumed by the compliance engine.
#[derive(Clone, Debug, PartialEq)]
pub struct RuleTables {
    /// Ordered bundling edit pairs.
    pub bundling_pairs: Vec<BundlingEditPair>,

    /// Modifier definitions, unique by normalised id.
    pub modifiers: Vec<ModifierDefinition>,

    /// Ordered diagnosis rules; the first rule that applies to a code decides it.
    pub diagnosis_rules: Vec<DiagnosisRule>,

    /// Selectable inpatient code catalog, unique by code.
    pub catalog: Vec<CodeMetadata>,
}

// ============================================================================
// Public RuleTables operations
// ============================================================================

impl RuleTables {
    /// An owned copy of the built-in tables.
    pub fn builtin() -> Self {
        crate::builtin::builtin_tables().clone()
    }

    /// Parse rule tables from YAML text.
    ///
    /// This uses `serde_path_to_error` so schema errors report the failing field path, for
    /// example `diagnosis_rules[3].severity`.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTablesError::Translation`] if the YAML does not match the wire schema
    /// (including unknown keys), and [`RuleTablesError::InvalidInput`] if the contents fail
    /// validation (malformed codes, duplicate ids, empty prefix lists, inverted ranges).
    pub fn parse(yaml_text: &str) -> RuleTablesResult<Self> {
        let deserializer = serde_yaml::Deserializer::from_str(yaml_text);

        let wire = match serde_path_to_error::deserialize::<_, RuleTablesWire>(deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(RuleTablesError::Translation(format!(
                    "Rule tables schema mismatch at {path}: {source}"
                )));
            }
        };

        let tables = wire_to_domain(wire)?;
        tables.validate()?;
        Ok(tables)
    }

    /// Render the tables as YAML in the same format [`RuleTables::parse`] accepts.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTablesError::Translation`] if serialisation fails.
    pub fn render(&self) -> RuleTablesResult<String> {
        let wire = domain_to_wire(self);
        serde_yaml::to_string(&wire)
            .map_err(|e| RuleTablesError::Translation(format!("Failed to serialize rule tables: {e}")))
    }

    /// Read and parse a rule-table file.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTablesError::Io`] if the file cannot be read, otherwise any error from
    /// [`RuleTables::parse`].
    pub fn load(path: &Path) -> RuleTablesResult<Self> {
        let text = std::fs::read_to_string(path)?;
        let tables = Self::parse(&text)?;
        tracing::info!(
            path = %path.display(),
            bundling_pairs = tables.bundling_pairs.len(),
            modifiers = tables.modifiers.len(),
            diagnosis_rules = tables.diagnosis_rules.len(),
            catalog = tables.catalog.len(),
            "loaded rule tables"
        );
        Ok(tables)
    }

    /// Check the internal consistency of the tables.
    ///
    /// # Errors
    ///
    /// Returns [`RuleTablesError::InvalidInput`] describing the first problem found.
    pub fn validate(&self) -> RuleTablesResult<()> {
        for (i, pair) in self.bundling_pairs.iter().enumerate() {
            check_code(&pair.primary, &format!("bundling_pairs[{i}].primary"))?;
            check_code(&pair.bundled, &format!("bundling_pairs[{i}].bundled"))?;
            if pair.primary == pair.bundled {
                return Err(RuleTablesError::InvalidInput(format!(
                    "bundling_pairs[{i}] bundles {} into itself",
                    pair.primary
                )));
            }
        }

        let mut ids = HashSet::new();
        for (i, def) in self.modifiers.iter().enumerate() {
            if def.id.len() < 2 {
                return Err(RuleTablesError::InvalidInput(format!(
                    "modifiers[{i}].id is empty"
                )));
            }
            if !ids.insert(def.id.as_str()) {
                return Err(RuleTablesError::InvalidInput(format!(
                    "duplicate modifier id {}",
                    def.id
                )));
            }
        }

        for (i, rule) in self.diagnosis_rules.iter().enumerate() {
            if rule.required_prefixes.is_empty()
                || rule.required_prefixes.iter().any(String::is_empty)
            {
                return Err(RuleTablesError::InvalidInput(format!(
                    "diagnosis_rules[{i}] ({}) needs at least one non-empty prefix",
                    rule.id
                )));
            }
            match &rule.applicability {
                Applicability::Codes(codes) => {
                    for code in codes {
                        check_code(code, &format!("diagnosis_rules[{i}].codes"))?;
                    }
                }
                Applicability::NumericRange { start, end } => {
                    if start > end {
                        return Err(RuleTablesError::InvalidInput(format!(
                            "diagnosis_rules[{i}] range start {start} exceeds end {end}"
                        )));
                    }
                }
            }
        }

        let mut codes = HashSet::new();
        for (i, meta) in self.catalog.iter().enumerate() {
            check_code(&meta.code, &format!("catalog[{i}].code"))?;
            if !codes.insert(meta.code.as_str()) {
                return Err(RuleTablesError::InvalidInput(format!(
                    "duplicate catalog code {}",
                    meta.code
                )));
            }
            if !meta.rvu.is_finite() || meta.rvu < 0.0 {
                return Err(RuleTablesError::InvalidInput(format!(
                    "catalog[{i}].rvu must be a non-negative number"
                )));
            }
        }

        Ok(())
    }

    /// Look up a modifier definition. Accepts `25`, `-25` or `tc` style ids.
    pub fn modifier(&self, id: &str) -> Option<&ModifierDefinition> {
        let id = normalize_modifier_id(id);
        self.modifiers.iter().find(|m| m.id == id)
    }

    /// Whether a modifier id has a definition.
    pub fn is_known_modifier(&self, id: &str) -> bool {
        self.modifier(id).is_some()
    }

    /// Whether two modifiers may appear on the same code.
    ///
    /// Incompatibility is declared one-directionally, so both definitions are consulted.
    /// Modifiers without a definition are treated as compatible.
    pub fn modifiers_compatible(&self, a: &str, b: &str) -> bool {
        let a_blocks = self.modifier(a).is_some_and(|m| m.declares_incompatible(b));
        let b_blocks = self.modifier(b).is_some_and(|m| m.declares_incompatible(a));
        !(a_blocks || b_blocks)
    }

    /// Catalog metadata for a code, if it is a selectable inpatient code.
    pub fn metadata(&self, code: &str) -> Option<&CodeMetadata> {
        self.catalog.iter().find(|m| m.code == code)
    }

    /// Catalog entries in one selection category, in catalog order.
    pub fn codes_in_category(
        &self,
        category: SelectionCategory,
    ) -> impl Iterator<Item = &CodeMetadata> {
        self.catalog.iter().filter(move |m| m.category == category)
    }
}

// ============================================================================
// Wire types (internal)
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleTablesWire {
    #[serde(default)]
    bundling_pairs: Vec<BundlingPairWire>,

    #[serde(default)]
    modifiers: Vec<ModifierWire>,

    #[serde(default)]
    diagnosis_rules: Vec<DiagnosisRuleWire>,

    #[serde(default)]
    catalog: Vec<CatalogEntryWire>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct BundlingPairWire {
    primary: String,
    bundled: String,
    #[serde(default)]
    modifier_exception: bool,
    description: String,
    category: BundlingCategory,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ModifierWire {
    id: String,
    name: String,
    description: String,
    #[serde(default)]
    auto_apply: bool,
    #[serde(default)]
    requires_review: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    incompatible_with: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    documentation: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct DiagnosisRuleWire {
    id: String,
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    codes: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    range: Option<RangeWire>,
    required_prefixes: Vec<String>,
    severity: Severity,
    message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RangeWire {
    start: u32,
    end: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct CatalogEntryWire {
    code: String,
    category: SelectionCategory,
    rvu: f64,
    #[serde(default)]
    add_on: bool,
    #[serde(default)]
    time_based: bool,
    #[serde(default)]
    initial_encounter: bool,
}

// ============================================================================
// Helper functions (internal)
// ============================================================================

fn check_code(code: &str, field: &str) -> RuleTablesResult<()> {
    match CptCode::new(code) {
        Ok(parsed) if parsed.as_str() == code => Ok(()),
        Ok(parsed) => Err(RuleTablesError::InvalidInput(format!(
            "{field}: code {code:?} is not normalised (expected {parsed})"
        ))),
        Err(e) => Err(RuleTablesError::InvalidInput(format!("{field}: {e}"))),
    }
}

fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

fn wire_to_domain(wire: RuleTablesWire) -> RuleTablesResult<RuleTables> {
    let bundling_pairs = wire
        .bundling_pairs
        .into_iter()
        .map(|p| BundlingEditPair {
            primary: normalize_code(&p.primary),
            bundled: normalize_code(&p.bundled),
            modifier_exception: p.modifier_exception,
            description: p.description,
            category: p.category,
        })
        .collect();

    let modifiers = wire
        .modifiers
        .into_iter()
        .map(|m| ModifierDefinition {
            id: normalize_modifier_id(&m.id),
            name: m.name,
            description: m.description,
            auto_apply: m.auto_apply,
            requires_review: m.requires_review,
            incompatible_with: m
                .incompatible_with
                .iter()
                .map(String::as_str)
                .map(normalize_modifier_id)
                .collect(),
            documentation: m.documentation,
        })
        .collect();

    let diagnosis_rules = wire
        .diagnosis_rules
        .into_iter()
        .map(|r| {
            let applicability = match (r.codes, r.range) {
                (Some(codes), None) => {
                    Applicability::Codes(codes.iter().map(|c| normalize_code(c)).collect())
                }
                (None, Some(range)) => Applicability::NumericRange {
                    start: range.start,
                    end: range.end,
                },
                _ => {
                    return Err(RuleTablesError::InvalidInput(format!(
                        "diagnosis rule {} must set exactly one of `codes` or `range`",
                        r.id
                    )))
                }
            };
            Ok(DiagnosisRule {
                id: r.id,
                name: r.name,
                applicability,
                required_prefixes: r
                    .required_prefixes
                    .iter()
                    .map(|p| p.trim().to_ascii_uppercase())
                    .collect(),
                severity: r.severity,
                message: r.message,
            })
        })
        .collect::<RuleTablesResult<Vec<_>>>()?;

    let catalog = wire
        .catalog
        .into_iter()
        .map(|c| CodeMetadata {
            code: normalize_code(&c.code),
            category: c.category,
            rvu: c.rvu,
            add_on: c.add_on,
            time_based: c.time_based,
            initial_encounter: c.initial_encounter,
        })
        .collect();

    Ok(RuleTables {
        bundling_pairs,
        modifiers,
        diagnosis_rules,
        catalog,
    })
}

fn domain_to_wire(tables: &RuleTables) -> RuleTablesWire {
    RuleTablesWire {
        bundling_pairs: tables
            .bundling_pairs
            .iter()
            .map(|p| BundlingPairWire {
                primary: p.primary.clone(),
                bundled: p.bundled.clone(),
                modifier_exception: p.modifier_exception,
                description: p.description.clone(),
                category: p.category,
            })
            .collect(),
        modifiers: tables
            .modifiers
            .iter()
            .map(|m| ModifierWire {
                id: m.id.clone(),
                name: m.name.clone(),
                description: m.description.clone(),
                auto_apply: m.auto_apply,
                requires_review: m.requires_review,
                incompatible_with: m.incompatible_with.clone(),
                documentation: m.documentation.clone(),
            })
            .collect(),
        diagnosis_rules: tables
            .diagnosis_rules
            .iter()
            .map(|r| {
                let (codes, range) = match &r.applicability {
                    Applicability::Codes(codes) => (Some(codes.clone()), None),
                    Applicability::NumericRange { start, end } => (
                        None,
                        Some(RangeWire {
                            start: *start,
                            end: *end,
                        }),
                    ),
                };
                DiagnosisRuleWire {
                    id: r.id.clone(),
                    name: r.name.clone(),
                    codes,
                    range,
                    required_prefixes: r.required_prefixes.clone(),
                    severity: r.severity,
                    message: r.message.clone(),
                }
            })
            .collect(),
        catalog: tables
            .catalog
            .iter()
            .map(|c| CatalogEntryWire {
                code: c.code.clone(),
                category: c.category,
                rvu: c.rvu,
                add_on: c.add_on,
                time_based: c.time_based,
                initial_encounter: c.initial_encounter,
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SMALL: &str = r#"
bundling_pairs:
  - primary: "93458"
    bundled: "93454"
    description: Left heart cath bundles angiography
    category: cath_pci
modifiers:
  - id: "59"
    name: Distinct Procedural Service
    description: distinct
    auto_apply: true
    incompatible_with: ["xs"]
  - id: "-XS"
    name: Separate Structure
    description: structure
    requires_review: true
diagnosis_rules:
  - id: pvd
    name: Peripheral needs PVD
    range: { start: 37184, end: 37299 }
    required_prefixes: ["i70"]
    severity: warning
    message: needs PVD
catalog:
  - code: "99291"
    category: critical_care
    rvu: 4.5
    time_based: true
"#;

    #[test]
    fn parse_normalises_ids_and_prefixes() {
        let tables = RuleTables::parse(SMALL).expect("parse should succeed");
        assert_eq!(tables.bundling_pairs.len(), 1);
        assert_eq!(tables.modifiers[0].id, "-59");
        assert_eq!(tables.modifiers[0].incompatible_with, vec!["-XS".to_string()]);
        assert_eq!(tables.diagnosis_rules[0].required_prefixes, vec!["I70".to_string()]);
        assert!(tables.metadata("99291").is_some_and(|m| m.time_based));
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let tables = RuleTables::parse("catalog: []\n").expect("parse should succeed");
        assert!(tables.bundling_pairs.is_empty());
        assert!(tables.diagnosis_rules.is_empty());
    }

    #[test]
    fn unknown_key_reports_path() {
        let yaml = r#"
modifiers:
  - id: "-25"
    name: E/M
    description: d
    colour: blue
"#;
        let err = RuleTables::parse(yaml).expect_err("unknown key should fail");
        let msg = err.to_string();
        assert!(msg.contains("schema mismatch at modifiers[0]"), "{msg}");
        assert!(msg.contains("colour"), "{msg}");
    }

    #[test]
    fn rule_needs_exactly_one_applicability() {
        let yaml = r#"
diagnosis_rules:
  - id: both
    name: both
    codes: ["92928"]
    range: { start: 1, end: 2 }
    required_prefixes: ["I25"]
    severity: error
    message: m
"#;
        let err = RuleTables::parse(yaml).expect_err("both set should fail");
        assert!(matches!(err, RuleTablesError::InvalidInput(_)));
    }

    #[test]
    fn inverted_range_rejected() {
        let yaml = r#"
diagnosis_rules:
  - id: inv
    name: inv
    range: { start: 200, end: 100 }
    required_prefixes: ["I25"]
    severity: error
    message: m
"#;
        assert!(RuleTables::parse(yaml).is_err());
    }

    #[test]
    fn duplicate_modifier_rejected() {
        let yaml = r#"
modifiers:
  - { id: "-25", name: a, description: a }
  - { id: "25", name: b, description: b }
"#;
        let err = RuleTables::parse(yaml).expect_err("duplicate should fail");
        assert!(err.to_string().contains("duplicate modifier id -25"));
    }

    #[test]
    fn malformed_code_rejected() {
        let yaml = r#"
catalog:
  - { code: "9929", category: critical_care, rvu: 1.0 }
"#;
        assert!(matches!(
            RuleTables::parse(yaml),
            Err(RuleTablesError::InvalidInput(_))
        ));
    }

    #[test]
    fn render_then_parse_preserves_builtin() {
        let builtin = RuleTables::builtin();
        let yaml = builtin.render().expect("render should succeed");
        let parsed = RuleTables::parse(&yaml).expect("rendered tables should parse");
        assert_eq!(parsed, builtin);
    }

    #[test]
    fn compatibility_is_symmetric() {
        let tables = RuleTables::parse(SMALL).expect("parse should succeed");
        // only -59 declares the conflict
        assert!(!tables.modifiers_compatible("-59", "-XS"));
        assert!(!tables.modifiers_compatible("XS", "59"));
        assert!(tables.modifiers_compatible("-59", "-76"));
        assert!(tables.modifiers_compatible("-99", "-98"));
    }

    #[test]
    fn modifier_lookup_normalises() {
        let tables = RuleTables::builtin();
        assert_eq!(tables.modifier("tc").map(|m| m.name.as_str()), Some("Technical Component"));
        assert!(tables.is_known_modifier("25"));
        assert!(!tables.is_known_modifier("-QQ"));
    }

    #[test]
    fn codes_in_category_keeps_catalog_order() {
        let tables = RuleTables::builtin();
        let discharge: Vec<&str> = tables
            .codes_in_category(SelectionCategory::Discharge)
            .map(|m| m.code.as_str())
            .collect();
        assert_eq!(discharge, vec!["99238", "99239"]);
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(SMALL.as_bytes()).expect("write");
        let tables = RuleTables::load(file.path()).expect("load should succeed");
        assert_eq!(tables.modifiers.len(), 2);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = RuleTables::load(&dir.path().join("absent.yaml")).expect_err("should fail");
        assert!(matches!(err, RuleTablesError::Io(_)));
    }
}
