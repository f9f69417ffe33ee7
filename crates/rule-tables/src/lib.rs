//! Rule-table provider for the billing compliance engine.
//!
//! This crate provides the **configuration data** the engine evaluates against:
//! - bundling edit pairs (CCI-style column 1 / column 2 edits)
//! - modifier definitions (auto-apply policy, review flag, incompatibilities)
//! - diagnosis-to-procedure medical necessity rules
//! - the selectable inpatient code catalog (category, RVU, add-on and time flags)
//!
//! The tables are swappable (payers and CMS update them annually) without touching engine
//! logic. A built-in set ships with the crate; an override can be loaded from a strict YAML
//! wire format.
//!
//! This crate focuses on:
//! - domain-level table types consumed by `billing-core`
//! - serialisation/deserialisation of the YAML wire format
//! - translation and validation between wire structs and domain types

pub mod builtin;
pub mod bundling;
pub mod catalog;
pub mod diagnosis;
pub mod modifiers;
pub mod tables;

// Re-export facades
pub use builtin::builtin_tables;
pub use tables::RuleTables;

// Re-export public domain-level types
pub use bundling::{BundlingCategory, BundlingEditPair};
pub use catalog::{BillingGroup, CodeMetadata, SelectionCategory};
pub use diagnosis::{Applicability, DiagnosisRule};
pub use modifiers::{normalize_modifier_id, ModifierDefinition};

pub use billing_types::Severity;

/// Errors returned by the `rule-tables` crate.
#[derive(Debug, thiserror::Error)]
pub enum RuleTablesError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`RuleTablesError`].
pub type RuleTablesResult<T> = Result<T, RuleTablesError>;
