//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into the engine. Evaluation never reads environment variables; binaries parse them
//! with the `*_from_env_value` helpers below and build a [`CoreConfig`].

use crate::constants::{
    DEFAULT_CHARGE_LAG_ERROR_DAYS, DEFAULT_CHARGE_LAG_WARNING_DAYS, DEFAULT_HIGH_VOLUME_THRESHOLD,
    DEFAULT_MAX_DIAGNOSES, DEFAULT_STAGED_PCI_WINDOW_DAYS,
};
use crate::{BillingError, BillingResult};
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Environment variable naming a rule-table override file.
pub const RULES_FILE_ENV: &str = "BILLING_RULES_FILE";
pub const CHARGE_LAG_WARNING_DAYS_ENV: &str = "BILLING_CHARGE_LAG_WARNING_DAYS";
pub const CHARGE_LAG_ERROR_DAYS_ENV: &str = "BILLING_CHARGE_LAG_ERROR_DAYS";
pub const MAX_DIAGNOSES_ENV: &str = "BILLING_MAX_DIAGNOSES";

/// Core configuration resolved at startup.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CoreConfig {
    rules_file: Option<PathBuf>,
    charge_lag_warning_days: i64,
    charge_lag_error_days: i64,
    max_diagnoses: usize,
    staged_pci_window_days: i64,
    high_volume_threshold: usize,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`BillingError::InvalidConfig`] if:
    /// - the charge-lag warning threshold is negative or not below the error threshold,
    /// - `max_diagnoses` is zero,
    /// - the staged PCI window is negative.
    pub fn new(
        rules_file: Option<PathBuf>,
        charge_lag_warning_days: i64,
        charge_lag_error_days: i64,
        max_diagnoses: usize,
        staged_pci_window_days: i64,
        high_volume_threshold: usize,
    ) -> BillingResult<Self> {
        if charge_lag_warning_days < 0 {
            return Err(BillingError::InvalidConfig(
                "charge_lag_warning_days cannot be negative".into(),
            ));
        }
        if charge_lag_warning_days >= charge_lag_error_days {
            return Err(BillingError::InvalidConfig(format!(
                "charge_lag_warning_days ({charge_lag_warning_days}) must be less than charge_lag_error_days ({charge_lag_error_days})"
            )));
        }
        if max_diagnoses == 0 {
            return Err(BillingError::InvalidConfig(
                "max_diagnoses must be at least 1".into(),
            ));
        }
        if staged_pci_window_days < 0 {
            return Err(BillingError::InvalidConfig(
                "staged_pci_window_days cannot be negative".into(),
            ));
        }

        Ok(Self {
            rules_file,
            charge_lag_warning_days,
            charge_lag_error_days,
            max_diagnoses,
            staged_pci_window_days,
            high_volume_threshold,
        })
    }

    /// Build a configuration from raw environment values.
    ///
    /// Each argument is the value of the matching `BILLING_*` variable, if set. Blank values
    /// fall back to the defaults.
    pub fn from_env_values(
        rules_file: Option<String>,
        charge_lag_warning_days: Option<String>,
        charge_lag_error_days: Option<String>,
        max_diagnoses: Option<String>,
    ) -> BillingResult<Self> {
        Self::new(
            rules_file_from_env_value(rules_file),
            parse_env_value(
                CHARGE_LAG_WARNING_DAYS_ENV,
                charge_lag_warning_days,
                DEFAULT_CHARGE_LAG_WARNING_DAYS,
            )?,
            parse_env_value(
                CHARGE_LAG_ERROR_DAYS_ENV,
                charge_lag_error_days,
                DEFAULT_CHARGE_LAG_ERROR_DAYS,
            )?,
            parse_env_value(MAX_DIAGNOSES_ENV, max_diagnoses, DEFAULT_MAX_DIAGNOSES)?,
            DEFAULT_STAGED_PCI_WINDOW_DAYS,
            DEFAULT_HIGH_VOLUME_THRESHOLD,
        )
    }

    pub fn rules_file(&self) -> Option<&Path> {
        self.rules_file.as_deref()
    }

    pub fn charge_lag_warning_days(&self) -> i64 {
        self.charge_lag_warning_days
    }

    pub fn charge_lag_error_days(&self) -> i64 {
        self.charge_lag_error_days
    }

    pub fn max_diagnoses(&self) -> usize {
        self.max_diagnoses
    }

    pub fn staged_pci_window_days(&self) -> i64 {
        self.staged_pci_window_days
    }

    /// Charges per patient per day above which every charge in the group is flagged.
    pub fn high_volume_threshold(&self) -> usize {
        self.high_volume_threshold
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            rules_file: None,
            charge_lag_warning_days: DEFAULT_CHARGE_LAG_WARNING_DAYS,
            charge_lag_error_days: DEFAULT_CHARGE_LAG_ERROR_DAYS,
            max_diagnoses: DEFAULT_MAX_DIAGNOSES,
            staged_pci_window_days: DEFAULT_STAGED_PCI_WINDOW_DAYS,
            high_volume_threshold: DEFAULT_HIGH_VOLUME_THRESHOLD,
        }
    }
}

/// Resolve the rule-table override path from an environment value.
pub fn rules_file_from_env_value(value: Option<String>) -> Option<PathBuf> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

/// Parse a numeric environment value, falling back to `default` when unset or blank.
pub fn parse_env_value<T: FromStr>(
    name: &str,
    value: Option<String>,
    default: T,
) -> BillingResult<T> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    let parsed = value
        .map(|v| {
            v.parse::<T>()
                .map_err(|_| BillingError::InvalidConfig(format!("{name} must be a number, got {v:?}")))
        })
        .transpose()?;

    Ok(parsed.unwrap_or(default))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_constants() {
        let cfg = CoreConfig::default();
        assert_eq!(cfg.charge_lag_warning_days(), 7);
        assert_eq!(cfg.charge_lag_error_days(), 30);
        assert_eq!(cfg.max_diagnoses(), 24);
        assert_eq!(cfg.staged_pci_window_days(), 30);
        assert_eq!(cfg.high_volume_threshold(), 4);
        assert!(cfg.rules_file().is_none());
    }

    #[test]
    fn rejects_inverted_lag_thresholds() {
        let err = CoreConfig::new(None, 30, 7, 24, 30, 4).expect_err("expected validation failure");
        assert!(matches!(err, BillingError::InvalidConfig(_)));
    }

    #[test]
    fn rejects_zero_diagnosis_cap() {
        let err = CoreConfig::new(None, 7, 30, 0, 30, 4).expect_err("expected validation failure");
        assert!(matches!(err, BillingError::InvalidConfig(_)));
    }

    #[test]
    fn env_values_fall_back_to_defaults() {
        let cfg = CoreConfig::from_env_values(None, Some("  ".into()), None, None).unwrap();
        assert_eq!(cfg, CoreConfig::default());
    }

    #[test]
    fn env_values_override_defaults() {
        let cfg = CoreConfig::from_env_values(
            Some(" rules.yaml ".into()),
            Some("5".into()),
            Some("45".into()),
            Some("12".into()),
        )
        .unwrap();
        assert_eq!(cfg.rules_file(), Some(Path::new("rules.yaml")));
        assert_eq!(cfg.charge_lag_warning_days(), 5);
        assert_eq!(cfg.charge_lag_error_days(), 45);
        assert_eq!(cfg.max_diagnoses(), 12);
    }

    #[test]
    fn env_values_reject_non_numbers() {
        let err = CoreConfig::from_env_values(None, Some("soon".into()), None, None)
            .expect_err("expected parse failure");
        assert!(matches!(
            err,
            BillingError::InvalidConfig(msg) if msg.contains(CHARGE_LAG_WARNING_DAYS_ENV)
        ));
    }
}
