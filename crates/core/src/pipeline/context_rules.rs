//! Context rule modules: checks that need diagnoses, documented time or encounter dates.

use billing_types::Severity;
use chrono::{Datelike, NaiveDate};

use super::{EvalInput, Findings, Proposal};
use crate::code_sets::{self, contains};
use crate::constants::{
    CRITICAL_CARE_BASE, CRITICAL_CARE_MIN_SANE_MINUTES, DISCHARGE_MAX_SANE_MINUTES,
    EM_MAX_SANE_MINUTES,
};
use crate::diagnosis::validate_diagnosis;
use crate::domain::{is_em, is_procedure};

pub(super) fn missing_diagnosis(input: &EvalInput<'_>, findings: &mut Findings) {
    if !input.diagnoses.is_empty() {
        return;
    }
    if input.has_any(|c| is_procedure(c) || is_em(c)) {
        findings.warn(
            "No ICD-10 diagnosis codes attached to this charge. All claims require at least one diagnosis code to establish medical necessity.",
        );
    }
}

pub(super) fn diagnosis_support(input: &EvalInput<'_>, findings: &mut Findings) {
    for code in &input.unique {
        if let Some(finding) = validate_diagnosis(input.tables, code, &input.diagnoses) {
            match finding.severity {
                Severity::Error => findings.error(finding.message),
                Severity::Warning => findings.warn(finding.message),
            }
        }
    }
}

pub(super) fn time_documentation(input: &EvalInput<'_>, findings: &mut Findings) {
    let minutes = input.time_minutes.filter(|t| *t > 0);

    for code in &input.unique {
        let Some(threshold) = code_sets::time_threshold(code) else {
            continue;
        };

        if code_sets::is_critical_care(code) && minutes.is_none() {
            findings.warn(format!(
                "Critical care code {code} requires time documentation. Record the total critical care time (non-continuous, excluding separately billable procedures)."
            ));
            continue;
        }

        let Some(minutes) = minutes else {
            continue;
        };
        if minutes < threshold.min_minutes {
            findings.warn(format!(
                "{code} ({}) requires at least {} minutes. Documented time is {minutes} minutes. Consider a lower-level code.",
                threshold.label, threshold.min_minutes
            ));
        }
        if threshold.max_minutes.is_some_and(|max| minutes > max) {
            if code == "99238" {
                findings.warn(format!(
                    "Discharge time {minutes} minutes exceeds 30 minutes. Use 99239 instead of 99238."
                ));
            } else if code == CRITICAL_CARE_BASE {
                findings.warn(format!(
                    "Critical care time {minutes} minutes exceeds 74 minutes. Also bill 99292 for additional 30-minute increments."
                ));
            }
        }
    }
}

pub(super) fn discharge_date(input: &EvalInput<'_>, findings: &mut Findings) {
    let (Some(charge_date), Some(discharge)) =
        (input.context.charge_date, input.context.discharge_date)
    else {
        return;
    };

    for code in &input.unique {
        if code_sets::is_discharge(code) && charge_date != discharge {
            findings.error(format!(
                "Discharge code {code} billed on {charge_date}, but patient discharge date is {discharge}. Discharge codes must be billed on the actual discharge date."
            ));
        }
        if charge_date > discharge && is_em(code) && !code_sets::is_discharge(code) {
            findings.error(format!(
                "E/M code {code} billed on {charge_date}, which is after patient discharge ({discharge}). Cannot bill inpatient E/M after discharge."
            ));
        }
    }
}

pub(super) fn charge_lag(input: &EvalInput<'_>, findings: &mut Findings) {
    let (Some(charge_date), Some(created_at)) =
        (input.context.charge_date, input.context.created_at)
    else {
        return;
    };

    let lag_days = created_at
        .date_naive()
        .signed_duration_since(charge_date)
        .num_days();
    if lag_days < input.config.charge_lag_warning_days() {
        return;
    }

    if lag_days >= input.config.charge_lag_error_days() {
        findings.error(format!(
            "Charge entered {lag_days} days after service date ({charge_date}). This exceeds timely filing thresholds; most payers require claims within 90-365 days. Expedite submission."
        ));
    } else {
        findings.warn(format!(
            "Charge entered {lag_days} days after service date ({charge_date}). Prompt charge entry reduces denial risk and improves revenue cycle."
        ));
    }
}

pub(super) fn time_sanity(input: &EvalInput<'_>, findings: &mut Findings) {
    let Some(minutes) = input.time_minutes.filter(|t| *t > 0) else {
        return;
    };

    for code in &input.unique {
        if code_sets::is_critical_care(code) && minutes < CRITICAL_CARE_MIN_SANE_MINUTES {
            findings.warn(format!(
                "Critical care time of {minutes} minutes is unusually low. Code 99291 requires at least 30 minutes of direct bedside critical care. Verify this value."
            ));
        }
        if is_em(code) && minutes > EM_MAX_SANE_MINUTES {
            findings.warn(format!(
                "Documented time of {minutes} minutes ({:.1} hours) for {code} is unusually high, possibly a data entry error. Verify and correct if needed.",
                f64::from(minutes) / 60.0
            ));
        }
        if code_sets::is_discharge(code) && minutes > DISCHARGE_MAX_SANE_MINUTES {
            findings.warn(format!(
                "Discharge management time of {minutes} minutes is unusually high. Typical discharge is 30-60 minutes. Verify this is correct."
            ));
        }
    }
}

pub(super) fn prior_authorization(input: &EvalInput<'_>, findings: &mut Findings) {
    if input.context.prior_auth_documented {
        return;
    }
    for code in &input.unique {
        if let Some(note) = code_sets::lookup(code_sets::PRIOR_AUTH, code) {
            findings.error(format!(
                "Prior authorization alert: {note}. No authorization is documented for {code}; verify authorization was obtained before billing to prevent denial."
            ));
        }
    }
}

/// Whole years from `birth` to `on`.
fn age_on(birth: NaiveDate, on: NaiveDate) -> i64 {
    let mut age = i64::from(on.year() - birth.year());
    if (on.month(), on.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

pub(super) fn age_restrictions(input: &EvalInput<'_>, findings: &mut Findings) {
    let (Some(charge_date), Some(birth)) = (input.context.charge_date, input.context.date_of_birth)
    else {
        return;
    };
    let age = age_on(birth, charge_date);

    for code in &input.unique {
        for rule in code_sets::AGE_RESTRICTIONS.iter().filter(|r| contains(r.codes, code)) {
            if let Some(min) = rule.min_age.filter(|min| age < i64::from(*min)) {
                findings.warn(format!(
                    "Patient age {age} is below minimum age {min} for {code}. {}",
                    rule.note
                ));
            }
            if let Some(max) = rule.max_age.filter(|max| age > i64::from(*max)) {
                findings.warn(format!(
                    "Patient age {age} exceeds maximum age {max} for {code}. {}",
                    rule.note
                ));
            }
        }
    }
}

pub(super) fn coverage_determinations(input: &EvalInput<'_>, findings: &mut Findings) {
    for code in &input.unique {
        for rule in code_sets::COVERAGE_RULES.iter().filter(|r| contains(r.procedures, code)) {
            let supported = input
                .diagnoses
                .iter()
                .any(|dx| rule.required_prefixes.iter().any(|p| dx.starts_with(p)));
            if supported {
                findings.warn(format!(
                    "{} documentation reminder for {code}: Verify {}",
                    rule.name, rule.documentation_checklist
                ));
            } else {
                findings.warn(format!(
                    "{}: {code} may not meet Medicare coverage criteria. {} Documentation checklist: {}",
                    rule.name, rule.clinical_criteria, rule.documentation_checklist
                ));
            }
        }
    }
}

pub(super) fn retired_codes(input: &EvalInput<'_>, findings: &mut Findings) {
    for code in &input.unique {
        if let Some(note) = code_sets::lookup(code_sets::RETIRED_CODES, code) {
            findings.error(format!(
                "Code {code} has been retired/replaced: {note}. Update to the current valid code to prevent claim rejection."
            ));
        }
    }
}

pub(super) fn em_level(input: &EvalInput<'_>, findings: &mut Findings) {
    let Some(minutes) = input.time_minutes.filter(|t| *t > 0) else {
        return;
    };

    for code in input.unique.iter().map(String::as_str).filter(|c| is_em(c)) {
        let Some(family) = code_sets::EM_LEVEL_FAMILIES
            .iter()
            .find(|f| f.codes.contains(&code))
        else {
            continue;
        };

        // Highest level in the family whose window contains the documented time.
        let optimal = family
            .codes
            .iter()
            .enumerate()
            .filter_map(|(idx, c)| code_sets::time_threshold(c).map(|t| (idx, t)))
            .filter(|(_, t)| {
                minutes >= t.min_minutes && t.max_minutes.is_none_or(|max| minutes <= max)
            })
            .last();
        let Some((optimal_idx, threshold)) = optimal else {
            continue;
        };
        let Some(current_idx) = family.codes.iter().position(|c| *c == code) else {
            continue;
        };

        if optimal_idx > current_idx {
            findings.suggest(
                input,
                Proposal::code_change(
                    code,
                    threshold.code,
                    "em-level-upgrade",
                    format!(
                        "Documented time of {minutes} minutes supports upgrading from {code} to {} ({}). Consider selecting the higher-level code to accurately reflect the service provided.",
                        threshold.code, threshold.label
                    ),
                ),
            );
        } else if optimal_idx < current_idx {
            findings.suggest(
                input,
                Proposal::code_change(
                    code,
                    threshold.code,
                    "em-level-downgrade-risk",
                    format!(
                        "Documented time of {minutes} minutes supports {} ({}), which is a lower level than the selected {code}. Verify that medical decision-making complexity justifies the higher code, or adjust the code to match documented time.",
                        threshold.code, threshold.label
                    ),
                ),
            );
        }
    }
}
