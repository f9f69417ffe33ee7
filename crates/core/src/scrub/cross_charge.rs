//! Checks that compare charges: same patient and date, or the same patient across dates.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::NaiveDate;
use rule_tables::RuleTables;

use super::{suggest_on, ChargeView, PatientContext};
use crate::code_sets::{self, contains};
use crate::config::CoreConfig;
use crate::constants::NO_CHARGE_CODE;
use crate::domain::{is_em, is_procedure};
use crate::pipeline::Proposal;
use crate::result::{Confidence, ValidationResult};

/// Runs every cross-charge pass, appending to `results` (parallel to `views`).
pub(super) fn apply(
    tables: &RuleTables,
    config: &CoreConfig,
    views: &[ChargeView<'_>],
    patients: &HashMap<String, PatientContext>,
    results: &mut [ValidationResult],
) {
    let mut same_day: BTreeMap<(&str, NaiveDate), Vec<usize>> = BTreeMap::new();
    let mut by_patient: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for (index, view) in views.iter().enumerate() {
        let patient = view.charge.patient_id.as_str();
        same_day
            .entry((patient, view.charge.charge_date))
            .or_default()
            .push(index);
        by_patient.entry(patient).or_default().push(index);
    }

    for group in same_day.values() {
        if group.len() > 1 {
            for &current in group {
                pairwise(tables, views, group, current, results);
            }
            duplicate_records(views, group, results);
            ep_study_with_ablation(views, group, results);
            coronary_territories(views, group, results);
            post_pci_angiography(views, group, results);
        }
        high_volume(config, views, group, results);
    }

    for (patient, indices) in &by_patient {
        global_period(tables, views, indices, results);
        consult_sequencing(views, indices, results);
        if let Some(context) = patients.get(*patient) {
            same_day_admit_discharge(views, indices, context, results);
        }
        em_pattern(views, indices, results);
        staged_pci(config, views, indices, results);
    }
}

// ============================================================================
// Same patient, same date
// ============================================================================

/// Checks between one charge and the rest of its same-day group.
fn pairwise(
    tables: &RuleTables,
    views: &[ChargeView<'_>],
    group: &[usize],
    current: usize,
    results: &mut [ValidationResult],
) {
    let view = &views[current];
    let others: Vec<&str> = group
        .iter()
        .filter(|&&i| i != current)
        .flat_map(|&i| views[i].codes.iter().map(String::as_str))
        .collect();
    let result = &mut results[current];

    let em_codes = view.matching(is_em);
    let procedures = view.matching(is_procedure);
    let other_em: Vec<&str> = others.iter().copied().filter(|c| is_em(c)).collect();
    let other_has_procedure = others.iter().any(|c| is_procedure(c));

    if other_has_procedure {
        for em in &em_codes {
            let already = result
                .suggestions
                .iter()
                .any(|s| s.code == *em && s.modifier.as_deref() == Some("-25"));
            if already {
                continue;
            }
            let proposal = if code_sets::is_discharge(em) {
                Proposal::modifier(
                    em,
                    "-25",
                    Confidence::Required,
                    "cross-charge-discharge-procedure-25",
                    format!(
                        "Discharge code {em} billed same day as procedure(s) on separate charge(s). Modifier -25 needed on discharge E/M."
                    ),
                )
            } else {
                Proposal::modifier(
                    em,
                    "-25",
                    Confidence::Required,
                    "cross-charge-em-procedure-25",
                    format!(
                        "E/M code {em} billed same day as procedure(s) on separate charge(s). Modifier -25 needed to indicate separately identifiable service."
                    ),
                )
            };
            suggest_on(tables, view, result, proposal.auto_apply());
        }
    }

    if !procedures.is_empty() {
        for em in &other_em {
            result.warnings.push(format!(
                "E/M code {em} on a separate charge may need modifier -25 due to procedures ({}) on this charge.",
                procedures.join(", ")
            ));
        }
    }

    for echo in view.matching(code_sets::is_echo) {
        if others.contains(&echo) {
            suggest_on(
                tables,
                view,
                result,
                Proposal::modifier(
                    echo,
                    "-76",
                    Confidence::Recommended,
                    "cross-charge-repeat-echo-76",
                    format!(
                        "Echo code {echo} also appears on another charge for this patient today. Modifier -76 indicates a repeat procedure by the same physician."
                    ),
                ),
            );
        }
    }

    for code in &view.codes {
        for other in &others {
            let Some(pair) = tables.bundling_pairs.iter().find(|p| p.links(code, other)) else {
                continue;
            };
            if !pair.modifier_exception || pair.bundled != *code {
                continue;
            }
            result.warnings.push(format!(
                "CCI edit: {}. Code {code} on this charge may need modifier -59 relative to {} on another charge.",
                pair.description, pair.primary
            ));
        }
    }

    for exclusion in code_sets::ECHO_EXCLUSIONS {
        let split = (view.has(exclusion.first) && others.contains(&exclusion.second))
            || (view.has(exclusion.second) && others.contains(&exclusion.first));
        if split {
            result.errors.push(format!(
                "{} (across separate charges; review and consolidate).",
                exclusion.reason.trim_end_matches('.')
            ));
        }
    }

    if others.iter().any(|c| code_sets::is_diagnostic_cath(c)) {
        for code in view.matching(|c| contains(code_sets::PERICARDIOCENTESIS, c)) {
            suggest_on(
                tables,
                view,
                result,
                Proposal::modifier(
                    code,
                    "-59",
                    Confidence::Recommended,
                    "cross-charge-pericardiocentesis-cath-59",
                    format!(
                        "Pericardiocentesis ({code}) billed same day as cardiac cath on separate charge. Modifier -59 needed if separate indication from cath."
                    ),
                ),
            );
        }
    }
}

/// The same non-E/M, non-add-on code on more than one record.
fn duplicate_records(views: &[ChargeView<'_>], group: &[usize], results: &mut [ValidationResult]) {
    let mut holders: BTreeMap<&str, Vec<usize>> = BTreeMap::new();
    for &index in group {
        for code in &views[index].codes {
            holders.entry(code.as_str()).or_default().push(index);
        }
    }

    for (code, indices) in holders {
        if indices.len() < 2 || is_em(code) || code_sets::is_add_on(code) {
            continue;
        }
        for index in &indices {
            results[*index].warnings.push(format!(
                "CPT code {code} appears on {} separate charge records for this patient on the same date. Verify these are not duplicate submissions. If intentional, ensure modifier -76 (same physician) or -77 (different physician) is applied.",
                indices.len()
            ));
        }
    }
}

fn high_volume(
    config: &CoreConfig,
    views: &[ChargeView<'_>],
    group: &[usize],
    results: &mut [ValidationResult],
) {
    if group.len() <= config.high_volume_threshold() {
        return;
    }
    for &index in group {
        results[index].warnings.push(format!(
            "{} charges for this patient on {}. High charge volume. Review for completeness and accuracy.",
            group.len(),
            views[index].charge.charge_date
        ));
    }
}

fn ep_study_with_ablation(
    views: &[ChargeView<'_>],
    group: &[usize],
    results: &mut [ValidationResult],
) {
    let has_ablation = |index: usize| views[index].has_any(|c| contains(code_sets::ABLATION, c));

    for &index in group {
        let ablation_elsewhere = group.iter().any(|&other| other != index && has_ablation(other));
        if !ablation_elsewhere {
            continue;
        }
        for ep in views[index].matching(|c| contains(code_sets::EP_STUDY, c)) {
            results[index].errors.push(format!(
                "EP study {ep} is on a separate charge from ablation procedure(s) on the same date. The comprehensive EP study is bundled into the ablation code and cannot be billed separately. Remove the EP study charge or consolidate into the ablation charge."
            ));
        }
    }
}

fn coronary_territories(
    views: &[ChargeView<'_>],
    group: &[usize],
    results: &mut [ValidationResult],
) {
    let mut territories: BTreeMap<&str, BTreeSet<usize>> = BTreeMap::new();
    for &index in group {
        for entry in &views[index].entries {
            if !contains(code_sets::BASE_PCI, &entry.code) {
                continue;
            }
            if let Some(tag) = entry.vessel.as_deref() {
                let territory = code_sets::coronary_territory(tag).unwrap_or(tag);
                territories.entry(territory).or_default().insert(index);
            }
        }
    }

    for (territory, charges) in territories {
        if charges.len() < 2 {
            continue;
        }
        for index in charges {
            results[index].warnings.push(format!(
                "PCI on {territory} territory appears on multiple separate charges for this patient today. If both are the same coronary territory (e.g., proximal and mid LAD), they should be billed as a single PCI code, not two separate codes. Different lesions in the same territory are one code."
            ));
        }
    }
}

fn post_pci_angiography(
    views: &[ChargeView<'_>],
    group: &[usize],
    results: &mut [ValidationResult],
) {
    if !group.iter().any(|&i| views[i].has_any(code_sets::is_pci)) {
        return;
    }
    for &index in group {
        let view = &views[index];
        if view.has_any(code_sets::is_pci) {
            continue;
        }
        for cath in view.matching(code_sets::is_diagnostic_cath) {
            results[index].warnings.push(format!(
                "Diagnostic cath {cath} on a separate charge from PCI on the same date. Final angiography post-PCI is included in the PCI code. Only bill a separate diagnostic cath if it was a distinct diagnostic study (prior to PCI decision). Document with modifier -59 and ensure medical necessity for separate billing."
            ));
        }
    }
}

// ============================================================================
// Same patient, across dates
// ============================================================================

fn global_period(
    tables: &RuleTables,
    views: &[ChargeView<'_>],
    indices: &[usize],
    results: &mut [ValidationResult],
) {
    let mut anchors: Vec<(usize, &str, u32)> = Vec::new();
    for &index in indices {
        for code in &views[index].codes {
            if let Some(days) = code_sets::global_period(code).filter(|d| *d > 0) {
                if is_procedure(code) {
                    anchors.push((index, code.as_str(), days));
                }
            }
        }
    }
    if anchors.is_empty() {
        return;
    }

    for &index in indices {
        let view = &views[index];
        for &(anchor, procedure, days) in &anchors {
            if anchor == index {
                continue;
            }
            let performed = views[anchor].charge.charge_date;
            let elapsed = view.charge.charge_date.signed_duration_since(performed).num_days();
            if elapsed <= 0 || elapsed > i64::from(days) {
                continue;
            }

            for code in &view.codes {
                let result = &mut results[index];
                if is_em(code) {
                    suggest_on(
                        tables,
                        view,
                        result,
                        Proposal::modifier(
                            code,
                            "-24",
                            Confidence::Recommended,
                            "global-period-em-24",
                            format!(
                                "E/M code {code} is within the {days}-day global period of {procedure} (performed {performed}). Modifier -24 needed if this E/M is for an unrelated condition."
                            ),
                        ),
                    );
                    result.warnings.push(format!(
                        "E/M {code} falls within {days}-day global period of {procedure} ({performed}). Add -24 if unrelated, or -57 if this led to a new surgery decision."
                    ));
                } else if is_procedure(code) {
                    suggest_on(
                        tables,
                        view,
                        result,
                        Proposal::modifier(
                            code,
                            "-79",
                            Confidence::Recommended,
                            "global-period-procedure-79",
                            format!(
                                "Procedure {code} is within the {days}-day global period of {procedure} (performed {performed}). Modifier -79 if unrelated, -78 if related but unplanned return."
                            ),
                        ),
                    );
                    result.warnings.push(format!(
                        "Procedure {code} falls within {days}-day global period of {procedure} ({performed}). Use -78 (related, unplanned return) or -79 (unrelated procedure)."
                    ));
                }
            }
        }
    }
}

/// Indices ordered by date of service, stable within a date.
fn by_date(views: &[ChargeView<'_>], indices: &[usize]) -> Vec<usize> {
    let mut sorted = indices.to_vec();
    sorted.sort_by_key(|&i| views[i].charge.charge_date);
    sorted
}

fn consult_sequencing(
    views: &[ChargeView<'_>],
    indices: &[usize],
    results: &mut [ValidationResult],
) {
    let mut first_encounter: Option<NaiveDate> = None;
    let mut first_consult: Option<NaiveDate> = None;

    for index in by_date(views, indices) {
        let view = &views[index];
        if view.codes.iter().all(|c| c == NO_CHARGE_CODE) {
            tracing::debug!(
                "consult sequencing skips charge {} with no billable codes",
                view.charge.id
            );
            continue;
        }
        let date = view.charge.charge_date;
        let first_date = *first_encounter.get_or_insert(date);

        for code in &view.codes {
            if contains(code_sets::CONSULT, code) {
                match first_consult {
                    Some(first) if first != date => results[index].errors.push(format!(
                        "Consult code {code} billed on {date}, but a consult was already billed on {first} for this admission. Subsequent visits should use 99231-99233."
                    )),
                    Some(_) => {}
                    None => first_consult = Some(date),
                }
            }
            if contains(code_sets::INITIAL_HOSPITAL, code) && date != first_date {
                results[index].errors.push(format!(
                    "Initial hospital care {code} billed on {date}, but first encounter was {first_date}. Use 99231-99233 for subsequent visits."
                ));
            }
        }
    }
}

fn same_day_admit_discharge(
    views: &[ChargeView<'_>],
    indices: &[usize],
    context: &PatientContext,
    results: &mut [ValidationResult],
) {
    let (Some(admit), Some(discharge)) = (context.admit_date, context.discharge_date) else {
        return;
    };
    if admit != discharge {
        return;
    }
    for &index in indices {
        let view = &views[index];
        if view.charge.charge_date != admit {
            continue;
        }
        for code in view.matching(|c| contains(code_sets::INITIAL_HOSPITAL, c)) {
            results[index].warnings.push(format!(
                "Initial hospital care {code} billed on a same-day admit/discharge. Consider whether observation codes (99234-99236) are more appropriate if the patient did not cross two midnights."
            ));
        }
    }
}

/// Flags uniform subsequent-visit levels across a stay.
fn em_pattern(views: &[ChargeView<'_>], indices: &[usize], results: &mut [ValidationResult]) {
    let visits: Vec<(usize, &str)> = indices
        .iter()
        .filter_map(|&i| {
            views[i]
                .codes
                .iter()
                .find(|c| contains(code_sets::SUBSEQUENT_HOSPITAL, c))
                .map(|c| (i, c.as_str()))
        })
        .collect();
    if visits.len() < 3 {
        return;
    }

    let count = visits.len();
    if visits.iter().all(|(_, code)| *code == "99233") {
        for (index, _) in &visits {
            results[*index].warnings.push(format!(
                "All {count} subsequent hospital visits for this patient are billed at the highest level (99233). Consistent highest-level billing is a common audit trigger. Ensure documentation supports high-complexity MDM for each visit."
            ));
        }
        return;
    }

    let first = visits[0].1;
    if count >= 4 && visits.iter().all(|(_, code)| *code == first) {
        for (index, _) in &visits {
            results[*index].warnings.push(format!(
                "All {count} subsequent visits use {first}. An identical code each day may indicate documentation is not reflecting daily changes in patient complexity. Ensure each day's note supports the selected level."
            ));
        }
    }
}

fn staged_pci(
    config: &CoreConfig,
    views: &[ChargeView<'_>],
    indices: &[usize],
    results: &mut [ValidationResult],
) {
    let mut by_day: BTreeMap<NaiveDate, Vec<usize>> = BTreeMap::new();
    for &index in indices {
        if views[index].has_any(|c| contains(code_sets::BASE_PCI, c)) {
            by_day.entry(views[index].charge.charge_date).or_default().push(index);
        }
    }

    let days: Vec<(&NaiveDate, &Vec<usize>)> = by_day.iter().collect();
    for pair in days.windows(2) {
        let (previous, _) = pair[0];
        let (current, charges) = pair[1];
        let between = current.signed_duration_since(*previous).num_days();
        if between > config.staged_pci_window_days() {
            continue;
        }
        let unit = if between == 1 { "day" } else { "days" };
        for &index in charges {
            results[index].warnings.push(format!(
                "Staged PCI: This PCI ({current}) is {between} {unit} after a prior PCI ({previous}) for this patient. Staged multi-vessel PCI requires documentation stating the procedure was intentionally planned as staged. Include the clinical rationale for staging (contrast limits, patient stability), which vessels were treated at each session, and that multi-vessel CAD was identified at the index procedure."
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::charge;
    use super::super::{scrub, scrub_with_context, PatientContext, StoredCharge};
    use crate::config::CoreConfig;
    use chrono::NaiveDate;
    use rule_tables::builtin_tables;
    use std::collections::HashMap;

    fn run(charges: &[StoredCharge]) -> super::super::ScrubReport {
        scrub(builtin_tables(), &CoreConfig::default(), charges)
    }

    fn warned(report: &super::super::ScrubReport, id: &str, needle: &str) -> bool {
        report.results[id].warnings.iter().any(|w| w.contains(needle))
    }

    fn errored(report: &super::super::ScrubReport, id: &str, needle: &str) -> bool {
        report.results[id].errors.iter().any(|e| e.contains(needle))
    }

    #[test]
    fn em_on_one_charge_and_procedure_on_another_adds_25() {
        let report = run(&[
            charge("visit", "p1", "2026-03-02", "99232"),
            charge("echo", "p1", "2026-03-02", "93306"),
        ]);

        let visit = &report.results["visit"];
        let suggestion = visit
            .suggestions
            .iter()
            .find(|s| s.rule_id == "cross-charge-em-procedure-25")
            .expect("cross-charge -25");
        assert!(suggestion.auto_applied);
        assert_eq!(visit.billed_codes, vec!["99232-25".to_owned()]);
        assert!(warned(&report, "echo", "E/M code 99232 on a separate charge"));
    }

    #[test]
    fn discharge_uses_its_own_rule_id() {
        let report = run(&[
            charge("dc", "p1", "2026-03-02", "99238"),
            charge("cath", "p1", "2026-03-02", "93458"),
        ]);
        assert!(report.results["dc"]
            .suggestions
            .iter()
            .any(|s| s.rule_id == "cross-charge-discharge-procedure-25"));
    }

    #[test]
    fn different_dates_are_not_same_day() {
        let report = run(&[
            charge("visit", "p1", "2026-03-02", "99232"),
            charge("echo", "p1", "2026-03-03", "93306"),
        ]);
        assert!(report.results["visit"].suggestions.is_empty());
    }

    #[test]
    fn repeat_echo_and_exclusion_across_charges() {
        let report = run(&[
            charge("a", "p1", "2026-03-02", "93306"),
            charge("b", "p1", "2026-03-02", "93306"),
            charge("c", "p1", "2026-03-02", "93307"),
        ]);
        assert!(report.results["a"]
            .suggestions
            .iter()
            .any(|s| s.rule_id == "cross-charge-repeat-echo-76"));
        assert!(errored(&report, "c", "across separate charges"));
        assert!(warned(&report, "a", "appears on 2 separate charge records"));
    }

    #[test]
    fn split_bundling_pair_warns_component_charge() {
        let report = run(&[
            charge("stent", "p1", "2026-03-02", "92928"),
            charge("ather", "p1", "2026-03-02", "92924"),
        ]);
        assert!(warned(&report, "ather", "Code 92924 on this charge may need modifier -59 relative to 92928"));
        assert!(!warned(&report, "stent", "on this charge may need modifier -59"));
    }

    #[test]
    fn high_volume_warns_every_charge() {
        let codes = ["93000", "93005", "93010", "93040", "93041"];
        let charges: Vec<StoredCharge> = codes
            .iter()
            .enumerate()
            .map(|(i, code)| charge(&format!("c{i}"), "p1", "2026-03-02", code))
            .collect();
        let report = run(&charges);
        for i in 0..codes.len() {
            assert!(warned(&report, &format!("c{i}"), "5 charges for this patient on 2026-03-02"));
        }

        let report = run(&charges[..4]);
        assert!(!warned(&report, "c0", "High charge volume"));
    }

    #[test]
    fn ep_study_separate_from_ablation_is_an_error() {
        let mut ep = charge("ep", "p1", "2026-03-02", "93620");
        ep.diagnoses = vec!["I48.0".into()];
        let mut ablation = charge("abl", "p1", "2026-03-02", "93656");
        ablation.diagnoses = vec!["I48.0".into()];
        let report = run(&[ep, ablation]);
        assert!(errored(&report, "ep", "EP study 93620 is on a separate charge"));
    }

    #[test]
    fn same_territory_on_two_charges_warns() {
        let report = run(&[
            charge("a", "p1", "2026-03-02", "92928-LD"),
            charge("b", "p1", "2026-03-02", "92928-LD"),
            charge("c", "p1", "2026-03-02", "92928-RC"),
        ]);
        assert!(warned(&report, "a", "PCI on LAD territory"));
        assert!(warned(&report, "b", "PCI on LAD territory"));
        assert!(!warned(&report, "c", "PCI on RCA territory"));
    }

    #[test]
    fn standalone_cath_beside_pci_warns() {
        let report = run(&[
            charge("cath", "p1", "2026-03-02", "93458"),
            charge("pci", "p1", "2026-03-02", "92928-LD"),
        ]);
        assert!(warned(&report, "cath", "Diagnostic cath 93458 on a separate charge from PCI"));
        assert!(!warned(&report, "pci", "Diagnostic cath"));
    }

    #[test]
    fn pericardiocentesis_beside_cath_gets_59() {
        let report = run(&[
            charge("peri", "p1", "2026-03-02", "33016"),
            charge("cath", "p1", "2026-03-02", "93458"),
        ]);
        assert!(report.results["peri"]
            .suggestions
            .iter()
            .any(|s| s.rule_id == "cross-charge-pericardiocentesis-cath-59"));
    }

    #[test]
    fn global_period_flags_later_visits_only() {
        let mut implant = charge("pm", "p1", "2026-03-01", "33208");
        implant.diagnoses = vec!["I44.2".into()];
        let report = run(&[
            implant,
            charge("before", "p1", "2026-02-27", "99232"),
            charge("within", "p1", "2026-03-10", "99232"),
            charge("after", "p1", "2026-06-15", "99232"),
        ]);

        let within = &report.results["within"];
        assert!(within.suggestions.iter().any(|s| s.rule_id == "global-period-em-24"));
        assert!(warned(&report, "within", "90-day global period of 33208"));
        assert!(report.results["before"].suggestions.iter().all(|s| s.rule_id != "global-period-em-24"));
        assert!(report.results["after"].suggestions.iter().all(|s| s.rule_id != "global-period-em-24"));
    }

    #[test]
    fn consult_sequencing_errors() {
        let report = run(&[
            charge("nc", "p1", "2026-03-01", "00000"),
            charge("blank", "p1", "2026-03-01", ""),
            charge("consult", "p1", "2026-03-02", "99253"),
            charge("again", "p1", "2026-03-04", "99252"),
            charge("initial", "p1", "2026-03-05", "99222"),
        ]);
        assert!(report.results["consult"].errors.is_empty());
        assert!(errored(&report, "again", "a consult was already billed on 2026-03-02"));
        assert!(errored(&report, "initial", "first encounter was 2026-03-02"));
    }

    #[test]
    fn same_day_admit_discharge_needs_context() {
        let charges = vec![charge("adm", "p1", "2026-03-02", "99223")];
        let day = NaiveDate::from_ymd_opt(2026, 3, 2);
        let mut patients = HashMap::new();
        patients.insert(
            "p1".to_owned(),
            PatientContext {
                admit_date: day,
                discharge_date: day,
                date_of_birth: None,
            },
        );

        let report =
            scrub_with_context(builtin_tables(), &CoreConfig::default(), &charges, &patients);
        assert!(warned(&report, "adm", "same-day admit/discharge"));
        assert!(!warned(&run(&charges), "adm", "same-day admit/discharge"));
    }

    #[test]
    fn uniform_high_level_visits_warn() {
        let report = run(&[
            charge("d1", "p1", "2026-03-02", "99233"),
            charge("d2", "p1", "2026-03-03", "99233"),
            charge("d3", "p1", "2026-03-04", "99233"),
        ]);
        assert!(warned(&report, "d2", "All 3 subsequent hospital visits"));

        let cloned = run(&[
            charge("d1", "p2", "2026-03-02", "99232"),
            charge("d2", "p2", "2026-03-03", "99232"),
            charge("d3", "p2", "2026-03-04", "99232"),
        ]);
        assert!(!warned(&cloned, "d1", "subsequent visits use"));

        let cloned = run(&[
            charge("d1", "p2", "2026-03-02", "99232"),
            charge("d2", "p2", "2026-03-03", "99232"),
            charge("d3", "p2", "2026-03-04", "99232"),
            charge("d4", "p2", "2026-03-05", "99232"),
        ]);
        assert!(warned(&cloned, "d4", "All 4 subsequent visits use 99232"));
    }

    #[test]
    fn staged_pci_within_window() {
        let report = run(&[
            charge("first", "p1", "2026-03-02", "92928-LD"),
            charge("second", "p1", "2026-03-03", "92928-RC"),
            charge("late", "p1", "2026-05-20", "92928-LC"),
        ]);
        assert!(warned(&report, "second", "is 1 day after a prior PCI (2026-03-02)"));
        assert!(!warned(&report, "first", "Staged PCI"));
        assert!(!warned(&report, "late", "Staged PCI"));
    }

    #[test]
    fn staged_window_follows_config() {
        let config = CoreConfig::new(None, 7, 30, 24, 90, 4).unwrap();
        let charges = vec![
            charge("first", "p1", "2026-03-02", "92928-LD"),
            charge("late", "p1", "2026-05-20", "92928-LC"),
        ];
        let report = scrub(builtin_tables(), &config, &charges);
        assert!(warned(&report, "late", "79 days after a prior PCI"));
    }
}
