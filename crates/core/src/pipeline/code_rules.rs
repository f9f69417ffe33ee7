//! Within-charge rule modules: checks over the set of codes on one charge.

use billing_types::CodeDomain;
use rule_tables::BillingGroup;

use super::{EvalInput, Findings, Proposal};
use crate::bundling::check_bundling;
use crate::code_sets::{self, contains};
use crate::domain::{classify, is_em, is_procedure};
use crate::result::Confidence;

/// First three codes, with an ellipsis when there are more.
fn preview(codes: &[&str]) -> String {
    let head = codes.iter().take(3).copied().collect::<Vec<_>>().join(", ");
    if codes.len() > 3 {
        format!("{head}...")
    } else {
        head
    }
}

pub(super) fn modifier_conflicts(input: &EvalInput<'_>, findings: &mut Findings) {
    for entry in &input.entries {
        for (i, a) in entry.modifiers.iter().enumerate() {
            for b in &entry.modifiers[i + 1..] {
                if !input.tables.modifiers_compatible(a, b) {
                    findings.error(format!(
                        "Modifiers {a} and {b} on {} are incompatible and cannot be reported together. Remove one of them.",
                        entry.code
                    ));
                }
            }
        }
    }
}

pub(super) fn duplicate_codes(input: &EvalInput<'_>, findings: &mut Findings) {
    for code in &input.unique {
        let count = input.codes.iter().filter(|c| *c == code).count();
        if count > 1 {
            findings.suggest(
                input,
                Proposal::modifier(
                    code,
                    "-76",
                    Confidence::Required,
                    "duplicate-code-76",
                    format!(
                        "Code {code} appears {count} times. Modifier -76 indicates a repeat procedure by the same physician. Use -77 if performed by a different physician."
                    ),
                ),
            );
        }
    }
}

pub(super) fn bundling_edits(input: &EvalInput<'_>, findings: &mut Findings) {
    for violation in check_bundling(input.tables, &input.codes) {
        if violation.modifier_exception {
            let modifier = if is_em(&violation.bundled_code) { "-25" } else { "-59" };
            let rule_id = format!(
                "ncci-{}-{}-{}",
                violation.primary_code,
                violation.bundled_code,
                modifier.trim_start_matches('-')
            );
            findings.suggest(
                input,
                Proposal::modifier(
                    &violation.bundled_code,
                    modifier,
                    Confidence::Required,
                    rule_id,
                    format!(
                        "CCI edit: {}. Modifier {modifier} allows separate reporting when services are distinct.",
                        violation.description
                    ),
                )
                .auto_apply(),
            );
        } else {
            findings.warn(format!(
                "CCI edit: {}. These codes are bundled and cannot be billed separately (no modifier exception).",
                violation.description
            ));
        }
    }
}

pub(super) fn em_with_procedure(input: &EvalInput<'_>, findings: &mut Findings) {
    let procedures = input.matching(is_procedure);
    if procedures.is_empty() {
        return;
    }
    for em in input.matching_unique(is_em) {
        if findings.has_suggestion(em, "-25") {
            continue;
        }
        findings.suggest(
            input,
            Proposal::modifier(
                em,
                "-25",
                Confidence::Required,
                "em-plus-procedure-25",
                format!(
                    "E/M code {em} billed with procedure code(s) {} on the same charge. Modifier -25 indicates a separately identifiable E/M service.",
                    procedures.join(", ")
                ),
            )
            .auto_apply(),
        );
    }
}

pub(super) fn critical_care_with_em(input: &EvalInput<'_>, findings: &mut Findings) {
    let critical = input.matching_unique(code_sets::is_critical_care);
    if critical.is_empty() {
        return;
    }
    let primary_em = input.matching_unique(|c| {
        input
            .tables
            .metadata(c)
            .is_some_and(|m| m.category.billing_group() == BillingGroup::PrimaryEm)
    });
    for em in primary_em {
        if findings.has_suggestion(em, "-25") {
            continue;
        }
        findings.suggest(
            input,
            Proposal::modifier(
                em,
                "-25",
                Confidence::Required,
                "critical-care-em-25",
                format!(
                    "E/M code {em} billed with critical care ({}) on the same date. E/M service performed before patient required critical care; modifier -25 marks it as separately identifiable.",
                    critical.join(", ")
                ),
            )
            .auto_apply(),
        );
    }
}

pub(super) fn prof_tech_split(input: &EvalInput<'_>, findings: &mut Findings) {
    for code in input.matching_unique(|c| contains(code_sets::PROF_TECH, c)) {
        findings.suggest(
            input,
            Proposal::modifier(
                code,
                "-26",
                Confidence::Optional,
                "prof-tech-split-26",
                format!(
                    "Code {code} has professional/technical components. If billing professional component only (interpretation), add -26. If technical only, add -TC."
                ),
            ),
        );
    }
}

pub(super) fn laterality(input: &EvalInput<'_>, findings: &mut Findings) {
    for code in input.unique.iter().map(String::as_str) {
        if contains(code_sets::BILATERAL, code) {
            findings.suggest(
                input,
                Proposal::modifier(
                    code,
                    "-50",
                    Confidence::Optional,
                    "bilateral-50",
                    format!("Code {code} is eligible for bilateral modifier -50 if performed on both sides."),
                ),
            );
        }
        if contains(code_sets::LATERALITY, code) {
            findings.suggest(
                input,
                Proposal::modifier(
                    code,
                    "-LT",
                    Confidence::Optional,
                    "laterality-lt-rt",
                    format!("Code {code} may need laterality modifier (-LT left, -RT right) if site-specific."),
                ),
            );
        }
    }
}

pub(super) fn diag_cath_with_pci(input: &EvalInput<'_>, findings: &mut Findings) {
    let pci = input.matching(code_sets::is_pci);
    if pci.is_empty() {
        return;
    }
    for cath in input.matching_unique(code_sets::is_diagnostic_cath) {
        if findings.has_suggestion(cath, "-59") {
            continue;
        }
        findings.suggest(
            input,
            Proposal::modifier(
                cath,
                "-59",
                Confidence::Required,
                "diag-cath-pci-59",
                format!(
                    "Diagnostic cath {cath} performed with PCI ({}) same session. Modifier -59 needed if diagnostic cath was a separate decision from the intervention.",
                    pci.join(", ")
                ),
            )
            .auto_apply(),
        );
        findings.warn(
            "Diagnostic cath + PCI: Ensure documentation supports separate billing. No prior cath in 30 days, diagnostic findings led to PCI decision.",
        );
    }
}

pub(super) fn add_on_orphans(input: &EvalInput<'_>, findings: &mut Findings) {
    for code in &input.unique {
        let Some(primaries) = code_sets::add_on_primaries(code) else {
            continue;
        };
        if !primaries.iter().any(|p| input.has(p)) {
            findings.error(format!(
                "Add-on code {code} requires a primary code ({}). Cannot be billed standalone.",
                preview(primaries)
            ));
        }
    }
}

pub(super) fn echo_exclusion(input: &EvalInput<'_>, findings: &mut Findings) {
    for exclusion in code_sets::ECHO_EXCLUSIONS {
        if input.has(exclusion.first) && input.has(exclusion.second) {
            findings.error(exclusion.reason);
        }
    }
}

pub(super) fn critical_care_bundling(input: &EvalInput<'_>, findings: &mut Findings) {
    if !input.has_any(code_sets::is_critical_care) {
        return;
    }
    for code in input.matching_unique(|c| contains(code_sets::CRITICAL_CARE_BUNDLED, c)) {
        findings.warn(format!(
            "{code} is bundled into critical care time (99291/99292) and should not be billed separately when provided during the critical care period."
        ));
    }
}

pub(super) fn sedation_bundling(input: &EvalInput<'_>, findings: &mut Findings) {
    let inherent = input.matching(|c| contains(code_sets::SEDATION_INHERENT, c));
    if inherent.is_empty() {
        return;
    }
    for sedation in input.matching(|c| contains(code_sets::SEDATION, c)) {
        findings.error(format!(
            "Sedation code {sedation} cannot be billed separately: moderate sedation is inherent in {}.",
            inherent.join(", ")
        ));
    }
}

pub(super) fn catheter_hierarchy(input: &EvalInput<'_>, findings: &mut Findings) {
    for level in code_sets::CATHETER_HIERARCHY {
        if !input.has(level.higher) {
            continue;
        }
        for lower in level.includes.iter().filter(|c| input.has(c)) {
            findings.warn(format!(
                "{}. Do not bill {lower} separately when {} is reported in the same vascular family.",
                level.description, level.higher
            ));
        }
    }
}

pub(super) fn si_pairing(input: &EvalInput<'_>, findings: &mut Findings) {
    for pairing in code_sets::SI_PAIRINGS {
        if !input.has(pairing.code) {
            continue;
        }
        if !pairing.required_caths.iter().any(|c| input.has(c)) {
            let first: Vec<&str> = pairing.required_caths.iter().take(3).copied().collect();
            findings.warn(format!(
                "S&I code {} ({}) typically requires a catheter placement code ({}...). Ensure catheter placement is reported.",
                pairing.code,
                pairing.territory,
                first.join(", ")
            ));
        }
    }
}

pub(super) fn peripheral_territory(input: &EvalInput<'_>, findings: &mut Findings) {
    for territory in code_sets::PERIPHERAL_TERRITORIES {
        let primaries: Vec<&str> =
            territory.primary.iter().copied().filter(|c| input.has(c)).collect();
        let add_ons: Vec<&str> =
            territory.add_on.iter().copied().filter(|c| input.has(c)).collect();

        if primaries.len() > 1 {
            findings.error(format!(
                "Multiple primary {} intervention codes ({}). Only one primary code per territory is allowed. Use add-on codes for additional vessels.",
                territory.name,
                primaries.join(", ")
            ));
        }
        if !add_ons.is_empty() && primaries.is_empty() {
            findings.error(format!(
                "{} add-on code(s) ({}) require a primary intervention code. Add the appropriate primary code for this territory.",
                territory.name,
                add_ons.join(", ")
            ));
        }
    }
}

pub(super) fn multiple_procedures(input: &EvalInput<'_>, findings: &mut Findings) {
    let procedures = input.matching(|c| is_procedure(c) && !code_sets::is_add_on(c) && !is_em(c));
    if procedures.len() < 2 {
        return;
    }

    let mut by_domain: Vec<(CodeDomain, Vec<&str>)> = Vec::new();
    for code in procedures {
        let domain = classify(code);
        match by_domain.iter_mut().find(|(d, _)| *d == domain) {
            Some((_, codes)) => codes.push(code),
            None => by_domain.push((domain, vec![code])),
        }
    }
    if by_domain.len() < 2 {
        return;
    }

    let ordered: Vec<&str> = by_domain.into_iter().flat_map(|(_, codes)| codes).collect();
    for code in ordered.into_iter().skip(1) {
        if findings.has_suggestion(code, "-59") || findings.has_suggestion(code, "-51") {
            continue;
        }
        findings.suggest(
            input,
            Proposal::modifier(
                code,
                "-51",
                Confidence::Optional,
                "multiple-procedure-51",
                format!(
                    "Multiple procedures from different domains on same charge. Modifier -51 on secondary procedure {code} indicates multiple procedure payment reduction may apply."
                ),
            ),
        );
    }
}

pub(super) fn discharge_with_procedure(input: &EvalInput<'_>, findings: &mut Findings) {
    let procedures = input.matching(is_procedure);
    if procedures.is_empty() {
        return;
    }
    for discharge in input.matching_unique(code_sets::is_discharge) {
        if findings.has_suggestion(discharge, "-25") {
            continue;
        }
        findings.suggest(
            input,
            Proposal::modifier(
                discharge,
                "-25",
                Confidence::Required,
                "discharge-plus-procedure-25",
                format!(
                    "Discharge code {discharge} billed with procedure(s) {} on same day. Modifier -25 needed on discharge E/M to indicate separately identifiable service.",
                    procedures.join(", ")
                ),
            )
            .auto_apply(),
        );
    }
}

pub(super) fn pericardiocentesis_with_cath(input: &EvalInput<'_>, findings: &mut Findings) {
    if !input.has_any(code_sets::is_diagnostic_cath) {
        return;
    }
    for code in input.matching_unique(|c| contains(code_sets::PERICARDIOCENTESIS, c)) {
        findings.suggest(
            input,
            Proposal::modifier(
                code,
                "-59",
                Confidence::Recommended,
                "pericardiocentesis-cath-59",
                format!(
                    "Pericardiocentesis ({code}) during cardiac cath session. Modifier -59 indicates distinct procedural service with separate indication."
                ),
            ),
        );
        findings.warn(
            "Pericardiocentesis + cardiac cath: Ensure documentation supports separate clinical indication (not just a complication of the cath procedure).",
        );
    }
}

pub(super) fn category_iii(input: &EvalInput<'_>, findings: &mut Findings) {
    for code in input.matching_unique(code_sets::is_category_iii) {
        match code_sets::lookup(code_sets::CATEGORY_III_NOTES, code) {
            Some(note) => findings.warn(format!(
                "Category III code {code}: {note}. These codes may have no established Medicare reimbursement. Verify payer coverage before billing."
            )),
            None => findings.warn(format!(
                "Category III code {code} is a temporary tracking code with limited or no Medicare reimbursement. Verify payer coverage and obtain prior authorization if required."
            )),
        }
    }
}

pub(super) fn diag_cath_hierarchy(input: &EvalInput<'_>, findings: &mut Findings) {
    for level in code_sets::DIAGNOSTIC_CATH_HIERARCHY {
        if !input.has(level.higher) {
            continue;
        }
        for lower in level.includes.iter().filter(|c| input.has(c)) {
            findings.error(format!(
                "{}. Do not bill {lower} separately when {} is reported; the higher code includes the lower component.",
                level.description, level.higher
            ));
        }
    }

    let angio = input.matching_unique(|c| contains(code_sets::CORONARY_ANGIO, c));
    if angio.len() > 1 {
        findings.error(format!(
            "Coronary angiography codes {} are mutually exclusive. Only one can be billed per session. Select the code that best represents all components performed.",
            angio.join(", ")
        ));
    }
}

pub(super) fn ep_study_with_ablation(input: &EvalInput<'_>, findings: &mut Findings) {
    for bundle in code_sets::ABLATION_BUNDLES {
        if !input.has(bundle.ablation) {
            continue;
        }
        for ep in bundle.bundled.iter().filter(|c| input.has(c)) {
            findings.error(format!(
                "EP study code {ep} is bundled into ablation code {} and cannot be billed separately. {}. The EP study is only separately billable if it leads to a decision NOT to ablate.",
                bundle.ablation, bundle.description
            ));
        }
    }
}

pub(super) fn device_implant_consistency(input: &EvalInput<'_>, findings: &mut Findings) {
    let generator = input.matching(|c| contains(code_sets::GENERATOR_CHANGE, c));
    let de_novo = input.matching(|c| contains(code_sets::DE_NOVO_IMPLANT, c));
    if generator.is_empty() || de_novo.is_empty() {
        return;
    }
    findings.error(format!(
        "Generator change code(s) {} and de novo implant code(s) {} cannot be billed together. Use generator change codes for replacement/revision or de novo codes for new implants, not both.",
        generator.join(", "),
        de_novo.join(", ")
    ));
}

pub(super) fn cardioversion_bundling(input: &EvalInput<'_>, findings: &mut Findings) {
    if !input.has_any(|c| code_sets::is_diagnostic_cath(c) || code_sets::is_pci(c)) {
        return;
    }
    for cv in input.matching(|c| contains(code_sets::CARDIOVERSION, c)) {
        let kind = if cv == "92960" { "External" } else { "Internal" };
        findings.warn(format!(
            "{kind} cardioversion ({cv}) billed with catheterization/PCI codes on same charge. If performed during the cath lab case, ensure documentation supports a separately identifiable cardioversion service with its own medical necessity."
        ));
    }
}

pub(super) fn structural_tee(input: &EvalInput<'_>, findings: &mut Findings) {
    if !input.has_any(|c| contains(code_sets::STRUCTURAL_EXPECTING_TEE, c)) {
        return;
    }
    let structural_tee = input.has(code_sets::STRUCTURAL_TEE);
    let generic_tee = input.has_any(|c| contains(code_sets::GENERIC_TEE, c));

    if generic_tee && !structural_tee {
        findings.warn(
            "Structural procedure billed with generic TEE code instead of 93355 (3D TEE for structural intervention). For intraprocedural structural guidance, 93355 is the appropriate code and provides higher reimbursement.",
        );
    }
    if !structural_tee && !generic_tee {
        findings.warn(
            "Structural procedure billed without TEE guidance code. If intraprocedural TEE was performed for guidance, ensure 93355 (3D TEE structural) is captured. This is a commonly missed billable component.",
        );
    }
}

pub(super) fn imaging_without_pci(input: &EvalInput<'_>, findings: &mut Findings) {
    let imaging = |c: &str| contains(code_sets::INTRAVASCULAR_IMAGING, c);
    if input.has_any(|c| code_sets::is_pci(c) && !imaging(c)) {
        return;
    }
    for code in input.matching_unique(imaging) {
        let kind = match code {
            "92978" | "92979" => "IVUS",
            "93571" | "93572" => "FFR/CFR",
            _ => "OCT",
        };
        findings.warn(format!(
            "{kind} ({code}) billed without a PCI code on this charge. If intervention was deferred based on imaging results, document the specific findings (e.g., FFR >0.80) and clinical rationale for deferral to support medical necessity."
        ));
    }
}

#[cfg(test)]
mod tests {
    use crate::config::CoreConfig;
    use crate::pipeline::{evaluate, ChargeContext};
    use crate::result::{Confidence, ValidationResult};
    use crate::selection::{ChargeSelection, SelectedCode};
    use rule_tables::builtin_tables;

    fn run(codes: &[&str]) -> ValidationResult {
        let sel = ChargeSelection::from_codes(codes.iter().map(|c| SelectedCode::new(*c)).collect())
            .with_diagnoses(vec!["I25.10".into()]);
        evaluate(builtin_tables(), &CoreConfig::default(), &sel, &ChargeContext::default())
    }

    fn rule_ids(result: &ValidationResult) -> Vec<&str> {
        result.suggestions.iter().map(|s| s.rule_id.as_str()).collect()
    }

    #[test]
    fn conflicting_modifiers_are_errors() {
        let sel = ChargeSelection::from_codes(vec![SelectedCode::with_modifiers(
            "93306",
            vec!["-26".into(), "TC".into()],
        )]);
        let result = evaluate(
            builtin_tables(),
            &CoreConfig::default(),
            &sel,
            &ChargeContext::default(),
        );
        assert!(result.errors.iter().any(|e| e.contains("-26 and -TC")));
    }

    #[test]
    fn diagnostic_cath_with_pci_gets_59_once() {
        let result = run(&["93458", "92928"]);
        let cath: Vec<_> = result
            .suggestions
            .iter()
            .filter(|s| s.code == "93458" && s.modifier.as_deref() == Some("-59"))
            .collect();
        assert_eq!(cath.len(), 1);
        assert!(cath[0].auto_applied);
        assert!(result.warnings.iter().any(|w| w.starts_with("Diagnostic cath + PCI")));
    }

    #[test]
    fn orphaned_add_on_is_an_error() {
        let result = run(&["92978"]);
        assert!(result
            .errors
            .iter()
            .any(|e| e.starts_with("Add-on code 92978 requires a primary code")));
    }

    #[test]
    fn add_on_with_primary_is_fine() {
        let result = run(&["92928", "92978"]);
        assert!(!result.errors.iter().any(|e| e.starts_with("Add-on code")));
    }

    #[test]
    fn sedation_with_inherent_procedure_is_an_error() {
        let inherent = crate::code_sets::SEDATION_INHERENT[0];
        let result = run(&[inherent, "99152"]);
        assert!(result
            .errors
            .iter()
            .any(|e| e.starts_with("Sedation code 99152 cannot be billed separately")));
    }

    #[test]
    fn coronary_angiography_codes_are_exclusive() {
        let result = run(&["93454", "93455"]);
        assert!(result
            .errors
            .iter()
            .any(|e| e.starts_with("Coronary angiography codes 93454, 93455")));
    }

    #[test]
    fn ep_study_bundles_into_ablation() {
        let result = run(&["93653", "93619"]);
        assert!(result
            .errors
            .iter()
            .any(|e| e.starts_with("EP study code 93619 is bundled into ablation code 93653")));
    }

    #[test]
    fn peripheral_territory_allows_one_primary() {
        let result = run(&["37254", "37256"]);
        assert!(result
            .errors
            .iter()
            .any(|e| e.starts_with("Multiple primary Iliac intervention codes")));
    }

    #[test]
    fn imaging_without_pci_warns() {
        let result = run(&["93571"]);
        assert!(result.warnings.iter().any(|w| w.starts_with("FFR/CFR (93571)")));
        let with_pci = run(&["92928", "93571"]);
        assert!(!with_pci.warnings.iter().any(|w| w.starts_with("FFR/CFR")));
    }

    #[test]
    fn prof_tech_hint_is_optional() {
        let result = run(&["93306"]);
        let hint = result
            .suggestions
            .iter()
            .find(|s| s.rule_id == "prof-tech-split-26")
            .unwrap();
        assert_eq!(hint.confidence, Confidence::Optional);
        assert_eq!(result.actionable_suggestions().count(), 0);
    }

    #[test]
    fn discharge_with_procedure_needs_25() {
        let result = run(&["99238", "93306"]);
        assert!(rule_ids(&result).contains(&"em-plus-procedure-25"));
        // The E/M module already covered the discharge code.
        assert!(!rule_ids(&result).contains(&"discharge-plus-procedure-25"));
    }

    #[test]
    fn multiple_domains_suggest_51_on_secondary() {
        let result = run(&["93306", "92928"]);
        let s = result
            .suggestions
            .iter()
            .find(|s| s.rule_id == "multiple-procedure-51")
            .unwrap();
        assert_eq!(s.code, "92928");
    }
}
