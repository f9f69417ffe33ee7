//! Built-in rule tables shipped with the engine.
//!
//! These are the defaults used when no override file is configured. Order matters:
//! bundling pairs drive violation order and diagnosis rules are evaluated first-match.

use std::sync::LazyLock;

use billing_types::Severity;

use crate::bundling::{BundlingCategory, BundlingEditPair};
use crate::catalog::{CodeMetadata, SelectionCategory};
use crate::diagnosis::{Applicability, DiagnosisRule};
use crate::modifiers::ModifierDefinition;
use crate::tables::RuleTables;

static BUILTIN: LazyLock<RuleTables> = LazyLock::new(build);

/// Process-wide built-in tables, constructed on first use and never mutated.
pub fn builtin_tables() -> &'static RuleTables {
    &BUILTIN
}

pub(crate) fn build() -> RuleTables {
    RuleTables {
        bundling_pairs: bundling_pairs(),
        modifiers: modifiers(),
        diagnosis_rules: diagnosis_rules(),
        catalog: catalog(),
    }
}

// ============================================================================
// Bundling edits
// ============================================================================

fn pair(
    primary: &str,
    bundled: &str,
    modifier_exception: bool,
    description: &str,
    category: BundlingCategory,
) -> BundlingEditPair {
    BundlingEditPair {
        primary: primary.to_owned(),
        bundled: bundled.to_owned(),
        modifier_exception,
        description: description.to_owned(),
        category,
    }
}

fn bundling_pairs() -> Vec<BundlingEditPair> {
    use BundlingCategory::*;

    vec![
        // Cath / PCI
        pair("93458", "93454", false, "Left heart cath bundles coronary angiography supervision", CathPci),
        pair("93459", "93454", false, "Combined heart cath bundles coronary angiography supervision", CathPci),
        pair("93459", "93455", false, "Combined heart cath bundles right heart cath imaging", CathPci),
        pair("93459", "93456", false, "Combined heart cath bundles right heart cath with angiography", CathPci),
        pair("93459", "93457", false, "Combined heart cath bundles right heart cath", CathPci),
        pair("93459", "93458", false, "Combined heart cath bundles left heart cath", CathPci),
        pair("92928", "92920", false, "PCI with stent bundles PTCA", CathPci),
        pair("92933", "92920", false, "PCI with stent + atherectomy bundles PTCA", CathPci),
        pair("92937", "92920", false, "PCI with stent in bypass graft bundles PTCA", CathPci),
        pair("92928", "92924", true, "PCI with stent bundles PTCA with atherectomy (different vessel allowed)", CathPci),
        pair("92941", "92920", false, "Acute MI PCI bundles PTCA", CathPci),
        pair("92941", "92928", true, "Acute MI PCI bundles standard PCI with stent (different vessel)", CathPci),
        pair("93458", "93452", false, "Left heart cath with coronary angiography bundles left heart cath alone", CathPci),
        pair("93460", "93452", false, "Cath with injection bundles left heart cath", CathPci),
        pair("93460", "93453", false, "Cath with injection bundles combined heart cath", CathPci),
        pair("93461", "93452", false, "Cath with injection (R+L) bundles left heart cath", CathPci),
        pair("93461", "93453", false, "Cath with injection (R+L) bundles combined heart cath", CathPci),
        // Echo
        pair("93306", "93320", false, "Complete TTE with Doppler bundles separate Doppler echo", Echo),
        pair("93306", "93321", false, "Complete TTE with Doppler bundles Doppler follow-up", Echo),
        pair("93306", "93325", false, "Complete TTE with Doppler bundles Doppler color flow", Echo),
        pair("93312", "93320", false, "TEE bundles separate Doppler echo", Echo),
        pair("93312", "93325", false, "TEE bundles Doppler color flow", Echo),
        pair("93314", "93312", false, "TEE with 3D bundles standard TEE", Echo),
        pair("93351", "93350", false, "Stress echo with Doppler bundles stress echo without Doppler", Echo),
        pair("93351", "93320", false, "Stress echo with Doppler bundles separate Doppler", Echo),
        pair("93351", "93325", false, "Stress echo with Doppler bundles Doppler color flow", Echo),
        pair("93303", "93304", false, "Initial TTE bundles follow-up TTE", Echo),
        pair("93306", "93304", false, "Complete TTE Doppler bundles follow-up TTE", Echo),
        // EP
        pair("93620", "93600", false, "Comprehensive EP study bundles bundle of His recording", Ep),
        pair("93620", "93602", false, "Comprehensive EP study bundles intra-atrial recording", Ep),
        pair("93620", "93603", false, "Comprehensive EP study bundles right ventricular recording", Ep),
        pair("93620", "93610", false, "Comprehensive EP study bundles intra-atrial pacing", Ep),
        pair("93620", "93612", false, "Comprehensive EP study bundles intraventricular pacing", Ep),
        pair("93653", "93620", false, "SVT ablation bundles comprehensive EP study", Ep),
        pair("93654", "93620", false, "VT ablation bundles comprehensive EP study", Ep),
        pair("93656", "93620", false, "AFib ablation bundles comprehensive EP study", Ep),
        pair("93656", "93621", false, "AFib ablation bundles LA pacing and recording", Ep),
        pair("93656", "93622", false, "AFib ablation bundles LV pacing and recording", Ep),
        pair("93653", "93600", false, "SVT ablation bundles bundle of His recording", Ep),
        pair("93654", "93600", false, "VT ablation bundles bundle of His recording", Ep),
        // E/M + procedure
        pair("99291", "99232", true, "Critical care bundles subsequent hospital care (separate service with -25)", EmProcedure),
        pair("99291", "99233", true, "Critical care bundles subsequent hospital care (separate service with -25)", EmProcedure),
        pair("99291", "99231", true, "Critical care bundles subsequent hospital care (separate service with -25)", EmProcedure),
        pair("99291", "93458", true, "Critical care bundles left heart cath (separate service)", EmProcedure),
        pair("99291", "93459", true, "Critical care bundles combined heart cath (separate service)", EmProcedure),
        pair("99291", "92928", true, "Critical care bundles PCI with stent (separate service)", EmProcedure),
        pair("99291", "33967", true, "Critical care bundles IABP insertion (separate service)", EmProcedure),
        pair("99291", "33990", true, "Critical care bundles Impella insertion (separate service)", EmProcedure),
        // Peripheral
        pair("37228", "37226", true, "Fem/pop stent + atherectomy bundles iliac stent (different territory)", Peripheral),
        pair("37229", "37226", true, "Fem/pop stent + atherectomy bundles iliac stent", Peripheral),
        pair("37230", "37228", true, "Tibial stent bundles fem/pop stent (different territory)", Peripheral),
        pair("36247", "36245", true, "Third order selective catheterization bundles first order (same vessel)", Peripheral),
        pair("36247", "36246", true, "Third order selective catheterization bundles second order (same vessel)", Peripheral),
        pair("36248", "36246", true, "Additional second+ order catheterization bundles second order (same vessel)", Peripheral),
    ]
}

// ============================================================================
// Modifier definitions
// ============================================================================

struct ModifierSeed {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    auto_apply: bool,
    requires_review: bool,
    incompatible_with: &'static [&'static str],
    documentation: Option<&'static str>,
}

impl From<ModifierSeed> for ModifierDefinition {
    fn from(seed: ModifierSeed) -> Self {
        ModifierDefinition {
            id: seed.id.to_owned(),
            name: seed.name.to_owned(),
            description: seed.description.to_owned(),
            auto_apply: seed.auto_apply,
            requires_review: seed.requires_review,
            incompatible_with: seed.incompatible_with.iter().map(|m| (*m).to_owned()).collect(),
            documentation: seed.documentation.map(str::to_owned),
        }
    }
}

fn modifiers() -> Vec<ModifierDefinition> {
    let seeds = [
        ModifierSeed {
            id: "-25",
            name: "Significant, Separately Identifiable E/M",
            description: "E/M service performed on the same day as a procedure or other service, significant and separately identifiable",
            auto_apply: true,
            requires_review: false,
            incompatible_with: &[],
            documentation: Some("Requires separate E/M documentation: distinct history, exam, or MDM beyond the procedure. The note must demonstrate a significant, separately identifiable service."),
        },
        ModifierSeed {
            id: "-26",
            name: "Professional Component",
            description: "Professional component only (reading/interpretation), physician billing for interpretation without technical component",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-TC"],
            documentation: Some("Professional component only. Physician interpretation/report must be documented separately. Facility bills technical component (-TC)."),
        },
        ModifierSeed {
            id: "-TC",
            name: "Technical Component",
            description: "Technical component only, facility billing for equipment and technician with no professional interpretation",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-26"],
            documentation: Some("Technical component only. Facility bills equipment, supplies, and technician. Physician interpretation billed separately with -26."),
        },
        ModifierSeed {
            id: "-59",
            name: "Distinct Procedural Service",
            description: "Distinct procedural service performed on the same day, used for NCCI unbundling when procedures are truly separate",
            auto_apply: true,
            requires_review: false,
            incompatible_with: &["-XS", "-XE", "-XU"],
            documentation: Some("Requires documentation of a distinct service: different session, different procedure/surgery, different anatomical site or organ system, or separate incision/excision."),
        },
        ModifierSeed {
            id: "-XS",
            name: "Separate Structure",
            description: "Services performed on different anatomical structures (e.g., left vs right heart cath)",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-59", "-XE", "-XU"],
            documentation: None,
        },
        ModifierSeed {
            id: "-XE",
            name: "Separate Encounter",
            description: "Services performed during different encounters on the same date (e.g., morning echo + afternoon stress echo)",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-59", "-XS", "-XU"],
            documentation: None,
        },
        ModifierSeed {
            id: "-XU",
            name: "Unusual Non-Overlapping Service",
            description: "Services that do not overlap but are not typically reported together",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-59", "-XS", "-XE"],
            documentation: None,
        },
        ModifierSeed {
            id: "-76",
            name: "Repeat Procedure, Same Physician",
            description: "Repeat procedure by the same physician on the same day; medical necessity for the repeat must be documented",
            auto_apply: true,
            requires_review: true,
            incompatible_with: &["-77"],
            documentation: Some("Requires documentation that the same procedure was repeated on the same day by the same physician, with documented medical necessity for the repeat."),
        },
        ModifierSeed {
            id: "-77",
            name: "Repeat Procedure, Different Physician",
            description: "Repeat procedure by a different physician on the same day",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-76"],
            documentation: Some("Requires documentation identifying a different physician who performed the repeat procedure, with medical necessity documented."),
        },
        ModifierSeed {
            id: "-50",
            name: "Bilateral Procedure",
            description: "Same procedure performed on both sides (e.g., bilateral lower extremity angiography)",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-LT", "-RT"],
            documentation: Some("Bilateral procedure. Both sides must be documented with findings. Single operative note covering both sides is acceptable."),
        },
        ModifierSeed {
            id: "-LT",
            name: "Left Side",
            description: "Procedure performed on the left side",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-50", "-RT"],
            documentation: Some("Left side. Laterality must be documented in the operative/procedure note."),
        },
        ModifierSeed {
            id: "-RT",
            name: "Right Side",
            description: "Procedure performed on the right side",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-50", "-LT"],
            documentation: Some("Right side. Laterality must be documented in the operative/procedure note."),
        },
        ModifierSeed {
            id: "-22",
            name: "Increased Procedural Service",
            description: "Work required substantially exceeded usual. Requires operative report documentation.",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &[],
            documentation: Some("Requires detailed operative note explaining increased complexity: why the procedure was substantially more difficult than typical. Include time, findings, and technique."),
        },
        ModifierSeed {
            id: "-51",
            name: "Multiple Procedures",
            description: "Multiple procedures performed during same session; payment reduction applies to secondary/subsequent procedures",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &[],
            documentation: Some("Multiple procedures. Each procedure must be documented separately with individual medical necessity."),
        },
        ModifierSeed {
            id: "-52",
            name: "Reduced Services",
            description: "Procedure partially completed or reduced in scope; requires documentation of what was performed and why it was reduced",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-53"],
            documentation: Some("Reduced services. Document why the procedure was partially reduced or not completed as planned."),
        },
        ModifierSeed {
            id: "-53",
            name: "Discontinued Procedure",
            description: "Procedure started but discontinued due to threat to patient wellbeing; requires documentation of reason for discontinuation",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-52"],
            documentation: Some("Discontinued procedure. Document the reason for discontinuation (patient risk, equipment failure, etc.) and what portion was completed."),
        },
        ModifierSeed {
            id: "-57",
            name: "Decision for Surgery",
            description: "E/M service that resulted in the initial decision to perform a major procedure (90-day global). Use instead of -25 when the E/M led to the surgical decision.",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-25"],
            documentation: Some("Requires documentation that this E/M service resulted in the initial decision to perform surgery within the next 24 hours."),
        },
        ModifierSeed {
            id: "-24",
            name: "Unrelated E/M During Postop",
            description: "E/M service performed during a postoperative global period for a reason unrelated to the original procedure",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &[],
            documentation: Some("Requires documentation that the E/M service was for a condition UNRELATED to the original procedure during the global period."),
        },
        ModifierSeed {
            id: "-78",
            name: "Unplanned Return to OR/Cath Lab",
            description: "Unplanned return to the operating room or cath lab during the postoperative period for a procedure related to the original",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-79"],
            documentation: Some("Requires documentation of an unplanned return to the OR for a RELATED complication during the postoperative period."),
        },
        ModifierSeed {
            id: "-79",
            name: "Unrelated Procedure During Postop",
            description: "Procedure performed during the postoperative period that is unrelated to the original procedure",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-78"],
            documentation: Some("Requires documentation of an UNRELATED procedure during the postoperative period of the original surgery."),
        },
        ModifierSeed {
            id: "-62",
            name: "Two Surgeons",
            description: "Two surgeons performing distinct parts of the same procedure; each surgeon bills with -62. Requires operative notes from both.",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-80"],
            documentation: None,
        },
        ModifierSeed {
            id: "-80",
            name: "Assistant Surgeon",
            description: "Surgical assistant bills the same procedure code as the primary surgeon with -80",
            auto_apply: false,
            requires_review: true,
            incompatible_with: &["-62"],
            documentation: None,
        },
    ];

    seeds.into_iter().map(ModifierDefinition::from).collect()
}

// ============================================================================
// Diagnosis rules
// ============================================================================

fn rule(
    id: &str,
    name: &str,
    codes: &[&str],
    prefixes: &[&str],
    severity: Severity,
    message: &str,
) -> DiagnosisRule {
    DiagnosisRule {
        id: id.to_owned(),
        name: name.to_owned(),
        applicability: Applicability::Codes(codes.iter().map(|c| (*c).to_owned()).collect()),
        required_prefixes: prefixes.iter().map(|p| (*p).to_owned()).collect(),
        severity,
        message: message.to_owned(),
    }
}

fn diagnosis_rules() -> Vec<DiagnosisRule> {
    use Severity::{Error, Warning};

    let mut peripheral = rule(
        "peripheral-pvd-diagnosis",
        "Peripheral intervention requires PVD diagnosis",
        &[],
        &["I70", "I73", "I74", "I77", "I80", "I82", "I87"],
        Warning,
        "Peripheral vascular intervention should be supported by a vascular disease diagnosis (I70.x atherosclerosis, I73.x PVD, I74.x embolism).",
    );
    peripheral.applicability = Applicability::NumericRange {
        start: 37184,
        end: 37299,
    };

    vec![
        rule(
            "pci-cad-diagnosis",
            "PCI requires CAD/ACS diagnosis",
            &["92920", "92924", "92928", "92930", "92933", "92937", "92943", "92945"],
            &["I25", "I20", "I21", "I22", "I24"],
            Error,
            "PCI codes require a coronary artery disease or acute coronary syndrome diagnosis (I20-I25). Missing diagnosis is a top reason for PCI claim denial.",
        ),
        rule(
            "acute-mi-pci-diagnosis",
            "Acute MI PCI requires STEMI/NSTEMI diagnosis",
            &["92941"],
            &["I21", "I22"],
            Error,
            "Acute MI PCI (92941) requires an acute myocardial infarction diagnosis (I21.x STEMI/NSTEMI or I22.x subsequent MI). Chronic CAD (I25.x) does not support 92941.",
        ),
        rule(
            "diag-cath-cardiac-diagnosis",
            "Diagnostic cath requires cardiac indication",
            &[
                "93451", "93452", "93453", "93454", "93455", "93456", "93457", "93458", "93459",
                "93460", "93461",
            ],
            &[
                "I25", "I20", "I21", "I22", "I24", "I50", "I34", "I35", "I36", "I37", "I42", "I43",
                "I47", "I48", "I49", "Q20", "Q21", "Q22", "Q23", "Q24", "R00", "R07", "R55",
                "R94.31",
            ],
            Warning,
            "Diagnostic cardiac catheterization should be supported by a cardiac diagnosis. Verify ICD-10 code supports medical necessity.",
        ),
        rule(
            "tavr-aortic-stenosis",
            "TAVR requires aortic stenosis diagnosis",
            &["33361", "33362", "33363", "33364", "33365", "33366"],
            &["I35.0", "I35.2", "I06.0", "I06.2"],
            Error,
            "TAVR requires an aortic stenosis diagnosis (I35.0/I35.2 nonrheumatic, I06.0/I06.2 rheumatic). Missing diagnosis will result in claim denial.",
        ),
        rule(
            "pacemaker-bradycardia",
            "Pacemaker requires bradycardia/conduction diagnosis",
            &["33206", "33207", "33208", "33212", "33213"],
            &["I44", "I45", "I49.5", "R00.1"],
            Error,
            "Pacemaker implant requires a bradycardia or conduction disorder diagnosis (I44.x AV block, I45.x conduction disorder, I49.5 sick sinus, R00.1 bradycardia).",
        ),
        rule(
            "leadless-pm-diagnosis",
            "Leadless pacemaker requires bradycardia diagnosis",
            &["33274", "33275"],
            &["I44", "I45", "I49.5", "R00.1"],
            Error,
            "Leadless pacemaker requires a bradycardia or conduction disorder diagnosis.",
        ),
        rule(
            "icd-vt-vf-cmp",
            "ICD requires VT/VF or cardiomyopathy diagnosis",
            &["33249", "33230", "33231", "33240", "33262", "33263", "33264"],
            &["I42", "I43", "I47.2", "I49.01", "I46", "I50"],
            Error,
            "ICD implant requires ventricular arrhythmia (I47.2 VT, I49.01 VF), cardiomyopathy (I42.x), cardiac arrest (I46.x), or heart failure (I50.x) diagnosis.",
        ),
        rule(
            "sicd-vt-vf-diagnosis",
            "S-ICD requires VT/VF or cardiomyopathy",
            &["33270", "33271", "33272", "33273"],
            &["I42", "I43", "I47.2", "I49.01", "I46", "I50"],
            Error,
            "S-ICD requires a ventricular arrhythmia, cardiomyopathy, or heart failure diagnosis.",
        ),
        rule(
            "crt-hf-diagnosis",
            "CRT requires heart failure diagnosis",
            &["33224", "33225", "33226"],
            &["I50", "I42", "I43", "I25.5"],
            Error,
            "CRT implant requires heart failure (I50.x) or cardiomyopathy (I42.x) diagnosis with reduced EF documentation.",
        ),
        rule(
            "ep-ablation-arrhythmia",
            "EP ablation requires arrhythmia diagnosis",
            &["93653", "93654", "93655", "93656", "93657"],
            &["I47", "I48", "I49"],
            Error,
            "EP ablation requires an arrhythmia diagnosis (I47.x paroxysmal tachycardia, I48.x atrial fibrillation/flutter, I49.x other arrhythmias).",
        ),
        rule(
            "cardioversion-arrhythmia",
            "Cardioversion requires arrhythmia diagnosis",
            &["92960", "92961"],
            &["I48", "I47"],
            Warning,
            "Cardioversion should be supported by an arrhythmia diagnosis (I48.x atrial fibrillation/flutter, I47.x paroxysmal tachycardia).",
        ),
        rule(
            "echo-cardiac-indication",
            "Echo requires cardiac indication",
            &[
                "93303", "93304", "93306", "93307", "93308", "93312", "93314", "93315", "93350",
                "93351", "93355",
            ],
            &[
                "I", "R00", "R01", "R06.0", "R07", "R55", "R94.31", "Q20", "Q21", "Q22", "Q23",
                "Q24", "Q25", "Q26", "Q27", "Q28", "Z01.81", "Z13.6", "Z82.4", "Z87.7",
            ],
            Warning,
            "Echocardiogram should be supported by a cardiac diagnosis or symptom code. Verify ICD-10 supports medical necessity.",
        ),
        rule(
            "structural-closure-diagnosis",
            "Structural closure requires septal defect diagnosis",
            &["93580", "93581", "93582", "93583"],
            &["Q21", "I51.0", "Q25.0"],
            Error,
            "Structural closure (ASD/PFO/VSD) requires a septal defect diagnosis (Q21.x congenital, I51.0 acquired ASD).",
        ),
        rule(
            "mitral-repair-diagnosis",
            "Mitral valve repair requires mitral valve disorder",
            &["33418", "33419"],
            &["I34", "I05", "I08"],
            Error,
            "Mitral valve repair requires a mitral valve disorder diagnosis (I34.x nonrheumatic, I05.x rheumatic).",
        ),
        rule(
            "ttvr-diagnosis",
            "TTVR requires tricuspid valve disorder",
            &["0569T", "0570T"],
            &["I36", "I07", "Q22.4", "Q22.8"],
            Error,
            "Transcatheter tricuspid valve repair requires a tricuspid valve disorder diagnosis (I36.x nonrheumatic, I07.x rheumatic, Q22.4 congenital).",
        ),
        rule(
            "mcs-shock-hf-diagnosis",
            "MCS/ECMO requires shock or heart failure diagnosis",
            &[
                "33990", "33991", "33995", "33992", "33993", "33946", "33947", "33948", "33949",
                "33951", "33952", "33989",
            ],
            &["I50", "I21", "I46", "R57", "I40", "I51.4", "T86.2"],
            Error,
            "Mechanical circulatory support requires cardiogenic shock (R57.0), heart failure (I50.x), acute MI (I21.x), or cardiac arrest (I46.x) diagnosis.",
        ),
        peripheral,
        rule(
            "evar-aortic-diagnosis",
            "EVAR/TEVAR requires aortic diagnosis",
            &[
                "34701", "34702", "34703", "34704", "34705", "34706", "34707", "34708", "34709",
                "34710", "34711", "34712", "34713", "34714", "33880", "33881", "33883", "33884",
                "33886", "33889", "33891",
            ],
            &["I71", "I77.0", "I77.1"],
            Error,
            "Endovascular aortic repair requires an aortic aneurysm (I71.x) or aortic dissection diagnosis.",
        ),
    ]
}

// ============================================================================
// Code catalog
// ============================================================================

fn meta(code: &str, category: SelectionCategory, rvu: f64) -> CodeMetadata {
    use SelectionCategory::*;

    CodeMetadata {
        code: code.to_owned(),
        category,
        rvu,
        add_on: code == "99292" || category == Prolonged,
        time_based: matches!(category, CriticalCare | Prolonged),
        initial_encounter: matches!(category, InitialHospital | Consult),
    }
}

fn catalog() -> Vec<CodeMetadata> {
    use SelectionCategory::*;

    vec![
        meta("00000", NoCharge, 0.0),
        meta("99221", InitialHospital, 1.92),
        meta("99222", InitialHospital, 2.61),
        meta("99223", InitialHospital, 3.86),
        meta("99231", Subsequent, 0.99),
        meta("99232", Subsequent, 1.39),
        meta("99233", Subsequent, 2.00),
        meta("99234", ObservationSameDay, 2.56),
        meta("99235", ObservationSameDay, 3.41),
        meta("99236", ObservationSameDay, 4.60),
        meta("99224", ObservationSubsequent, 0.99),
        meta("99225", ObservationSubsequent, 1.39),
        meta("99226", ObservationSubsequent, 2.00),
        meta("99238", Discharge, 1.28),
        meta("99239", Discharge, 1.90),
        meta("99251", Consult, 0.99),
        meta("99252", Consult, 1.55),
        meta("99253", Consult, 2.15),
        meta("99254", Consult, 3.11),
        meta("99255", Consult, 4.00),
        meta("99291", CriticalCare, 4.50),
        meta("99292", CriticalCare, 2.25),
        meta("99354", Prolonged, 1.77),
        meta("99355", Prolonged, 1.77),
        meta("99356", Prolonged, 1.71),
        meta("99357", Prolonged, 1.71),
        meta("99417", Prolonged, 0.61),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_is_shared() {
        let a = builtin_tables() as *const RuleTables;
        let b = builtin_tables() as *const RuleTables;
        assert_eq!(a, b);
    }

    #[test]
    fn builtin_table_sizes() {
        let tables = builtin_tables();
        assert_eq!(tables.bundling_pairs.len(), 54);
        assert_eq!(tables.diagnosis_rules.len(), 18);
        assert_eq!(tables.modifiers.len(), 22);
        assert_eq!(tables.catalog.len(), 27);
    }

    #[test]
    fn first_pair_is_left_heart_cath_bundle() {
        let first = &builtin_tables().bundling_pairs[0];
        assert_eq!(first.primary, "93458");
        assert_eq!(first.bundled, "93454");
        assert!(!first.modifier_exception);
    }

    #[test]
    fn critical_care_add_on_flags() {
        let tables = builtin_tables();
        let add_on = tables.metadata("99292").expect("99292 in catalog");
        assert!(add_on.add_on);
        assert!(add_on.time_based);
        let primary = tables.metadata("99291").expect("99291 in catalog");
        assert!(!primary.add_on);
        assert!(primary.time_based);
    }

    #[test]
    fn builtin_passes_validation() {
        builtin_tables()
            .validate()
            .expect("built-in tables should validate");
    }
}
