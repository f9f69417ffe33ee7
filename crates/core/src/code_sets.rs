//! Static cardiology code tables used by the classifier and the rule pipeline.
//!
//! Responsibilities:
//! - Hold the code families each pipeline module inspects (domain membership, add-on primaries,
//!   exclusion pairs, hierarchies, thresholds, coverage rules).
//! - Offer small lookup helpers so rule modules read as predicates rather than slice scans.
//!
//! Notes:
//! - These tables describe coding structure rather than payer policy, so they are compiled in.
//!   Payer-swappable data (bundling pairs, modifier definitions, diagnosis rules, the selectable
//!   catalog) lives in the `rule-tables` crate.
//! - All codes are stored in normalised form (uppercase, no modifier).

// ============================================================================
// Domain membership
// ============================================================================

/// Numeric span of the evaluation and management family.
pub const EM_RANGE: (u32, u32) = (99202, 99499);

/// Inpatient E/M codes recognised even if the numeric range were narrowed.
pub const SPECIFIC_EM: &[&str] = &[
    "99221", "99222", "99223", "99231", "99232", "99233", "99224", "99225", "99226", "99238",
    "99239", "99251", "99252", "99253", "99254", "99255", "99291", "99292", "99354", "99355",
    "99356", "99357", "99417",
];

pub const DIAGNOSTIC_CATH: &[&str] = &[
    "93451", "93452", "93453", "93454", "93455", "93456", "93457", "93458", "93459", "93460",
    "93461",
];

pub const PCI: &[&str] = &[
    "92920", "92924", "92928", "92930", "92933", "92937", "92941", "92943", "92945", "0913T",
    "0914T", "92972", "92973", "92974", "92978", "92979", "93571", "93572", "0523T", "0524T",
];

/// Echo family. Cardioversion is grouped here.
pub const ECHO: &[&str] = &[
    "93306", "93307", "93308", "93303", "93304", "93320", "93321", "93325", "93352", "93356",
    "76376", "76377", "93312", "93313", "93314", "93315", "93316", "93317", "93318", "93355",
    "93350", "93351", "93662", "92960", "92961",
];

/// Electrophysiology, including pacemaker, ICD, CRT and loop recorder work.
pub const EP: &[&str] = &[
    "93600", "93602", "93603", "93609", "93610", "93612", "93613", "93618", "93619", "93620",
    "93621", "93622", "93623", "93624", "93631", "93640", "93641", "93642", "93650", "93653",
    "93654", "93655", "93656", "93657", "33206", "33207", "33208", "33212", "33213", "33227",
    "33228", "33229", "33249", "33230", "33231", "33240", "33262", "33263", "33264", "33224",
    "33225", "33226", "33274", "33275", "33270", "33271", "33272", "33273", "33214", "33215",
    "33216", "33217", "33218", "33220", "33221", "33222", "33223", "33234", "33235", "33241",
    "33244", "33285", "33286", "95921", "95922", "95924",
];

pub const PERIPHERAL_DX: &[&str] = &[
    "36200", "36245", "36246", "36247", "36248", "36215", "36216", "36217", "36010", "36011",
    "36012", "75600", "75605", "75625", "75630", "75676", "75680", "75710", "75716", "75722",
    "75724", "75726", "75736", "75774", "75820", "75822", "75825", "75827", "36221", "36222",
    "36223", "36224", "36225", "36226", "36227", "36228",
];

/// Peripheral intervention codes outside the 37254-37299 territory span.
pub const PERIPHERAL_INT: &[&str] = &[
    "37246", "37247", "37248", "37249", "0338T", "0339T", "37220", "37221", "37236", "37237",
    "37215", "37216", "37217", "37218", "37191", "37192", "37193", "37238", "37239", "37187",
    "37188", "37211", "37212", "37213", "37214", "37184", "37185", "37186", "37241", "37242",
    "37226", "37227", "37197",
];

/// Lower-extremity territory interventions (iliac through inframalleolar).
pub const PERIPHERAL_TERRITORY_RANGE: (u32, u32) = (37254, 37299);

pub const STRUCTURAL: &[&str] = &[
    "33361", "33362", "33363", "33364", "33365", "33366", "33367", "33368", "33369", "92986",
    "92987", "92990", "93580", "93581", "93582", "93583", "93590", "93591", "33340", "33418",
    "33419", "0569T", "0570T", "34701", "34702", "34703", "34704", "34705", "34706", "34707",
    "34708", "34709", "34710", "34711", "34712", "34713", "34714", "34808", "34812", "34820",
    "34833", "34834", "34717", "34718", "0254T", "0255T", "33880", "33881", "33883", "33884",
    "33886", "33889", "33891",
];

/// Mechanical circulatory support.
pub const MCS: &[&str] = &[
    "33990", "33991", "33995", "33992", "33993", "33946", "33947", "33948", "33949", "33951",
    "33952", "33989",
];

// ============================================================================
// Component, laterality and add-on structure
// ============================================================================

/// Codes with separate professional and technical components.
pub const PROF_TECH: &[&str] = &[
    "93306", "93307", "93308", "93303", "93304", "93320", "93321", "93325", "93312", "93314",
    "93315", "93317", "93350", "93351", "75600", "75605", "75625", "75630", "75676", "75680",
    "75710", "75716", "75722", "75724", "75726", "75736", "75774", "75820", "75822", "75825",
    "75827", "76376", "76377",
];

pub const BILATERAL: &[&str] = &["75716", "75724", "0339T", "75822"];

pub const LATERALITY: &[&str] = &["93451", "93452", "75710", "75722", "75820", "0338T"];

const PCI_BASE_PRIMARIES: &[&str] = &[
    "92920", "92924", "92928", "92930", "92933", "92937", "92941", "92943", "92945",
];

const IMAGING_PRIMARIES: &[&str] = &[
    "92920", "92924", "92928", "92930", "92933", "92937", "92941", "92943", "92945", "93451",
    "93452", "93453", "93454", "93455", "93456", "93457", "93458", "93459", "93460", "93461",
];

const ECHO_DOPPLER_PRIMARIES: &[&str] = &[
    "93303", "93304", "93306", "93307", "93308", "93312", "93314", "93315",
];

const EP_MAPPING_PRIMARIES: &[&str] = &["93619", "93620", "93653", "93654", "93656"];

const CATH_ADD_ON_PRIMARIES: &[&str] = &[
    "93451", "93452", "93453", "93458", "93459", "93460", "93461",
];

/// Add-on code and the primaries any one of which makes it billable.
pub const ADD_ON_PRIMARIES: &[(&str, &[&str])] = &[
    ("92972", PCI_BASE_PRIMARIES),
    ("92973", PCI_BASE_PRIMARIES),
    ("92974", PCI_BASE_PRIMARIES),
    ("0914T", &["92920", "92924", "92928", "92930", "92933", "0913T"]),
    ("92978", IMAGING_PRIMARIES),
    ("93571", IMAGING_PRIMARIES),
    ("0523T", IMAGING_PRIMARIES),
    ("92979", &["92978"]),
    ("93572", &["93571"]),
    ("0524T", &["0523T"]),
    ("93320", ECHO_DOPPLER_PRIMARIES),
    ("93321", ECHO_DOPPLER_PRIMARIES),
    (
        "93325",
        &[
            "93303", "93304", "93306", "93307", "93308", "93312", "93314", "93315", "93350",
            "93351",
        ],
    ),
    ("93352", &["93306", "93303", "93304", "93312", "93314", "93350", "93351"]),
    ("93356", &["93306", "93303", "93304"]),
    ("76376", &["93306", "93303", "93312", "93314"]),
    ("76377", &["93306", "93303", "93312", "93314"]),
    ("93313", &["93312", "93314"]),
    ("93316", &["93315"]),
    ("93317", &["93315"]),
    ("93318", &["93312", "93314", "93315"]),
    ("93355", &["93312", "93314"]),
    ("93621", EP_MAPPING_PRIMARIES),
    ("93622", EP_MAPPING_PRIMARIES),
    ("93623", EP_MAPPING_PRIMARIES),
    ("93655", &["93653", "93654", "93656"]),
    ("93657", &["93656"]),
    (
        "93662",
        &[
            "93653", "93654", "93656", "93619", "93620", "93580", "93581", "93582", "93590",
            "33340", "33361", "33362", "33363", "33364", "33365", "33366", "33418", "33419",
            "0569T",
        ],
    ),
    ("93462", CATH_ADD_ON_PRIMARIES),
    ("93463", CATH_ADD_ON_PRIMARIES),
    ("93464", CATH_ADD_ON_PRIMARIES),
    ("93566", CATH_ADD_ON_PRIMARIES),
    ("93567", CATH_ADD_ON_PRIMARIES),
    ("93568", CATH_ADD_ON_PRIMARIES),
    ("99292", &["99291"]),
    ("99355", &["99354"]),
    ("99357", &["99356"]),
    ("33225", &["33206", "33207", "33208", "33224", "33249"]),
];

// ============================================================================
// Exclusions and hierarchies
// ============================================================================

/// Two echo codes that may not be billed together, with the reason shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoExclusion {
    pub first: &'static str,
    pub second: &'static str,
    pub reason: &'static str,
}

impl EchoExclusion {
    /// Whether this exclusion links `a` and `b` in either order.
    pub fn links(&self, a: &str, b: &str) -> bool {
        (self.first == a && self.second == b) || (self.first == b && self.second == a)
    }
}

const fn exclusion(
    first: &'static str,
    second: &'static str,
    reason: &'static str,
) -> EchoExclusion {
    EchoExclusion {
        first,
        second,
        reason,
    }
}

pub const ECHO_EXCLUSIONS: &[EchoExclusion] = &[
    exclusion("93306", "93307", "Complete TTE with Doppler (93306) and TTE without Doppler (93307) are mutually exclusive. Use 93306 if Doppler was performed"),
    exclusion("93306", "93303", "Complete TTE with Doppler (93306) includes components of initial TTE (93303). Bill the more comprehensive code"),
    exclusion("93303", "93304", "Initial TTE (93303) and follow-up TTE (93304) cannot be billed together same session"),
    exclusion("93306", "93304", "Complete TTE with Doppler (93306) and follow-up TTE (93304) cannot be billed together"),
    exclusion("93350", "93351", "Stress echo without Doppler (93350) and stress echo with Doppler (93351) are mutually exclusive"),
    exclusion("93312", "93314", "Standard TEE (93312) and TEE with probe placement (93314) are mutually exclusive"),
    exclusion("93306", "93350", "Complete TTE with Doppler (93306) and stress echo (93350): resting echo images are included in the stress echo. Bill the stress echo code only unless the resting TTE was a distinct, separately indicated study (requires -59 with documentation)."),
    exclusion("93306", "93351", "Complete TTE with Doppler (93306) and stress echo with Doppler (93351): resting echo with Doppler is included in 93351. Bill 93351 only unless the resting TTE was a distinct study (requires -59)."),
    exclusion("93307", "93350", "TTE without Doppler (93307) and stress echo (93350): resting echo is included in stress echo."),
    exclusion("93307", "93351", "TTE without Doppler (93307) and stress echo with Doppler (93351): resting echo is included in stress echo."),
    exclusion("93303", "93350", "Initial TTE (93303) and stress echo (93350): resting echo is included in stress echo."),
    exclusion("93303", "93351", "Initial TTE (93303) and stress echo with Doppler (93351): resting echo is included in stress echo."),
    exclusion("93304", "93351", "Follow-up TTE (93304) and stress echo with Doppler (93351): resting echo components are included in stress echo."),
];

/// Procedures bundled into critical care time.
pub const CRITICAL_CARE_BUNDLED: &[&str] = &["93503", "92950", "36000", "36140", "36410", "36600"];

/// Procedures that include moderate sedation.
pub const SEDATION_INHERENT: &[&str] = &[
    "93451", "93452", "93453", "93454", "93455", "93456", "93457", "93458", "93459", "93460",
    "93461", "92920", "92924", "92928", "92930", "92933", "92937", "92941", "92943", "92945",
    "93653", "93654", "93656", "93619", "93620", "33206", "33207", "33208", "33212", "33213",
    "33249", "33230", "33231", "33240", "33262", "33263", "33264", "33270", "33271", "33274",
    "33275", "93312", "93314", "93315", "92960", "92961", "33361", "33362", "33363", "33364",
    "33365", "33366", "93580", "93581", "93582", "93583", "93590", "93591", "33340", "33990",
    "33991", "33995", "33946", "33947", "92986", "92987", "92990", "37220", "37221", "37224",
    "37225", "37226", "37227", "37228", "37229", "37230", "37231", "37236", "37237", "37238",
    "37239",
];

pub const SEDATION: &[&str] = &["99152", "99153", "99155", "99156", "99157"];

/// A higher-order code that includes lower-order codes from the same family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hierarchy {
    pub higher: &'static str,
    pub includes: &'static [&'static str],
    pub description: &'static str,
}

/// Selective catheter placement orders.
pub const CATHETER_HIERARCHY: &[Hierarchy] = &[
    Hierarchy { higher: "36247", includes: &["36245", "36246"], description: "3rd order selective (36247) includes 1st (36245) and 2nd (36246) order in same vascular family" },
    Hierarchy { higher: "36246", includes: &["36245"], description: "2nd order selective (36246) includes 1st order (36245) in same vascular family" },
    Hierarchy { higher: "36224", includes: &["36222", "36223"], description: "Cerebrovascular selective cath (36224) includes cervicocerebral arch (36222) and 3rd order cerebral (36223)" },
    Hierarchy { higher: "36223", includes: &["36222"], description: "Cervicocerebral 3rd order (36223) includes arch study (36222)" },
    Hierarchy { higher: "36217", includes: &["36215", "36216"], description: "3rd order arterial selective (36217) includes 1st (36215) and 2nd (36216) order" },
    Hierarchy { higher: "36216", includes: &["36215"], description: "2nd order arterial selective (36216) includes 1st order (36215)" },
    Hierarchy { higher: "36012", includes: &["36010", "36011"], description: "2nd+ order venous selective (36012) includes 1st (36010) and main branch (36011)" },
    Hierarchy { higher: "36011", includes: &["36010"], description: "Venous first order branch (36011) includes main venous access (36010)" },
];

/// Diagnostic heart catheterisation combinations.
pub const DIAGNOSTIC_CATH_HIERARCHY: &[Hierarchy] = &[
    Hierarchy { higher: "93453", includes: &["93451", "93452"], description: "Combined R+L heart cath includes right (93451) and left (93452) heart cath" },
    Hierarchy { higher: "93456", includes: &["93454", "93451"], description: "Coronary angio + right heart cath includes standalone right cath (93451) and angio-only (93454)" },
    Hierarchy { higher: "93457", includes: &["93454", "93451", "93455", "93456"], description: "Coronary angio + bypasses + right heart cath includes all lower cath combinations" },
    Hierarchy { higher: "93458", includes: &["93454", "93452"], description: "Coronary angio + left heart cath includes standalone left cath (93452) and angio-only (93454)" },
    Hierarchy { higher: "93459", includes: &["93454", "93452", "93455", "93458"], description: "Coronary angio + left + bypasses includes left cath and angio combinations" },
    Hierarchy { higher: "93460", includes: &["93454", "93451", "93452", "93453", "93456", "93458"], description: "Coronary angio + combined R+L includes all standalone and combination cath codes" },
    Hierarchy { higher: "93461", includes: &["93454", "93451", "93452", "93453", "93455", "93456", "93457", "93458", "93459", "93460"], description: "Coronary angio + combined R+L + bypasses includes all cath codes" },
];

/// Only one coronary angiography code may be billed per session.
pub const CORONARY_ANGIO: &[&str] = &[
    "93454", "93455", "93456", "93457", "93458", "93459", "93460", "93461",
];

/// Supervision and interpretation code with the catheter placements it pairs with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SiPairing {
    pub code: &'static str,
    pub required_caths: &'static [&'static str],
    pub territory: &'static str,
}

const AORTIC_CATHS: &[&str] = &["36200", "36245", "36246", "36247"];
const EXTREMITY_CATHS: &[&str] = &["36245", "36246", "36247", "36248"];
const SELECTIVE_CATHS: &[&str] = &["36245", "36246", "36247"];
const CEREBRAL_CATHS: &[&str] = &["36222", "36223", "36224", "36225", "36226", "36227", "36228"];
const VENOUS_CATHS: &[&str] = &["36010", "36011", "36012"];

pub const SI_PAIRINGS: &[SiPairing] = &[
    SiPairing { code: "75600", required_caths: AORTIC_CATHS, territory: "Thoracic aorta" },
    SiPairing { code: "75605", required_caths: AORTIC_CATHS, territory: "Thoracic aorta" },
    SiPairing { code: "75625", required_caths: AORTIC_CATHS, territory: "Abdominal aorta" },
    SiPairing { code: "75630", required_caths: AORTIC_CATHS, territory: "Abdominal aorta" },
    SiPairing { code: "75710", required_caths: EXTREMITY_CATHS, territory: "Extremity arterial (unilateral)" },
    SiPairing { code: "75716", required_caths: EXTREMITY_CATHS, territory: "Extremity arterial (bilateral)" },
    SiPairing { code: "75722", required_caths: SELECTIVE_CATHS, territory: "Renal (unilateral)" },
    SiPairing { code: "75724", required_caths: SELECTIVE_CATHS, territory: "Renal (bilateral)" },
    SiPairing { code: "75726", required_caths: SELECTIVE_CATHS, territory: "Visceral/mesenteric" },
    SiPairing { code: "75736", required_caths: SELECTIVE_CATHS, territory: "Pelvic" },
    SiPairing { code: "75676", required_caths: CEREBRAL_CATHS, territory: "Carotid/cerebrovascular" },
    SiPairing { code: "75680", required_caths: CEREBRAL_CATHS, territory: "Carotid/cerebrovascular" },
    SiPairing { code: "75820", required_caths: VENOUS_CATHS, territory: "Venous (unilateral extremity)" },
    SiPairing { code: "75822", required_caths: VENOUS_CATHS, territory: "Venous (bilateral extremity)" },
    SiPairing { code: "75825", required_caths: VENOUS_CATHS, territory: "Venous (IVC/iliac)" },
    SiPairing { code: "75827", required_caths: VENOUS_CATHS, territory: "Venous (SVC/innominate)" },
    SiPairing { code: "75774", required_caths: EXTREMITY_CATHS, territory: "Additional selective injection" },
];

/// Lower-extremity intervention territory: one primary code, add-ons for extra vessels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeripheralTerritory {
    pub name: &'static str,
    pub primary: &'static [&'static str],
    pub add_on: &'static [&'static str],
}

pub const PERIPHERAL_TERRITORIES: &[PeripheralTerritory] = &[
    PeripheralTerritory {
        name: "Iliac",
        primary: &["37254", "37256", "37258", "37260"],
        add_on: &["37255", "37257", "37259", "37261", "37262"],
    },
    PeripheralTerritory {
        name: "Femoral/Popliteal",
        primary: &["37263", "37265", "37267", "37269", "37271", "37273", "37275", "37277"],
        add_on: &[
            "37264", "37266", "37268", "37270", "37272", "37274", "37276", "37278", "37279",
        ],
    },
    PeripheralTerritory {
        name: "Tibial/Peroneal",
        primary: &["37280", "37282", "37284", "37286", "37288", "37290", "37292", "37294"],
        add_on: &["37281", "37283", "37285", "37287", "37289", "37291", "37293", "37295"],
    },
    PeripheralTerritory {
        name: "Inframalleolar",
        primary: &["37296", "37298"],
        add_on: &["37297", "37299"],
    },
];

/// Ablation codes that bundle the comprehensive EP study.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AblationBundle {
    pub ablation: &'static str,
    pub bundled: &'static [&'static str],
    pub description: &'static str,
}

pub const ABLATION_BUNDLES: &[AblationBundle] = &[
    AblationBundle { ablation: "93653", bundled: &["93619", "93620", "93600"], description: "SVT/AVNRT/AVRT ablation bundles comprehensive EP study" },
    AblationBundle { ablation: "93654", bundled: &["93619", "93620", "93600"], description: "VT ablation bundles comprehensive EP study" },
    AblationBundle { ablation: "93656", bundled: &["93619", "93620", "93621", "93622"], description: "AFib ablation bundles comprehensive EP study + mapping" },
];

pub const ABLATION: &[&str] = &["93653", "93654", "93655", "93656", "93657"];

pub const EP_STUDY: &[&str] = &["93619", "93620"];

pub const GENERATOR_CHANGE: &[&str] = &[
    "33227", "33228", "33229", "33262", "33263", "33264", "33230", "33231",
];

pub const DE_NOVO_IMPLANT: &[&str] = &["33206", "33207", "33208", "33240", "33249", "33274"];

/// 3D TEE for structural intervention.
pub const STRUCTURAL_TEE: &str = "93355";

pub const GENERIC_TEE: &[&str] = &["93312", "93314", "93315"];

pub const STRUCTURAL_EXPECTING_TEE: &[&str] = &[
    "33361", "33362", "33363", "33364", "33365", "33366", "93580", "93581", "93582", "33340",
    "93590", "33418", "33419", "0569T", "0570T",
];

// ============================================================================
// Small code families
// ============================================================================

pub const DISCHARGE: &[&str] = &["99238", "99239"];
pub const CRITICAL_CARE: &[&str] = &["99291", "99292"];
pub const PERICARDIOCENTESIS: &[&str] = &["33016", "33017"];
pub const CONSULT: &[&str] = &["99251", "99252", "99253", "99254", "99255"];
pub const INITIAL_HOSPITAL: &[&str] = &["99221", "99222", "99223"];
pub const SUBSEQUENT_HOSPITAL: &[&str] = &["99231", "99232", "99233"];
pub const CARDIOVERSION: &[&str] = &["92960", "92961"];
pub const INTRAVASCULAR_IMAGING: &[&str] = &["92978", "92979", "93571", "93572", "0523T", "0524T"];

/// Base PCI codes, each a distinct intervention.
pub const BASE_PCI: &[&str] = &[
    "92920", "92924", "92928", "92930", "92933", "92937", "92941", "92943", "92945", "0913T",
];

/// Coronary vessel tag to territory name.
pub const CORONARY_TERRITORIES: &[(&str, &str)] = &[
    ("LD", "LAD"),
    ("LC", "LCx"),
    ("RC", "RCA"),
    ("LM", "Left Main"),
    ("RI", "Ramus"),
];

// ============================================================================
// Time thresholds and E/M families
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeThreshold {
    pub code: &'static str,
    pub min_minutes: u32,
    pub max_minutes: Option<u32>,
    pub label: &'static str,
}

const fn threshold(code: &'static str, min_minutes: u32, label: &'static str) -> TimeThreshold {
    TimeThreshold {
        code,
        min_minutes,
        max_minutes: None,
        label,
    }
}

pub const EM_TIME_THRESHOLDS: &[TimeThreshold] = &[
    threshold("99221", 40, "Initial hospital care, low complexity"),
    threshold("99222", 55, "Initial hospital care, moderate complexity"),
    threshold("99223", 75, "Initial hospital care, high complexity"),
    threshold("99231", 25, "Subsequent hospital care, low complexity"),
    threshold("99232", 35, "Subsequent hospital care, moderate complexity"),
    threshold("99233", 50, "Subsequent hospital care, high complexity"),
    TimeThreshold { code: "99238", min_minutes: 0, max_minutes: Some(30), label: "Discharge day, ≤30 min" },
    threshold("99239", 31, "Discharge day, >30 min"),
    threshold("99251", 20, "Consult, straightforward"),
    threshold("99252", 40, "Consult, low complexity"),
    threshold("99253", 55, "Consult, moderate complexity"),
    threshold("99254", 80, "Consult, moderate-high complexity"),
    threshold("99255", 110, "Consult, high complexity"),
    TimeThreshold { code: "99291", min_minutes: 30, max_minutes: Some(74), label: "Critical care, first 30-74 min" },
    threshold("99234", 45, "Observation same-day, low complexity"),
    threshold("99235", 70, "Observation same-day, moderate complexity"),
    threshold("99236", 90, "Observation same-day, high complexity"),
    threshold("99224", 25, "Observation subsequent, low complexity"),
    threshold("99225", 35, "Observation subsequent, moderate complexity"),
    threshold("99226", 50, "Observation subsequent, high complexity"),
    threshold("99354", 60, "Prolonged outpatient, first hour"),
    threshold("99355", 30, "Prolonged outpatient, each additional 30 min"),
    threshold("99356", 60, "Prolonged inpatient, first hour"),
    threshold("99357", 30, "Prolonged inpatient, each additional 30 min"),
];

/// E/M codes ordered from lowest to highest level within a family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmFamily {
    pub family: &'static str,
    pub codes: &'static [&'static str],
}

pub const EM_LEVEL_FAMILIES: &[EmFamily] = &[
    EmFamily { family: "Initial Hospital Care", codes: &["99221", "99222", "99223"] },
    EmFamily { family: "Subsequent Hospital Care", codes: &["99231", "99232", "99233"] },
    EmFamily { family: "Discharge Management", codes: &["99238", "99239"] },
    EmFamily { family: "Inpatient Consult", codes: &["99251", "99252", "99253", "99254", "99255"] },
    EmFamily { family: "Observation Same-Day", codes: &["99234", "99235", "99236"] },
    EmFamily { family: "Observation Subsequent", codes: &["99224", "99225", "99226"] },
];

// ============================================================================
// Global periods, category III and retired codes
// ============================================================================

pub const GLOBAL_PERIOD_DAYS: &[(&str, u32)] = &[
    ("33206", 90), ("33207", 90), ("33208", 90), ("33212", 90), ("33213", 90),
    ("33227", 90), ("33228", 90), ("33229", 90), ("33249", 90), ("33230", 90),
    ("33231", 90), ("33240", 90), ("33262", 90), ("33263", 90), ("33264", 90),
    ("33224", 90), ("33225", 90), ("33226", 90), ("33274", 90), ("33275", 90),
    ("33270", 90), ("33271", 90), ("33272", 90), ("33273", 90),
    ("33361", 90), ("33362", 90), ("33363", 90), ("33364", 90), ("33365", 90), ("33366", 90),
    ("34701", 90), ("34702", 90), ("34703", 90), ("34704", 90), ("34705", 90), ("34706", 90),
    ("33880", 90), ("33881", 90), ("33883", 90), ("33884", 90), ("33886", 90),
    ("33234", 90), ("33235", 90), ("33241", 90), ("33244", 90),
    ("33214", 90), ("33215", 90), ("33216", 90), ("33217", 90), ("33218", 90),
    ("33220", 90), ("33221", 90), ("33222", 90), ("33223", 90),
    ("33285", 10), ("33286", 10),
    ("33016", 0), ("33017", 0),
    ("33340", 0),
];

/// Category III codes with a specific reimbursement note.
pub const CATEGORY_III_NOTES: &[(&str, &str)] = &[
    ("0913T", "Drug-coated balloon (DCB), coronary: limited payer coverage, verify authorization"),
    ("0914T", "DCB add-on vessel: limited payer coverage, verify authorization"),
    ("0523T", "Coronary OCT, initial vessel: limited payer coverage, some commercial plans cover"),
    ("0524T", "Coronary OCT, additional vessel: limited payer coverage"),
    ("0338T", "Renal denervation, unilateral: investigational, most payers deny"),
    ("0339T", "Renal denervation, bilateral: investigational, most payers deny"),
    ("0569T", "Transcatheter tricuspid valve repair (TTVR): limited coverage, check payer policy"),
    ("0570T", "TTVR additional prosthesis: limited coverage, check payer policy"),
    ("0254T", "Iliac bifurcation endograft: limited coverage"),
    ("0255T", "Iliac bifurcation endograft add-on: limited coverage"),
];

pub const RETIRED_CODES: &[(&str, &str)] = &[
    ("75962", "Transluminal balloon angioplasty, peripheral: replaced by territory-specific codes (37246-37249)"),
    ("75964", "Transluminal balloon angioplasty, each additional vessel: replaced by territory-specific add-on codes"),
    ("75966", "Transluminal balloon angioplasty, renal: replaced by 37246-37249"),
    ("75968", "Transluminal balloon angioplasty, each additional renal: replaced by territory-specific codes"),
    ("35476", "Transluminal balloon angioplasty, venous: replaced by 37248-37249"),
    ("37205", "Transcatheter stent placement, arterial: replaced by territory-specific codes (37236-37239)"),
    ("37206", "Transcatheter stent placement, each additional: replaced by territory-specific add-on codes"),
];

// ============================================================================
// Payer gates: prior authorisation, age and coverage determinations
// ============================================================================

pub const PRIOR_AUTH: &[(&str, &str)] = &[
    ("33361", "TAVR (transfemoral): prior authorization required by all major payers"),
    ("33362", "TAVR (transapical): prior authorization required by all major payers"),
    ("33363", "TAVR (transaortic): prior authorization required by all major payers"),
    ("33364", "TAVR (transaxillary): prior authorization required by all major payers"),
    ("33365", "TAVR (transcaval): prior authorization required by all major payers"),
    ("33366", "TAVR (transcarotid): prior authorization required by all major payers"),
    ("33249", "ICD/CRT-D implant: prior authorization required by most payers"),
    ("33230", "ICD generator change: prior authorization often required"),
    ("33231", "ICD generator change, dual: prior authorization often required"),
    ("33240", "ICD implant, single lead: prior authorization required"),
    ("33270", "S-ICD implant: prior authorization required"),
    ("33271", "S-ICD generator change: prior authorization often required"),
    ("33224", "CRT upgrade: prior authorization required"),
    ("33225", "CRT LV lead placement (add-on): prior authorization via base procedure"),
    ("33274", "Leadless pacemaker implant: prior authorization required by most payers"),
    ("33234", "Lead extraction (transvenous): prior authorization required"),
    ("33235", "Lead extraction (transvenous), dual: prior authorization required"),
    ("33241", "ICD lead extraction: prior authorization required"),
    ("33244", "Lead extraction requiring thoracotomy: prior authorization required"),
    ("33990", "pVAD (Impella) insertion: prior auth for elective; emergent may be retrospective"),
    ("33991", "pVAD (Impella) removal: paired with insertion authorization"),
    ("33995", "pVAD insertion, repositioning: prior auth for elective"),
    ("33946", "ECMO initiation, VA: prior auth for elective; emergent reviewed retrospectively"),
    ("33947", "ECMO initiation, VV: prior auth for elective; emergent reviewed retrospectively"),
    ("93580", "ASD closure: prior authorization required"),
    ("93581", "VSD closure: prior authorization required"),
    ("93582", "PFO closure: prior authorization required (limited coverage)"),
    ("93590", "Paravalvular leak closure: prior authorization required for transcatheter approach"),
    ("33340", "LAA closure (Watchman): prior authorization required, Q0 modifier required (CED), dual diagnosis: AF primary + Z00.6"),
    ("33418", "Mitral valve repair (TEER/MitraClip): prior authorization required"),
    ("33419", "Mitral valve repair add-on: paired with base authorization"),
    ("0569T", "Transcatheter tricuspid valve repair: limited coverage, prior auth required where covered"),
    ("34701", "EVAR, infrarenal: prior authorization required for elective"),
    ("34702", "EVAR, infrarenal with extension: prior auth required for elective"),
    ("33880", "TEVAR, initial: prior authorization required for elective"),
    ("92924", "Coronary atherectomy: prior authorization required by some payers, especially for rotational/orbital devices"),
    ("92933", "Coronary atherectomy + stent: prior authorization may be required"),
    ("92972", "Coronary lithotripsy (IVL): prior authorization required by many payers for Shockwave device"),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AgeRestriction {
    pub codes: &'static [&'static str],
    pub min_age: Option<u32>,
    pub max_age: Option<u32>,
    pub note: &'static str,
}

pub const AGE_RESTRICTIONS: &[AgeRestriction] = &[
    AgeRestriction {
        codes: &["33249", "33230", "33231", "33240", "33262", "33263", "33264"],
        min_age: Some(18),
        max_age: None,
        note: "ICD implant: primary prevention NCD criteria validated for adults. Pediatric ICD coverage requires specific documented criteria per payer.",
    },
    AgeRestriction {
        codes: &["33361", "33362", "33363", "33364", "33365", "33366"],
        min_age: Some(18),
        max_age: None,
        note: "TAVR: FDA-approved and NCD-covered for adult patients. Not applicable to pediatric population.",
    },
    AgeRestriction {
        codes: &["33270", "33271"],
        min_age: Some(18),
        max_age: None,
        note: "Subcutaneous ICD (S-ICD): FDA-approved for adults ≥18 years. Pediatric coverage is non-standard.",
    },
    AgeRestriction {
        codes: &["33274", "33275"],
        min_age: Some(18),
        max_age: None,
        note: "Leadless pacemaker: FDA indication for adults. Pediatric use is off-label and may not be covered.",
    },
    AgeRestriction {
        codes: &["93580", "93581", "93582"],
        min_age: None,
        max_age: None,
        note: "Structural closure: ASD/VSD/PFO closure. Verify payer-specific age requirements. PFO closure (93582) typically requires age 18-60 for stroke prevention indication.",
    },
    AgeRestriction {
        codes: &["33340"],
        min_age: Some(18),
        max_age: None,
        note: "LAA closure (Watchman): NCD requires age ≥18, CHA₂DS₂-VASc score ≥3, and documented contraindication to long-term anticoagulation.",
    },
];

/// Medicare national coverage determination for a procedure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoverageRule {
    pub id: &'static str,
    pub name: &'static str,
    pub procedures: &'static [&'static str],
    pub required_prefixes: &'static [&'static str],
    pub clinical_criteria: &'static str,
    pub documentation_checklist: &'static str,
}

pub const COVERAGE_RULES: &[CoverageRule] = &[
    CoverageRule {
        id: "ncd-icd-primary",
        name: "ICD Primary Prevention (NCD 20.4)",
        procedures: &["33249", "33230", "33231", "33240", "33262", "33263", "33264"],
        required_prefixes: &["I42", "I43", "I50", "I25.5"],
        clinical_criteria: "EF ≤35% (or ≤30% for MADIT), NYHA Class II-III, on GDMT ≥3 months, ≥40 days post-MI if ischemic CMP.",
        documentation_checklist: "EF value and date, NYHA functional class, medication list showing GDMT, MI date if applicable, heart failure etiology.",
    },
    CoverageRule {
        id: "ncd-crt",
        name: "CRT Coverage (NCD 20.4)",
        procedures: &["33224", "33225", "33226"],
        required_prefixes: &["I50", "I42", "I43", "I25.5", "I44.7"],
        clinical_criteria: "LBBB with QRS ≥150ms (or 120-149ms with LBBB), EF ≤35%, NYHA Class II-IV ambulatory, sinus rhythm.",
        documentation_checklist: "QRS duration and morphology (LBBB vs non-LBBB), EF value, NYHA class, rhythm (sinus vs AF), GDMT list.",
    },
    CoverageRule {
        id: "ncd-tavr",
        name: "TAVR Coverage (NCD 20.32)",
        procedures: &["33361", "33362", "33363", "33364", "33365", "33366"],
        required_prefixes: &["I35.0", "I35.2", "I06.0", "I06.2"],
        clinical_criteria: "Severe symptomatic aortic stenosis (valve area ≤1.0 cm² or mean gradient ≥40 mmHg), heart team evaluation, intermediate/high/prohibitive surgical risk.",
        documentation_checklist: "Valve area and mean gradient, STS score or EuroSCORE, heart team conference note, symptom documentation (NYHA class), CT planning.",
    },
    CoverageRule {
        id: "ncd-ablation",
        name: "EP Ablation Coverage",
        procedures: &["93653", "93654", "93656"],
        required_prefixes: &["I47", "I48", "I49"],
        clinical_criteria: "Arrhythmia refractory to ≥1 antiarrhythmic drug (AAD), or documented AAD intolerance/contraindication.",
        documentation_checklist: "Arrhythmia type documented, AAD trial(s) with dates and outcomes, reason for failure/intolerance, EP study results if applicable.",
    },
    CoverageRule {
        id: "ncd-lead-extraction",
        name: "Lead Extraction Coverage",
        procedures: &["33234", "33235", "33241", "33244"],
        required_prefixes: &["T82.1", "T82.7", "T81.4", "T82.6", "I33", "T82.0"],
        clinical_criteria: "Documented indication: device/lead infection, lead malfunction/recall, or venous occlusion with need for venous access.",
        documentation_checklist: "Indication for extraction, blood cultures (if infection), imaging showing malfunction/occlusion, manufacturer recall notice if applicable.",
    },
    CoverageRule {
        id: "ncd-laa-closure",
        name: "LAA Closure (Watchman) Coverage (NCD 20.34)",
        procedures: &["33340"],
        required_prefixes: &["I48"],
        clinical_criteria: "Non-valvular AF, CHA₂DS₂-VASc ≥3, documented contraindication to long-term anticoagulation, heart team recommendation. Requires modifier Q0 (CMS coverage with evidence development). Must report two diagnoses: AF primary (never I48.20) + Z00.6.",
        documentation_checklist: "CHA₂DS₂-VASc score calculation, reason for anticoagulation contraindication, heart team/multidisciplinary note, AF documentation, Q0 modifier, dual diagnosis (AF + Z00.6).",
    },
    CoverageRule {
        id: "ncd-paravalvular-leak",
        name: "Paravalvular Leak Closure Coverage",
        procedures: &["93590"],
        required_prefixes: &["T82.0", "T82.5", "I38", "T82.6"],
        clinical_criteria: "Symptomatic paravalvular regurgitation post valve replacement/repair, high surgical risk for redo operation, documented hemolysis or heart failure from paravalvular leak.",
        documentation_checklist: "Prior valve surgery documentation, echo showing paravalvular leak location and severity, symptom documentation (heart failure, hemolysis), surgical risk assessment for redo.",
    },
    CoverageRule {
        id: "ncd-pfo-closure",
        name: "PFO Closure Coverage",
        procedures: &["93582"],
        required_prefixes: &["Q21.1", "I63", "G45"],
        clinical_criteria: "Age 18-60, cryptogenic stroke with PFO, neurology evaluation confirming no other stroke etiology.",
        documentation_checklist: "Stroke documentation, bubble study/TEE showing PFO, neurology clearance, hypercoagulable workup negative, age verification.",
    },
];

// ============================================================================
// Lookup helpers
// ============================================================================

/// Whether `code` is a member of `set`.
pub fn contains(set: &[&str], code: &str) -> bool {
    set.contains(&code)
}

/// Looks up the value paired with `code` in a keyed table.
pub fn lookup<T: Copy>(table: &[(&str, T)], code: &str) -> Option<T> {
    table
        .iter()
        .find(|(key, _)| *key == code)
        .map(|(_, value)| *value)
}

/// Numeric value of a fully numeric code, `None` for category III and HCPCS-style codes.
pub fn numeric_value(code: &str) -> Option<u32> {
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    code.parse().ok()
}

pub fn in_range(code: &str, (start, end): (u32, u32)) -> bool {
    numeric_value(code).is_some_and(|n| (start..=end).contains(&n))
}

pub fn add_on_primaries(code: &str) -> Option<&'static [&'static str]> {
    lookup(ADD_ON_PRIMARIES, code)
}

pub fn is_add_on(code: &str) -> bool {
    add_on_primaries(code).is_some()
}

pub fn time_threshold(code: &str) -> Option<&'static TimeThreshold> {
    EM_TIME_THRESHOLDS.iter().find(|t| t.code == code)
}

pub fn global_period(code: &str) -> Option<u32> {
    lookup(GLOBAL_PERIOD_DAYS, code)
}

/// Category III codes are four digits followed by `T`.
pub fn is_category_iii(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 5 && bytes[..4].iter().all(u8::is_ascii_digit) && bytes[4] == b'T'
}

pub fn coronary_territory(vessel: &str) -> Option<&'static str> {
    lookup(CORONARY_TERRITORIES, vessel)
}

pub fn is_discharge(code: &str) -> bool {
    contains(DISCHARGE, code)
}

pub fn is_critical_care(code: &str) -> bool {
    contains(CRITICAL_CARE, code)
}

pub fn is_diagnostic_cath(code: &str) -> bool {
    contains(DIAGNOSTIC_CATH, code)
}

pub fn is_pci(code: &str) -> bool {
    contains(PCI, code)
}

pub fn is_echo(code: &str) -> bool {
    contains(ECHO, code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_value_ignores_category_iii() {
        assert_eq!(numeric_value("99232"), Some(99232));
        assert_eq!(numeric_value("0913T"), None);
        assert!(in_range("37270", PERIPHERAL_TERRITORY_RANGE));
        assert!(!in_range("37300", PERIPHERAL_TERRITORY_RANGE));
    }

    #[test]
    fn category_iii_pattern() {
        assert!(is_category_iii("0913T"));
        assert!(is_category_iii("9999T"));
        assert!(!is_category_iii("92928"));
        assert!(!is_category_iii("091T3"));
    }

    #[test]
    fn add_on_lookup() {
        assert_eq!(add_on_primaries("99292"), Some(&["99291"][..]));
        assert!(is_add_on("93321"));
        assert!(!is_add_on("93306"));
    }

    #[test]
    fn time_thresholds_are_unique() {
        let mut codes: Vec<_> = EM_TIME_THRESHOLDS.iter().map(|t| t.code).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), EM_TIME_THRESHOLDS.len());
        assert_eq!(time_threshold("99291").and_then(|t| t.max_minutes), Some(74));
    }

    #[test]
    fn echo_exclusion_is_symmetric() {
        let pair = ECHO_EXCLUSIONS[0];
        assert!(pair.links("93306", "93307"));
        assert!(pair.links("93307", "93306"));
        assert!(!pair.links("93306", "93350"));
    }

    #[test]
    fn coronary_territory_names() {
        assert_eq!(coronary_territory("LD"), Some("LAD"));
        assert_eq!(coronary_territory("XX"), None);
    }
}
