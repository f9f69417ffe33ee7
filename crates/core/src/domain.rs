//! Code domain classifier.
//!
//! Maps a procedure code to its [`CodeDomain`]. The classifier is total: any code it does not
//! recognise, including malformed input, resolves to [`CodeDomain::Misc`] so new codes never
//! stop downstream validation.

use std::collections::HashMap;
use std::sync::LazyLock;

use billing_types::CodeDomain;

use crate::code_sets::{self, in_range};

/// Explicit code to domain map. The first family listing a code wins.
static DOMAIN_MAP: LazyLock<HashMap<&'static str, CodeDomain>> = LazyLock::new(|| {
    let families: [(&[&str], CodeDomain); 8] = [
        (code_sets::ECHO, CodeDomain::Echo),
        (code_sets::DIAGNOSTIC_CATH, CodeDomain::DiagnosticCath),
        (code_sets::PCI, CodeDomain::Pci),
        (code_sets::EP, CodeDomain::Ep),
        (code_sets::PERIPHERAL_DX, CodeDomain::PeripheralDx),
        (code_sets::PERIPHERAL_INT, CodeDomain::PeripheralInt),
        (code_sets::STRUCTURAL, CodeDomain::Structural),
        (code_sets::MCS, CodeDomain::Mcs),
    ];

    let mut map = HashMap::new();
    for (codes, domain) in families {
        for code in codes {
            map.entry(*code).or_insert(domain);
        }
    }
    map
});

/// Classifies `code` into its semantic domain.
///
/// Modifiers are not stripped here; pass the base code.
pub fn classify(code: &str) -> CodeDomain {
    if is_em(code) {
        return CodeDomain::Em;
    }
    if let Some(domain) = DOMAIN_MAP.get(code) {
        return *domain;
    }
    if in_range(code, code_sets::PERIPHERAL_TERRITORY_RANGE) {
        return CodeDomain::PeripheralInt;
    }
    CodeDomain::Misc
}

/// Evaluation and management code, by explicit list or by the 99202-99499 span.
pub fn is_em(code: &str) -> bool {
    code_sets::contains(code_sets::SPECIFIC_EM, code) || in_range(code, code_sets::EM_RANGE)
}

/// Procedure codes are everything outside E/M and misc.
pub fn is_procedure(code: &str) -> bool {
    classify(code).is_procedure()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_each_family() {
        assert_eq!(classify("99232"), CodeDomain::Em);
        assert_eq!(classify("99213"), CodeDomain::Em);
        assert_eq!(classify("93306"), CodeDomain::Echo);
        assert_eq!(classify("92960"), CodeDomain::Echo);
        assert_eq!(classify("93458"), CodeDomain::DiagnosticCath);
        assert_eq!(classify("92928"), CodeDomain::Pci);
        assert_eq!(classify("0913T"), CodeDomain::Pci);
        assert_eq!(classify("93656"), CodeDomain::Ep);
        assert_eq!(classify("36245"), CodeDomain::PeripheralDx);
        assert_eq!(classify("37263"), CodeDomain::PeripheralInt);
        assert_eq!(classify("37299"), CodeDomain::PeripheralInt);
        assert_eq!(classify("33361"), CodeDomain::Structural);
        assert_eq!(classify("33990"), CodeDomain::Mcs);
    }

    #[test]
    fn unknown_and_malformed_codes_are_misc() {
        assert_eq!(classify("93000"), CodeDomain::Misc);
        assert_eq!(classify("33016"), CodeDomain::Misc);
        assert_eq!(classify(""), CodeDomain::Misc);
        assert_eq!(classify("not-a-code"), CodeDomain::Misc);
    }

    #[test]
    fn procedure_excludes_em_and_misc() {
        assert!(is_procedure("93458"));
        assert!(!is_procedure("99232"));
        assert!(!is_procedure("93000"));
    }
}
