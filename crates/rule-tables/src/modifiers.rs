//! Modifier definition types.

/// Static definition of a billing modifier.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModifierDefinition {
    /// Normalised identifier including the leading dash, e.g. `-25`.
    pub id: String,

    pub name: String,

    pub description: String,

    /// Whether the engine may fold this modifier into the billed code on its own.
    pub auto_apply: bool,

    /// Whether a coder should review the modifier before submission.
    pub requires_review: bool,

    /// Modifiers that cannot appear on the same code. Declared one-directionally.
    pub incompatible_with: Vec<String>,

    /// What the record must contain to support this modifier at audit.
    pub documentation: Option<String>,
}

impl ModifierDefinition {
    /// Whether this definition declares `other` as incompatible.
    ///
    /// This only consults *this* side; use [`crate::RuleTables::modifiers_compatible`] for the
    /// symmetric check.
    pub fn declares_incompatible(&self, other: &str) -> bool {
        let other = normalize_modifier_id(other);
        self.incompatible_with.iter().any(|m| *m == other)
    }
}

/// Normalise a modifier identifier to its dashed, uppercase form.
///
/// `25`, `-25` and ` -25 ` all become `-25`; `tc` becomes `-TC`.
pub fn normalize_modifier_id(id: &str) -> String {
    let trimmed = id.trim();
    let bare = trimmed.strip_prefix('-').unwrap_or(trimmed);
    format!("-{}", bare.to_ascii_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_adds_dash_and_uppercases() {
        assert_eq!(normalize_modifier_id("25"), "-25");
        assert_eq!(normalize_modifier_id("-25"), "-25");
        assert_eq!(normalize_modifier_id(" tc "), "-TC");
    }

    #[test]
    fn declares_incompatible_normalises_argument() {
        let def = ModifierDefinition {
            id: "-26".into(),
            name: "Professional Component".into(),
            description: String::new(),
            auto_apply: false,
            requires_review: true,
            incompatible_with: vec!["-TC".into()],
            documentation: None,
        };
        assert!(def.declares_incompatible("TC"));
        assert!(!def.declares_incompatible("-59"));
    }
}
