//! The closed relation vocabulary shared by extraction and verification.
//!
//! Both prompt builders render [`RELATIONS`] verbatim; a drift between the
//! two would silently break the schema contract, so this module is the only
//! place the label set is written down.

/// Every relation label the schema permits, exactly as it appears on the
/// wire and in prompts.
pub const RELATIONS: [&str; 28] = [
    "AFFECTS",
    "CAUSES",
    "DELAYS",
    "CANCELS",
    "INCREASES",
    "DECREASES",
    "LAUNCHES",
    "PARTNERS_WITH",
    "COMPETES_WITH",
    "REGULATES",
    "ANNOUNCES",
    "BENEFITS_FROM",
    "WARNS",
    "MISSES",
    "LOWERS",
    "WITHDRAWS",
    "SCALE_BACK",
    "INCURS",
    "REDUCES",
    "COMMENTS_ON",
    "REPORTS",
    "EXPANDS",
    "INVESTS_IN",
    "OWNS",
    "MANAGES",
    "DEVELOPS",
    "TESTIFIES_BEFORE",
    "HAMPERS",
];

/// Substituted whenever a relation cannot be made vocabulary-valid.
pub const FALLBACK_RELATION: &str = "REPORTS";

/// Entity categories named in the extraction prompt. A head or tail equal
/// to one of these is a placeholder the model emitted instead of a concrete
/// name, not a real entity.
pub const ENTITY_CATEGORIES: [&str; 6] = [
    "Company",
    "Product",
    "Event",
    "Risk",
    "Person",
    "Organization",
];

/// Exact, case-sensitive membership test against [`RELATIONS`].
#[must_use]
pub fn is_valid_relation(relation: &str) -> bool {
    RELATIONS.contains(&relation)
}

/// Case-insensitive check for category-label placeholders ("Event",
/// "company", "ENTITY", ...) standing in where a concrete name belongs.
#[must_use]
pub fn is_placeholder(name: &str) -> bool {
    let trimmed = name.trim();
    ENTITY_CATEGORIES
        .iter()
        .any(|c| c.eq_ignore_ascii_case(trimmed))
        || trimmed.eq_ignore_ascii_case("Entity")
}

/// Comma-separated vocabulary for prompt interpolation.
#[must_use]
pub fn relations_list() -> String {
    RELATIONS.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_is_in_vocabulary() {
        assert!(is_valid_relation(FALLBACK_RELATION));
    }

    #[test]
    fn test_membership_is_case_sensitive() {
        assert!(is_valid_relation("AFFECTS"));
        assert!(!is_valid_relation("affects"));
        assert!(!is_valid_relation("RATES"));
        assert!(!is_valid_relation(""));
    }

    #[test]
    fn test_placeholder_detection() {
        assert!(is_placeholder("Event"));
        assert!(is_placeholder("company"));
        assert!(is_placeholder(" RISK "));
        assert!(is_placeholder("entity"));
        assert!(!is_placeholder("Federal Reserve"));
        assert!(!is_placeholder("Vision Pro"));
    }

    #[test]
    fn test_relations_list_renders_every_label() {
        let listed = relations_list();
        for relation in RELATIONS {
            assert!(listed.contains(relation));
        }
    }
}
