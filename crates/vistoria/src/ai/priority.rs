//! Repair priority classification from free-text analysis.

use crate::model::Priority;

const CRITICAL_KEYWORDS: &[&str] = &[
    "leak",
    "leaking",
    "infiltration",
    "structural crack",
    "danger",
    "hazard",
    "broken",
    "not working",
    "vazamento",
    "infiltração",
    "rachadura estrutural",
    "perigo",
    "risco",
    "quebrado",
    "não funciona",
];

const HIGH_KEYWORDS: &[&str] = &[
    "damaged",
    "replacement",
    "must be replaced",
    "urgent repair",
    "deteriorated",
    "danificado",
    "substituição",
    "troca necessária",
    "reparo urgente",
    "deteriorado",
];

const MEDIUM_KEYWORDS: &[&str] = &[
    "wear",
    "stain",
    "scratch",
    "adjustment needed",
    "deep cleaning",
    "desgaste",
    "manchas",
    "riscos",
    "ajuste necessário",
    "limpeza profunda",
];

/// Classifies an analysis by the most severe keyword tier it mentions.
///
/// Tiers are checked from critical down, so a text mentioning both a
/// leak and a stain is critical. Text with no keyword is low priority.
pub fn determine_repair_priority(analysis: &str) -> Priority {
    let lower = analysis.to_lowercase();
    let mentions = |keywords: &[&str]| keywords.iter().any(|k| lower.contains(k));

    if mentions(CRITICAL_KEYWORDS) {
        Priority::Critical
    } else if mentions(HIGH_KEYWORDS) {
        Priority::High
    } else if mentions(MEDIUM_KEYWORDS) {
        Priority::Medium
    } else {
        Priority::Low
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_critical_wins_over_lower_tiers() {
        assert_eq!(
            determine_repair_priority("Small stain near a LEAKING pipe"),
            Priority::Critical
        );
        assert_eq!(
            determine_repair_priority("Há vazamento na torneira"),
            Priority::Critical
        );
    }

    #[test]
    fn test_high_and_medium_tiers() {
        assert_eq!(
            determine_repair_priority("Door hinge damaged, needs attention"),
            Priority::High
        );
        assert_eq!(
            determine_repair_priority("Piso com desgaste natural"),
            Priority::Medium
        );
    }

    #[test]
    fn test_no_keywords_is_low() {
        assert_eq!(determine_repair_priority("Good condition"), Priority::Low);
        assert_eq!(determine_repair_priority(""), Priority::Low);
    }
}
