//! Keyword tables used to classify world events by their `type` string.
//!
//! Matching is by substring, so `"border_trade_fair"` counts as trade.

use crate::model::TreatyType;

// --- Relation updates ---
pub const POSITIVE_INTERACTION: &[&str] = &["trade", "cultural_exchange", "cooperation", "aid"];
pub const NEGATIVE_INTERACTION: &[&str] = &["conflict", "violation", "dispute", "aggression"];
pub const MAJOR_INCIDENT: &[&str] = &[
    "treaty_violation",
    "military_aggression",
    "resource_theft",
    "diplomatic_insult",
];

/// Which events touch a treaty of a given type, and how.
#[derive(Debug, Clone, Copy)]
pub struct ComplianceKeywords {
    /// The event concerns the treaty at all.
    pub relevance: &'static [&'static str],
    pub violation: &'static [&'static str],
    pub compliance: &'static [&'static str],
}

const NO_KEYWORDS: ComplianceKeywords = ComplianceKeywords {
    relevance: &[],
    violation: &[],
    compliance: &[],
};

pub fn compliance_keywords(treaty_type: TreatyType) -> ComplianceKeywords {
    match treaty_type {
        TreatyType::TradeAgreement => ComplianceKeywords {
            relevance: &["trade", "economic"],
            violation: &["trade_disruption", "embargo", "tariff_increase"],
            compliance: &[
                "trade_facilitation",
                "tariff_reduction",
                "commercial_cooperation",
            ],
        },
        TreatyType::MutualDefense => ComplianceKeywords {
            relevance: &["military", "conflict", "defense"],
            violation: &["refused_aid", "separate_peace", "betrayal"],
            compliance: &["military_aid", "joint_defense", "intelligence_sharing"],
        },
        TreatyType::NonAggression => ComplianceKeywords {
            relevance: &["conflict", "aggression", "attack"],
            violation: &["attack", "aggression", "invasion"],
            compliance: &["peaceful_resolution", "conflict_avoidance"],
        },
        TreatyType::CulturalExchange => ComplianceKeywords {
            relevance: &["cultural", "knowledge", "education"],
            violation: &["cultural_suppression", "knowledge_hoarding"],
            compliance: &[
                "knowledge_sharing",
                "cultural_mission",
                "educational_exchange",
            ],
        },
        TreatyType::Territorial => ComplianceKeywords {
            relevance: &["territorial", "border", "expansion"],
            violation: &["border_violation", "territorial_expansion"],
            compliance: &["border_respect", "territorial_agreement"],
        },
        TreatyType::ResourceSharing
        | TreatyType::DiplomaticImmunity
        | TreatyType::PrisonerExchange
        | TreatyType::MarriageAlliance
        | TreatyType::Tribute => NO_KEYWORDS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::helpers::matches_any;

    #[test]
    fn bare_embargo_is_not_about_trade() {
        let kw = compliance_keywords(TreatyType::TradeAgreement);
        assert!(!matches_any("embargo", kw.relevance));
        assert!(matches_any("trade_embargo", kw.relevance));
        assert!(matches_any("trade_embargo", kw.violation));
    }

    #[test]
    fn non_aggression_attack_is_both_relevant_and_violation() {
        let kw = compliance_keywords(TreatyType::NonAggression);
        assert!(matches_any("surprise_attack", kw.relevance));
        assert!(matches_any("surprise_attack", kw.violation));
        assert!(!matches_any("surprise_attack", kw.compliance));
    }

    #[test]
    fn untracked_types_have_no_keywords() {
        assert!(compliance_keywords(TreatyType::Tribute).relevance.is_empty());
    }
}
