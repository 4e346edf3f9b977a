use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::relation::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TreatyType {
    TradeAgreement,
    MutualDefense,
    NonAggression,
    CulturalExchange,
    Territorial,
    ResourceSharing,
    DiplomaticImmunity,
    PrisonerExchange,
    MarriageAlliance,
    Tribute,
}

string_enum!(TreatyType {
    TradeAgreement => "trade_agreement",
    MutualDefense => "mutual_defense",
    NonAggression => "non_aggression",
    CulturalExchange => "cultural_exchange",
    Territorial => "territorial",
    ResourceSharing => "resource_sharing",
    DiplomaticImmunity => "diplomatic_immunity",
    PrisonerExchange => "prisoner_exchange",
    MarriageAlliance => "marriage_alliance",
    Tribute => "tribute",
});

/// Static description of what a treaty of a given type usually contains.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreatyTemplate {
    pub typical_terms: &'static [&'static str],
    /// `None` means the treaty is permanent and never comes up for renewal.
    pub typical_duration: Option<u32>,
    pub renewal_probability: f64,
    pub compliance_difficulty: f64,
}

/// Fallback duration for types without a dedicated template.
pub const DEFAULT_TREATY_DURATION: u32 = 365;

impl TreatyType {
    pub fn template(self) -> TreatyTemplate {
        match self {
            TreatyType::TradeAgreement => TreatyTemplate {
                typical_terms: &[
                    "tariff_reduction",
                    "trade_routes",
                    "currency_exchange",
                    "dispute_resolution",
                ],
                typical_duration: Some(365),
                renewal_probability: 0.8,
                compliance_difficulty: 0.3,
            },
            TreatyType::MutualDefense => TreatyTemplate {
                typical_terms: &[
                    "mutual_military_aid",
                    "shared_intelligence",
                    "coordinated_defense",
                    "non_betrayal",
                ],
                typical_duration: Some(1095),
                renewal_probability: 0.6,
                compliance_difficulty: 0.7,
            },
            TreatyType::NonAggression => TreatyTemplate {
                typical_terms: &[
                    "no_attacks",
                    "peaceful_coexistence",
                    "border_respect",
                    "conflict_prevention",
                ],
                typical_duration: Some(730),
                renewal_probability: 0.7,
                compliance_difficulty: 0.4,
            },
            TreatyType::CulturalExchange => TreatyTemplate {
                typical_terms: &[
                    "knowledge_sharing",
                    "educational_exchange",
                    "cultural_preservation",
                    "language_learning",
                ],
                typical_duration: Some(1825),
                renewal_probability: 0.9,
                compliance_difficulty: 0.2,
            },
            TreatyType::Territorial => TreatyTemplate {
                typical_terms: &[
                    "border_demarcation",
                    "territorial_rights",
                    "resource_access",
                    "migration_rules",
                ],
                typical_duration: None,
                renewal_probability: 0.3,
                compliance_difficulty: 0.6,
            },
            TreatyType::Tribute => TreatyTemplate {
                typical_terms: &[
                    "regular_payments",
                    "protection_guarantee",
                    "autonomy_limits",
                    "loyalty_oath",
                ],
                typical_duration: Some(1095),
                renewal_probability: 0.4,
                compliance_difficulty: 0.8,
            },
            TreatyType::ResourceSharing
            | TreatyType::DiplomaticImmunity
            | TreatyType::PrisonerExchange
            | TreatyType::MarriageAlliance => TreatyTemplate {
                typical_terms: &[],
                typical_duration: Some(DEFAULT_TREATY_DURATION),
                renewal_probability: 0.5,
                compliance_difficulty: 0.5,
            },
        }
    }

    /// Human-readable suffix used in generated treaty names.
    pub fn display_name(self) -> &'static str {
        match self {
            TreatyType::TradeAgreement => "Trade Pact",
            TreatyType::MutualDefense => "Defense Alliance",
            TreatyType::NonAggression => "Peace Treaty",
            TreatyType::CulturalExchange => "Cultural Accord",
            TreatyType::Territorial => "Border Agreement",
            TreatyType::Tribute => "Tribute Arrangement",
            _ => "Agreement",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TreatyStatus {
    Active,
    Suspended,
    Terminated,
}

string_enum!(TreatyStatus {
    Active => "active",
    Suspended => "suspended",
    Terminated => "terminated",
});

/// Why a treaty stopped being in force.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum TerminationReason {
    RenewalFailed,
    WarDeclared,
    GroupDisbanded,
}

string_enum!(TerminationReason {
    RenewalFailed => "renewal_failed",
    WarDeclared => "war_declared",
    GroupDisbanded => "group_disbanded",
});

/// Diplomatic fallout attached to a violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Consequence {
    TrustDecrease { with: u64 },
    DiplomaticProtest,
    EconomicSanctions,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Violation {
    pub violating_group: u64,
    pub day: u32,
    pub severity: Severity,
    pub consequences: Vec<Consequence>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Treaty {
    pub id: u64,
    pub name: String,
    pub treaty_type: TreatyType,
    pub signatory_groups: Vec<u64>,
    pub signed_day: u32,
    pub obligations: BTreeMap<u64, Vec<String>>,
    pub benefits: BTreeMap<u64, Vec<String>>,
    pub duration: Option<u32>,
    pub renewal_day: Option<u32>,
    /// Per-signatory compliance, 0.0–1.0.
    pub compliance: BTreeMap<u64, f64>,
    pub violations: Vec<Violation>,
    pub enforcement: Vec<String>,
    pub status: TreatyStatus,
    pub economic_impact: BTreeMap<u64, f64>,
}

impl Treaty {
    /// Build a fresh treaty from its type template. Every signatory starts at
    /// full compliance; obligations are the first two template terms and
    /// benefits the rest.
    pub fn from_template(
        id: u64,
        name: String,
        treaty_type: TreatyType,
        signatory_groups: Vec<u64>,
        day: u32,
    ) -> Self {
        let template = treaty_type.template();
        let split = template.typical_terms.len().min(2);
        let (obligation_terms, benefit_terms) = template.typical_terms.split_at(split);
        fn to_owned(terms: &[&str]) -> Vec<String> {
            terms.iter().map(|t| t.to_string()).collect()
        }

        let obligations = signatory_groups
            .iter()
            .map(|&g| (g, to_owned(obligation_terms)))
            .collect();
        let benefits = signatory_groups
            .iter()
            .map(|&g| (g, to_owned(benefit_terms)))
            .collect();
        let compliance = signatory_groups.iter().map(|&g| (g, 1.0)).collect();
        let economic_impact = signatory_groups.iter().map(|&g| (g, 0.0)).collect();

        Self {
            id,
            name,
            treaty_type,
            signatory_groups,
            signed_day: day,
            obligations,
            benefits,
            duration: template.typical_duration,
            renewal_day: template.typical_duration.map(|d| day + d),
            compliance,
            violations: Vec::new(),
            enforcement: vec![
                "diplomatic_pressure".to_string(),
                "economic_sanctions".to_string(),
            ],
            status: TreatyStatus::Active,
            economic_impact,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == TreatyStatus::Active
    }

    pub fn is_terminated(&self) -> bool {
        self.status == TreatyStatus::Terminated
    }

    pub fn has_signatory(&self, group: u64) -> bool {
        self.signatory_groups.contains(&group)
    }

    /// Mean compliance across signatories. An empty compliance table reads as
    /// fully compliant rather than dividing by zero.
    pub fn average_compliance(&self) -> f64 {
        if self.compliance.is_empty() {
            return 1.0;
        }
        self.compliance.values().sum::<f64>() / self.compliance.len() as f64
    }

    pub fn compliance_of(&self, group: u64) -> f64 {
        self.compliance.get(&group).copied().unwrap_or(1.0)
    }
}

/// `"{a}-{b} Trade Pact"` for bilateral treaties, `"Multilateral …"` otherwise.
pub fn treaty_name(treaty_type: TreatyType, groups: &[String]) -> String {
    let base = treaty_type.display_name();
    match groups {
        [a, b] => format!("{a}-{b} {base}"),
        _ => format!("Multilateral {base}"),
    }
}
