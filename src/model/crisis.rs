use serde::{Deserialize, Serialize};

use super::pair::PairKey;

/// World-event keywords that escalate into a diplomatic crisis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CrisisTrigger {
    TreatyViolation,
    TerritorialDispute,
    TradeEmbargo,
    DiplomaticInsult,
    MilitaryIncident,
    RefugeeCrisis,
}

string_enum!(CrisisTrigger {
    TreatyViolation => "treaty_violation",
    TerritorialDispute => "territorial_dispute",
    TradeEmbargo => "trade_embargo",
    DiplomaticInsult => "diplomatic_insult",
    MilitaryIncident => "military_incident",
    RefugeeCrisis => "refugee_crisis",
});

impl CrisisTrigger {
    /// First trigger whose keyword appears in `event_type`.
    pub fn detect(event_type: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| event_type.contains(t.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrisisRecord {
    pub id: u64,
    pub trigger: CrisisTrigger,
    /// The raw `type` of the world event that caused the crisis.
    pub trigger_event: String,
    pub pair: PairKey,
    pub day: u32,
    /// Last day on which a resolution attempt may still happen.
    pub window_end: u32,
    pub resolved: bool,
    pub resolved_day: Option<u32>,
    pub resolution_attempts: u32,
}

impl CrisisRecord {
    /// Open, unresolved and still inside its resolution window.
    pub fn is_open(&self, day: u32) -> bool {
        !self.resolved && day < self.window_end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_keyword_inside_longer_type() {
        assert_eq!(
            CrisisTrigger::detect("border_territorial_dispute_flareup"),
            Some(CrisisTrigger::TerritorialDispute)
        );
        assert_eq!(CrisisTrigger::detect("harvest_festival"), None);
        assert_eq!(CrisisTrigger::detect(""), None);
    }

    #[test]
    fn window_is_exclusive_at_end() {
        let record = CrisisRecord {
            id: 1,
            trigger: CrisisTrigger::TradeEmbargo,
            trigger_event: "trade_embargo".to_string(),
            pair: PairKey::new(1, 2).unwrap(),
            day: 10,
            window_end: 40,
            resolved: false,
            resolved_day: None,
            resolution_attempts: 0,
        };
        assert!(record.is_open(39));
        assert!(!record.is_open(40));
    }
}
