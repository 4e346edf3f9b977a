use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DiplomaticRole {
    Ambassador,
    Envoy,
    TradeRepresentative,
    CulturalAttache,
}

string_enum!(DiplomaticRole {
    Ambassador => "ambassador",
    Envoy => "envoy",
    TradeRepresentative => "trade_representative",
    CulturalAttache => "cultural_attache",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum RecallReason {
    PoorPerformance,
    GroupDisbanded,
}

string_enum!(RecallReason {
    PoorPerformance => "poor_performance",
    GroupDisbanded => "group_disbanded",
});

/// An agent serving in a group's diplomatic corps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiplomaticAgent {
    pub agent_id: u64,
    pub role: DiplomaticRole,
    pub representing_group: u64,
    pub assigned_location: String,
    pub assignment_day: u32,
    pub negotiation_skill: f64,
    pub cultural_understanding: f64,
    pub reputation: f64,
    pub successful_negotiations: u32,
    pub failed_negotiations: u32,
    pub loyalty: f64,
    pub effectiveness_rating: f64,
}

impl DiplomaticAgent {
    pub fn total_negotiations(&self) -> u32 {
        self.successful_negotiations + self.failed_negotiations
    }

    /// Share of concluded negotiations that ended in a treaty; `None` before the
    /// first outcome.
    pub fn success_rate(&self) -> Option<f64> {
        let total = self.total_negotiations();
        (total > 0).then(|| self.successful_negotiations as f64 / total as f64)
    }
}
