use std::collections::{BTreeSet, VecDeque};

use serde::{Deserialize, Serialize};

use super::pair::PairKey;

/// Maximum number of `(day, trust)` samples kept per relation.
pub const HISTORY_CAPACITY: usize = 100;
/// Maximum number of status transitions kept per relation.
pub const STATUS_LOG_CAPACITY: usize = 100;
/// Incidents older than this many days are dropped from `recent_incidents`.
pub const INCIDENT_RETENTION_DAYS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DiplomaticStatus {
    Unrecognized,
    Acknowledged,
    Neutral,
    Friendly,
    Allied,
    Hostile,
    War,
    Vassal,
    Protectorate,
}

string_enum!(DiplomaticStatus {
    Unrecognized => "unrecognized",
    Acknowledged => "acknowledged",
    Neutral => "neutral",
    Friendly => "friendly",
    Allied => "allied",
    Hostile => "hostile",
    War => "war",
    Vassal => "vassal",
    Protectorate => "protectorate",
});

impl DiplomaticStatus {
    pub fn is_peaceful(self) -> bool {
        matches!(self, DiplomaticStatus::Friendly | DiplomaticStatus::Allied)
    }

    pub fn is_hostile(self) -> bool {
        matches!(self, DiplomaticStatus::Hostile | DiplomaticStatus::War)
    }
}

/// Areas in which two groups' interests align or collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Interest {
    Trade,
    Defense,
    Culture,
    ResourceCompetition,
    TerritorialDispute,
}

string_enum!(Interest {
    Trade => "trade",
    Defense => "defense",
    Culture => "culture",
    ResourceCompetition => "resource_competition",
    TerritorialDispute => "territorial_dispute",
});

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrustSample {
    pub day: u32,
    pub trust: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusTransition {
    pub day: u32,
    pub from: DiplomaticStatus,
    pub to: DiplomaticStatus,
    /// Trust was below the war threshold when this transition happened.
    /// Only meaningful for `hostile -> war`.
    #[serde(default)]
    pub low_trust: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Severity {
    Minor,
    Moderate,
    High,
}

string_enum!(Severity {
    Minor => "minor",
    Moderate => "moderate",
    High => "high",
});

/// A diplomatic incident recorded against a relation (crises, for now).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Incident {
    /// World event type that caused the incident.
    pub kind: String,
    pub day: u32,
    pub severity: Severity,
}

/// The one relation that exists between an unordered pair of groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiplomaticRelation {
    pub key: PairKey,
    pub status: DiplomaticStatus,
    pub established_day: u32,
    /// Mutual trust, 0.0–1.0.
    pub trust: f64,
    pub trade_volume: f64,
    /// 0.0–1.0.
    pub cultural_affinity: f64,
    /// -1.0–1.0. Positive means `key.low` is the stronger side.
    pub power_balance: f64,
    pub treaties: BTreeSet<u64>,
    pub pending_negotiations: BTreeSet<u64>,
    pub history: VecDeque<TrustSample>,
    pub status_log: VecDeque<StatusTransition>,
    pub recent_incidents: VecDeque<Incident>,
    pub shared_interests: BTreeSet<Interest>,
    pub conflicting_interests: BTreeSet<Interest>,
    /// Set when one of the groups disappeared. Dissolved relations stay in the
    /// registry as history but no system touches them again.
    pub dissolved_day: Option<u32>,
}

impl DiplomaticRelation {
    pub fn new(
        key: PairKey,
        status: DiplomaticStatus,
        day: u32,
        trust: f64,
        cultural_affinity: f64,
        power_balance: f64,
    ) -> Self {
        let trust = trust.clamp(0.0, 1.0);
        let mut history = VecDeque::with_capacity(HISTORY_CAPACITY);
        history.push_back(TrustSample { day, trust });
        Self {
            key,
            status,
            established_day: day,
            trust,
            trade_volume: 0.0,
            cultural_affinity: cultural_affinity.clamp(0.0, 1.0),
            power_balance: power_balance.clamp(-1.0, 1.0),
            treaties: BTreeSet::new(),
            pending_negotiations: BTreeSet::new(),
            history,
            status_log: VecDeque::new(),
            recent_incidents: VecDeque::new(),
            shared_interests: BTreeSet::new(),
            conflicting_interests: BTreeSet::new(),
            dissolved_day: None,
        }
    }

    pub fn is_live(&self) -> bool {
        self.dissolved_day.is_none()
    }

    /// Shift trust by `delta`, clamped to 0.0–1.0. Returns the applied change.
    pub fn adjust_trust(&mut self, delta: f64) -> f64 {
        let old = self.trust;
        self.trust = (self.trust + delta).clamp(0.0, 1.0);
        self.trust - old
    }

    /// Append today's trust to the rolling history, dropping the oldest sample
    /// once the window is full.
    pub fn record_trust(&mut self, day: u32) {
        if self.history.len() >= HISTORY_CAPACITY {
            self.history.pop_front();
        }
        self.history.push_back(TrustSample {
            day,
            trust: self.trust,
        });
    }

    pub fn set_status(&mut self, to: DiplomaticStatus, day: u32, low_trust: bool) {
        if self.status == to {
            return;
        }
        if self.status_log.len() >= STATUS_LOG_CAPACITY {
            self.status_log.pop_front();
        }
        self.status_log.push_back(StatusTransition {
            day,
            from: self.status,
            to,
            low_trust,
        });
        self.status = to;
    }

    pub fn record_incident(&mut self, kind: &str, day: u32, severity: Severity) {
        self.prune_incidents(day);
        self.recent_incidents.push_back(Incident {
            kind: kind.to_string(),
            day,
            severity,
        });
    }

    pub fn prune_incidents(&mut self, day: u32) {
        while self
            .recent_incidents
            .front()
            .is_some_and(|i| day.saturating_sub(i.day) > INCIDENT_RETENTION_DAYS)
        {
            self.recent_incidents.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn relation() -> DiplomaticRelation {
        DiplomaticRelation::new(
            PairKey::new(1, 2).unwrap(),
            DiplomaticStatus::Neutral,
            0,
            0.5,
            0.5,
            0.0,
        )
    }

    #[test]
    fn constructor_clamps_metrics() {
        let rel = DiplomaticRelation::new(
            PairKey::new(1, 2).unwrap(),
            DiplomaticStatus::Neutral,
            3,
            1.4,
            -0.2,
            -3.0,
        );
        assert_eq!(rel.trust, 1.0);
        assert_eq!(rel.cultural_affinity, 0.0);
        assert_eq!(rel.power_balance, -1.0);
        assert_eq!(rel.history.len(), 1);
    }

    #[test]
    fn adjust_trust_clamps_and_reports_applied_delta() {
        let mut rel = relation();
        let applied = rel.adjust_trust(0.8);
        assert_eq!(rel.trust, 1.0);
        assert!((applied - 0.5).abs() < 1e-9);
        rel.adjust_trust(-5.0);
        assert_eq!(rel.trust, 0.0);
    }

    #[test]
    fn history_is_bounded() {
        let mut rel = relation();
        for day in 1..=250 {
            rel.record_trust(day);
        }
        assert_eq!(rel.history.len(), HISTORY_CAPACITY);
        assert_eq!(rel.history.front().unwrap().day, 151);
        assert_eq!(rel.history.back().unwrap().day, 250);
    }

    #[test]
    fn set_status_logs_only_real_changes() {
        let mut rel = relation();
        rel.set_status(DiplomaticStatus::Neutral, 1, false);
        assert!(rel.status_log.is_empty());
        rel.set_status(DiplomaticStatus::Hostile, 2, false);
        assert_eq!(rel.status_log.len(), 1);
        assert_eq!(rel.status_log[0].from, DiplomaticStatus::Neutral);
        assert_eq!(rel.status_log[0].to, DiplomaticStatus::Hostile);
    }

    #[test]
    fn old_incidents_are_pruned() {
        let mut rel = relation();
        rel.record_incident("trade_embargo", 10, Severity::High);
        rel.record_incident("diplomatic_insult", 50, Severity::High);
        rel.record_incident("military_incident", 130, Severity::High);
        assert_eq!(rel.recent_incidents.len(), 2);
        assert_eq!(rel.recent_incidents[0].day, 50);
    }

    #[test]
    fn status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&DiplomaticStatus::Protectorate).unwrap(),
            "\"protectorate\""
        );
        let parsed: Interest = serde_json::from_str("\"territorial_dispute\"").unwrap();
        assert_eq!(parsed, Interest::TerritorialDispute);
        assert!(serde_json::from_str::<DiplomaticStatus>("\"truce\"").is_err());
    }
}
