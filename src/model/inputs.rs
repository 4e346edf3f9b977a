//! Read-only snapshots supplied by the surrounding simulation each tick.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum GroupKind {
    Faction,
    Institution,
    Council,
    Guild,
    MerchantGroup,
    CulturalGroup,
    Alliance,
    PoliticalGroup,
    Tribe,
    Custom(String),
}

string_enum!(open GroupKind, "group kind", {
    Faction => "faction",
    Institution => "institution",
    Council => "council",
    Guild => "guild",
    MerchantGroup => "merchant_group",
    CulturalGroup => "cultural_group",
    Alliance => "alliance",
    PoliticalGroup => "political_group",
    Tribe => "tribe",
});

impl GroupKind {
    /// Kinds that count as organised even without named leaders.
    pub fn is_organized(&self) -> bool {
        matches!(
            self,
            GroupKind::Faction | GroupKind::Institution | GroupKind::Council
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub id: u64,
    pub name: String,
    pub kind: GroupKind,
    pub members: Vec<u64>,
    pub leaders: Vec<u64>,
    #[serde(default)]
    pub disbanded: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentSnapshot {
    pub id: u64,
    pub alive: bool,
    pub age: u32,
    /// 0.0–1.0.
    pub reputation: f64,
    /// Number of personal relationships the agent maintains.
    pub relationship_count: u32,
    pub specialization: Option<String>,
    pub location: String,
}

/// An organisation spanning several groups (a council of tribes, a trade
/// league). Membership in one gives a group the structure needed for
/// diplomacy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Institution {
    pub id: u64,
    pub name: String,
    pub member_groups: Vec<u64>,
}

/// A structured record from the world-event stream.
///
/// Only `type` is interpreted, by keyword matching. Either list may name group
/// ids; entries that match no keyword simply have no effect.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WorldEvent {
    #[serde(rename = "type", default)]
    pub event_type: String,
    #[serde(default)]
    pub participants: Vec<u64>,
    #[serde(default)]
    pub groups: Vec<u64>,
}

impl WorldEvent {
    pub fn new(event_type: impl Into<String>, groups: Vec<u64>) -> Self {
        Self {
            event_type: event_type.into(),
            participants: Vec::new(),
            groups,
        }
    }

    pub fn involves(&self, group: u64) -> bool {
        self.groups.contains(&group) || self.participants.contains(&group)
    }

    /// Groups named by the event, `groups` first then `participants`.
    pub fn affected(&self) -> &[u64] {
        if self.groups.is_empty() {
            &self.participants
        } else {
            &self.groups
        }
    }
}
