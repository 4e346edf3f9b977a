use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::relation::DiplomaticStatus;
use super::treaty::TreatyType;

/// Population-wide diplomatic indicators for a single day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendSnapshot {
    pub day: u32,
    pub average_trust: f64,
    /// Fraction of live relations that are friendly or allied.
    pub peaceful_relations: f64,
    /// Fraction of live relations that are hostile or at war.
    pub hostile_relations: f64,
    pub active_treaties: usize,
    pub open_negotiations: usize,
}

/// Registry-wide overview for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiplomacySummary {
    pub total_relations: usize,
    pub relations_by_status: BTreeMap<DiplomaticStatus, usize>,
    pub active_treaties: usize,
    pub treaties_by_type: BTreeMap<TreatyType, usize>,
    pub ongoing_negotiations: usize,
    pub diplomatic_agents: usize,
    pub recent_crises: usize,
    pub average_trust: f64,
    /// 0.0–1.0 index of how busy the diplomatic scene is.
    pub complexity: f64,
}
