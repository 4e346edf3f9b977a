use rand::Rng;

use super::context::{TickContext, TickInputs};
use super::helpers::matches_any;
use super::keywords::{MAJOR_INCIDENT, NEGATIVE_INTERACTION, POSITIVE_INTERACTION};
use super::system::SimSystem;
use crate::model::{DiplomacyEventKind, DiplomaticRelation, DiplomaticStatus, Interest, PairKey};

// --- Trust ---
const TRUST_DECAY: f64 = 0.001;
const POSITIVE_EVENT_TRUST: f64 = 0.05;
const NEGATIVE_EVENT_TRUST: f64 = -0.10;
const TREATY_HIGH_COMPLIANCE: f64 = 0.8;
const TREATY_HIGH_COMPLIANCE_TRUST: f64 = 0.02;
const TREATY_LOW_COMPLIANCE: f64 = 0.5;
const TREATY_LOW_COMPLIANCE_TRUST: f64 = -0.05;
const REPORTABLE_TRUST_CHANGE: f64 = 0.1;

// --- Status Thresholds ---
const ALLIANCE_TRUST: f64 = 0.8;
const FRIENDLY_TRUST: f64 = 0.6;
const HOSTILE_TRUST: f64 = 0.3;
const WAR_TRUST: f64 = 0.1;
const WAR_TO_HOSTILE_TRUST: f64 = 0.4;
const HOSTILE_TO_NEUTRAL_TRUST: f64 = 0.6;

// --- Alliance & War ---
const EXTERNAL_THREAT_CHANCE: f64 = 0.3;
const WAR_MAX_TRUST: f64 = 0.2;
const WAR_PER_MAJOR_INCIDENT: f64 = 0.3;
const WAR_RESOURCE_COMPETITION: f64 = 0.2;
const WAR_TERRITORIAL_DISPUTE: f64 = 0.3;

pub const DISSOLVED_GROUP_DISBANDED: &str = "group_disbanded";

/// Evolves trust and status of every live relation from the world-event
/// stream. Relations whose groups are gone are dissolved here.
#[derive(Debug, Default)]
pub struct RelationSystem;

impl SimSystem for RelationSystem {
    fn name(&self) -> &str {
        "relations"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let inputs = ctx.inputs;
        let day = ctx.day();

        for key in ctx.state.live_relation_keys() {
            if !inputs.group_present(key.low) || !inputs.group_present(key.high) {
                dissolve(ctx, key);
                continue;
            }

            note_conflicting_interests(ctx, key);

            let treaty_adjustment = treaty_trust_adjustment(ctx, key);
            let event_adjustment = event_trust_adjustment(&inputs, key);

            let Some(rel) = ctx.state.relations.get_mut(&key) else {
                continue;
            };
            let old_trust = rel.trust;
            rel.adjust_trust(-TRUST_DECAY + event_adjustment + treaty_adjustment);
            rel.record_trust(day);
            let new_trust = rel.trust;
            let old_status = rel.status;

            let new_status = next_status(ctx, key);
            if new_status != old_status {
                let low_trust = new_trust < WAR_TRUST;
                if let Some(rel) = ctx.state.relations.get_mut(&key) {
                    rel.set_status(new_status, day, low_trust);
                }
                tracing::debug!("day {day}: relation {key} {old_status} -> {new_status}");
                ctx.emit(DiplomacyEventKind::DiplomaticStatusChange {
                    group1: key.low,
                    group2: key.high,
                    old_status,
                    new_status,
                    trust: new_trust,
                });
            }

            let change = new_trust - old_trust;
            if change.abs() > REPORTABLE_TRUST_CHANGE {
                ctx.emit(DiplomacyEventKind::DiplomaticTrustChange {
                    group1: key.low,
                    group2: key.high,
                    trust_change: change,
                    new_trust,
                });
            }
        }
    }
}

fn dissolve(ctx: &mut TickContext, key: PairKey) {
    let day = ctx.day();
    if let Some(rel) = ctx.state.relations.get_mut(&key) {
        rel.dissolved_day = Some(day);
    }
    tracing::warn!("day {day}: relation {key} dissolved, a group has disbanded");
    ctx.emit(DiplomacyEventKind::DiplomaticRelationDissolved {
        group1: key.low,
        group2: key.high,
        reason: DISSOLVED_GROUP_DISBANDED.to_string(),
    });
}

/// Net trust change from yesterday's world events touching either group.
/// An event may count as both positive and negative.
fn event_trust_adjustment(inputs: &TickInputs, key: PairKey) -> f64 {
    inputs
        .world_events
        .iter()
        .filter(|e| e.involves(key.low) || e.involves(key.high))
        .map(|e| {
            let mut delta = 0.0;
            if matches_any(&e.event_type, POSITIVE_INTERACTION) {
                delta += POSITIVE_EVENT_TRUST;
            }
            if matches_any(&e.event_type, NEGATIVE_INTERACTION) {
                delta += NEGATIVE_EVENT_TRUST;
            }
            delta
        })
        .sum()
}

/// One adjustment per active treaty attached to the relation.
fn treaty_trust_adjustment(ctx: &TickContext, key: PairKey) -> f64 {
    let Some(rel) = ctx.state.relations.get(&key) else {
        return 0.0;
    };
    rel.treaties
        .iter()
        .filter_map(|id| ctx.state.treaties.get(id))
        .filter(|t| t.is_active())
        .map(|t| {
            let avg = t.average_compliance();
            if avg > TREATY_HIGH_COMPLIANCE {
                TREATY_HIGH_COMPLIANCE_TRUST
            } else if avg < TREATY_LOW_COMPLIANCE {
                TREATY_LOW_COMPLIANCE_TRUST
            } else {
                0.0
            }
        })
        .sum()
}

/// World events naming both groups can reveal a lasting conflict of interest.
fn note_conflicting_interests(ctx: &mut TickContext, key: PairKey) {
    let inputs = ctx.inputs;
    let Some(rel) = ctx.state.relations.get_mut(&key) else {
        return;
    };
    for event in inputs.world_events {
        if !(event.involves(key.low) && event.involves(key.high)) {
            continue;
        }
        for interest in [Interest::ResourceCompetition, Interest::TerritorialDispute] {
            if event.event_type.contains(interest.as_str()) {
                rel.conflicting_interests.insert(interest);
            }
        }
    }
}

/// Status after today's trust update. At most one transition per day, tried
/// in priority order.
fn next_status(ctx: &mut TickContext, key: PairKey) -> DiplomaticStatus {
    let Some(rel) = ctx.state.relations.get(&key) else {
        return DiplomaticStatus::Neutral;
    };
    let trust = rel.trust;
    let status = rel.status;

    match status {
        DiplomaticStatus::Friendly if trust > ALLIANCE_TRUST => {
            if should_ally(ctx, key) {
                DiplomaticStatus::Allied
            } else {
                status
            }
        }
        DiplomaticStatus::Neutral if trust > FRIENDLY_TRUST => DiplomaticStatus::Friendly,
        DiplomaticStatus::Neutral | DiplomaticStatus::Friendly if trust < HOSTILE_TRUST => {
            DiplomaticStatus::Hostile
        }
        DiplomaticStatus::Hostile if trust < WAR_TRUST => {
            if should_go_to_war(ctx, key) {
                DiplomaticStatus::War
            } else {
                status
            }
        }
        DiplomaticStatus::War if trust > WAR_TO_HOSTILE_TRUST => DiplomaticStatus::Hostile,
        DiplomaticStatus::Hostile if trust > HOSTILE_TO_NEUTRAL_TRUST => DiplomaticStatus::Neutral,
        _ => status,
    }
}

fn should_ally(ctx: &mut TickContext, key: PairKey) -> bool {
    let Some(rel) = ctx.state.relations.get(&key) else {
        return false;
    };
    if rel.trust < ALLIANCE_TRUST {
        return false;
    }
    let shared = !rel.shared_interests.is_empty();
    let external_threat = ctx.rng.random_range(0.0..1.0) < EXTERNAL_THREAT_CHANCE;
    shared || external_threat
}

fn should_go_to_war(ctx: &mut TickContext, key: PairKey) -> bool {
    let inputs = ctx.inputs;
    let Some(rel) = ctx.state.relations.get(&key) else {
        return false;
    };
    if rel.trust > WAR_MAX_TRUST {
        return false;
    }
    war_probability(rel, &inputs) > ctx.rng.random_range(0.0..1.0)
}

/// Chance of war today: grows with major incidents involving the pair and
/// with standing conflicts over resources or territory.
pub fn war_probability(rel: &DiplomaticRelation, inputs: &TickInputs) -> f64 {
    let incidents = inputs
        .world_events
        .iter()
        .filter(|e| e.involves(rel.key.low) || e.involves(rel.key.high))
        .filter(|e| matches_any(&e.event_type, MAJOR_INCIDENT))
        .count();
    let mut p = incidents as f64 * WAR_PER_MAJOR_INCIDENT;
    if rel.conflicting_interests.contains(&Interest::ResourceCompetition) {
        p += WAR_RESOURCE_COMPETITION;
    }
    if rel.conflicting_interests.contains(&Interest::TerritorialDispute) {
        p += WAR_TERRITORIAL_DISPUTE;
    }
    p
}
