use std::collections::BTreeMap;

use rand::Rng;

use super::context::TickContext;
use super::helpers::group_name;
use super::system::SimSystem;
use crate::model::negotiation::INITIAL_AGREEMENT_PROBABILITY;
use crate::model::{
    DiplomacyEventKind, DiplomaticStatus, FailureReason, Interest, Negotiation, NegotiationPhase,
    PairKey, Treaty, TreatyType, pair_keys, treaty_name,
};

// --- Opportunities ---
const TRADE_MIN_TRUST: f64 = 0.5;
const TRADE_POTENTIAL_CHANCE: f64 = 0.4;
const DEFENSE_MIN_TRUST: f64 = 0.7;
const COMMON_THREAT_CHANCE: f64 = 0.3;
const NON_AGGRESSION_MIN_TRUST: f64 = 0.3;
const CULTURAL_MIN_AFFINITY: f64 = 0.6;
const TIME_PRESSURE_RANGE: (f64, f64) = (0.2, 0.8);
const PUBLIC_PRESSURE_RANGE: (f64, f64) = (0.3, 0.7);

// --- Progress ---
const BASE_PROGRESS: f64 = 0.05;
const DEADLOCK_FAILURE_CHANCE: f64 = 0.1;

// --- Progress Factors ---
const HIGH_TRUST: f64 = 0.7;
const HIGH_TRUST_MULTIPLIER: f64 = 1.5;
const LOW_TRUST: f64 = 0.4;
const LOW_TRUST_MULTIPLIER: f64 = 0.6;
const EXPERT_SKILL: f64 = 0.7;
const EXPERT_SKILL_MULTIPLIER: f64 = 1.5;
const NOVICE_SKILL: f64 = 0.4;
const NOVICE_SKILL_MULTIPLIER: f64 = 0.7;
const URGENT_PRESSURE: f64 = 0.7;
const URGENT_MULTIPLIER: f64 = 0.8;
const RELAXED_PRESSURE: f64 = 0.3;
const RELAXED_MULTIPLIER: f64 = 1.2;
const ECONOMIC_INCENTIVE_MULTIPLIERS: [f64; 3] = [1.6, 1.0, 0.5];

// --- Outcomes ---
const SIGNING_TRUST_BONUS: f64 = 0.1;
const FAILURE_TRUST_PENALTY: f64 = -0.05;

/// Advances every open negotiation by one round and settles those that reach
/// agreement or break down.
#[derive(Debug, Default)]
pub struct NegotiationProgressSystem;

/// Opens a negotiation on each live relation that has none pending and shows
/// an opportunity for a treaty.
#[derive(Debug, Default)]
pub struct NegotiationOpportunitySystem;

impl SimSystem for NegotiationProgressSystem {
    fn name(&self) -> &str {
        "negotiation_progress"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let ids: Vec<u64> = ctx.state.negotiations.keys().copied().collect();
        for id in ids {
            advance(ctx, id);
        }
    }
}

impl SimSystem for NegotiationOpportunitySystem {
    fn name(&self) -> &str {
        "negotiation_opportunities"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        for key in ctx.state.live_relation_keys() {
            let Some(rel) = ctx.state.relations.get(&key) else {
                continue;
            };
            if !rel.pending_negotiations.is_empty() {
                continue;
            }
            let Some(treaty_type) = identify_opportunity(ctx, key) else {
                continue;
            };
            start_negotiation(ctx, key, treaty_type);
        }
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

fn advance(ctx: &mut TickContext, id: u64) {
    let inputs = ctx.inputs;
    let Some(negotiation) = ctx.state.negotiations.get(&id) else {
        return;
    };
    let key = negotiation.relation;

    let relation_live = ctx
        .state
        .relations
        .get(&key)
        .is_some_and(|r| r.is_live());
    if !relation_live || !negotiation.groups.iter().all(|&g| inputs.group_present(g)) {
        fail(ctx, id, FailureReason::GroupDisbanded);
        return;
    }
    if ctx
        .state
        .relations
        .get(&key)
        .is_some_and(|r| r.status == DiplomaticStatus::War)
    {
        fail(ctx, id, FailureReason::WarDeclared);
        return;
    }

    let multiplier = progress_multiplier(ctx, id);
    let Some(negotiation) = ctx.state.negotiations.get_mut(&id) else {
        return;
    };
    negotiation.agreement_probability =
        (negotiation.agreement_probability + BASE_PROGRESS * multiplier).clamp(0.0, 1.0);

    let old_phase = negotiation.phase;
    let new_phase =
        NegotiationPhase::from_progress(negotiation.agreement_probability, negotiation.rounds);
    negotiation.phase = new_phase;
    negotiation.rounds += 1;
    let treaty_type = negotiation.proposed_treaty_type;
    let agreement_probability = negotiation.agreement_probability;

    if new_phase != old_phase {
        tracing::debug!(
            "day {}: negotiation {id} ({treaty_type}) {old_phase} -> {new_phase}",
            ctx.day()
        );
        ctx.emit(DiplomacyEventKind::NegotiationPhaseChange {
            negotiation_id: id,
            treaty_type,
            old_phase,
            new_phase,
            agreement_probability,
        });
    }

    match new_phase {
        NegotiationPhase::Agreement => conclude(ctx, id),
        NegotiationPhase::Deadlock => {
            if ctx.rng.random_range(0.0..1.0) < DEADLOCK_FAILURE_CHANCE {
                fail(ctx, id, FailureReason::IrreconcilableDifferences);
            }
        }
        _ => {}
    }
}

/// Product of the trust, skill, time pressure and economic incentive
/// multipliers. Factors with no data (no corps negotiator, missing relation)
/// contribute 1.0.
fn progress_multiplier(ctx: &mut TickContext, id: u64) -> f64 {
    let Some(negotiation) = ctx.state.negotiations.get(&id) else {
        return 1.0;
    };
    let mut m = 1.0;

    if let Some(rel) = ctx.state.relations.get(&negotiation.relation) {
        m *= trust_multiplier(rel.trust);
    }

    let skills: Vec<f64> = negotiation
        .lead_negotiators
        .values()
        .filter_map(|agent| ctx.state.corps.get(agent))
        .map(|a| a.negotiation_skill)
        .collect();
    if !skills.is_empty() {
        let avg = skills.iter().sum::<f64>() / skills.len() as f64;
        if avg > EXPERT_SKILL {
            m *= EXPERT_SKILL_MULTIPLIER;
        } else if avg < NOVICE_SKILL {
            m *= NOVICE_SKILL_MULTIPLIER;
        }
    }

    if negotiation.time_pressure > URGENT_PRESSURE {
        m *= URGENT_MULTIPLIER;
    } else if negotiation.time_pressure < RELAXED_PRESSURE {
        m *= RELAXED_MULTIPLIER;
    }

    let incentive = ctx.rng.random_range(0..ECONOMIC_INCENTIVE_MULTIPLIERS.len());
    m * ECONOMIC_INCENTIVE_MULTIPLIERS[incentive]
}

fn trust_multiplier(trust: f64) -> f64 {
    if trust > HIGH_TRUST {
        HIGH_TRUST_MULTIPLIER
    } else if trust < LOW_TRUST {
        LOW_TRUST_MULTIPLIER
    } else {
        1.0
    }
}

fn remove_negotiation(ctx: &mut TickContext, id: u64) -> Option<Negotiation> {
    let negotiation = ctx.state.negotiations.remove(&id)?;
    if let Some(rel) = ctx.state.relations.get_mut(&negotiation.relation) {
        rel.pending_negotiations.remove(&id);
    }
    Some(negotiation)
}

/// Replace the negotiation with a treaty attached to every relation between
/// its parties.
fn conclude(ctx: &mut TickContext, id: u64) {
    let Some(negotiation) = remove_negotiation(ctx, id) else {
        return;
    };
    let day = ctx.day();
    let names: Vec<String> = negotiation
        .groups
        .iter()
        .map(|&g| group_name(ctx.inputs.groups, g))
        .collect();
    let treaty_type = negotiation.proposed_treaty_type;
    let treaty_id = ctx.state.id_gen.next_id();
    let name = treaty_name(treaty_type, &names);
    let treaty = Treaty::from_template(
        treaty_id,
        name.clone(),
        treaty_type,
        negotiation.groups.clone(),
        day,
    );
    ctx.state.attach_treaty(treaty);

    let shared = shared_interest_for(treaty_type);
    for key in pair_keys(&negotiation.groups) {
        if let Some(rel) = ctx.state.relations.get_mut(&key) {
            rel.adjust_trust(SIGNING_TRUST_BONUS);
            if let Some(interest) = shared {
                rel.shared_interests.insert(interest);
            }
        }
    }

    tracing::info!(
        "day {day}: {name} signed after {} rounds",
        negotiation.rounds
    );
    ctx.emit(DiplomacyEventKind::TreatySigned {
        treaty_id,
        treaty_name: name,
        treaty_type,
        signatory_groups: negotiation.groups.clone(),
        negotiation_rounds: negotiation.rounds,
        negotiators: negotiation.negotiators(),
    });
}

fn shared_interest_for(treaty_type: TreatyType) -> Option<Interest> {
    match treaty_type {
        TreatyType::TradeAgreement => Some(Interest::Trade),
        TreatyType::MutualDefense => Some(Interest::Defense),
        TreatyType::CulturalExchange => Some(Interest::Culture),
        _ => None,
    }
}

fn fail(ctx: &mut TickContext, id: u64, reason: FailureReason) {
    let Some(negotiation) = remove_negotiation(ctx, id) else {
        return;
    };
    if reason == FailureReason::IrreconcilableDifferences {
        for key in pair_keys(&negotiation.groups) {
            if let Some(rel) = ctx.state.relations.get_mut(&key) {
                rel.adjust_trust(FAILURE_TRUST_PENALTY);
            }
        }
    }
    tracing::debug!(
        "day {}: negotiation {id} ({}) failed: {reason}",
        ctx.day(),
        negotiation.proposed_treaty_type
    );
    ctx.emit(DiplomacyEventKind::NegotiationFailed {
        negotiation_id: id,
        treaty_type: negotiation.proposed_treaty_type,
        groups: negotiation.groups.clone(),
        reason,
        rounds: negotiation.rounds,
        negotiators: negotiation.negotiators(),
    });
}

// ---------------------------------------------------------------------------
// Opportunities
// ---------------------------------------------------------------------------

/// First treaty type the relation's state calls for, if the two groups do
/// not already hold one of that type.
fn identify_opportunity(ctx: &mut TickContext, key: PairKey) -> Option<TreatyType> {
    let rel = ctx.state.relations.get(&key)?;
    let (status, trust, affinity) = (rel.status, rel.trust, rel.cultural_affinity);
    let territorial = rel
        .conflicting_interests
        .contains(&Interest::TerritorialDispute);

    let candidate = if matches!(status, DiplomaticStatus::Neutral | DiplomaticStatus::Friendly)
        && trust > TRADE_MIN_TRUST
        && ctx.rng.random_range(0.0..1.0) < TRADE_POTENTIAL_CHANCE
    {
        TreatyType::TradeAgreement
    } else if status == DiplomaticStatus::Friendly
        && trust > DEFENSE_MIN_TRUST
        && ctx.rng.random_range(0.0..1.0) < COMMON_THREAT_CHANCE
    {
        TreatyType::MutualDefense
    } else if status == DiplomaticStatus::Hostile && trust > NON_AGGRESSION_MIN_TRUST {
        TreatyType::NonAggression
    } else if matches!(status, DiplomaticStatus::Friendly | DiplomaticStatus::Allied)
        && affinity > CULTURAL_MIN_AFFINITY
    {
        TreatyType::CulturalExchange
    } else if territorial {
        TreatyType::Territorial
    } else {
        return None;
    };

    let rel = ctx.state.relations.get(&key)?;
    let already_held = rel.treaties.iter().any(|tid| {
        ctx.state
            .treaties
            .get(tid)
            .is_some_and(|t| t.treaty_type == candidate && !t.is_terminated())
    });
    (!already_held).then_some(candidate)
}

/// A corps member representing the group if there is one, else the group's
/// first leader.
fn find_negotiator(ctx: &TickContext, group: u64) -> Option<u64> {
    if let Some(agent) = ctx.state.corps_of(group).next() {
        return Some(agent.agent_id);
    }
    ctx.inputs
        .groups
        .get(&group)
        .and_then(|g| g.leaders.first().copied())
}

fn start_negotiation(ctx: &mut TickContext, key: PairKey, treaty_type: TreatyType) {
    let mut lead_negotiators = BTreeMap::new();
    for group in key.groups() {
        match find_negotiator(ctx, group) {
            Some(agent) => {
                lead_negotiators.insert(group, agent);
            }
            None => return,
        }
    }

    let day = ctx.day();
    let id = ctx.state.id_gen.next_id();
    let time_pressure = ctx
        .rng
        .random_range(TIME_PRESSURE_RANGE.0..TIME_PRESSURE_RANGE.1);
    let public_pressure = ctx
        .rng
        .random_range(PUBLIC_PRESSURE_RANGE.0..PUBLIC_PRESSURE_RANGE.1);

    let negotiation = Negotiation {
        id,
        relation: key,
        groups: key.groups().to_vec(),
        proposed_treaty_type: treaty_type,
        started_day: day,
        phase: NegotiationPhase::Proposal,
        lead_negotiators,
        time_pressure,
        public_pressure,
        agreement_probability: INITIAL_AGREEMENT_PROBABILITY,
        rounds: 0,
    };
    let negotiators = negotiation.negotiators();
    ctx.state.negotiations.insert(id, negotiation);
    if let Some(rel) = ctx.state.relations.get_mut(&key) {
        rel.pending_negotiations.insert(id);
    }

    tracing::debug!("day {day}: negotiation {id} opened on {key} for {treaty_type}");
    ctx.emit(DiplomacyEventKind::NegotiationStarted {
        negotiation_id: id,
        groups: key.groups().to_vec(),
        treaty_type,
        negotiators,
    });
}
