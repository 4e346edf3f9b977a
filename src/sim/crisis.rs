use rand::Rng;

use super::context::TickContext;
use super::system::SimSystem;
use crate::model::{
    CrisisRecord, CrisisTrigger, DiplomacyEventKind, Interest, PairKey, Severity, WorldEvent,
};

const CRISIS_TRUST_PENALTY: f64 = -0.2;
const RESOLUTION_TRUST_BONUS: f64 = 0.1;
const RESOLUTION_WINDOW_DAYS: u32 = 30;
const RESOLUTION_CHANCE_PER_TRUST: f64 = 0.3;
const CRISIS_RETENTION_DAYS: u32 = 365;

/// Escalates alarming world events into crises on the relation they hit and
/// gives each open crisis a daily chance to be talked down.
#[derive(Debug, Default)]
pub struct CrisisSystem;

impl SimSystem for CrisisSystem {
    fn name(&self) -> &str {
        "crises"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let inputs = ctx.inputs;
        for event in inputs.world_events {
            if let Some(trigger) = CrisisTrigger::detect(&event.event_type) {
                open_crisis(ctx, event, trigger);
            }
        }
        attempt_resolutions(ctx);

        let day = ctx.day();
        ctx.state
            .crises
            .retain(|c| day.saturating_sub(c.day) <= CRISIS_RETENTION_DAYS);
    }
}

fn open_crisis(ctx: &mut TickContext, event: &WorldEvent, trigger: CrisisTrigger) {
    let day = ctx.day();
    let affected = event.affected();
    let [first, second, ..] = affected else {
        return;
    };
    let Some(key) = PairKey::new(*first, *second) else {
        return;
    };
    let Some(rel) = ctx.state.relations.get_mut(&key) else {
        return;
    };
    if !rel.is_live() {
        return;
    }

    rel.adjust_trust(CRISIS_TRUST_PENALTY);
    rel.record_incident(&event.event_type, day, Severity::High);
    if trigger == CrisisTrigger::TerritorialDispute {
        rel.conflicting_interests.insert(Interest::TerritorialDispute);
    }

    let id = ctx.state.id_gen.next_id();
    ctx.state.crises.push(CrisisRecord {
        id,
        trigger,
        trigger_event: event.event_type.clone(),
        pair: key,
        day,
        window_end: day + RESOLUTION_WINDOW_DAYS,
        resolved: false,
        resolved_day: None,
        resolution_attempts: 0,
    });

    tracing::info!("day {day}: {trigger} crisis between groups {key}");
    ctx.emit(DiplomacyEventKind::DiplomaticCrisis {
        crisis_id: id,
        trigger,
        affected_groups: affected.to_vec(),
        trust_impact: CRISIS_TRUST_PENALTY,
    });
}

/// One roll per open crisis, succeeding with probability `trust * 0.3`.
/// Crises past their window are left as they are.
fn attempt_resolutions(ctx: &mut TickContext) {
    let day = ctx.day();
    for i in 0..ctx.state.crises.len() {
        let crisis = &ctx.state.crises[i];
        if !crisis.is_open(day) {
            continue;
        }
        let key = crisis.pair;
        let Some(trust) = ctx
            .state
            .relations
            .get(&key)
            .filter(|r| r.is_live())
            .map(|r| r.trust)
        else {
            continue;
        };

        let resolved = ctx.rng.random_range(0.0..1.0) < trust * RESOLUTION_CHANCE_PER_TRUST;
        let crisis = &mut ctx.state.crises[i];
        crisis.resolution_attempts += 1;
        if !resolved {
            continue;
        }
        crisis.resolved = true;
        crisis.resolved_day = Some(day);
        let (id, trigger) = (crisis.id, crisis.trigger);

        if let Some(rel) = ctx.state.relations.get_mut(&key) {
            rel.adjust_trust(RESOLUTION_TRUST_BONUS);
        }
        tracing::info!("day {day}: crisis {id} between groups {key} resolved");
        ctx.emit(DiplomacyEventKind::DiplomaticCrisisResolved {
            crisis_id: id,
            trigger,
            affected_groups: key.groups().to_vec(),
            trust_recovery: RESOLUTION_TRUST_BONUS,
        });
    }
}
