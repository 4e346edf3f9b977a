use std::collections::BTreeSet;

use rand::Rng;

use super::context::TickContext;
use super::system::SimSystem;
use crate::model::{
    AgentSnapshot, DiplomacyEventKind, DiplomaticAgent, DiplomaticRole, FailureReason,
    RecallReason,
};

// --- Appointment ---
const CORPS_QUOTA: usize = 2;
const APPOINTMENT_MIN_SCORE: f64 = 0.6;
const REPUTATION_WEIGHT: f64 = 0.4;
const RELATIONSHIP_DIVISOR: f64 = 10.0;
const RELATIONSHIP_BONUS_CAP: f64 = 0.3;
const SPECIALIZATION_BONUS: f64 = 0.3;
const DIPLOMATIC_SPECIALIZATIONS: [&str; 3] = ["leader", "scholar", "merchant"];
const PRIME_AGE: f64 = 40.0;
const AGE_WEIGHT: f64 = 0.2;

// --- New Appointee ---
const SKILL_RANGE: (f64, f64) = (0.3, 0.8);
const CULTURAL_UNDERSTANDING_RANGE: (f64, f64) = (0.4, 0.7);
const INITIAL_LOYALTY: f64 = 0.8;
const INITIAL_EFFECTIVENESS: f64 = 0.5;

// --- Performance ---
const EFFECTIVENESS_PER_SUCCESS_RATE: f64 = 1.2;
const SKILL_GAIN: f64 = 0.01;
const RECALL_EFFECTIVENESS: f64 = 0.3;

/// Staffs, evaluates and recalls each group's diplomatic corps.
#[derive(Debug, Default)]
pub struct CorpsSystem;

impl SimSystem for CorpsSystem {
    fn name(&self) -> &str {
        "corps"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        credit_outcomes(ctx);
        recall_orphaned(ctx);
        appoint(ctx);
        update_performance(ctx);
        recall_underperformers(ctx);
    }
}

/// Credit the lead negotiators of talks that concluded earlier today.
/// Talks cut short by war or a vanished group are nobody's failure.
fn credit_outcomes(ctx: &mut TickContext) {
    let mut outcomes: Vec<(u64, bool)> = Vec::new();
    for event in ctx.events.iter() {
        match &event.kind {
            DiplomacyEventKind::TreatySigned { negotiators, .. } => {
                outcomes.extend(negotiators.iter().map(|&a| (a, true)));
            }
            DiplomacyEventKind::NegotiationFailed {
                negotiators,
                reason: FailureReason::IrreconcilableDifferences,
                ..
            } => {
                outcomes.extend(negotiators.iter().map(|&a| (a, false)));
            }
            _ => {}
        }
    }

    for (agent_id, success) in outcomes {
        if let Some(agent) = ctx.state.corps.get_mut(&agent_id) {
            if success {
                agent.successful_negotiations += 1;
            } else {
                agent.failed_negotiations += 1;
            }
        }
    }
}

fn recall(ctx: &mut TickContext, agent_id: u64, reason: RecallReason) {
    let Some(agent) = ctx.state.corps.remove(&agent_id) else {
        return;
    };
    tracing::debug!(
        "day {}: agent {agent_id} recalled from group {} ({reason})",
        ctx.day(),
        agent.representing_group
    );
    ctx.emit(DiplomacyEventKind::DiplomaticAgentRecalled {
        agent_id,
        representing_group: agent.representing_group,
        reason,
        effectiveness: agent.effectiveness_rating,
    });
}

fn recall_orphaned(ctx: &mut TickContext) {
    let inputs = ctx.inputs;
    let orphaned: Vec<u64> = ctx
        .state
        .corps
        .values()
        .filter(|a| !inputs.group_present(a.representing_group))
        .map(|a| a.agent_id)
        .collect();
    for agent_id in orphaned {
        recall(ctx, agent_id, RecallReason::GroupDisbanded);
    }
}

fn recall_underperformers(ctx: &mut TickContext) {
    let underperformers: Vec<u64> = ctx
        .state
        .corps
        .values()
        .filter(|a| a.effectiveness_rating < RECALL_EFFECTIVENESS)
        .map(|a| a.agent_id)
        .collect();
    for agent_id in underperformers {
        recall(ctx, agent_id, RecallReason::PoorPerformance);
    }
}

/// Suitability of an agent for diplomatic service, roughly 0.0–1.2.
pub fn candidate_score(agent: &AgentSnapshot) -> f64 {
    let mut score = agent.reputation * REPUTATION_WEIGHT;
    score += (agent.relationship_count as f64 / RELATIONSHIP_DIVISOR).min(RELATIONSHIP_BONUS_CAP);
    if agent
        .specialization
        .as_deref()
        .is_some_and(|s| DIPLOMATIC_SPECIALIZATIONS.contains(&s))
    {
        score += SPECIALIZATION_BONUS;
    }
    let age_factor = 1.0 - (agent.age as f64 - PRIME_AGE).abs() / PRIME_AGE;
    score + age_factor.max(0.0) * AGE_WEIGHT
}

/// Single-writer pass: groups in ascending id order, one appointment per
/// group per day. Anyone already serving, for any group, is skipped, so no
/// agent is ever claimed twice.
fn appoint(ctx: &mut TickContext) {
    let inputs = ctx.inputs;
    let entitled: BTreeSet<u64> = ctx
        .state
        .live_relations()
        .filter(|r| r.status.is_peaceful())
        .flat_map(|r| r.key.groups())
        .collect();

    for group_id in entitled {
        let Some(group) = inputs.groups.get(&group_id) else {
            continue;
        };
        if group.disbanded || ctx.state.corps_of(group_id).count() >= CORPS_QUOTA {
            continue;
        }

        let mut best: Option<(&AgentSnapshot, f64)> = None;
        for agent in group.members.iter().filter_map(|id| inputs.agents.get(id)) {
            if !agent.alive || ctx.state.corps.contains_key(&agent.id) {
                continue;
            }
            let score = candidate_score(agent);
            if best.is_none_or(|(_, s)| score > s) {
                best = Some((agent, score));
            }
        }
        let Some((candidate, score)) = best else {
            continue;
        };
        if score < APPOINTMENT_MIN_SCORE {
            continue;
        }

        let role = DiplomaticRole::ALL[ctx.rng.random_range(0..DiplomaticRole::ALL.len())];
        let appointee = DiplomaticAgent {
            agent_id: candidate.id,
            role,
            representing_group: group_id,
            assigned_location: candidate.location.clone(),
            assignment_day: ctx.day(),
            negotiation_skill: ctx.rng.random_range(SKILL_RANGE.0..SKILL_RANGE.1),
            cultural_understanding: ctx
                .rng
                .random_range(CULTURAL_UNDERSTANDING_RANGE.0..CULTURAL_UNDERSTANDING_RANGE.1),
            reputation: candidate.reputation,
            successful_negotiations: 0,
            failed_negotiations: 0,
            loyalty: INITIAL_LOYALTY,
            effectiveness_rating: INITIAL_EFFECTIVENESS,
        };
        ctx.state.corps.insert(candidate.id, appointee);

        tracing::debug!(
            "day {}: agent {} appointed {role} for {}",
            ctx.day(),
            candidate.id,
            group.name
        );
        ctx.emit(DiplomacyEventKind::DiplomaticAgentAppointed {
            agent_id: candidate.id,
            representing_group: group_id,
            diplomatic_role: role,
        });
    }
}

fn update_performance(ctx: &mut TickContext) {
    for agent in ctx.state.corps.values_mut() {
        let Some(rate) = agent.success_rate() else {
            continue;
        };
        agent.effectiveness_rating = (rate * EFFECTIVENESS_PER_SUCCESS_RATE).min(1.0);
        agent.negotiation_skill = (agent.negotiation_skill + SKILL_GAIN).min(1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DiplomacyEvent, DiplomaticStatus, GroupKind, TreatyType};
    use crate::scenario::Scenario;
    use crate::testutil::{assert_approx, tick_system};

    fn snapshot(age: u32, reputation: f64, relationships: u32, spec: Option<&str>) -> AgentSnapshot {
        AgentSnapshot {
            id: 1,
            alive: true,
            age,
            reputation,
            relationship_count: relationships,
            specialization: spec.map(str::to_string),
            location: "fields".to_string(),
        }
    }

    #[test]
    fn score_weights() {
        assert_approx(
            candidate_score(&snapshot(40, 1.0, 10, Some("leader"))),
            0.4 + 0.3 + 0.3 + 0.2,
            1e-9,
            "ideal candidate",
        );
        assert_approx(
            candidate_score(&snapshot(80, 0.5, 1, Some("farmer"))),
            0.2 + 0.1,
            1e-9,
            "old farmer",
        );
        assert_approx(
            candidate_score(&snapshot(20, 0.0, 0, None)),
            0.1,
            1e-9,
            "young nobody",
        );
    }

    #[test]
    fn friendly_groups_staff_up_to_quota() {
        let mut s = Scenario::new();
        let a = s.add_group("Ash", GroupKind::Tribe, 3, "fields");
        let b = s.add_group("Elm", GroupKind::Tribe, 3, "fields");
        let envoys: Vec<u64> = (0..3).map(|_| s.add_agent(a, 40, 0.9, "fields")).collect();
        let mut state = s.state_with_relation(a, b, DiplomaticStatus::Friendly, 0.7);

        let first = tick_system(&mut state, &mut CorpsSystem, &s, 1, 1);
        assert_eq!(first.len(), 1);
        assert_eq!(state.corps_of(a).count(), 1);
        // Ties go to the earliest member.
        assert!(state.corps.contains_key(&envoys[0]));

        tick_system(&mut state, &mut CorpsSystem, &s, 2, 2);
        tick_system(&mut state, &mut CorpsSystem, &s, 3, 3);
        assert_eq!(state.corps_of(a).count(), CORPS_QUOTA);
        assert_eq!(state.corps_of(b).count(), 0);

        let agent = &state.corps[&envoys[0]];
        assert!((0.3..0.8).contains(&agent.negotiation_skill));
        assert_eq!(agent.loyalty, 0.8);
        assert_eq!(agent.effectiveness_rating, 0.5);
    }

    #[test]
    fn neutral_relations_get_no_corps() {
        let mut s = Scenario::new();
        let a = s.add_group("Ash", GroupKind::Tribe, 3, "fields");
        let b = s.add_group("Elm", GroupKind::Tribe, 3, "fields");
        s.add_agent(a, 40, 0.9, "fields");
        let mut state = s.state_with_relation(a, b, DiplomaticStatus::Neutral, 0.5);
        assert!(tick_system(&mut state, &mut CorpsSystem, &s, 1, 1).is_empty());
    }

    #[test]
    fn agent_in_two_groups_is_claimed_once() {
        let mut s = Scenario::new();
        let a = s.add_group("Ash", GroupKind::Tribe, 3, "fields");
        let b = s.add_group("Elm", GroupKind::Tribe, 3, "fields");
        let shared = s.add_agent(a, 40, 0.9, "fields");
        s.join(shared, b);
        let mut state = s.state_with_relation(a, b, DiplomaticStatus::Allied, 0.9);

        let events = tick_system(&mut state, &mut CorpsSystem, &s, 1, 1);
        assert_eq!(events.len(), 1);
        assert_eq!(state.corps[&shared].representing_group, a);
    }

    #[test]
    fn outcomes_drive_effectiveness_and_recall() {
        let mut s = Scenario::new();
        let a = s.add_group("Ash", GroupKind::Tribe, 3, "fields");
        let b = s.add_group("Elm", GroupKind::Tribe, 3, "fields");
        let envoy = s.add_agent(a, 70, 0.1, "fields");
        let mut state = s.state_with_relation(a, b, DiplomaticStatus::Neutral, 0.5);
        s.appoint(&mut state, envoy, a, 0.5);

        let failure = DiplomacyEvent::new(
            4,
            DiplomacyEventKind::NegotiationFailed {
                negotiation_id: 1,
                treaty_type: TreatyType::TradeAgreement,
                groups: vec![a, b],
                reason: FailureReason::IrreconcilableDifferences,
                rounds: 9,
                negotiators: vec![envoy],
            },
        );
        let mut events = vec![failure];
        crate::testutil::with_context_events(&mut state, &s, 4, 4, &mut events, |ctx| {
            CorpsSystem.tick(ctx)
        });
        assert!(!state.corps.contains_key(&envoy));
        match &events.last().unwrap().kind {
            DiplomacyEventKind::DiplomaticAgentRecalled { reason, .. } => {
                assert_eq!(*reason, RecallReason::PoorPerformance)
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn success_raises_skill() {
        let mut s = Scenario::new();
        let a = s.add_group("Ash", GroupKind::Tribe, 3, "fields");
        let envoy = s.add_agent(a, 70, 0.1, "fields");
        let mut state = crate::model::DiplomacyState::new();
        s.appoint(&mut state, envoy, a, 0.5);
        state.corps.get_mut(&envoy).unwrap().successful_negotiations = 3;
        state.corps.get_mut(&envoy).unwrap().failed_negotiations = 1;

        tick_system(&mut state, &mut CorpsSystem, &s, 1, 1);
        let agent = &state.corps[&envoy];
        assert_approx(agent.effectiveness_rating, 0.9, 1e-9, "0.75 * 1.2");
        assert_approx(agent.negotiation_skill, 0.51, 1e-9, "skill gain");
    }

    #[test]
    fn disbanded_group_recalls_its_corps() {
        let mut s = Scenario::new();
        let a = s.add_group("Ash", GroupKind::Tribe, 3, "fields");
        let envoy = s.add_agent(a, 40, 0.9, "fields");
        let mut state = crate::model::DiplomacyState::new();
        s.appoint(&mut state, envoy, a, 0.5);
        s.disband(a);
        let events = tick_system(&mut state, &mut CorpsSystem, &s, 1, 1);
        assert!(state.corps.is_empty());
        assert_eq!(events[0].type_name(), "diplomatic_agent_recalled");
    }
}
