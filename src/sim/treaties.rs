use rand::Rng;

use super::context::{TickContext, TickInputs};
use super::helpers::matches_any;
use super::keywords::{ComplianceKeywords, compliance_keywords};
use super::system::SimSystem;
use crate::model::treaty::DEFAULT_TREATY_DURATION;
use crate::model::{
    Consequence, DiplomacyEventKind, DiplomaticStatus, Severity, TerminationReason, Treaty,
    TreatyStatus, TreatyType, Violation, pair_keys,
};

// --- Compliance ---
const VIOLATION_COMPLIANCE_HIT: f64 = -0.2;
const COMPLIANT_ACT_BONUS: f64 = 0.1;
const COMPLIANCE_DECAY: f64 = 0.01;
const VIOLATION_THRESHOLD: f64 = 0.5;
const REPORTABLE_COMPLIANCE_CHANGE: f64 = 0.2;

// --- Violation Consequences ---
const VIOLATION_TRUST_PENALTY: f64 = -0.15;
const PROTEST_CHANCE: f64 = 0.6;
const SANCTIONS_CHANCE: f64 = 0.3;

// --- Renewal ---
const RENEWAL_MIN_COMPLIANCE: f64 = 0.7;
const RENEWAL_SUPPORT_PER_COMPLIANCE: f64 = 0.8;
const RENEWAL_ECONOMIC_BONUS: f64 = 0.2;

/// Keeps every non-terminated treaty in step with its signatories: war,
/// disbanded groups, compliance drift, violations and renewal.
#[derive(Debug, Default)]
pub struct TreatySystem;

impl SimSystem for TreatySystem {
    fn name(&self) -> &str {
        "treaties"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let ids: Vec<u64> = ctx
            .state
            .treaties
            .values()
            .filter(|t| !t.is_terminated())
            .map(|t| t.id)
            .collect();

        for id in ids {
            let Some(treaty) = ctx.state.treaties.get(&id) else {
                continue;
            };
            if treaty
                .signatory_groups
                .iter()
                .any(|&g| !ctx.inputs.group_present(g))
            {
                terminate(ctx, id, TerminationReason::GroupDisbanded);
                continue;
            }

            if !apply_war_state(ctx, id) {
                continue;
            }
            monitor_compliance(ctx, id);
            check_renewal(ctx, id);
        }
    }
}

/// Whether any pair of the treaty's signatories is at war.
fn signatories_at_war(ctx: &TickContext, treaty: &Treaty) -> bool {
    pair_keys(&treaty.signatory_groups).iter().any(|key| {
        ctx.state
            .relations
            .get(key)
            .is_some_and(|r| r.is_live() && r.status == DiplomaticStatus::War)
    })
}

/// Terminate, suspend or reinstate according to whether the signatories are
/// at war. Returns true if the treaty is in force afterwards.
fn apply_war_state(ctx: &mut TickContext, id: u64) -> bool {
    let Some(treaty) = ctx.state.treaties.get(&id) else {
        return false;
    };
    let at_war = signatories_at_war(ctx, treaty);
    let (status, treaty_type, name) = (treaty.status, treaty.treaty_type, treaty.name.clone());

    match (at_war, status) {
        (true, _) if treaty_type == TreatyType::NonAggression => {
            terminate(ctx, id, TerminationReason::WarDeclared);
            false
        }
        (true, TreatyStatus::Active) => {
            set_status(ctx, id, TreatyStatus::Suspended);
            tracing::debug!("day {}: {name} suspended by war", ctx.day());
            ctx.emit(DiplomacyEventKind::TreatySuspended {
                treaty_id: id,
                treaty_name: name,
            });
            false
        }
        (false, TreatyStatus::Suspended) => {
            set_status(ctx, id, TreatyStatus::Active);
            tracing::debug!("day {}: {name} back in force", ctx.day());
            ctx.emit(DiplomacyEventKind::TreatyReinstated {
                treaty_id: id,
                treaty_name: name,
            });
            true
        }
        (_, status) => status == TreatyStatus::Active,
    }
}

fn set_status(ctx: &mut TickContext, id: u64, status: TreatyStatus) {
    if let Some(treaty) = ctx.state.treaties.get_mut(&id) {
        treaty.status = status;
    }
}

fn terminate(ctx: &mut TickContext, id: u64, reason: TerminationReason) {
    let Some(treaty) = ctx.state.treaties.get_mut(&id) else {
        return;
    };
    treaty.status = TreatyStatus::Terminated;
    let name = treaty.name.clone();
    let final_compliance = treaty.average_compliance();
    ctx.state.detach_treaty(id);

    tracing::info!("day {}: {name} terminated ({reason})", ctx.day());
    ctx.emit(DiplomacyEventKind::TreatyExpired {
        treaty_id: id,
        treaty_name: name,
        reason,
        final_compliance,
    });
}

/// Net compliance change for `group` from yesterday's events, including the
/// daily decay. Only events naming the group and relevant to the treaty type
/// count; a violating event is never also counted as compliant.
pub fn compliance_delta(inputs: &TickInputs, group: u64, keywords: ComplianceKeywords) -> f64 {
    let mut delta = -COMPLIANCE_DECAY;
    for event in inputs.events_involving(group) {
        let kind = event.event_type.as_str();
        if !matches_any(kind, keywords.relevance) {
            continue;
        }
        if matches_any(kind, keywords.violation) {
            delta += VIOLATION_COMPLIANCE_HIT;
        } else if matches_any(kind, keywords.compliance) {
            delta += COMPLIANT_ACT_BONUS;
        }
    }
    delta
}

fn monitor_compliance(ctx: &mut TickContext, id: u64) {
    let inputs = ctx.inputs;
    let Some(treaty) = ctx.state.treaties.get(&id) else {
        return;
    };
    let keywords = compliance_keywords(treaty.treaty_type);
    let changes: Vec<(u64, f64, f64)> = treaty
        .signatory_groups
        .iter()
        .map(|&group| {
            let old = treaty.compliance_of(group);
            let new = (old + compliance_delta(&inputs, group, keywords)).clamp(0.0, 1.0);
            (group, old, new)
        })
        .collect();

    for (group, old, new) in changes {
        if let Some(treaty) = ctx.state.treaties.get_mut(&id) {
            treaty.compliance.insert(group, new);
        }
        if old >= VIOLATION_THRESHOLD && new < VIOLATION_THRESHOLD {
            record_violation(ctx, id, group);
        } else if (new - old).abs() > REPORTABLE_COMPLIANCE_CHANGE {
            ctx.emit(DiplomacyEventKind::TreatyComplianceChange {
                treaty_id: id,
                group,
                compliance_change: new - old,
                new_compliance: new,
            });
        }
    }
}

fn record_violation(ctx: &mut TickContext, id: u64, violator: u64) {
    let day = ctx.day();
    let Some(treaty) = ctx.state.treaties.get(&id) else {
        return;
    };
    let name = treaty.name.clone();
    let co_signatories: Vec<u64> = treaty
        .signatory_groups
        .iter()
        .copied()
        .filter(|&g| g != violator)
        .collect();

    let mut consequences = Vec::new();
    for &other in &co_signatories {
        if let Some(rel) = ctx.state.relation_mut(violator, other) {
            if rel.is_live() {
                rel.adjust_trust(VIOLATION_TRUST_PENALTY);
                consequences.push(Consequence::TrustDecrease { with: other });
            }
        }
    }
    if ctx.rng.random_range(0.0..1.0) < PROTEST_CHANCE {
        consequences.push(Consequence::DiplomaticProtest);
    }
    if ctx.rng.random_range(0.0..1.0) < SANCTIONS_CHANCE {
        consequences.push(Consequence::EconomicSanctions);
    }

    let severity = Severity::Moderate;
    if let Some(treaty) = ctx.state.treaties.get_mut(&id) {
        treaty.violations.push(Violation {
            violating_group: violator,
            day,
            severity,
            consequences: consequences.clone(),
        });
    }

    tracing::debug!("day {day}: group {violator} violated {name}");
    ctx.emit(DiplomacyEventKind::TreatyViolation {
        treaty_id: id,
        treaty_name: name,
        violating_group: violator,
        co_signatories,
        severity,
        consequences,
    });
}

/// Chance that `group` backs renewing `treaty`.
pub fn renewal_support_probability(treaty: &Treaty, group: u64) -> f64 {
    let mut p = treaty.compliance_of(group) * RENEWAL_SUPPORT_PER_COMPLIANCE;
    if treaty.economic_impact.get(&group).is_some_and(|&e| e > 0.0) {
        p += RENEWAL_ECONOMIC_BONUS;
    }
    p
}

fn check_renewal(ctx: &mut TickContext, id: u64) {
    let day = ctx.day();
    let Some(treaty) = ctx.state.treaties.get(&id) else {
        return;
    };
    let due = treaty.renewal_day.is_some_and(|d| day >= d);
    if !due {
        return;
    }

    let average = treaty.average_compliance();
    let support_odds: Vec<f64> = treaty
        .signatory_groups
        .iter()
        .map(|&g| renewal_support_probability(treaty, g))
        .collect();
    let new_duration = treaty
        .treaty_type
        .template()
        .typical_duration
        .unwrap_or(DEFAULT_TREATY_DURATION);

    // Every signatory is asked, even once one has refused.
    let mut supporters = 0;
    for p in &support_odds {
        if average > RENEWAL_MIN_COMPLIANCE && ctx.rng.random_range(0.0..1.0) < *p {
            supporters += 1;
        }
    }

    if supporters < support_odds.len() {
        terminate(ctx, id, TerminationReason::RenewalFailed);
        return;
    }

    let renewal_day = day + new_duration;
    let Some(treaty) = ctx.state.treaties.get_mut(&id) else {
        return;
    };
    treaty.renewal_day = Some(renewal_day);
    let name = treaty.name.clone();
    tracing::info!("day {day}: {name} renewed until day {renewal_day}");
    ctx.emit(DiplomacyEventKind::TreatyRenewed {
        treaty_id: id,
        treaty_name: name,
        new_duration,
        renewal_day,
        compliance: average,
    });
}
