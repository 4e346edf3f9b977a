#![allow(dead_code)]

use diplomacy_sim::model::*;
use diplomacy_sim::scenario::Scenario;

/// Five groups sharing the village square, each with a leader and one
/// well-placed candidate for the diplomatic corps.
pub fn build_village() -> (Scenario, Vec<u64>) {
    let mut s = Scenario::new();
    let mut groups = Vec::new();
    for (name, kind) in [
        ("Smiths", GroupKind::Guild),
        ("Traders", GroupKind::MerchantGroup),
        ("Elders", GroupKind::Council),
        ("Raiders", GroupKind::Faction),
        ("Hill Folk", GroupKind::Tribe),
    ] {
        let g = s.add_group(name, kind, 8, "village_center");
        s.add_leader(g);
        s.add_agent_with(g, "village_center", |a| {
            a.age = 42;
            a.reputation = 0.8;
            a.relationship_count = 6;
            a.specialization = Some("merchant".to_string());
        });
        groups.push(g);
    }
    let council = vec![groups[0], groups[1], groups[2]];
    s.add_institution("Village Council", council);
    (s, groups)
}

/// A steady trickle of friction and goodwill between the village groups.
pub fn schedule_unrest(s: &mut Scenario, groups: &[u64], days: u32) {
    let (raiders, hill_folk, traders) = (groups[3], groups[4], groups[1]);
    for day in (1..=days).step_by(9) {
        s.schedule(day, WorldEvent::new("border_conflict", vec![raiders, hill_folk]));
        s.schedule(day + 3, WorldEvent::new("resource_theft", vec![raiders, traders]));
    }
    for day in (5..=days).step_by(23) {
        s.schedule(day, WorldEvent::new("territorial_dispute", vec![raiders, hill_folk]));
    }
    for day in (2..=days).step_by(7) {
        s.schedule(day, WorldEvent::new("trade_fair", vec![groups[0], traders]));
    }
}

/// A registry with one relation, one treaty and one negotiation on it,
/// plus a corps member, a crisis and a trend row.
pub fn build_small_registry() -> (Scenario, DiplomacyState) {
    let mut s = Scenario::new();
    let a = s.add_group("Ash", GroupKind::Tribe, 4, "fields");
    let b = s.add_group("Elm", GroupKind::Tribe, 4, "fields");
    s.add_leader(a);
    s.add_leader(b);
    let envoy = s.add_agent(a, 40, 0.9, "fields");

    let mut state = s.state_with_relation(a, b, DiplomaticStatus::Friendly, 0.65);
    let treaty = s.sign(&mut state, TreatyType::TradeAgreement, &[a, b], 3);
    state.treaties.get_mut(&treaty).unwrap().economic_impact.insert(a, 0.25);
    s.open_negotiation(&mut state, a, b, TreatyType::CulturalExchange, 0.45);
    s.appoint(&mut state, envoy, a, 0.55);
    state
        .relation_mut(a, b)
        .unwrap()
        .record_incident("trade\tdispute", 4, Severity::High);

    let crisis_id = state.id_gen.next_id();
    state.crises.push(CrisisRecord {
        id: crisis_id,
        trigger: CrisisTrigger::TradeEmbargo,
        trigger_event: "trade_embargo".to_string(),
        pair: PairKey::new(a, b).unwrap(),
        day: 4,
        window_end: 34,
        resolved: false,
        resolved_day: None,
        resolution_attempts: 1,
    });
    state.trends.insert(
        4,
        TrendSnapshot {
            day: 4,
            average_trust: 0.65,
            peaceful_relations: 1.0,
            hostile_relations: 0.0,
            active_treaties: 1,
            open_negotiations: 1,
        },
    );
    state.current_day = 4;
    (s, state)
}

pub fn read_lines(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
