use rand::Rng;

use super::context::TickContext;
use super::helpers::{group_locations, is_diplomatically_active, locations_adjacent};
use super::system::SimSystem;
use crate::model::{
    DiplomacyEventKind, DiplomaticRelation, DiplomaticStatus, Group, GroupKind, PairKey,
};

// --- Contact Probability ---
const CONTACT_BASE_PROBABILITY: f64 = 0.02;
const OVERLAPPING_LOCATION_MULTIPLIER: f64 = 3.0;
const ADJACENT_LOCATION_MULTIPLIER: f64 = 2.0;
const SIZE_FACTOR_DIVISOR: f64 = 10.0;
const SIZE_FACTOR_CAP: f64 = 3.0;
const COMPLEMENTARY_CHANCE: f64 = 0.3;
const COMPLEMENTARY_MULTIPLIER: f64 = 1.5;
const EXPERIENCE_CHANCE: f64 = 0.2;
const EXPERIENCE_MULTIPLIER: f64 = 1.3;
const CONTACT_PROBABILITY_CAP: f64 = 0.3;

// --- Initial Relation ---
const HISTORICAL_CONFLICT_CHANCE: f64 = 0.1;
const INITIAL_TRUST: f64 = 0.5;
const COMPATIBLE_TRUST_BONUS: f64 = 0.2;
const CONFLICT_TRUST_PENALTY: f64 = 0.3;
const TRUST_NOISE: f64 = 0.1;
const INITIAL_AFFINITY: f64 = 0.5;
const AFFINITY_NOISE_LOW: f64 = -0.2;
const AFFINITY_NOISE_HIGH: f64 = 0.3;
const POWER_NOISE: f64 = 0.2;

const CONTACT_METHODS: [&str; 6] = [
    "territorial_encounter",
    "trade_contact",
    "cultural_exchange",
    "military_encounter",
    "diplomatic_mission",
    "accidental_meeting",
];

/// Kind pairs that start out friendly.
const COMPATIBLE_KINDS: [(GroupKind, GroupKind); 3] = [
    (GroupKind::Guild, GroupKind::MerchantGroup),
    (GroupKind::Institution, GroupKind::CulturalGroup),
    (GroupKind::Alliance, GroupKind::PoliticalGroup),
];

/// Establishes first contact between unconnected, diplomatically active
/// groups.
#[derive(Debug, Default)]
pub struct ContactSystem {
    forced: bool,
}

impl ContactSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every eligible pair makes contact on the first tick. The remaining
    /// rolls (status, trust, method) still come from the RNG.
    pub fn forced() -> Self {
        Self { forced: true }
    }
}

impl SimSystem for ContactSystem {
    fn name(&self) -> &str {
        "contact"
    }

    fn tick(&mut self, ctx: &mut TickContext) {
        let inputs = ctx.inputs;
        let active: Vec<&Group> = inputs
            .groups
            .values()
            .filter(|g| is_diplomatically_active(g, inputs.institutions))
            .collect();

        for (i, a) in active.iter().enumerate() {
            for b in &active[i + 1..] {
                let Some(key) = PairKey::new(a.id, b.id) else {
                    continue;
                };
                if ctx.state.relations.contains_key(&key) {
                    continue;
                }

                let probability = contact_probability(ctx, a, b);
                if !self.forced && ctx.rng.random_range(0.0..1.0) >= probability {
                    continue;
                }
                establish_contact(ctx, key, a, b);
            }
        }
    }
}

fn contact_probability(ctx: &mut TickContext, a: &Group, b: &Group) -> f64 {
    let mut p = CONTACT_BASE_PROBABILITY;

    let locs_a = group_locations(a, ctx.inputs.agents);
    let locs_b = group_locations(b, ctx.inputs.agents);
    if !locs_a.is_disjoint(&locs_b) {
        p *= OVERLAPPING_LOCATION_MULTIPLIER;
    } else if locations_adjacent(&locs_a, &locs_b) {
        p *= ADJACENT_LOCATION_MULTIPLIER;
    }

    let total = (a.members.len() + b.members.len()) as f64;
    p *= (total / SIZE_FACTOR_DIVISOR).sqrt().min(SIZE_FACTOR_CAP);

    if ctx.rng.random_range(0.0..1.0) < COMPLEMENTARY_CHANCE {
        p *= COMPLEMENTARY_MULTIPLIER;
    }

    let experienced =
        ctx.state.has_any_relation(a.id) || ctx.state.has_any_relation(b.id);
    if experienced || ctx.rng.random_range(0.0..1.0) < EXPERIENCE_CHANCE {
        p *= EXPERIENCE_MULTIPLIER;
    }

    p.min(CONTACT_PROBABILITY_CAP)
}

fn kinds_compatible(a: &GroupKind, b: &GroupKind) -> bool {
    COMPATIBLE_KINDS
        .iter()
        .any(|(x, y)| (x == a && y == b) || (x == b && y == a))
}

fn establish_contact(ctx: &mut TickContext, key: PairKey, a: &Group, b: &Group) {
    let day = ctx.day();
    let compatible = kinds_compatible(&a.kind, &b.kind);
    let historical_conflict = ctx.rng.random_range(0.0..1.0) < HISTORICAL_CONFLICT_CHANCE;

    let status = if compatible {
        DiplomaticStatus::Friendly
    } else if historical_conflict {
        DiplomaticStatus::Hostile
    } else {
        DiplomaticStatus::Neutral
    };

    let mut trust = INITIAL_TRUST;
    if compatible {
        trust += COMPATIBLE_TRUST_BONUS;
    }
    if historical_conflict {
        trust -= CONFLICT_TRUST_PENALTY;
    }
    trust += ctx.rng.random_range(-TRUST_NOISE..TRUST_NOISE);

    let affinity =
        INITIAL_AFFINITY + ctx.rng.random_range(AFFINITY_NOISE_LOW..AFFINITY_NOISE_HIGH);

    // Sign follows key.low: positive means the lower-id group is larger.
    let (low, high) = if a.id == key.low { (a, b) } else { (b, a) };
    let (n_low, n_high) = (low.members.len() as f64, high.members.len() as f64);
    let size_ratio = if n_low + n_high > 0.0 {
        (n_low - n_high) / (n_low + n_high)
    } else {
        0.0
    };
    let power_balance = size_ratio + ctx.rng.random_range(-POWER_NOISE..POWER_NOISE);

    let method = CONTACT_METHODS[ctx.rng.random_range(0..CONTACT_METHODS.len())];

    let relation = DiplomaticRelation::new(key, status, day, trust, affinity, power_balance);
    let initial_trust = relation.trust;
    ctx.state.insert_relation(relation);

    tracing::debug!(
        "day {day}: first contact between {} and {} ({status}, {method})",
        a.name,
        b.name
    );
    ctx.emit(DiplomacyEventKind::DiplomaticFirstContact {
        group1: key.low,
        group2: key.high,
        initial_status: status,
        initial_trust,
        contact_method: method.to_string(),
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::DiplomacyState;
    use crate::scenario::Scenario;
    use crate::testutil::tick_system;

    #[test]
    fn forced_contact_creates_one_relation_per_pair() {
        let mut s = Scenario::new();
        let a = s.add_group("Ash", GroupKind::Tribe, 6, "fields");
        let b = s.add_group("Elm", GroupKind::Tribe, 6, "fields");
        let mut state = DiplomacyState::new();

        let events = tick_system(&mut state, &mut ContactSystem::forced(), &s, 1, 7);
        assert_eq!(state.relations.len(), 1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].type_name(), "diplomatic_first_contact");
        let rel = state.relation(a, b).unwrap();
        assert!((0.0..=1.0).contains(&rel.trust));
        assert!(matches!(
            rel.status,
            DiplomaticStatus::Friendly | DiplomaticStatus::Neutral | DiplomaticStatus::Hostile
        ));

        // A second pass never duplicates the pair.
        let again = tick_system(&mut state, &mut ContactSystem::forced(), &s, 2, 8);
        assert!(again.is_empty());
        assert_eq!(state.relations.len(), 1);
    }

    #[test]
    fn compatible_kinds_start_friendly() {
        let mut s = Scenario::new();
        let a = s.add_group("Smiths", GroupKind::Guild, 4, "village_center");
        let b = s.add_group("Traders", GroupKind::MerchantGroup, 4, "village_center");
        let mut state = DiplomacyState::new();
        tick_system(&mut state, &mut ContactSystem::forced(), &s, 1, 3);
        let rel = state.relation(a, b).unwrap();
        assert_eq!(rel.status, DiplomaticStatus::Friendly);
        assert!(rel.trust >= 0.3);
    }

    #[test]
    fn inactive_groups_never_meet() {
        let mut s = Scenario::new();
        s.add_group("Pair", GroupKind::Tribe, 2, "fields");
        s.add_group("Other", GroupKind::Tribe, 5, "fields");
        let mut state = DiplomacyState::new();
        let events = tick_system(&mut state, &mut ContactSystem::forced(), &s, 1, 1);
        assert!(events.is_empty());
        assert!(state.relations.is_empty());
    }

    #[test]
    fn probability_is_capped() {
        let mut s = Scenario::new();
        s.add_group("Big", GroupKind::Faction, 400, "forest");
        s.add_group("Bigger", GroupKind::Faction, 500, "forest");
        let groups: Vec<Group> = s.groups.values().cloned().collect();
        let mut state = DiplomacyState::new();
        crate::testutil::with_context(&mut state, &s, 1, 11, |ctx| {
            for _ in 0..50 {
                let p = contact_probability(ctx, &groups[0], &groups[1]);
                assert!(p <= CONTACT_PROBABILITY_CAP + 1e-12);
                assert!(p > 0.0);
            }
        });
    }

    #[test]
    fn power_balance_favours_larger_low_id_group() {
        let mut s = Scenario::new();
        let a = s.add_group("Many", GroupKind::Faction, 30, "hills");
        let b = s.add_group("Few", GroupKind::Faction, 3, "hills");
        let mut state = DiplomacyState::new();
        tick_system(&mut state, &mut ContactSystem::forced(), &s, 1, 5);
        assert!(a < b);
        // (30 - 3) / 33 = 0.82, noise at most 0.2
        assert!(state.relation(a, b).unwrap().power_balance > 0.6);
    }
}
