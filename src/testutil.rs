use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::model::*;
use crate::scenario::Scenario;
use crate::sim::{SimSystem, TickContext};

// ---------------------------------------------------------------------------
// Tick execution helpers
// ---------------------------------------------------------------------------

/// Run a single system tick on `day` against the scenario's snapshots.
/// Returns emitted events.
pub fn tick_system(
    state: &mut DiplomacyState,
    system: &mut dyn SimSystem,
    scenario: &Scenario,
    day: u32,
    seed: u64,
) -> Vec<DiplomacyEvent> {
    let mut events = Vec::new();
    with_context_events(state, scenario, day, seed, &mut events, |ctx| system.tick(ctx));
    events
}

/// Build a tick context for `day` and hand it to `f`. Useful for calling a
/// system's helper functions directly.
pub fn with_context<R>(
    state: &mut DiplomacyState,
    scenario: &Scenario,
    day: u32,
    seed: u64,
    f: impl FnOnce(&mut TickContext) -> R,
) -> R {
    let mut events = Vec::new();
    with_context_events(state, scenario, day, seed, &mut events, f)
}

/// Like [`with_context`], with `events` standing in for what earlier systems
/// emitted today. New events are appended to it.
pub fn with_context_events<R>(
    state: &mut DiplomacyState,
    scenario: &Scenario,
    day: u32,
    seed: u64,
    events: &mut Vec<DiplomacyEvent>,
    f: impl FnOnce(&mut TickContext) -> R,
) -> R {
    state.current_day = day;
    let mut rng = SmallRng::seed_from_u64(seed);
    let mut ctx = TickContext {
        state,
        rng: &mut rng,
        inputs: scenario.inputs(day),
        events,
    };
    f(&mut ctx)
}

// ---------------------------------------------------------------------------
// Assertions
// ---------------------------------------------------------------------------

/// Assert two floats are within `eps` of each other.
pub fn assert_approx(actual: f64, expected: f64, eps: f64, label: &str) {
    assert!(
        (actual - expected).abs() <= eps,
        "{label}: expected {expected}, got {actual} (eps {eps})"
    );
}

/// Panic with every broken registry invariant, prefixed by `label`.
pub fn check_invariants(state: &DiplomacyState, label: &str) {
    let problems = state.invariant_violations();
    assert!(
        problems.is_empty(),
        "{label}: {} invariant violation(s):\n  {}",
        problems.len(),
        problems.join("\n  ")
    );
}

/// Count events of one `type` tag.
pub fn count_events(events: &[DiplomacyEvent], type_name: &str) -> usize {
    events.iter().filter(|e| e.type_name() == type_name).count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::TrendSystem;

    #[test]
    fn tick_system_sets_the_day() {
        let mut s = Scenario::new();
        let a = s.add_group("Ash", GroupKind::Tribe, 2, "fields");
        let b = s.add_group("Elm", GroupKind::Tribe, 2, "fields");
        let mut state = s.state_with_relation(a, b, DiplomaticStatus::Neutral, 0.5);
        tick_system(&mut state, &mut TrendSystem, &s, 12, 0);
        assert_eq!(state.current_day, 12);
        assert!(state.trends.contains_key(&12));
        check_invariants(&state, "after trend tick");
    }

    #[test]
    #[should_panic(expected = "trust")]
    fn check_invariants_reports_problems() {
        let mut s = Scenario::new();
        let a = s.add_group("Ash", GroupKind::Tribe, 1, "fields");
        let b = s.add_group("Elm", GroupKind::Tribe, 1, "fields");
        let mut state = s.state_with_relation(a, b, DiplomaticStatus::Neutral, 0.5);
        state.relation_mut(a, b).unwrap().trust = -0.5;
        check_invariants(&state, "broken");
    }
}
