use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

use rand::rngs::SmallRng;
use rand::{RngCore, SeedableRng};

use super::contact::ContactSystem;
use super::context::{TickContext, TickInputs};
use super::corps::CorpsSystem;
use super::crisis::CrisisSystem;
use super::negotiation::{NegotiationOpportunitySystem, NegotiationProgressSystem};
use super::relations::RelationSystem;
use super::system::SimSystem;
use super::treaties::TreatySystem;
use super::trends::TrendSystem;
use crate::flush::flush_to_jsonl;
use crate::model::{AgentSnapshot, DiplomacyEvent, DiplomacyState, Group, Institution, WorldEvent};

/// Configuration for a multi-day run.
pub struct SimConfig {
    pub start_day: u32,
    pub num_days: u32,
    pub seed: u64,
    /// If set, flush the registry every N days.
    pub flush_interval: Option<u32>,
    /// Directory to write flush checkpoints into.
    pub output_dir: Option<PathBuf>,
}

impl SimConfig {
    pub fn new(start_day: u32, num_days: u32, seed: u64) -> Self {
        Self {
            start_day,
            num_days,
            seed,
            flush_interval: None,
            output_dir: None,
        }
    }

    pub fn flush_every(mut self, days: u32) -> Self {
        self.flush_interval = Some(days);
        self
    }

    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }
}

/// The eight stages in their fixed daily order. Trends must stay last.
pub fn default_systems() -> Vec<Box<dyn SimSystem>> {
    vec![
        Box::new(ContactSystem::new()),
        Box::new(RelationSystem),
        Box::new(NegotiationProgressSystem),
        Box::new(NegotiationOpportunitySystem),
        Box::new(TreatySystem),
        Box::new(CorpsSystem),
        Box::new(CrisisSystem),
        Box::new(TrendSystem),
    ]
}

/// Set `state.current_day` and run every system once, in order, against the
/// same inputs. Returns everything the systems emitted, in emission order.
pub fn dispatch_systems(
    state: &mut DiplomacyState,
    systems: &mut [Box<dyn SimSystem>],
    rng: &mut dyn RngCore,
    inputs: TickInputs,
) -> Vec<DiplomacyEvent> {
    state.current_day = inputs.day;

    let mut events = Vec::new();
    for system in systems.iter_mut() {
        let mut ctx = TickContext {
            state,
            rng,
            inputs,
            events: &mut events,
        };
        system.tick(&mut ctx);
    }
    events
}

/// Run one simulated day with the default stages.
///
/// `world_events` are the previous day's events. The returned records are
/// what the rest of the simulation should see, and by convention what goes
/// into tomorrow's `world_events`.
pub fn process_daily_diplomacy(
    state: &mut DiplomacyState,
    rng: &mut dyn RngCore,
    agents: &BTreeMap<u64, AgentSnapshot>,
    groups: &BTreeMap<u64, Group>,
    institutions: &[Institution],
    world_events: &[WorldEvent],
    day: u32,
) -> Vec<DiplomacyEvent> {
    let inputs = TickInputs {
        agents,
        groups,
        institutions,
        world_events,
        day,
    };
    dispatch_systems(state, &mut default_systems(), rng, inputs)
}

/// A registry bundled with its stages and a seeded RNG, for callers that
/// drive the simulation one day at a time.
pub struct Diplomacy {
    pub state: DiplomacyState,
    systems: Vec<Box<dyn SimSystem>>,
    rng: SmallRng,
}

impl Diplomacy {
    pub fn new(seed: u64) -> Self {
        Self::from_state(DiplomacyState::new(), seed)
    }

    /// Resume from an existing registry, e.g. one restored from a snapshot.
    pub fn from_state(state: DiplomacyState, seed: u64) -> Self {
        Self {
            state,
            systems: default_systems(),
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Replace the stage list. Mostly for tests.
    pub fn with_systems(mut self, systems: Vec<Box<dyn SimSystem>>) -> Self {
        self.systems = systems;
        self
    }

    pub fn process_daily_diplomacy(
        &mut self,
        agents: &BTreeMap<u64, AgentSnapshot>,
        groups: &BTreeMap<u64, Group>,
        institutions: &[Institution],
        world_events: &[WorldEvent],
        day: u32,
    ) -> Vec<DiplomacyEvent> {
        let inputs = TickInputs {
            agents,
            groups,
            institutions,
            world_events,
            day,
        };
        dispatch_systems(&mut self.state, &mut self.systems, &mut self.rng, inputs)
    }
}

/// Fixed rosters plus external events scheduled by day, for [`run`].
#[derive(Debug, Clone, Default)]
pub struct RunInputs {
    pub agents: BTreeMap<u64, AgentSnapshot>,
    pub groups: BTreeMap<u64, Group>,
    pub institutions: Vec<Institution>,
    /// Events delivered as the world-event input of the given day.
    pub scheduled_events: BTreeMap<u32, Vec<WorldEvent>>,
}

/// Run the simulation for the configured number of days.
///
/// Creates a deterministic RNG from `config.seed`. Each day's world events are
/// that day's scheduled events followed by the previous day's output, so
/// violations escalate into crises and so on without any outside help.
pub fn run(
    state: &mut DiplomacyState,
    systems: &mut [Box<dyn SimSystem>],
    inputs: &RunInputs,
    config: SimConfig,
) -> io::Result<Vec<DiplomacyEvent>> {
    let mut all_events = Vec::new();
    if systems.is_empty() || config.num_days == 0 {
        return Ok(all_events);
    }

    let mut rng = SmallRng::seed_from_u64(config.seed);
    let mut feedback: Vec<WorldEvent> = Vec::new();

    for day_offset in 0..config.num_days {
        let day = config.start_day + day_offset;
        let mut world_events = inputs
            .scheduled_events
            .get(&day)
            .cloned()
            .unwrap_or_default();
        world_events.append(&mut feedback);

        let tick_inputs = TickInputs {
            agents: &inputs.agents,
            groups: &inputs.groups,
            institutions: &inputs.institutions,
            world_events: &world_events,
            day,
        };
        let events = dispatch_systems(state, systems, &mut rng, tick_inputs);
        feedback = events.iter().map(DiplomacyEvent::to_world_event).collect();
        all_events.extend(events);

        // Flush checkpoint at configured interval
        if let (Some(interval), Some(dir)) = (config.flush_interval, &config.output_dir) {
            let is_last_day = day_offset == config.num_days - 1;
            if is_last_day || (day_offset + 1) % interval.max(1) == 0 {
                let checkpoint_dir = dir.join(format!("day_{day:06}"));
                flush_to_jsonl(state, &checkpoint_dir)?;
                tracing::debug!("day {day}: checkpoint written to {}", checkpoint_dir.display());
            }
        }
    }

    Ok(all_events)
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::model::{DiplomacyEventKind, GroupKind};
    use crate::scenario::Scenario;

    /// Records the order it was called in and the world-event types it saw.
    struct Probe {
        label: &'static str,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl SimSystem for Probe {
        fn name(&self) -> &str {
            self.label
        }
        fn tick(&mut self, ctx: &mut TickContext) {
            let seen: Vec<&str> = ctx
                .inputs
                .world_events
                .iter()
                .map(|e| e.event_type.as_str())
                .collect();
            self.log.borrow_mut().push(format!(
                "{}@{}:{}:{}",
                self.label,
                ctx.day(),
                ctx.events.len(),
                seen.join(",")
            ));
        }
    }

    /// Emits one record per day.
    struct Emitter;

    impl SimSystem for Emitter {
        fn name(&self) -> &str {
            "emitter"
        }
        fn tick(&mut self, ctx: &mut TickContext) {
            ctx.emit(DiplomacyEventKind::DiplomaticRelationDissolved {
                group1: 1,
                group2: 2,
                reason: "test".to_string(),
            });
        }
    }

    fn probe(label: &'static str, log: &Rc<RefCell<Vec<String>>>) -> Box<dyn SimSystem> {
        Box::new(Probe {
            label,
            log: Rc::clone(log),
        })
    }

    #[test]
    fn empty_systems_noop() {
        let mut state = DiplomacyState::new();
        let events = run(&mut state, &mut [], &RunInputs::default(), SimConfig::new(1, 10, 0)).unwrap();
        assert!(events.is_empty());
        assert_eq!(state.current_day, 0);
    }

    #[test]
    fn zero_days_noop() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut systems = vec![probe("a", &log)];
        let mut state = DiplomacyState::new();
        run(&mut state, &mut systems, &RunInputs::default(), SimConfig::new(1, 0, 0)).unwrap();
        assert!(log.borrow().is_empty());
    }

    #[test]
    fn systems_called_in_order_and_see_earlier_output() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut systems: Vec<Box<dyn SimSystem>> =
            vec![probe("first", &log), Box::new(Emitter), probe("last", &log)];
        let mut state = DiplomacyState::new();
        let inputs = RunInputs::default();
        let tick_inputs = TickInputs {
            agents: &inputs.agents,
            groups: &inputs.groups,
            institutions: &inputs.institutions,
            world_events: &[],
            day: 7,
        };
        let mut rng = SmallRng::seed_from_u64(0);
        let events = dispatch_systems(&mut state, &mut systems, &mut rng, tick_inputs);
        assert_eq!(events.len(), 1);
        assert_eq!(state.current_day, 7);
        assert_eq!(*log.borrow(), vec!["first@7:0:", "last@7:1:"]);
    }

    #[test]
    fn output_feeds_next_day_after_scheduled_events() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut systems: Vec<Box<dyn SimSystem>> = vec![probe("p", &log), Box::new(Emitter)];
        let mut inputs = RunInputs::default();
        inputs
            .scheduled_events
            .insert(2, vec![WorldEvent::new("harvest_festival", vec![1])]);
        let mut state = DiplomacyState::new();
        let events = run(&mut state, &mut systems, &inputs, SimConfig::new(1, 3, 0)).unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(
            *log.borrow(),
            vec![
                "p@1:0:",
                "p@2:0:harvest_festival,diplomatic_relation_dissolved",
                "p@3:0:diplomatic_relation_dissolved",
            ]
        );
        assert_eq!(state.current_day, 3);
    }

    #[test]
    fn same_seed_same_history() {
        let mut s = Scenario::new();
        for (name, kind) in [
            ("Smiths", GroupKind::Guild),
            ("Traders", GroupKind::MerchantGroup),
            ("Elders", GroupKind::Council),
            ("Raiders", GroupKind::Faction),
        ] {
            let g = s.add_group(name, kind, 12, "village_center");
            s.add_leader(g);
        }
        let inputs = s.run_inputs();

        let replay = |seed| {
            let mut state = DiplomacyState::new();
            let events =
                run(&mut state, &mut default_systems(), &inputs, SimConfig::new(1, 120, seed))
                    .unwrap();
            (state, events)
        };
        let (state_a, events_a) = replay(42);
        let (state_b, events_b) = replay(42);
        assert_eq!(events_a, events_b);
        assert_eq!(state_a, state_b);
        assert!(state_a.validate().is_ok());
    }

    #[test]
    fn checkpoints_at_interval_and_last_day() {
        let dir = tempfile::tempdir().unwrap();
        let mut systems: Vec<Box<dyn SimSystem>> = vec![Box::new(Emitter)];
        let mut state = DiplomacyState::new();
        let config = SimConfig::new(1, 5, 0).flush_every(2).output_dir(dir.path());
        run(&mut state, &mut systems, &RunInputs::default(), config).unwrap();

        for day in [2, 4, 5] {
            let meta = dir.path().join(format!("day_{day:06}")).join("meta.json");
            assert!(meta.exists(), "missing checkpoint for day {day}");
        }
        assert!(!dir.path().join("day_000001").exists());
        assert!(!dir.path().join("day_000003").exists());
    }

    #[test]
    fn custom_stages_replace_defaults() {
        let mut engine = Diplomacy::new(1).with_systems(vec![Box::new(Emitter)]);
        let groups = BTreeMap::new();
        let events = engine.process_daily_diplomacy(&BTreeMap::new(), &groups, &[], &[], 4);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].day, 4);
        assert_eq!(engine.state.current_day, 4);
    }

    #[test]
    fn engine_matches_free_function() {
        let mut s = Scenario::new();
        s.add_group("Ash", GroupKind::Council, 8, "fields");
        s.add_group("Elm", GroupKind::Council, 8, "fields");
        let mut engine = Diplomacy::new(5);
        let mut state = DiplomacyState::new();
        let mut rng = SmallRng::seed_from_u64(5);
        for day in 1..=60 {
            let from_engine =
                engine.process_daily_diplomacy(&s.agents, &s.groups, &s.institutions, &[], day);
            let from_fn = process_daily_diplomacy(
                &mut state,
                &mut rng,
                &s.agents,
                &s.groups,
                &s.institutions,
                &[],
                day,
            );
            assert_eq!(from_engine, from_fn);
        }
        assert_eq!(engine.state, state);
    }
}
