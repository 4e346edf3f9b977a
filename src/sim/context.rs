use std::collections::BTreeMap;

use rand::RngCore;

use crate::model::{
    AgentSnapshot, DiplomacyEvent, DiplomacyEventKind, DiplomacyState, Group, Institution,
    WorldEvent,
};

/// Read-only snapshots handed in by the surrounding simulation for one day.
#[derive(Debug, Clone, Copy)]
pub struct TickInputs<'a> {
    pub agents: &'a BTreeMap<u64, AgentSnapshot>,
    pub groups: &'a BTreeMap<u64, Group>,
    pub institutions: &'a [Institution],
    /// Previous day's world events, in the order they happened.
    pub world_events: &'a [WorldEvent],
    pub day: u32,
}

impl<'a> TickInputs<'a> {
    /// The group exists in today's roster and has not disbanded.
    pub fn group_present(&self, id: u64) -> bool {
        self.groups.get(&id).is_some_and(|g| !g.disbanded)
    }

    pub fn events_involving(&self, group: u64) -> impl Iterator<Item = &'a WorldEvent> {
        self.world_events.iter().filter(move |e| e.involves(group))
    }
}

/// Context passed to each system on every tick.
pub struct TickContext<'a> {
    pub state: &'a mut DiplomacyState,
    pub rng: &'a mut dyn RngCore,
    pub inputs: TickInputs<'a>,
    /// Events emitted so far today, in emission order. Later stages may read
    /// what earlier stages emitted.
    pub events: &'a mut Vec<DiplomacyEvent>,
}

impl TickContext<'_> {
    pub fn day(&self) -> u32 {
        self.inputs.day
    }

    pub fn emit(&mut self, kind: DiplomacyEventKind) {
        self.events.push(DiplomacyEvent::new(self.inputs.day, kind));
    }
}
