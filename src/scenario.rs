use std::collections::BTreeMap;

use crate::model::*;
use crate::sim::{RunInputs, TickInputs};

/// Builder for the read-only world the diplomacy core looks at: groups, their
/// member agents, institutions and the previous day's world events.
///
/// Groups and agents draw IDs from one counter, so every ID handed out is
/// unique and ascending in creation order.
///
/// ```ignore
/// let mut s = Scenario::new();
/// let ash = s.add_group("Ash", GroupKind::Tribe, 5, "fields");
/// let elm = s.add_group("Elm", GroupKind::Tribe, 5, "fields");
/// s.add_leader(ash);
/// let mut state = s.state_with_relation(ash, elm, DiplomaticStatus::Neutral, 0.5);
/// ```
#[derive(Debug, Clone, Default)]
pub struct Scenario {
    pub groups: BTreeMap<u64, Group>,
    pub agents: BTreeMap<u64, AgentSnapshot>,
    pub institutions: Vec<Institution>,
    /// Events every [`inputs`](Self::inputs) call reports as "yesterday's".
    pub world_events: Vec<WorldEvent>,
    /// Events fed to [`run`](crate::sim::run) on specific days.
    pub scheduled_events: BTreeMap<u32, Vec<WorldEvent>>,
    next_id: u64,
}

impl Scenario {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id.max(1);
        self.next_id = id + 1;
        id
    }

    // -- Groups and agents --

    /// Add a group with `members` ordinary members at `location`. Members are
    /// alive, 30 years old, with reputation 0.3, no personal relationships and
    /// no specialization.
    pub fn add_group(&mut self, name: &str, kind: GroupKind, members: usize, location: &str) -> u64 {
        let id = self.next_id();
        self.groups.insert(
            id,
            Group {
                id,
                name: name.to_string(),
                kind,
                members: Vec::with_capacity(members),
                leaders: Vec::new(),
                disbanded: false,
            },
        );
        for _ in 0..members {
            self.add_agent_with(id, location, |_| {});
        }
        id
    }

    /// Add a well-connected member: age and reputation as given, five personal
    /// relationships, no specialization.
    pub fn add_agent(&mut self, group: u64, age: u32, reputation: f64, location: &str) -> u64 {
        self.add_agent_with(group, location, |a| {
            a.age = age;
            a.reputation = reputation;
            a.relationship_count = 5;
        })
    }

    /// Add a member with default attributes, then let `modify` adjust the snapshot.
    pub fn add_agent_with(
        &mut self,
        group: u64,
        location: &str,
        modify: impl FnOnce(&mut AgentSnapshot),
    ) -> u64 {
        let id = self.next_id();
        let mut agent = AgentSnapshot {
            id,
            alive: true,
            age: 30,
            reputation: 0.3,
            relationship_count: 0,
            specialization: None,
            location: location.to_string(),
        };
        modify(&mut agent);
        self.agents.insert(id, agent);
        self.join(id, group);
        id
    }

    /// Add a default member who also leads the group. Lives where the group's
    /// first member lives.
    pub fn add_leader(&mut self, group: u64) -> u64 {
        let location = self.home_of(group);
        let id = self.add_agent_with(group, &location, |_| {});
        if let Some(g) = self.groups.get_mut(&group) {
            g.leaders.push(id);
        }
        id
    }

    /// Make an existing agent a member of another group as well.
    pub fn join(&mut self, agent: u64, group: u64) {
        let g = self.group_mut(group);
        if !g.members.contains(&agent) {
            g.members.push(agent);
        }
    }

    pub fn disband(&mut self, group: u64) {
        self.group_mut(group).disbanded = true;
    }

    pub fn add_institution(&mut self, name: &str, member_groups: Vec<u64>) -> u64 {
        let id = self.next_id();
        self.institutions.push(Institution {
            id,
            name: name.to_string(),
            member_groups,
        });
        id
    }

    fn group_mut(&mut self, group: u64) -> &mut Group {
        self.groups.get_mut(&group).expect("unknown group")
    }

    fn home_of(&self, group: u64) -> String {
        self.groups
            .get(&group)
            .and_then(|g| g.members.first())
            .and_then(|m| self.agents.get(m))
            .map(|a| a.location.clone())
            .unwrap_or_else(|| "village_center".to_string())
    }

    // -- World events --

    pub fn add_world_event(&mut self, event: WorldEvent) {
        self.world_events.push(event);
    }

    pub fn clear_world_events(&mut self) {
        self.world_events.clear();
    }

    /// Queue an event for the given day of a [`run`](crate::sim::run).
    pub fn schedule(&mut self, day: u32, event: WorldEvent) {
        self.scheduled_events.entry(day).or_default().push(event);
    }

    // -- Inputs --

    /// Snapshot view for a single tick on `day`.
    pub fn inputs(&self, day: u32) -> TickInputs<'_> {
        TickInputs {
            agents: &self.agents,
            groups: &self.groups,
            institutions: &self.institutions,
            world_events: &self.world_events,
            day,
        }
    }

    /// Owned inputs for a multi-day [`run`](crate::sim::run).
    pub fn run_inputs(&self) -> RunInputs {
        RunInputs {
            agents: self.agents.clone(),
            groups: self.groups.clone(),
            institutions: self.institutions.clone(),
            scheduled_events: self.scheduled_events.clone(),
        }
    }

    // -- Registry seeding --

    /// A registry holding one relation between `a` and `b`, established on
    /// day 0 with cultural affinity 0.5 and even power.
    pub fn state_with_relation(
        &self,
        a: u64,
        b: u64,
        status: DiplomaticStatus,
        trust: f64,
    ) -> DiplomacyState {
        let mut state = DiplomacyState::new();
        self.add_relation(&mut state, a, b, status, trust);
        state
    }

    pub fn add_relation(
        &self,
        state: &mut DiplomacyState,
        a: u64,
        b: u64,
        status: DiplomaticStatus,
        trust: f64,
    ) {
        let key = PairKey::new(a, b).expect("relation needs two distinct groups");
        state.insert_relation(DiplomaticRelation::new(key, status, 0, trust, 0.5, 0.0));
    }

    /// Sign a treaty of `treaty_type` between `groups` on `day` and attach it
    /// to their relations. Returns the treaty ID.
    pub fn sign(
        &self,
        state: &mut DiplomacyState,
        treaty_type: TreatyType,
        groups: &[u64],
        day: u32,
    ) -> u64 {
        let names: Vec<String> = groups.iter().map(|g| self.group_name(*g)).collect();
        let id = state.id_gen.next_id();
        let treaty = Treaty::from_template(
            id,
            treaty_name(treaty_type, &names),
            treaty_type,
            groups.to_vec(),
            day,
        );
        state.attach_treaty(treaty);
        id
    }

    /// Open a negotiation between `a` and `b` on day 0, in the proposal phase
    /// with the given agreement probability. Group leaders act as negotiators.
    pub fn open_negotiation(
        &self,
        state: &mut DiplomacyState,
        a: u64,
        b: u64,
        treaty_type: TreatyType,
        agreement_probability: f64,
    ) -> u64 {
        let key = PairKey::new(a, b).expect("negotiation needs two distinct groups");
        let id = state.id_gen.next_id();
        let lead_negotiators = [a, b]
            .into_iter()
            .filter_map(|g| {
                let leader = self.groups.get(&g)?.leaders.first()?;
                Some((g, *leader))
            })
            .collect();
        state.negotiations.insert(
            id,
            Negotiation {
                id,
                relation: key,
                groups: vec![a, b],
                proposed_treaty_type: treaty_type,
                started_day: 0,
                phase: NegotiationPhase::Proposal,
                lead_negotiators,
                time_pressure: 0.5,
                public_pressure: 0.5,
                agreement_probability,
                rounds: 0,
            },
        );
        state
            .relations
            .get_mut(&key)
            .expect("negotiation needs an existing relation")
            .pending_negotiations
            .insert(id);
        id
    }

    /// Put `agent` in `group`'s diplomatic corps as an envoy with the given
    /// negotiation skill.
    pub fn appoint(&self, state: &mut DiplomacyState, agent: u64, group: u64, skill: f64) {
        let snapshot = self.agents.get(&agent).expect("unknown agent");
        state.corps.insert(
            agent,
            DiplomaticAgent {
                agent_id: agent,
                role: DiplomaticRole::Envoy,
                representing_group: group,
                assigned_location: snapshot.location.clone(),
                assignment_day: 0,
                negotiation_skill: skill,
                cultural_understanding: 0.5,
                reputation: snapshot.reputation,
                successful_negotiations: 0,
                failed_negotiations: 0,
                loyalty: 0.8,
                effectiveness_rating: 0.5,
            },
        );
    }

    fn group_name(&self, group: u64) -> String {
        self.groups
            .get(&group)
            .map(|g| g.name.clone())
            .unwrap_or_else(|| format!("Group {group}"))
    }
}
