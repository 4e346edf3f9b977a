use std::collections::BTreeMap;

use super::corps::DiplomaticAgent;
use super::crisis::CrisisRecord;
use super::negotiation::Negotiation;
use super::pair::PairKey;
use super::relation::{DiplomaticRelation, DiplomaticStatus};
use super::treaty::{Treaty, TreatyType};
use super::trend::{DiplomacySummary, TrendSnapshot};
use crate::id::IdGenerator;

/// How many of the most recent crises count as "recent" in the summary.
const SUMMARY_RECENT_CRISES: usize = 10;

/// The complete diplomatic registry: every relation, treaty, negotiation,
/// corps member, crisis and daily trend.
///
/// All collections are ordered maps, so iteration order never depends on
/// insertion history and a fixed seed always replays identically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiplomacyState {
    pub relations: BTreeMap<PairKey, DiplomaticRelation>,
    pub treaties: BTreeMap<u64, Treaty>,
    pub negotiations: BTreeMap<u64, Negotiation>,
    /// Keyed by agent id: an agent serves at most one group.
    pub corps: BTreeMap<u64, DiplomaticAgent>,
    pub crises: Vec<CrisisRecord>,
    pub trends: BTreeMap<u32, TrendSnapshot>,
    pub id_gen: IdGenerator,
    pub current_day: u32,
}

impl DiplomacyState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relation(&self, a: u64, b: u64) -> Option<&DiplomaticRelation> {
        PairKey::new(a, b).and_then(|key| self.relations.get(&key))
    }

    pub fn relation_mut(&mut self, a: u64, b: u64) -> Option<&mut DiplomaticRelation> {
        PairKey::new(a, b).and_then(|key| self.relations.get_mut(&key))
    }

    pub fn has_relation(&self, a: u64, b: u64) -> bool {
        self.relation(a, b).is_some()
    }

    /// Insert a new relation. A second relation for the same pair is refused
    /// and the existing one is left untouched; returns whether it was added.
    pub fn insert_relation(&mut self, relation: DiplomaticRelation) -> bool {
        if self.relations.contains_key(&relation.key) {
            return false;
        }
        self.relations.insert(relation.key, relation);
        true
    }

    /// Keys of relations that have not been dissolved, in canonical order.
    pub fn live_relation_keys(&self) -> Vec<PairKey> {
        self.relations
            .values()
            .filter(|r| r.is_live())
            .map(|r| r.key)
            .collect()
    }

    pub fn live_relations(&self) -> impl Iterator<Item = &DiplomaticRelation> {
        self.relations.values().filter(|r| r.is_live())
    }

    /// Whether `group` takes part in any relation at all, dissolved or not.
    pub fn has_any_relation(&self, group: u64) -> bool {
        self.relations.keys().any(|k| k.contains(group))
    }

    /// Register a treaty and attach its id to every existing relation between
    /// two of its signatories.
    pub fn attach_treaty(&mut self, treaty: Treaty) {
        for key in pair_keys(&treaty.signatory_groups) {
            if let Some(rel) = self.relations.get_mut(&key) {
                rel.treaties.insert(treaty.id);
            }
        }
        self.treaties.insert(treaty.id, treaty);
    }

    /// Remove a treaty id from every relation between its signatories. The
    /// treaty record itself stays for history.
    pub fn detach_treaty(&mut self, treaty_id: u64) {
        let Some(treaty) = self.treaties.get(&treaty_id) else {
            return;
        };
        for key in pair_keys(&treaty.signatory_groups) {
            if let Some(rel) = self.relations.get_mut(&key) {
                rel.treaties.remove(&treaty_id);
            }
        }
    }

    pub fn corps_of(&self, group: u64) -> impl Iterator<Item = &DiplomaticAgent> {
        self.corps
            .values()
            .filter(move |a| a.representing_group == group)
    }

    pub fn active_treaty_count(&self) -> usize {
        self.treaties.values().filter(|t| t.is_active()).count()
    }

    pub fn summary(&self) -> DiplomacySummary {
        let mut relations_by_status: BTreeMap<DiplomaticStatus, usize> = BTreeMap::new();
        for rel in self.relations.values() {
            *relations_by_status.entry(rel.status).or_default() += 1;
        }

        let mut treaties_by_type: BTreeMap<TreatyType, usize> = BTreeMap::new();
        for treaty in self.treaties.values().filter(|t| t.is_active()) {
            *treaties_by_type.entry(treaty.treaty_type).or_default() += 1;
        }

        let average_trust = if self.relations.is_empty() {
            0.0
        } else {
            self.relations.values().map(|r| r.trust).sum::<f64>() / self.relations.len() as f64
        };

        let complexity_factors = [
            self.relations.len() as f64 / 10.0,
            self.treaties.len() as f64 / 5.0,
            self.negotiations.len() as f64 / 3.0,
            self.corps.len() as f64 / 5.0,
        ];
        let complexity = (complexity_factors.iter().sum::<f64>()
            / complexity_factors.len() as f64)
            .min(1.0);

        DiplomacySummary {
            total_relations: self.relations.len(),
            relations_by_status,
            active_treaties: self.active_treaty_count(),
            treaties_by_type,
            ongoing_negotiations: self.negotiations.len(),
            diplomatic_agents: self.corps.len(),
            recent_crises: self.crises.len().min(SUMMARY_RECENT_CRISES),
            average_trust,
            complexity,
        }
    }

    /// Every broken invariant, described in one line each. Empty when the
    /// registry is consistent.
    pub fn invariant_violations(&self) -> Vec<String> {
        let mut problems = Vec::new();

        for (key, rel) in &self.relations {
            if *key != rel.key || !key.is_canonical() {
                problems.push(format!("relation {key} stored under a non-canonical key"));
            }
            if !(0.0..=1.0).contains(&rel.trust) {
                problems.push(format!("relation {key} trust {} out of range", rel.trust));
            }
            if !(0.0..=1.0).contains(&rel.cultural_affinity) {
                problems.push(format!(
                    "relation {key} cultural affinity {} out of range",
                    rel.cultural_affinity
                ));
            }
            if !(-1.0..=1.0).contains(&rel.power_balance) {
                problems.push(format!(
                    "relation {key} power balance {} out of range",
                    rel.power_balance
                ));
            }
            for treaty_id in &rel.treaties {
                match self.treaties.get(treaty_id) {
                    None => problems.push(format!("relation {key} holds unknown treaty {treaty_id}")),
                    Some(t) => {
                        if !t.has_signatory(key.low) || !t.has_signatory(key.high) {
                            problems.push(format!(
                                "relation {key} holds treaty {treaty_id} not signed by both groups"
                            ));
                        }
                        if rel.status == DiplomaticStatus::War
                            && t.is_active()
                            && t.treaty_type == TreatyType::NonAggression
                        {
                            problems.push(format!(
                                "relation {key} is at war with active non-aggression treaty {treaty_id}"
                            ));
                        }
                    }
                }
            }
            for negotiation_id in &rel.pending_negotiations {
                if !self.negotiations.contains_key(negotiation_id) {
                    problems.push(format!(
                        "relation {key} lists unknown negotiation {negotiation_id}"
                    ));
                }
            }
        }

        for (id, treaty) in &self.treaties {
            for (group, compliance) in &treaty.compliance {
                if !(0.0..=1.0).contains(compliance) {
                    problems.push(format!(
                        "treaty {id} compliance {compliance} for group {group} out of range"
                    ));
                }
            }
        }

        for (id, negotiation) in &self.negotiations {
            if !(0.0..=1.0).contains(&negotiation.agreement_probability) {
                problems.push(format!("negotiation {id} probability out of range"));
            }
            match self.relations.get(&negotiation.relation) {
                None => problems.push(format!(
                    "negotiation {id} belongs to missing relation {}",
                    negotiation.relation
                )),
                Some(rel) if !rel.pending_negotiations.contains(id) => problems.push(format!(
                    "negotiation {id} is not listed on relation {}",
                    negotiation.relation
                )),
                Some(_) => {}
            }
        }

        problems
    }

    pub fn validate(&self) -> Result<(), String> {
        let problems = self.invariant_violations();
        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems.join("; "))
        }
    }
}

/// Canonical keys for every unordered pair drawn from `groups`.
pub fn pair_keys(groups: &[u64]) -> Vec<PairKey> {
    let mut keys = Vec::new();
    for (i, &a) in groups.iter().enumerate() {
        for &b in &groups[i + 1..] {
            if let Some(key) = PairKey::new(a, b) {
                keys.push(key);
            }
        }
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::treaty::TreatyStatus;

    fn relation(a: u64, b: u64) -> DiplomaticRelation {
        DiplomaticRelation::new(
            PairKey::new(a, b).unwrap(),
            DiplomaticStatus::Neutral,
            0,
            0.5,
            0.5,
            0.0,
        )
    }

    #[test]
    fn second_relation_for_same_pair_is_noop() {
        let mut state = DiplomacyState::new();
        assert!(state.insert_relation(relation(1, 2)));
        let mut duplicate = relation(2, 1);
        duplicate.trust = 0.9;
        assert!(!state.insert_relation(duplicate));
        assert_eq!(state.relations.len(), 1);
        assert_eq!(state.relation(2, 1).unwrap().trust, 0.5);
    }

    #[test]
    fn attach_and_detach_treaty() {
        let mut state = DiplomacyState::new();
        state.insert_relation(relation(1, 2));
        state.insert_relation(relation(2, 3));
        state.insert_relation(relation(1, 3));
        let treaty = Treaty::from_template(
            50,
            "t".to_string(),
            TreatyType::TradeAgreement,
            vec![1, 2, 3],
            0,
        );
        state.attach_treaty(treaty);
        for key in state.relations.keys() {
            assert!(state.relations[key].treaties.contains(&50));
        }
        state.detach_treaty(50);
        assert!(state.relations.values().all(|r| r.treaties.is_empty()));
        assert!(state.treaties.contains_key(&50));
        assert!(state.validate().is_ok());
    }

    #[test]
    fn pair_keys_cover_all_pairs() {
        let keys = pair_keys(&[3, 1, 2]);
        assert_eq!(keys.len(), 3);
        assert!(keys.contains(&PairKey::new(1, 3).unwrap()));
        assert!(pair_keys(&[5]).is_empty());
    }

    #[test]
    fn validate_flags_war_with_active_non_aggression() {
        let mut state = DiplomacyState::new();
        state.insert_relation(relation(1, 2));
        state.attach_treaty(Treaty::from_template(
            1,
            "peace".to_string(),
            TreatyType::NonAggression,
            vec![1, 2],
            0,
        ));
        state.relation_mut(1, 2).unwrap().status = DiplomaticStatus::War;
        assert!(state.validate().is_err());

        state.treaties.get_mut(&1).unwrap().status = TreatyStatus::Terminated;
        assert!(state.validate().is_ok());
    }

    #[test]
    fn validate_flags_out_of_range_trust() {
        let mut state = DiplomacyState::new();
        state.insert_relation(relation(1, 2));
        state.relation_mut(1, 2).unwrap().trust = 1.5;
        let problems = state.invariant_violations();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("trust"));
    }

    #[test]
    fn summary_of_empty_registry() {
        let summary = DiplomacyState::new().summary();
        assert_eq!(summary.total_relations, 0);
        assert_eq!(summary.average_trust, 0.0);
        assert_eq!(summary.complexity, 0.0);
    }

    #[test]
    fn summary_counts_by_status() {
        let mut state = DiplomacyState::new();
        state.insert_relation(relation(1, 2));
        let mut hostile = relation(1, 3);
        hostile.status = DiplomaticStatus::Hostile;
        hostile.trust = 0.1;
        state.insert_relation(hostile);
        let summary = state.summary();
        assert_eq!(summary.relations_by_status[&DiplomaticStatus::Neutral], 1);
        assert_eq!(summary.relations_by_status[&DiplomaticStatus::Hostile], 1);
        assert!((summary.average_trust - 0.3).abs() < 1e-9);
    }
}
