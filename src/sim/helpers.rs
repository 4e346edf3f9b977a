use std::collections::{BTreeMap, BTreeSet};

use crate::model::{AgentSnapshot, Group, Institution};

/// Groups smaller than this take no part in diplomacy.
pub const MIN_ACTIVE_MEMBERS: usize = 3;

/// Neighbouring map locations. Anything not listed has no neighbours.
pub fn adjacent_locations(location: &str) -> &'static [&'static str] {
    match location {
        "village_center" => &["fields", "forest", "river"],
        "fields" => &["village_center", "forest", "plains"],
        "forest" => &["village_center", "fields", "mountains", "hills"],
        "mountains" => &["forest", "hills"],
        "hills" => &["forest", "mountains", "plains"],
        "river" => &["village_center", "plains"],
        "plains" => &["fields", "hills", "river"],
        _ => &[],
    }
}

/// Whether any location in `a` borders any location in `b`.
pub fn locations_adjacent(a: &BTreeSet<&str>, b: &BTreeSet<&str>) -> bool {
    a.iter()
        .any(|loc| adjacent_locations(loc).iter().any(|n| b.contains(n)))
}

/// Locations where the group's living members currently are.
pub fn group_locations<'a>(
    group: &Group,
    agents: &'a BTreeMap<u64, AgentSnapshot>,
) -> BTreeSet<&'a str> {
    group
        .members
        .iter()
        .filter_map(|id| agents.get(id))
        .filter(|a| a.alive)
        .map(|a| a.location.as_str())
        .collect()
}

/// Large enough, not disbanded, and organised: named leaders, an organised
/// kind, or membership in an institution.
pub fn is_diplomatically_active(group: &Group, institutions: &[Institution]) -> bool {
    if group.disbanded || group.members.len() < MIN_ACTIVE_MEMBERS {
        return false;
    }
    !group.leaders.is_empty()
        || group.kind.is_organized()
        || institutions
            .iter()
            .any(|inst| inst.member_groups.contains(&group.id))
}

/// Display name for a group, falling back to its id once it is gone from the
/// roster.
pub fn group_name(groups: &BTreeMap<u64, Group>, id: u64) -> String {
    groups
        .get(&id)
        .map(|g| g.name.clone())
        .unwrap_or_else(|| format!("group {id}"))
}

/// True if `event_type` contains any of the keywords.
pub fn matches_any(event_type: &str, keywords: &[&str]) -> bool {
    !event_type.is_empty() && keywords.iter().any(|k| event_type.contains(k))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::GroupKind;

    fn group(id: u64, members: usize, leaders: Vec<u64>, kind: GroupKind) -> Group {
        Group {
            id,
            name: format!("g{id}"),
            kind,
            members: (0..members as u64).map(|m| id * 100 + m).collect(),
            leaders,
            disbanded: false,
        }
    }

    #[test]
    fn adjacency_is_symmetric() {
        for loc in [
            "village_center",
            "fields",
            "forest",
            "mountains",
            "hills",
            "river",
            "plains",
        ] {
            for n in adjacent_locations(loc) {
                assert!(
                    adjacent_locations(n).contains(&loc),
                    "{loc} -> {n} has no way back"
                );
            }
        }
        assert!(adjacent_locations("the_moon").is_empty());
    }

    #[test]
    fn location_sets_adjacent() {
        let a: BTreeSet<&str> = ["river"].into_iter().collect();
        let b: BTreeSet<&str> = ["plains", "mountains"].into_iter().collect();
        let c: BTreeSet<&str> = ["mountains"].into_iter().collect();
        assert!(locations_adjacent(&a, &b));
        assert!(!locations_adjacent(&a, &c));
    }

    #[test]
    fn activity_requires_size_and_structure() {
        assert!(!is_diplomatically_active(
            &group(1, 2, vec![100], GroupKind::Tribe),
            &[]
        ));
        assert!(is_diplomatically_active(
            &group(1, 3, vec![100], GroupKind::Tribe),
            &[]
        ));
        assert!(is_diplomatically_active(
            &group(1, 3, vec![], GroupKind::Council),
            &[]
        ));
        assert!(!is_diplomatically_active(
            &group(1, 5, vec![], GroupKind::Guild),
            &[]
        ));
        let league = Institution {
            id: 9,
            name: "League".to_string(),
            member_groups: vec![1],
        };
        assert!(is_diplomatically_active(
            &group(1, 5, vec![], GroupKind::Guild),
            &[league]
        ));

        let mut gone = group(1, 5, vec![100], GroupKind::Faction);
        gone.disbanded = true;
        assert!(!is_diplomatically_active(&gone, &[]));
    }

    #[test]
    fn dead_members_do_not_count_for_location() {
        let g = group(1, 2, vec![], GroupKind::Tribe);
        let mut agents = BTreeMap::new();
        for (id, alive, loc) in [(100, true, "fields"), (101, false, "river")] {
            agents.insert(
                id,
                AgentSnapshot {
                    id,
                    alive,
                    age: 30,
                    reputation: 0.5,
                    relationship_count: 0,
                    specialization: None,
                    location: loc.to_string(),
                },
            );
        }
        let locs = group_locations(&g, &agents);
        assert_eq!(locs.into_iter().collect::<Vec<_>>(), vec!["fields"]);
    }

    #[test]
    fn empty_event_type_matches_nothing() {
        assert!(!matches_any("", &["trade"]));
        assert!(matches_any("trade_fair", &["aid", "trade"]));
    }
}
