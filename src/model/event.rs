use serde::{Deserialize, Serialize};

use super::corps::{DiplomaticRole, RecallReason};
use super::crisis::CrisisTrigger;
use super::inputs::WorldEvent;
use super::negotiation::{FailureReason, NegotiationPhase};
use super::relation::{DiplomaticStatus, Severity};
use super::treaty::{Consequence, TerminationReason, TreatyType};

/// A structured record emitted by the diplomacy core. Serializes flat:
/// `{"day": 12, "type": "treaty_signed", ...}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiplomacyEvent {
    pub day: u32,
    #[serde(flatten)]
    pub kind: DiplomacyEventKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DiplomacyEventKind {
    /// Two groups met and a relation was created.
    DiplomaticFirstContact {
        group1: u64,
        group2: u64,
        initial_status: DiplomaticStatus,
        initial_trust: f64,
        contact_method: String,
    },

    DiplomaticStatusChange {
        group1: u64,
        group2: u64,
        old_status: DiplomaticStatus,
        new_status: DiplomaticStatus,
        trust: f64,
    },

    /// Trust moved by more than 0.1 in a single update.
    DiplomaticTrustChange {
        group1: u64,
        group2: u64,
        trust_change: f64,
        new_trust: f64,
    },

    /// One of the groups disappeared; the relation is kept as history only.
    DiplomaticRelationDissolved {
        group1: u64,
        group2: u64,
        reason: String,
    },

    NegotiationStarted {
        negotiation_id: u64,
        groups: Vec<u64>,
        treaty_type: TreatyType,
        negotiators: Vec<u64>,
    },

    NegotiationPhaseChange {
        negotiation_id: u64,
        treaty_type: TreatyType,
        old_phase: NegotiationPhase,
        new_phase: NegotiationPhase,
        agreement_probability: f64,
    },

    NegotiationFailed {
        negotiation_id: u64,
        treaty_type: TreatyType,
        groups: Vec<u64>,
        reason: FailureReason,
        rounds: u32,
        negotiators: Vec<u64>,
    },

    TreatySigned {
        treaty_id: u64,
        treaty_name: String,
        treaty_type: TreatyType,
        signatory_groups: Vec<u64>,
        negotiation_rounds: u32,
        negotiators: Vec<u64>,
    },

    /// A signatory's compliance fell below 0.5.
    TreatyViolation {
        treaty_id: u64,
        treaty_name: String,
        violating_group: u64,
        co_signatories: Vec<u64>,
        severity: Severity,
        consequences: Vec<Consequence>,
    },

    /// Compliance moved by more than 0.2 without crossing the violation line.
    TreatyComplianceChange {
        treaty_id: u64,
        group: u64,
        compliance_change: f64,
        new_compliance: f64,
    },

    TreatyRenewed {
        treaty_id: u64,
        treaty_name: String,
        new_duration: u32,
        renewal_day: u32,
        compliance: f64,
    },

    TreatyExpired {
        treaty_id: u64,
        treaty_name: String,
        reason: TerminationReason,
        final_compliance: f64,
    },

    TreatySuspended {
        treaty_id: u64,
        treaty_name: String,
    },

    TreatyReinstated {
        treaty_id: u64,
        treaty_name: String,
    },

    DiplomaticAgentAppointed {
        agent_id: u64,
        representing_group: u64,
        diplomatic_role: DiplomaticRole,
    },

    DiplomaticAgentRecalled {
        agent_id: u64,
        representing_group: u64,
        reason: RecallReason,
        effectiveness: f64,
    },

    DiplomaticCrisis {
        crisis_id: u64,
        trigger: CrisisTrigger,
        affected_groups: Vec<u64>,
        trust_impact: f64,
    },

    DiplomaticCrisisResolved {
        crisis_id: u64,
        trigger: CrisisTrigger,
        affected_groups: Vec<u64>,
        trust_recovery: f64,
    },
}

impl DiplomacyEventKind {
    /// The snake_case `type` tag this variant serializes with.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::DiplomaticFirstContact { .. } => "diplomatic_first_contact",
            Self::DiplomaticStatusChange { .. } => "diplomatic_status_change",
            Self::DiplomaticTrustChange { .. } => "diplomatic_trust_change",
            Self::DiplomaticRelationDissolved { .. } => "diplomatic_relation_dissolved",
            Self::NegotiationStarted { .. } => "negotiation_started",
            Self::NegotiationPhaseChange { .. } => "negotiation_phase_change",
            Self::NegotiationFailed { .. } => "negotiation_failed",
            Self::TreatySigned { .. } => "treaty_signed",
            Self::TreatyViolation { .. } => "treaty_violation",
            Self::TreatyComplianceChange { .. } => "treaty_compliance_change",
            Self::TreatyRenewed { .. } => "treaty_renewed",
            Self::TreatyExpired { .. } => "treaty_expired",
            Self::TreatySuspended { .. } => "treaty_suspended",
            Self::TreatyReinstated { .. } => "treaty_reinstated",
            Self::DiplomaticAgentAppointed { .. } => "diplomatic_agent_appointed",
            Self::DiplomaticAgentRecalled { .. } => "diplomatic_agent_recalled",
            Self::DiplomaticCrisis { .. } => "diplomatic_crisis",
            Self::DiplomaticCrisisResolved { .. } => "diplomatic_crisis_resolved",
        }
    }

    /// Groups the event is about, in the order they should be reported.
    pub fn groups(&self) -> Vec<u64> {
        match self {
            Self::DiplomaticFirstContact { group1, group2, .. }
            | Self::DiplomaticStatusChange { group1, group2, .. }
            | Self::DiplomaticTrustChange { group1, group2, .. }
            | Self::DiplomaticRelationDissolved { group1, group2, .. } => vec![*group1, *group2],
            Self::NegotiationStarted { groups, .. } | Self::NegotiationFailed { groups, .. } => {
                groups.clone()
            }
            Self::TreatySigned {
                signatory_groups, ..
            } => signatory_groups.clone(),
            Self::TreatyViolation {
                violating_group,
                co_signatories,
                ..
            } => std::iter::once(*violating_group)
                .chain(co_signatories.iter().copied())
                .collect(),
            Self::TreatyComplianceChange { group, .. } => vec![*group],
            Self::DiplomaticAgentAppointed {
                representing_group, ..
            }
            | Self::DiplomaticAgentRecalled {
                representing_group, ..
            } => vec![*representing_group],
            Self::DiplomaticCrisis {
                affected_groups, ..
            }
            | Self::DiplomaticCrisisResolved {
                affected_groups, ..
            } => affected_groups.clone(),
            Self::NegotiationPhaseChange { .. }
            | Self::TreatyRenewed { .. }
            | Self::TreatyExpired { .. }
            | Self::TreatySuspended { .. }
            | Self::TreatyReinstated { .. } => Vec::new(),
        }
    }
}

impl DiplomacyEvent {
    pub fn new(day: u32, kind: DiplomacyEventKind) -> Self {
        Self { day, kind }
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }

    /// Re-express this record as an entry for the next tick's world-event
    /// stream. A `treaty_violation` fed back this way is what escalates into a
    /// crisis one day later.
    pub fn to_world_event(&self) -> WorldEvent {
        WorldEvent::new(self.type_name(), self.kind.groups())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_flat_with_type_tag() {
        let ev = DiplomacyEvent::new(
            12,
            DiplomacyEventKind::TreatySigned {
                treaty_id: 5,
                treaty_name: "Ash-Elm Trade Pact".to_string(),
                treaty_type: TreatyType::TradeAgreement,
                signatory_groups: vec![1, 2],
                negotiation_rounds: 7,
                negotiators: vec![10, 20],
            },
        );
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["day"], 12);
        assert_eq!(json["type"], "treaty_signed");
        assert_eq!(json["treaty_type"], "trade_agreement");
        assert_eq!(json["signatory_groups"][1], 2);
    }

    #[test]
    fn type_name_matches_serde_tag() {
        let kinds = vec![
            DiplomacyEventKind::DiplomaticCrisis {
                crisis_id: 1,
                trigger: CrisisTrigger::TradeEmbargo,
                affected_groups: vec![1, 2],
                trust_impact: -0.2,
            },
            DiplomacyEventKind::TreatyExpired {
                treaty_id: 1,
                treaty_name: "x".to_string(),
                reason: TerminationReason::RenewalFailed,
                final_compliance: 0.4,
            },
            DiplomacyEventKind::DiplomaticAgentRecalled {
                agent_id: 3,
                representing_group: 1,
                reason: RecallReason::PoorPerformance,
                effectiveness: 0.1,
            },
        ];
        for kind in kinds {
            let json = serde_json::to_value(&kind).unwrap();
            assert_eq!(json["type"], kind.type_name());
        }
    }

    #[test]
    fn violation_feeds_back_as_world_event() {
        let ev = DiplomacyEvent::new(
            3,
            DiplomacyEventKind::TreatyViolation {
                treaty_id: 1,
                treaty_name: "x".to_string(),
                violating_group: 4,
                co_signatories: vec![7],
                severity: Severity::Moderate,
                consequences: vec![Consequence::DiplomaticProtest],
            },
        );
        let world_event = ev.to_world_event();
        assert_eq!(world_event.event_type, "treaty_violation");
        assert_eq!(world_event.groups, vec![4, 7]);
    }

    #[test]
    fn round_trips_through_json() {
        let ev = DiplomacyEvent::new(
            1,
            DiplomacyEventKind::DiplomaticFirstContact {
                group1: 1,
                group2: 2,
                initial_status: DiplomaticStatus::Neutral,
                initial_trust: 0.5,
                contact_method: "trade_contact".to_string(),
            },
        );
        let text = serde_json::to_string(&ev).unwrap();
        let back: DiplomacyEvent = serde_json::from_str(&text).unwrap();
        assert_eq!(back, ev);
    }
}
