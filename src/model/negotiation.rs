use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::pair::PairKey;
use super::treaty::TreatyType;

/// Starting point for every negotiation's agreement probability.
pub const INITIAL_AGREEMENT_PROBABILITY: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum NegotiationPhase {
    Proposal,
    Discussion,
    Compromise,
    Deadlock,
    Agreement,
    Failure,
}

string_enum!(NegotiationPhase {
    Proposal => "proposal",
    Discussion => "discussion",
    Compromise => "compromise",
    Deadlock => "deadlock",
    Agreement => "agreement",
    Failure => "failure",
});

impl NegotiationPhase {
    /// Phase implied by the current probability and round count.
    ///
    /// Checked in priority order: agreement, compromise, deadlock, discussion,
    /// proposal.
    pub fn from_progress(probability: f64, rounds: u32) -> Self {
        if probability > 0.9 {
            NegotiationPhase::Agreement
        } else if probability > 0.7 {
            NegotiationPhase::Compromise
        } else if probability < 0.2 && rounds > 5 {
            NegotiationPhase::Deadlock
        } else if rounds > 10 {
            NegotiationPhase::Discussion
        } else {
            NegotiationPhase::Proposal
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum FailureReason {
    IrreconcilableDifferences,
    WarDeclared,
    GroupDisbanded,
}

string_enum!(FailureReason {
    IrreconcilableDifferences => "irreconcilable_differences",
    WarDeclared => "war_declared",
    GroupDisbanded => "group_disbanded",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Negotiation {
    pub id: u64,
    /// The relation this negotiation belongs to.
    pub relation: PairKey,
    pub groups: Vec<u64>,
    pub proposed_treaty_type: TreatyType,
    pub started_day: u32,
    pub phase: NegotiationPhase,
    /// Group -> lead negotiator (agent id).
    pub lead_negotiators: BTreeMap<u64, u64>,
    /// 0.0–1.0 urgency.
    pub time_pressure: f64,
    /// 0.0–1.0 domestic pressure to reach a deal.
    pub public_pressure: f64,
    pub agreement_probability: f64,
    pub rounds: u32,
}

impl Negotiation {
    pub fn negotiators(&self) -> Vec<u64> {
        self.lead_negotiators.values().copied().collect()
    }
}
