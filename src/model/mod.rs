#[macro_use]
mod macros;

pub mod corps;
pub mod crisis;
pub mod event;
pub mod inputs;
pub mod negotiation;
pub mod pair;
pub mod relation;
pub mod state;
pub mod treaty;
pub mod trend;

pub use corps::{DiplomaticAgent, DiplomaticRole, RecallReason};
pub use crisis::{CrisisRecord, CrisisTrigger};
pub use event::{DiplomacyEvent, DiplomacyEventKind};
pub use inputs::{AgentSnapshot, Group, GroupKind, Institution, WorldEvent};
pub use negotiation::{FailureReason, Negotiation, NegotiationPhase};
pub use pair::PairKey;
pub use relation::{
    DiplomaticRelation, DiplomaticStatus, Incident, Interest, Severity, StatusTransition,
    TrustSample,
};
pub use state::{DiplomacyState, pair_keys};
pub use treaty::{
    Consequence, TerminationReason, Treaty, TreatyStatus, TreatyTemplate, TreatyType, Violation,
    treaty_name,
};
pub use trend::{DiplomacySummary, TrendSnapshot};
