mod context;
mod helpers;
mod keywords;
mod runner;
mod system;

pub mod contact;
pub mod corps;
pub mod crisis;
pub mod negotiation;
pub mod relations;
pub mod treaties;
pub mod trends;

pub use context::{TickContext, TickInputs};
pub use helpers::{MIN_ACTIVE_MEMBERS, is_diplomatically_active};
pub use keywords::{ComplianceKeywords, compliance_keywords};
pub use runner::{
    Diplomacy, RunInputs, SimConfig, default_systems, dispatch_systems, process_daily_diplomacy,
    run,
};
pub use system::SimSystem;

pub use contact::ContactSystem;
pub use corps::CorpsSystem;
pub use crisis::CrisisSystem;
pub use negotiation::{NegotiationOpportunitySystem, NegotiationProgressSystem};
pub use relations::RelationSystem;
pub use treaties::TreatySystem;
pub use trends::{TrendSystem, compute_trend};
