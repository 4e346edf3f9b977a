pub mod db;
pub mod flush;
pub mod id;
pub mod model;
pub mod scenario;
pub mod sim;
pub mod testutil;

pub use id::IdGenerator;
pub use model::{
    DiplomacyEvent, DiplomacyEventKind, DiplomacyState, DiplomaticRelation, DiplomaticStatus,
    Negotiation, PairKey, Treaty, TreatyType,
};
pub use sim::{Diplomacy, SimConfig, process_daily_diplomacy, run};
