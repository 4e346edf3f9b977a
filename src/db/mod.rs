pub mod load;
pub mod migrate;

pub use load::load_snapshot;
pub use migrate::migrate;
