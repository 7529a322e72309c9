//! Market and earnings data structures and CSV I/O

pub mod loader;
pub mod types;

pub use loader::DataLoader;
pub use types::{Dataset, EarningsEvent, EnrichedEvent, PriceObservation, TargetColumn};
