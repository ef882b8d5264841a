//! Analysis modules.
//!
//! Parsing loaded pages into records and aggregating them into statistics.

pub mod aggregator;
pub mod collector;

pub use aggregator::*;
pub use collector::{collect_records, SkippedFile};
