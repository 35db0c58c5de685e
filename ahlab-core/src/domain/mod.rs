//! Domain types for ahlab

pub mod handicap;
pub mod ids;
pub mod match_record;

pub use handicap::{HandicapError, HandicapLine};
pub use ids::{CombinationId, DatasetHash, FactorId};
pub use match_record::{MatchRecord, RecordError, Side};
