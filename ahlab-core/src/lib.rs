//! AH Lab Core — settlement, factors and the combination search engine.
//!
//! This crate contains everything a search needs, with no I/O:
//! - Domain types (handicap lines, match records, ids)
//! - Settlement engine for single and split Asian Handicap lines
//! - Stake sizing policies
//! - Factor predicates and the factor library
//! - Precomputation cache (settled outcomes and factor index sets)
//! - Combination generator, scorer and ranking

pub mod aggregate;
pub mod combination;
pub mod domain;
pub mod factor;
pub mod index_set;
pub mod precompute;
pub mod ranking;
pub mod settlement;
pub mod stake;

pub use aggregate::{AggregateResult, ScoredCombination, Scorer};
pub use combination::{Combination, CombinationError, CombinationGenerator};
pub use domain::{
    CombinationId, DatasetHash, FactorId, HandicapError, HandicapLine, MatchRecord, RecordError,
    Side,
};
pub use factor::{Factor, FactorLibrary, FactorRole, LibraryError, Predicate};
pub use precompute::{PrecomputedCache, Rejection};
pub use ranking::{rank, rank_owned, Leaderboard};
pub use settlement::{settle, BettingOutcome, Outcome, SettlementError};
pub use stake::{StakeError, StakePolicy, TieredStake};
