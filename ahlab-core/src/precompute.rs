//! Precomputation cache — settled outcomes and factor memberships, computed once.
//!
//! Built from a dataset and a factor library before any combination is
//! scored. Records that fail validation are excluded and listed in
//! `rejections`; every index in the cache refers to a valid record.
//! The cache is never mutated after `build`.

use serde::{Deserialize, Serialize};

use crate::domain::{DatasetHash, FactorId, MatchRecord, RecordError, Side};
use crate::factor::FactorLibrary;
use crate::index_set::IndexSet;
use crate::settlement::{settle, BettingOutcome, SettlementError};

/// A record excluded from the cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    /// Position of the record in the input dataset.
    pub source_index: usize,
    pub home_team: String,
    pub away_team: String,
    pub reason: String,
}

/// Immutable per-run cache: flat record array with parallel per-side arrays
/// and one index set per factor.
#[derive(Debug, Clone)]
pub struct PrecomputedCache {
    records: Vec<MatchRecord>,
    source_indices: Vec<usize>,
    outcomes: Vec<[BettingOutcome; 2]>,
    odds: Vec<[f64; 2]>,
    factor_sets: Vec<IndexSet>,
    rejections: Vec<Rejection>,
    dataset_hash: DatasetHash,
}

fn settle_record(record: &MatchRecord) -> Result<[BettingOutcome; 2], RecordError> {
    let (home, away) = record.validate()?;
    let settle_side = |side: Side| -> Result<BettingOutcome, SettlementError> {
        settle(home, away, &record.handicap, side, record.odds(side), 1.0)
    };
    Ok([settle_side(Side::Home)?, settle_side(Side::Away)?])
}

fn hash_record(hasher: &mut blake3::Hasher, record: &MatchRecord) {
    hasher.update(record.home_team.as_bytes());
    hasher.update(&[0u8]);
    hasher.update(record.away_team.as_bytes());
    hasher.update(&[0u8]);
    hasher.update(record.league.as_deref().unwrap_or("").as_bytes());
    hasher.update(&[0u8]);
    if let Some(date) = record.date {
        hasher.update(date.to_string().as_bytes());
    }
    hasher.update(&[0u8]);
    match record.week {
        Some(week) => {
            hasher.update(&[1u8]);
            hasher.update(&week.to_le_bytes());
        }
        None => {
            hasher.update(&[0u8]);
        }
    }
    hasher.update(&record.home_score.unwrap_or(0).to_le_bytes());
    hasher.update(&record.away_score.unwrap_or(0).to_le_bytes());
    let line = record.handicap.normalized().unwrap_or(record.handicap);
    hasher.update(line.to_string().as_bytes());
    hasher.update(&[0u8]);
    hasher.update(&record.home_odds.to_le_bytes());
    hasher.update(&record.away_odds.to_le_bytes());
    for (name, value) in &record.attributes {
        hasher.update(name.as_bytes());
        hasher.update(&[0u8]);
        hasher.update(&value.to_le_bytes());
    }
    hasher.update(&[0xffu8]);
}

impl PrecomputedCache {
    /// Validate and settle every record, then evaluate every factor.
    pub fn build(dataset: &[MatchRecord], library: &FactorLibrary) -> Self {
        let mut records = Vec::with_capacity(dataset.len());
        let mut source_indices = Vec::with_capacity(dataset.len());
        let mut outcomes = Vec::with_capacity(dataset.len());
        let mut odds = Vec::with_capacity(dataset.len());
        let mut rejections = Vec::new();
        let mut hasher = blake3::Hasher::new();

        for (source_index, record) in dataset.iter().enumerate() {
            match settle_record(record) {
                Ok(settled) => {
                    hash_record(&mut hasher, record);
                    records.push(record.clone());
                    source_indices.push(source_index);
                    outcomes.push(settled);
                    odds.push([record.home_odds, record.away_odds]);
                }
                Err(err) => rejections.push(Rejection {
                    source_index,
                    home_team: record.home_team.clone(),
                    away_team: record.away_team.clone(),
                    reason: err.to_string(),
                }),
            }
        }

        let factor_sets = library
            .factors()
            .iter()
            .map(|factor| IndexSet::from_fn(records.len(), |i| factor.matches(&records[i])))
            .collect();

        Self {
            records,
            source_indices,
            outcomes,
            odds,
            factor_sets,
            rejections,
            dataset_hash: DatasetHash::from_hasher(&hasher),
        }
    }

    /// Settled outcome at a stake of 1 unit.
    pub fn outcome_for(&self, match_index: usize, side: Side) -> &BettingOutcome {
        &self.outcomes[match_index][side.index()]
    }

    pub fn odds_for(&self, match_index: usize, side: Side) -> f64 {
        self.odds[match_index][side.index()]
    }

    /// Indices of valid records matched by the factor's predicate.
    ///
    /// # Panics
    /// If `factor` does not belong to the library the cache was built from.
    pub fn matches_of(&self, factor: FactorId) -> &IndexSet {
        &self.factor_sets[factor.0]
    }

    pub fn record(&self, match_index: usize) -> &MatchRecord {
        &self.records[match_index]
    }

    /// Position of a cached record in the original dataset.
    pub fn source_index(&self, match_index: usize) -> usize {
        self.source_indices[match_index]
    }

    /// Number of valid (cached) records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn factor_count(&self) -> usize {
        self.factor_sets.len()
    }

    pub fn rejections(&self) -> &[Rejection] {
        &self.rejections
    }

    pub fn rejected_count(&self) -> usize {
        self.rejections.len()
    }

    pub fn dataset_hash(&self) -> &DatasetHash {
        &self.dataset_hash
    }
}
