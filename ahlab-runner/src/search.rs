//! Search orchestration — cache build, parallel scoring, ranking.
//!
//! One run:
//! 1. Build the precompute cache (rejected records are counted and logged)
//! 2. For each size in `min_size..=max_size`, score every combination,
//!    one leaderboard per partition, partitions on the rayon pool
//! 3. Merge the per-size leaderboards into the final ranking
//!
//! Partitions share nothing but the immutable cache and library, so results
//! do not depend on scheduling: parallel and sequential runs agree exactly.

use std::time::Instant;

use ahlab_core::aggregate::{AggregateResult, ScoredCombination, Scorer};
use ahlab_core::combination::CombinationGenerator;
use ahlab_core::domain::{CombinationId, DatasetHash, MatchRecord};
use ahlab_core::factor::{CombinationDescription, FactorLibrary, LibraryError};
use ahlab_core::precompute::{PrecomputedCache, Rejection};
use ahlab_core::ranking::Leaderboard;
use chrono::{NaiveDateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SearchSection;

/// Version of the serialized `SearchReport` layout.
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid search options: {0}")]
    InvalidOptions(String),

    #[error(transparent)]
    Library(#[from] LibraryError),
}

/// What to enumerate and how to rank it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchOptions {
    pub min_size: usize,
    pub max_size: usize,
    pub min_bets: usize,
    pub top: Option<usize>,
    pub parallel: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self::from(&SearchSection::default())
    }
}

impl From<&SearchSection> for SearchOptions {
    fn from(s: &SearchSection) -> Self {
        Self {
            min_size: s.min_size,
            max_size: s.max_size,
            min_bets: s.min_bets,
            top: s.top,
            parallel: s.parallel,
        }
    }
}

impl SearchOptions {
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.min_size < 2 {
            return Err(SearchError::InvalidOptions(format!(
                "min_size must be at least 2, got {}",
                self.min_size
            )));
        }
        if self.max_size < self.min_size {
            return Err(SearchError::InvalidOptions(format!(
                "max_size {} is below min_size {}",
                self.max_size, self.min_size
            )));
        }
        if self.top == Some(0) {
            return Err(SearchError::InvalidOptions("top must be at least 1".into()));
        }
        Ok(())
    }
}

/// Per-size counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizeSummary {
    pub size: usize,
    /// `sides × stakes × C(filters, size − 2)`.
    pub combinations: u64,
    pub scored: usize,
    /// Combinations meeting `min_bets`.
    pub qualified: usize,
}

/// One row of the final ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedEntry {
    /// 1-based.
    pub rank: usize,
    pub combination_id: CombinationId,
    pub description: CombinationDescription,
    pub result: AggregateResult,
}

/// Everything a run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchReport {
    pub schema_version: u32,
    pub started_at: NaiveDateTime,
    pub elapsed_ms: u64,
    pub dataset_hash: DatasetHash,
    pub total_records: usize,
    pub valid_records: usize,
    pub rejections: Vec<Rejection>,
    pub factor_count: usize,
    pub options: SearchOptions,
    pub sizes: Vec<SizeSummary>,
    pub entries: Vec<RankedEntry>,
}

impl SearchReport {
    pub fn rejected_records(&self) -> usize {
        self.rejections.len()
    }

    pub fn total_scored(&self) -> usize {
        self.sizes.iter().map(|s| s.scored).sum()
    }
}

fn score_partition(
    gen: &CombinationGenerator<'_>,
    scorer: &Scorer<'_>,
    options: &SearchOptions,
    size: usize,
    partition: usize,
) -> Leaderboard<ScoredCombination> {
    let mut board = Leaderboard::new(options.top, options.min_bets);
    for combination in gen.generate_partition(size, partition) {
        board.insert(scorer.score_into(combination));
    }
    board
}

fn merge(
    mut a: Leaderboard<ScoredCombination>,
    b: Leaderboard<ScoredCombination>,
) -> Leaderboard<ScoredCombination> {
    a.merge(b);
    a
}

/// Score every combination of the requested sizes and rank the results.
pub fn run_search(
    dataset: &[MatchRecord],
    library: &FactorLibrary,
    options: &SearchOptions,
) -> Result<SearchReport, SearchError> {
    options.validate()?;
    library.ensure_searchable()?;

    let started_at = Utc::now().naive_utc();
    let clock = Instant::now();

    info!(
        records = dataset.len(),
        factors = library.len(),
        min_size = options.min_size,
        max_size = options.max_size,
        parallel = options.parallel,
        "starting search"
    );

    let cache = PrecomputedCache::build(dataset, library);
    if cache.rejected_count() > 0 {
        warn!(
            rejected = cache.rejected_count(),
            total = dataset.len(),
            "excluded malformed records"
        );
        for r in cache.rejections() {
            debug!(
                index = r.source_index,
                home = %r.home_team,
                away = %r.away_team,
                reason = %r.reason,
                "rejected record"
            );
        }
    }
    if cache.is_empty() {
        warn!("no valid records; every combination will score zero bets");
    }
    info!(
        valid = cache.len(),
        dataset_hash = cache.dataset_hash().short(),
        "precompute cache built"
    );

    let scorer = Scorer::new(&cache);
    let gen = CombinationGenerator::new(library);
    let empty = || Leaderboard::new(options.top, options.min_bets);

    let mut overall = empty();
    let mut sizes = Vec::with_capacity(options.max_size - options.min_size + 1);

    for size in options.min_size..=options.max_size {
        let partitions = gen.partition_count(size);
        let board = if options.parallel {
            (0..partitions)
                .into_par_iter()
                .map(|p| score_partition(&gen, &scorer, options, size, p))
                .reduce(empty, merge)
        } else {
            (0..partitions)
                .map(|p| score_partition(&gen, &scorer, options, size, p))
                .fold(empty(), merge)
        };

        let summary = SizeSummary {
            size,
            combinations: gen.combination_count(size),
            scored: board.seen(),
            qualified: board.qualified(),
        };
        debug!(
            size,
            combinations = summary.combinations,
            qualified = summary.qualified,
            "size scored"
        );
        sizes.push(summary);
        overall.merge(board);
    }

    let entries: Vec<RankedEntry> = overall
        .into_entries()
        .into_iter()
        .enumerate()
        .map(|(i, scored)| RankedEntry {
            rank: i + 1,
            combination_id: scored.combination.id(),
            description: library.describe(&scored.combination),
            result: scored.result,
        })
        .collect();

    let elapsed_ms = clock.elapsed().as_millis() as u64;
    info!(
        scored = sizes.iter().map(|s| s.scored).sum::<usize>(),
        ranked = entries.len(),
        elapsed_ms,
        "search finished"
    );

    Ok(SearchReport {
        schema_version: SCHEMA_VERSION,
        started_at,
        elapsed_ms,
        dataset_hash: cache.dataset_hash().clone(),
        total_records: dataset.len(),
        valid_records: cache.len(),
        rejections: cache.rejections().to_vec(),
        factor_count: library.len(),
        options: options.clone(),
        sizes,
        entries,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::synthetic::{generate, SyntheticConfig};
    use ahlab_core::domain::{HandicapLine, Side};
    use ahlab_core::factor::{Factor, Predicate};
    use ahlab_core::stake::{StakePolicy, TieredStake};

    fn standard() -> FactorLibrary {
        FactorLibrary::standard(TieredStake::default(), 100.0).unwrap()
    }

    fn options(min_size: usize, max_size: usize) -> SearchOptions {
        SearchOptions {
            min_size,
            max_size,
            min_bets: 0,
            top: None,
            parallel: true,
        }
    }

    #[test]
    fn counts_every_combination() {
        let lib = standard();
        let data = generate(&SyntheticConfig::new(120, 5));
        let report = run_search(&data, &lib, &options(2, 4)).unwrap();

        let expected: Vec<u64> = vec![4, 4 * 15, 4 * 105];
        let counts: Vec<u64> = report.sizes.iter().map(|s| s.combinations).collect();
        assert_eq!(counts, expected);
        for s in &report.sizes {
            assert_eq!(s.scored as u64, s.combinations);
            assert_eq!(s.qualified, s.scored);
        }
        assert_eq!(report.entries.len(), 4 + 60 + 420);
        assert_eq!(report.total_scored(), 484);
    }

    #[test]
    fn parallel_and_sequential_agree() {
        let lib = standard();
        let data = generate(&SyntheticConfig::new(300, 11));
        let mut opts = options(2, 4);
        opts.min_bets = 5;
        opts.top = Some(25);

        let parallel = run_search(&data, &lib, &opts).unwrap();
        opts.parallel = false;
        let sequential = run_search(&data, &lib, &opts).unwrap();

        assert_eq!(parallel.entries, sequential.entries);
        assert_eq!(parallel.sizes, sequential.sizes);
        assert_eq!(parallel.dataset_hash, sequential.dataset_hash);
    }

    #[test]
    fn entries_are_ranked_and_respect_floor() {
        let lib = standard();
        let data = generate(&SyntheticConfig::new(300, 2));
        let mut opts = options(2, 3);
        opts.min_bets = 20;
        opts.top = Some(10);
        let report = run_search(&data, &lib, &opts).unwrap();

        assert!(report.entries.len() <= 10);
        for (i, e) in report.entries.iter().enumerate() {
            assert_eq!(e.rank, i + 1);
            assert!(e.result.bet_count >= 20);
            assert_eq!(e.combination_id, e.result.combination_id);
        }
        for pair in report.entries.windows(2) {
            assert!(pair[0].result.roi >= pair[1].result.roi);
        }
    }

    #[test]
    fn descriptions_reconstruct_combinations() {
        let lib = standard();
        let data = generate(&SyntheticConfig::new(100, 4));
        let report = run_search(&data, &lib, &options(3, 3)).unwrap();
        for e in report.entries.iter().take(20) {
            let names = e.description.factor_ids();
            let rebuilt = ahlab_core::combination::Combination::from_names(&lib, &names).unwrap();
            assert_eq!(rebuilt.id(), e.combination_id);
        }
    }

    #[test]
    fn rejections_are_reported_not_scored() {
        let lib = FactorLibrary::from_factors([
            Factor::side("home", Side::Home),
            Factor::stake("flat", StakePolicy::fixed(100.0)),
            Factor::filter("all", Predicate::Always),
        ])
        .unwrap();
        let data = vec![
            MatchRecord::new("A", "B", HandicapLine::Single(-1.0), 1.90, 1.95).with_score(2, 0),
            MatchRecord::new("C", "D", HandicapLine::Single(-1.0), 0.95, 1.95).with_score(2, 0),
            MatchRecord::new("E", "F", HandicapLine::Single(-1.0), 1.90, 1.95),
        ];
        let report = run_search(&data, &lib, &options(2, 3)).unwrap();
        assert_eq!(report.total_records, 3);
        assert_eq!(report.valid_records, 1);
        assert_eq!(report.rejected_records(), 2);
        for e in &report.entries {
            assert_eq!(e.result.bet_count, 1);
            assert!((e.result.total_profit - 90.0).abs() < 1e-9);
        }
    }

    #[test]
    fn invalid_options_rejected() {
        let lib = standard();
        assert!(matches!(
            run_search(&[], &lib, &options(1, 3)),
            Err(SearchError::InvalidOptions(_))
        ));
        assert!(matches!(
            run_search(&[], &lib, &options(4, 3)),
            Err(SearchError::InvalidOptions(_))
        ));
    }

    #[test]
    fn library_without_sides_rejected() {
        let lib = FactorLibrary::from_factors([Factor::stake("flat", StakePolicy::fixed(1.0))])
            .unwrap();
        assert!(matches!(
            run_search(&[], &lib, &options(2, 2)),
            Err(SearchError::Library(_))
        ));
    }

    #[test]
    fn empty_dataset_scores_zero() {
        let lib = standard();
        let report = run_search(&[], &lib, &options(2, 2)).unwrap();
        assert_eq!(report.valid_records, 0);
        assert_eq!(report.entries.len(), 4);
        assert!(report.entries.iter().all(|e| e.result.bet_count == 0));
    }
}
