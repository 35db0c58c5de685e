//! Aggregator — scores a combination against the precomputed cache.
//!
//! The matching set is the intersection of every member factor's index set,
//! taken smallest-first so the working set shrinks as early as possible.
//! Each matched record contributes one bet on the combination's side, staked
//! by its policy at that side's odds.

use std::borrow::Borrow;

use serde::{Deserialize, Serialize};

use crate::combination::Combination;
use crate::domain::CombinationId;
use crate::index_set::IndexSet;
use crate::precompute::PrecomputedCache;
use crate::settlement::Outcome;

/// Aggregate betting performance of one combination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    pub combination_id: CombinationId,
    pub bet_count: usize,
    pub wins: usize,
    pub losses: usize,
    pub pushes: usize,
    pub half_wins: usize,
    pub half_losses: usize,
    pub total_stake: f64,
    pub total_profit: f64,
    /// `total_profit / total_stake`; 0 when nothing was staked.
    pub roi: f64,
    /// `(wins + 0.5 * half_wins) / bet_count`; 0 when there are no bets.
    pub win_rate: f64,
    /// Mean odds of the bets placed; 0 when there are no bets.
    pub average_odds: f64,
}

impl AggregateResult {
    /// The all-zero result of a combination that matched nothing.
    pub fn empty(combination_id: CombinationId) -> Self {
        Self {
            combination_id,
            bet_count: 0,
            wins: 0,
            losses: 0,
            pushes: 0,
            half_wins: 0,
            half_losses: 0,
            total_stake: 0.0,
            total_profit: 0.0,
            roi: 0.0,
            win_rate: 0.0,
            average_odds: 0.0,
        }
    }

    fn record(&mut self, outcome: Outcome, stake: f64, profit: f64) {
        self.bet_count += 1;
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::HalfWin => self.half_wins += 1,
            Outcome::Push => self.pushes += 1,
            Outcome::HalfLose => self.half_losses += 1,
            Outcome::Lose => self.losses += 1,
        }
        self.total_stake += stake;
        self.total_profit += profit;
    }

    fn finish(&mut self, odds_sum: f64) {
        if self.total_stake > 0.0 {
            self.roi = self.total_profit / self.total_stake;
        }
        if self.bet_count > 0 {
            let n = self.bet_count as f64;
            self.win_rate = (self.wins as f64 + 0.5 * self.half_wins as f64) / n;
            self.average_odds = odds_sum / n;
        }
    }
}

/// A combination together with its score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCombination {
    pub combination: Combination,
    pub result: AggregateResult,
}

impl Borrow<AggregateResult> for ScoredCombination {
    fn borrow(&self) -> &AggregateResult {
        &self.result
    }
}

/// Scores combinations against one cache. Cheap to copy across workers.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'a> {
    cache: &'a PrecomputedCache,
}

impl<'a> Scorer<'a> {
    pub fn new(cache: &'a PrecomputedCache) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &'a PrecomputedCache {
        self.cache
    }

    /// Records matched by every member factor.
    pub fn matching_set(&self, combination: &Combination) -> IndexSet {
        let mut sets: Vec<&IndexSet> = combination
            .factor_ids()
            .map(|id| self.cache.matches_of(id))
            .collect();
        sets.sort_by_key(|s| s.count());

        let Some((first, rest)) = sets.split_first() else {
            return IndexSet::empty(self.cache.len());
        };
        let mut acc = (*first).clone();
        for set in rest {
            if acc.is_empty() {
                break;
            }
            acc.intersect_with(set);
        }
        acc
    }

    pub fn score(&self, combination: &Combination) -> AggregateResult {
        let mut result = AggregateResult::empty(combination.id());
        let side = combination.bet_side();
        let policy = combination.policy();
        let mut odds_sum = 0.0;

        for idx in self.matching_set(combination).iter() {
            let odds = self.cache.odds_for(idx, side);
            let stake = policy.stake_for(odds);
            let unit = self.cache.outcome_for(idx, side);
            result.record(unit.outcome, stake, unit.profit * stake);
            odds_sum += odds;
        }

        result.finish(odds_sum);
        result
    }

    pub fn score_into(&self, combination: Combination) -> ScoredCombination {
        let result = self.score(&combination);
        ScoredCombination {
            combination,
            result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HandicapLine, MatchRecord, Side};
    use crate::factor::{Factor, FactorLibrary, Predicate};
    use crate::settlement::settle;
    use crate::stake::{StakePolicy, TieredStake};

    fn library() -> FactorLibrary {
        FactorLibrary::from_factors([
            Factor::side("home", Side::Home),
            Factor::side("away", Side::Away),
            Factor::stake("flat", StakePolicy::fixed(100.0)),
            Factor::stake("tiered", StakePolicy::Tiered(TieredStake::default())),
            Factor::filter("level", Predicate::LevelBall),
            Factor::filter("quarter", Predicate::QuarterLine),
            Factor::filter(
                "never",
                Predicate::HandicapRange {
                    min: Some(10.0),
                    max: Some(20.0),
                },
            ),
        ])
        .unwrap()
    }

    fn dataset() -> Vec<MatchRecord> {
        vec![
            MatchRecord::new("A", "B", HandicapLine::Single(-1.0), 1.90, 1.95).with_score(2, 0),
            MatchRecord::new("C", "D", HandicapLine::Single(-1.0), 1.90, 1.95).with_score(1, 0),
            MatchRecord::new("E", "F", HandicapLine::Split(0.0, -0.5), 2.10, 1.80)
                .with_score(0, 0),
            MatchRecord::new("G", "H", HandicapLine::Split(0.0, -0.5), 1.85, 2.05)
                .with_score(1, 0),
            MatchRecord::new("I", "J", HandicapLine::Single(0.0), 2.00, 1.85).with_score(0, 1),
        ]
    }

    fn combo(lib: &FactorLibrary, names: &[&str]) -> Combination {
        Combination::from_names(lib, names).unwrap()
    }

    #[test]
    fn empty_matching_set_scores_zero() {
        let lib = library();
        let cache = PrecomputedCache::build(&dataset(), &lib);
        let c = combo(&lib, &["home", "flat", "never"]);
        let r = Scorer::new(&cache).score(&c);
        assert_eq!(r, AggregateResult::empty(c.id()));
        assert_eq!(r.roi, 0.0);
    }

    #[test]
    fn home_flat_over_all_records() {
        let lib = library();
        let cache = PrecomputedCache::build(&dataset(), &lib);
        let r = Scorer::new(&cache).score(&combo(&lib, &["home", "flat"]));

        assert_eq!(r.bet_count, 5);
        assert_eq!(r.wins, 2);
        assert_eq!(r.pushes, 1);
        assert_eq!(r.half_losses, 1);
        assert_eq!(r.losses, 1);
        assert_eq!(r.total_stake, 500.0);
        // 90 + 0 - 50 + 85 - 100
        assert!((r.total_profit - 25.0).abs() < 1e-9);
        assert!((r.roi - 0.05).abs() < 1e-12);
        assert!((r.win_rate - 0.4).abs() < 1e-12);
        assert!((r.average_odds - (1.90 + 1.90 + 2.10 + 1.85 + 2.00) / 5.0).abs() < 1e-12);
    }

    #[test]
    fn filters_narrow_the_matching_set() {
        let lib = library();
        let cache = PrecomputedCache::build(&dataset(), &lib);
        let scorer = Scorer::new(&cache);
        let c = combo(&lib, &["away", "flat", "quarter"]);
        assert_eq!(scorer.matching_set(&c).iter().collect::<Vec<_>>(), vec![2, 3]);

        let r = scorer.score(&c);
        assert_eq!(r.bet_count, 2);
        assert_eq!(r.half_wins, 1);
        assert_eq!(r.losses, 1);
        assert!((r.win_rate - 0.25).abs() < 1e-12);
    }

    #[test]
    fn profit_matches_per_bet_settlement() {
        let lib = library();
        let data = dataset();
        let cache = PrecomputedCache::build(&data, &lib);
        let c = combo(&lib, &["away", "tiered"]);
        let r = Scorer::new(&cache).score(&c);

        let policy = StakePolicy::Tiered(TieredStake::default());
        let mut profit = 0.0;
        let mut stake = 0.0;
        for m in &data {
            let (hs, aws) = m.score().unwrap();
            let s = policy.stake_for(m.away_odds);
            profit += settle(hs, aws, &m.handicap, Side::Away, m.away_odds, s)
                .unwrap()
                .profit;
            stake += s;
        }
        assert!((r.total_profit - profit).abs() < 1e-9);
        assert!((r.total_stake - stake).abs() < 1e-9);
        assert!((r.roi - r.total_profit / r.total_stake).abs() < 1e-12);
    }

    #[test]
    fn profit_scales_cached_unit_outcomes() {
        let lib = library();
        let cache = PrecomputedCache::build(&dataset(), &lib);
        let scorer = Scorer::new(&cache);
        let c = combo(&lib, &["home", "tiered"]);
        let r = scorer.score(&c);

        let policy = StakePolicy::Tiered(TieredStake::default());
        let expected: f64 = scorer
            .matching_set(&c)
            .iter()
            .map(|i| {
                let stake = policy.stake_for(cache.odds_for(i, Side::Home));
                cache.outcome_for(i, Side::Home).profit * stake
            })
            .sum();
        assert_eq!(r.total_profit, expected);
    }

    #[test]
    fn zero_stake_keeps_roi_finite() {
        let mut r = AggregateResult::empty(CombinationId(vec![]));
        r.record(Outcome::Push, 0.0, 0.0);
        r.record(Outcome::Win, 0.0, 0.0);
        r.finish(3.9);
        assert_eq!(r.bet_count, 2);
        assert_eq!(r.roi, 0.0);
        assert!((r.win_rate - 0.5).abs() < 1e-12);
        assert!((r.average_odds - 1.95).abs() < 1e-12);
    }

    #[test]
    fn scoring_is_deterministic() {
        let lib = library();
        let cache = PrecomputedCache::build(&dataset(), &lib);
        let scorer = Scorer::new(&cache);
        let c = combo(&lib, &["home", "tiered", "level"]);
        assert_eq!(scorer.score(&c), scorer.score(&c));
    }
}
