//! Combinations and their enumeration.
//!
//! A combination is one side factor, one stake factor and `size - 2`
//! filters. The generator walks filter subsets in lexicographic order and,
//! for each subset, every side × stake pair, so each set of factors is
//! produced exactly once. Nothing is materialized up front.
//!
//! The space can be split into independent partitions keyed by the first
//! (lowest) filter of the subset; the union of all partitions is the full
//! enumeration and no two partitions overlap.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{CombinationId, FactorId, Side};
use crate::factor::{FactorLibrary, RoleKind};
use crate::stake::StakePolicy;

/// A combination shape that violates the role constraints.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CombinationError {
    #[error("factor {0} is not in the library")]
    UnknownFactor(FactorId),

    #[error("no factor named '{0}'")]
    UnknownName(String),

    #[error("factor '{0}' appears more than once")]
    DuplicateFactor(String),

    #[error("combination has no {0} factor")]
    MissingRole(RoleKind),

    #[error("combination has more than one {role} factor ('{first}' and '{second}')")]
    ExtraRole {
        role: RoleKind,
        first: String,
        second: String,
    },
}

/// One candidate strategy. Filters are kept in ascending id order.
///
/// Carries its side and stake policy so scoring needs no library lookups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Combination {
    side: FactorId,
    stake: FactorId,
    filters: Vec<FactorId>,
    bet_side: Side,
    policy: StakePolicy,
}

impl Combination {
    /// Build a combination from an unordered set of factor ids.
    pub fn from_ids(library: &FactorLibrary, ids: &[FactorId]) -> Result<Self, CombinationError> {
        let mut seen = HashSet::new();
        let mut side: Option<(FactorId, Side)> = None;
        let mut stake: Option<(FactorId, StakePolicy)> = None;
        let mut filters = Vec::new();

        for &id in ids {
            let factor = library
                .try_get(id)
                .ok_or(CombinationError::UnknownFactor(id))?;
            if !seen.insert(id) {
                return Err(CombinationError::DuplicateFactor(factor.id.clone()));
            }

            if let Some(value) = factor.side_value() {
                if let Some((first, _)) = side {
                    return Err(CombinationError::ExtraRole {
                        role: RoleKind::Side,
                        first: library.get(first).id.clone(),
                        second: factor.id.clone(),
                    });
                }
                side = Some((id, value));
            } else if let Some(policy) = factor.stake_policy() {
                if let Some((first, _)) = stake {
                    return Err(CombinationError::ExtraRole {
                        role: RoleKind::Stake,
                        first: library.get(first).id.clone(),
                        second: factor.id.clone(),
                    });
                }
                stake = Some((id, *policy));
            } else {
                filters.push(id);
            }
        }

        let (side, bet_side) = side.ok_or(CombinationError::MissingRole(RoleKind::Side))?;
        let (stake, policy) = stake.ok_or(CombinationError::MissingRole(RoleKind::Stake))?;
        filters.sort_unstable();

        Ok(Self {
            side,
            stake,
            filters,
            bet_side,
            policy,
        })
    }

    /// Build a combination from factor names.
    pub fn from_names(library: &FactorLibrary, names: &[&str]) -> Result<Self, CombinationError> {
        let ids = names
            .iter()
            .map(|name| {
                library
                    .id_of(name)
                    .ok_or_else(|| CombinationError::UnknownName(name.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::from_ids(library, &ids)
    }

    pub fn side(&self) -> FactorId {
        self.side
    }

    pub fn stake(&self) -> FactorId {
        self.stake
    }

    pub fn filters(&self) -> &[FactorId] {
        &self.filters
    }

    /// Which column of the outcome cache this combination bets on.
    pub fn bet_side(&self) -> Side {
        self.bet_side
    }

    pub fn policy(&self) -> &StakePolicy {
        &self.policy
    }

    /// Number of factors, side and stake included.
    pub fn size(&self) -> usize {
        self.filters.len() + 2
    }

    /// Canonical id, independent of member order.
    pub fn id(&self) -> CombinationId {
        CombinationId::from_factors(self.factor_ids())
    }

    /// Every member id: side, stake, then filters.
    pub fn factor_ids(&self) -> impl Iterator<Item = FactorId> + '_ {
        [self.side, self.stake]
            .into_iter()
            .chain(self.filters.iter().copied())
    }
}

/// Number of ways to choose `k` items from `n`, saturating at `u64::MAX`.
pub fn binomial(n: u64, k: u64) -> u64 {
    if k > n {
        return 0;
    }
    let k = k.min(n - k);
    let mut acc: u128 = 1;
    for i in 0..k {
        acc = acc * (n - i) as u128 / (i + 1) as u128;
        if acc > u64::MAX as u128 {
            return u64::MAX;
        }
    }
    acc as u64
}

// ─── Generator ──────────────────────────────────────────────────────

/// Enumerates valid combinations over a library's factor ids.
#[derive(Debug, Clone, Copy)]
pub struct CombinationGenerator<'a> {
    library: &'a FactorLibrary,
}

impl<'a> CombinationGenerator<'a> {
    pub fn new(library: &'a FactorLibrary) -> Self {
        Self { library }
    }

    /// `sides × stakes × C(filters, size - 2)`; zero for `size < 2`.
    pub fn combination_count(&self, size: usize) -> u64 {
        if size < 2 {
            return 0;
        }
        let pairs = (self.library.sides().len() as u64)
            .saturating_mul(self.library.stakes().len() as u64);
        pairs.saturating_mul(binomial(
            self.library.filters().len() as u64,
            (size - 2) as u64,
        ))
    }

    /// Number of independent partitions of the `size` space.
    ///
    /// One for `size == 2` (no filters to key on), otherwise one per filter.
    pub fn partition_count(&self, size: usize) -> usize {
        match size {
            0 | 1 => 0,
            2 => 1,
            _ => self.library.filters().len(),
        }
    }

    /// Every combination of `size` factors.
    pub fn generate(&self, size: usize) -> Combinations<'a> {
        let subsets = if size < 2 {
            FilterSubsets::exhausted()
        } else {
            FilterSubsets::new(self.library.filters().len(), size - 2, 0, None)
        };
        Combinations::new(self.library, subsets)
    }

    /// Combinations of `size` whose lowest filter is the `partition`-th filter.
    ///
    /// For `size == 2`, partition `0` is the whole space.
    pub fn generate_partition(&self, size: usize, partition: usize) -> Combinations<'a> {
        let n = self.library.filters().len();
        let subsets = match size {
            0 | 1 => FilterSubsets::exhausted(),
            2 if partition == 0 => FilterSubsets::new(n, 0, 0, None),
            2 => FilterSubsets::exhausted(),
            _ if partition < n => FilterSubsets::new(n, size - 3, partition + 1, Some(partition)),
            _ => FilterSubsets::exhausted(),
        };
        Combinations::new(self.library, subsets)
    }
}

/// Lexicographic `k`-subsets of filter positions `start..n`, optionally
/// prefixed with a fixed leading position.
#[derive(Debug, Clone)]
struct FilterSubsets {
    n: usize,
    indices: Vec<usize>,
    prefix: Option<usize>,
    done: bool,
}

impl FilterSubsets {
    fn new(n: usize, k: usize, start: usize, prefix: Option<usize>) -> Self {
        Self {
            n,
            indices: (start..start + k).collect(),
            prefix,
            done: start + k > n,
        }
    }

    fn exhausted() -> Self {
        Self {
            n: 0,
            indices: Vec::new(),
            prefix: None,
            done: true,
        }
    }

    fn advance(&mut self) {
        let k = self.indices.len();
        let mut i = k;
        while i > 0 {
            i -= 1;
            if self.indices[i] < self.n - (k - i) {
                self.indices[i] += 1;
                for j in i + 1..k {
                    self.indices[j] = self.indices[j - 1] + 1;
                }
                return;
            }
        }
        self.done = true;
    }
}

impl Iterator for FilterSubsets {
    type Item = Vec<usize>;

    fn next(&mut self) -> Option<Vec<usize>> {
        if self.done {
            return None;
        }
        let mut subset = Vec::with_capacity(self.indices.len() + 1);
        subset.extend(self.prefix);
        subset.extend_from_slice(&self.indices);
        self.advance();
        Some(subset)
    }
}

/// Streaming iterator over combinations. See [`CombinationGenerator`].
#[derive(Debug, Clone)]
pub struct Combinations<'a> {
    library: &'a FactorLibrary,
    subsets: FilterSubsets,
    current: Option<Vec<FactorId>>,
    side_pos: usize,
    stake_pos: usize,
}

impl<'a> Combinations<'a> {
    fn new(library: &'a FactorLibrary, subsets: FilterSubsets) -> Self {
        Self {
            library,
            subsets,
            current: None,
            side_pos: 0,
            stake_pos: 0,
        }
    }
}

impl Iterator for Combinations<'_> {
    type Item = Combination;

    fn next(&mut self) -> Option<Combination> {
        let sides = self.library.sides();
        let stakes = self.library.stakes();
        if sides.is_empty() || stakes.is_empty() {
            return None;
        }

        loop {
            if self.current.is_none() {
                let positions = self.subsets.next()?;
                let filters = self.library.filters();
                self.current = Some(positions.into_iter().map(|p| filters[p]).collect());
                self.side_pos = 0;
                self.stake_pos = 0;
            }

            if self.side_pos >= sides.len() {
                self.current = None;
                continue;
            }

            let side = sides[self.side_pos];
            let stake = stakes[self.stake_pos];
            self.stake_pos += 1;
            if self.stake_pos == stakes.len() {
                self.stake_pos = 0;
                self.side_pos += 1;
            }

            let bet_side = self.library.get(side).side_value();
            let policy = self.library.get(stake).stake_policy().copied();
            if let (Some(bet_side), Some(policy), Some(filters)) =
                (bet_side, policy, self.current.as_ref())
            {
                return Some(Combination {
                    side,
                    stake,
                    filters: filters.clone(),
                    bet_side,
                    policy,
                });
            }
        }
    }
}
