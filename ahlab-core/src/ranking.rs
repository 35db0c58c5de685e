//! Ranking — a total, deterministic order over scored combinations.
//!
//! Best first: ROI descending, then bet count descending, then combination
//! id ascending. Results below a minimum bet count can be dropped first.
//! Ranking never mutates its inputs.

use std::borrow::Borrow;
use std::cmp::Ordering;

use crate::aggregate::AggregateResult;

/// Ordering of two results, `Less` meaning `a` ranks above `b`.
pub fn compare(a: &AggregateResult, b: &AggregateResult) -> Ordering {
    b.roi
        .total_cmp(&a.roi)
        .then_with(|| b.bet_count.cmp(&a.bet_count))
        .then_with(|| a.combination_id.cmp(&b.combination_id))
}

fn result_of<T: Borrow<AggregateResult>>(item: &T) -> &AggregateResult {
    item.borrow()
}

/// References to the items with at least `min_bets` bets, best first.
pub fn rank<T: Borrow<AggregateResult>>(items: &[T], min_bets: usize) -> Vec<&T> {
    let mut ranked: Vec<&T> = items
        .iter()
        .filter(|item| result_of(*item).bet_count >= min_bets)
        .collect();
    ranked.sort_by(|a, b| compare(result_of(*a), result_of(*b)));
    ranked
}

/// Owning variant of [`rank`].
pub fn rank_owned<T: Borrow<AggregateResult>>(mut items: Vec<T>, min_bets: usize) -> Vec<T> {
    items.retain(|item| result_of(item).bet_count >= min_bets);
    items.sort_by(|a, b| compare(result_of(a), result_of(b)));
    items
}

// ─── Leaderboard ─────────────────────────────────────────────────────

/// Best-N collector in ranking order.
///
/// Workers each fill their own leaderboard and the results are merged, so
/// peak memory stays near `capacity` per worker regardless of how many
/// combinations are scored. With `capacity == None` every qualifying entry
/// is kept. Entries are sorted lazily: overflow is compacted in batches and
/// the final order is produced by [`Leaderboard::into_entries`].
#[derive(Debug, Clone)]
pub struct Leaderboard<T> {
    entries: Vec<T>,
    capacity: Option<usize>,
    min_bets: usize,
    seen: usize,
    qualified: usize,
}

impl<T: Borrow<AggregateResult>> Leaderboard<T> {
    pub fn new(capacity: Option<usize>, min_bets: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity,
            min_bets,
            seen: 0,
            qualified: 0,
        }
    }

    /// Offer an entry. Returns whether it met the `min_bets` floor.
    pub fn insert(&mut self, entry: T) -> bool {
        self.seen += 1;
        if result_of(&entry).bet_count < self.min_bets {
            return false;
        }
        self.qualified += 1;
        self.entries.push(entry);
        self.compact_if_full();
        true
    }

    /// Fold another leaderboard's entries into this one.
    pub fn merge(&mut self, other: Leaderboard<T>) {
        self.seen += other.seen;
        self.qualified += other.qualified;
        self.entries.extend(other.entries);
        self.compact_if_full();
    }

    /// Entries offered so far, kept or not.
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// Entries offered so far that met the `min_bets` floor.
    pub fn qualified(&self) -> usize {
        self.qualified
    }

    /// The best entries, best first, at most `capacity` of them.
    pub fn into_entries(mut self) -> Vec<T> {
        self.sort();
        if let Some(cap) = self.capacity {
            self.entries.truncate(cap);
        }
        self.entries
    }

    fn compact_if_full(&mut self) {
        if let Some(cap) = self.capacity {
            if self.entries.len() > cap.saturating_mul(2).max(64) {
                self.sort();
                self.entries.truncate(cap);
            }
        }
    }

    fn sort(&mut self) {
        self.entries
            .sort_by(|a, b| compare(result_of(a), result_of(b)));
    }
}
