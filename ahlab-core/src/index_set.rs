//! Bitset-backed set of match indices.
//!
//! One bit per record in the cache; intersection is a word-wise AND, and
//! the population count is kept alongside so intersections can be ordered
//! smallest-first without rescanning.

/// A set of indices in `0..universe`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSet {
    words: Vec<u64>,
    universe: usize,
    count: usize,
}

impl IndexSet {
    /// An empty set over `universe` indices.
    pub fn empty(universe: usize) -> Self {
        Self {
            words: vec![0; universe.div_ceil(64)],
            universe,
            count: 0,
        }
    }

    /// Every index in `0..universe`.
    pub fn full(universe: usize) -> Self {
        Self::from_fn(universe, |_| true)
    }

    /// The set of indices for which `member` returns true.
    pub fn from_fn(universe: usize, mut member: impl FnMut(usize) -> bool) -> Self {
        let mut set = Self::empty(universe);
        for idx in 0..universe {
            if member(idx) {
                set.words[idx / 64] |= 1u64 << (idx % 64);
            }
        }
        set.recount();
        set
    }

    pub fn from_indices(universe: usize, indices: impl IntoIterator<Item = usize>) -> Self {
        let mut set = Self::empty(universe);
        for idx in indices {
            set.insert(idx);
        }
        set
    }

    /// # Panics
    /// If `idx >= universe`.
    pub fn insert(&mut self, idx: usize) {
        assert!(idx < self.universe, "index {idx} outside universe {}", self.universe);
        let word = &mut self.words[idx / 64];
        let bit = 1u64 << (idx % 64);
        if *word & bit == 0 {
            *word |= bit;
            self.count += 1;
        }
    }

    pub fn contains(&self, idx: usize) -> bool {
        idx < self.universe && self.words[idx / 64] & (1u64 << (idx % 64)) != 0
    }

    /// Number of members.
    pub fn count(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn universe(&self) -> usize {
        self.universe
    }

    /// Keep only members also in `other`.
    ///
    /// # Panics
    /// If the two sets are over different universes.
    pub fn intersect_with(&mut self, other: &IndexSet) {
        assert_eq!(
            self.universe, other.universe,
            "intersecting index sets over different universes"
        );
        for (a, b) in self.words.iter_mut().zip(&other.words) {
            *a &= *b;
        }
        self.recount();
    }

    pub fn is_subset(&self, other: &IndexSet) -> bool {
        self.universe == other.universe
            && self
                .words
                .iter()
                .zip(&other.words)
                .all(|(a, b)| a & !b == 0)
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.words
            .iter()
            .enumerate()
            .flat_map(|(word_idx, &word)| BitIter { word }.map(move |bit| word_idx * 64 + bit))
    }

    fn recount(&mut self) {
        self.count = self.words.iter().map(|w| w.count_ones() as usize).sum();
    }
}

struct BitIter {
    word: u64,
}

impl Iterator for BitIter {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.word == 0 {
            return None;
        }
        let bit = self.word.trailing_zeros() as usize;
        self.word &= self.word - 1;
        Some(bit)
    }
}
