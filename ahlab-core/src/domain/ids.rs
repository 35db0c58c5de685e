use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of a factor inside its `FactorLibrary`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FactorId(pub usize);

impl fmt::Display for FactorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Canonical identity of a combination: its member factor ids, ascending.
///
/// Two combinations with the same factor set have equal ids regardless of
/// the order the factors were given in. Orders lexicographically.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CombinationId(pub Vec<FactorId>);

impl CombinationId {
    pub fn from_factors(ids: impl IntoIterator<Item = FactorId>) -> Self {
        let mut ids: Vec<FactorId> = ids.into_iter().collect();
        ids.sort_unstable();
        Self(ids)
    }
}

impl fmt::Display for CombinationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, id) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "-")?;
            }
            write!(f, "{}", id.0)?;
        }
        Ok(())
    }
}

/// Content hash of the records a search ran over (BLAKE3, hex).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetHash(pub String);

impl DatasetHash {
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(blake3::hash(bytes).to_hex().to_string())
    }

    pub fn from_hasher(hasher: &blake3::Hasher) -> Self {
        Self(hasher.finalize().to_hex().to_string())
    }

    /// First 12 hex characters, for log lines and tables.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for DatasetHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_hash_deterministic() {
        let a = DatasetHash::from_bytes(b"matches");
        let b = DatasetHash::from_bytes(b"matches");
        assert_eq!(a, b);
        assert_eq!(a.0.len(), 64);
        assert_eq!(a.short().len(), 12);
    }

    #[test]
    fn combination_id_is_order_independent() {
        let a = CombinationId::from_factors([FactorId(7), FactorId(0), FactorId(3)]);
        let b = CombinationId::from_factors([FactorId(3), FactorId(7), FactorId(0)]);
        assert_eq!(a, b);
        assert_eq!(a.to_string(), "0-3-7");
        assert!(CombinationId::from_factors([FactorId(0), FactorId(2)]) < a);
    }

    #[test]
    fn dataset_hash_changes_with_content() {
        assert_ne!(
            DatasetHash::from_bytes(b"matches"),
            DatasetHash::from_bytes(b"matches!")
        );
    }
}
