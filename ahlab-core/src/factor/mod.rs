//! Factors — named predicates tagged with a search role.
//!
//! - **Side** factors pick the column (home/away) a combination bets on.
//! - **Stake** factors pick the stake policy applied to each bet.
//! - **Filter** factors only restrict which matches count.
//!
//! Every factor also carries a predicate; side and stake predicates narrow the
//! matching set exactly like filters do.

pub mod library;
pub mod predicate;

pub use library::{CombinationDescription, FactorLibrary, LibraryError};
pub use predicate::{Comparison, Predicate};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::{MatchRecord, Side};
use crate::stake::StakePolicy;

/// Role of a factor and its selector payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactorRole {
    Side { side: Side },
    Stake { policy: StakePolicy },
    Filter,
}

/// Payload-free view of `FactorRole`, used for partitioning and messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoleKind {
    Side,
    Stake,
    Filter,
}

impl fmt::Display for RoleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Side => write!(f, "side"),
            Self::Stake => write!(f, "stake"),
            Self::Filter => write!(f, "filter"),
        }
    }
}

/// A named predicate with a role. Immutable once registered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    pub id: String,
    pub role: FactorRole,
    #[serde(default)]
    pub predicate: Predicate,
}

impl Factor {
    /// A side selector matching every record.
    pub fn side(id: impl Into<String>, side: Side) -> Self {
        Self {
            id: id.into(),
            role: FactorRole::Side { side },
            predicate: Predicate::Always,
        }
    }

    /// A stake selector matching every record.
    pub fn stake(id: impl Into<String>, policy: StakePolicy) -> Self {
        Self {
            id: id.into(),
            role: FactorRole::Stake { policy },
            predicate: Predicate::Always,
        }
    }

    pub fn filter(id: impl Into<String>, predicate: Predicate) -> Self {
        Self {
            id: id.into(),
            role: FactorRole::Filter,
            predicate,
        }
    }

    pub fn with_predicate(mut self, predicate: Predicate) -> Self {
        self.predicate = predicate;
        self
    }

    pub fn kind(&self) -> RoleKind {
        match self.role {
            FactorRole::Side { .. } => RoleKind::Side,
            FactorRole::Stake { .. } => RoleKind::Stake,
            FactorRole::Filter => RoleKind::Filter,
        }
    }

    pub fn side_value(&self) -> Option<Side> {
        match self.role {
            FactorRole::Side { side } => Some(side),
            _ => None,
        }
    }

    pub fn stake_policy(&self) -> Option<&StakePolicy> {
        match &self.role {
            FactorRole::Stake { policy } => Some(policy),
            _ => None,
        }
    }

    pub fn matches(&self, record: &MatchRecord) -> bool {
        self.predicate.evaluate(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_roles() {
        let side = Factor::side("back_home", Side::Home);
        assert_eq!(side.kind(), RoleKind::Side);
        assert_eq!(side.side_value(), Some(Side::Home));
        assert!(side.stake_policy().is_none());

        let stake = Factor::stake("flat", StakePolicy::fixed(100.0));
        assert_eq!(stake.kind(), RoleKind::Stake);
        assert_eq!(stake.stake_policy(), Some(&StakePolicy::fixed(100.0)));

        let filter = Factor::filter("level", Predicate::LevelBall);
        assert_eq!(filter.kind(), RoleKind::Filter);
        assert_eq!(filter.side_value(), None);
    }

    #[test]
    fn deserializes_with_default_predicate() {
        let f: Factor =
            serde_json::from_str(r#"{"id":"back_away","role":{"type":"SIDE","side":"AWAY"}}"#)
                .unwrap();
        assert_eq!(f, Factor::side("back_away", Side::Away));
    }

    #[test]
    fn deserializes_stake_role() {
        let f: Factor = serde_json::from_str(
            r#"{"id":"flat","role":{"type":"STAKE","policy":{"type":"FIXED","amount":25.0}}}"#,
        )
        .unwrap();
        assert_eq!(f.stake_policy(), Some(&StakePolicy::fixed(25.0)));
    }
}
