//! Factor library — the static registry a search runs over.
//!
//! Factors are registered once, before any search, and addressed afterwards
//! by `FactorId` (their registration position). The library keeps one id
//! list per role, each in registration order.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{Comparison, Factor, Predicate, RoleKind};
use crate::combination::Combination;
use crate::domain::{FactorId, Side};
use crate::stake::{StakeError, StakePolicy, TieredStake};

/// Errors from building a library.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LibraryError {
    #[error("factor id must not be empty")]
    EmptyId,

    #[error("duplicate factor id '{0}'")]
    DuplicateId(String),

    #[error("factor '{id}' has an invalid stake policy: {source}")]
    InvalidStake {
        id: String,
        #[source]
        source: StakeError,
    },

    #[error("library has no {0} factors; a combination needs one of each side and stake")]
    MissingRole(RoleKind),
}

/// Human-readable, reconstructible description of a combination.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CombinationDescription {
    pub side: String,
    pub stake: String,
    pub filters: Vec<String>,
}

impl CombinationDescription {
    /// All factor ids, side and stake first.
    pub fn factor_ids(&self) -> Vec<&str> {
        let mut ids = vec![self.side.as_str(), self.stake.as_str()];
        ids.extend(self.filters.iter().map(String::as_str));
        ids
    }
}

impl fmt::Display for CombinationDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.factor_ids().join(" + "))
    }
}

/// Registry of factors, partitioned by role.
#[derive(Debug, Clone, Default)]
pub struct FactorLibrary {
    factors: Vec<Factor>,
    by_id: HashMap<String, FactorId>,
    sides: Vec<FactorId>,
    stakes: Vec<FactorId>,
    filters: Vec<FactorId>,
}

impl FactorLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a library from factors in order.
    pub fn from_factors(factors: impl IntoIterator<Item = Factor>) -> Result<Self, LibraryError> {
        let mut library = Self::new();
        for factor in factors {
            library.register(factor)?;
        }
        Ok(library)
    }

    /// Register a factor and return its id.
    pub fn register(&mut self, factor: Factor) -> Result<FactorId, LibraryError> {
        if factor.id.trim().is_empty() {
            return Err(LibraryError::EmptyId);
        }
        if self.by_id.contains_key(&factor.id) {
            return Err(LibraryError::DuplicateId(factor.id));
        }
        if let Some(policy) = factor.stake_policy() {
            policy
                .validate()
                .map_err(|source| LibraryError::InvalidStake {
                    id: factor.id.clone(),
                    source,
                })?;
        }

        let id = FactorId(self.factors.len());
        match factor.kind() {
            RoleKind::Side => self.sides.push(id),
            RoleKind::Stake => self.stakes.push(id),
            RoleKind::Filter => self.filters.push(id),
        }
        self.by_id.insert(factor.id.clone(), id);
        self.factors.push(factor);
        Ok(id)
    }

    /// Check the library can produce at least one combination.
    pub fn ensure_searchable(&self) -> Result<(), LibraryError> {
        if self.sides.is_empty() {
            return Err(LibraryError::MissingRole(RoleKind::Side));
        }
        if self.stakes.is_empty() {
            return Err(LibraryError::MissingRole(RoleKind::Stake));
        }
        Ok(())
    }

    /// # Panics
    /// If `id` was not issued by this library.
    pub fn get(&self, id: FactorId) -> &Factor {
        &self.factors[id.0]
    }

    pub fn try_get(&self, id: FactorId) -> Option<&Factor> {
        self.factors.get(id.0)
    }

    pub fn id_of(&self, name: &str) -> Option<FactorId> {
        self.by_id.get(name).copied()
    }

    pub fn sides(&self) -> &[FactorId] {
        &self.sides
    }

    pub fn stakes(&self) -> &[FactorId] {
        &self.stakes
    }

    pub fn filters(&self) -> &[FactorId] {
        &self.filters
    }

    pub fn factors(&self) -> &[Factor] {
        &self.factors
    }

    pub fn iter(&self) -> impl Iterator<Item = (FactorId, &Factor)> {
        self.factors
            .iter()
            .enumerate()
            .map(|(i, f)| (FactorId(i), f))
    }

    pub fn len(&self) -> usize {
        self.factors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factors.is_empty()
    }

    pub fn describe(&self, combination: &Combination) -> CombinationDescription {
        CombinationDescription {
            side: self.get(combination.side()).id.clone(),
            stake: self.get(combination.stake()).id.clone(),
            filters: combination
                .filters()
                .iter()
                .map(|id| self.get(*id).id.clone())
                .collect(),
        }
    }

    /// The standard library: both sides, a fixed and a tiered stake, and a
    /// set of line, price, calendar and form filters.
    ///
    /// Attribute filters read `home_position`, `away_position`, `home_form`
    /// and `away_form`; on datasets without those columns they match nothing.
    pub fn standard(tiered: TieredStake, fixed_amount: f64) -> Result<Self, LibraryError> {
        let attr = |name: &str, op: Comparison, value: f64| Predicate::Attribute {
            name: name.into(),
            op,
            value,
        };

        Self::from_factors([
            Factor::side("back_home", Side::Home),
            Factor::side("back_away", Side::Away),
            Factor::stake("fixed_stake", StakePolicy::fixed(fixed_amount)),
            Factor::stake("tiered_stake", StakePolicy::Tiered(tiered)),
            Factor::filter("home_favourite", Predicate::Favourite { side: Side::Home }),
            Factor::filter("away_favourite", Predicate::Favourite { side: Side::Away }),
            Factor::filter("level_ball", Predicate::LevelBall),
            Factor::filter("quarter_line", Predicate::QuarterLine),
            Factor::filter(
                "deep_line",
                Predicate::Any {
                    predicates: vec![
                        Predicate::HandicapRange {
                            min: None,
                            max: Some(-1.0),
                        },
                        Predicate::HandicapRange {
                            min: Some(1.0),
                            max: None,
                        },
                    ],
                },
            ),
            Factor::filter(
                "home_price_short",
                Predicate::OddsRange {
                    side: Side::Home,
                    min: None,
                    max: Some(1.85),
                },
            ),
            Factor::filter(
                "home_price_long",
                Predicate::OddsRange {
                    side: Side::Home,
                    min: Some(2.0),
                    max: None,
                },
            ),
            Factor::filter(
                "away_price_short",
                Predicate::OddsRange {
                    side: Side::Away,
                    min: None,
                    max: Some(1.85),
                },
            ),
            Factor::filter(
                "away_price_long",
                Predicate::OddsRange {
                    side: Side::Away,
                    min: Some(2.0),
                    max: None,
                },
            ),
            Factor::filter("early_season", Predicate::WeekRange { min: 1, max: 10 }),
            Factor::filter("late_season", Predicate::WeekRange { min: 30, max: 99 }),
            Factor::filter("home_top_half", attr("home_position", Comparison::Le, 10.0)),
            Factor::filter("away_top_half", attr("away_position", Comparison::Le, 10.0)),
            Factor::filter(
                "home_in_form",
                Predicate::AttributeCompare {
                    left: "home_form".into(),
                    op: Comparison::Gt,
                    right: "away_form".into(),
                },
            ),
            Factor::filter(
                "away_in_form",
                Predicate::AttributeCompare {
                    left: "away_form".into(),
                    op: Comparison::Gt,
                    right: "home_form".into(),
                },
            ),
        ])
    }
}
