//! Predicates — the closed set of boolean tests a factor can apply to a match.
//!
//! Predicates are plain data, built once from configuration and evaluated
//! directly; nothing is parsed or interpreted per call. A predicate that
//! reads a value the record does not carry (week, date, league, an
//! attribute) evaluates to `false`.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::{MatchRecord, Side};

/// Numeric comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl Comparison {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            Self::Lt => lhs < rhs,
            Self::Le => lhs <= rhs,
            Self::Gt => lhs > rhs,
            Self::Ge => lhs >= rhs,
            Self::Eq => lhs == rhs,
            Self::Ne => lhs != rhs,
        }
    }
}

/// A boolean test over a `MatchRecord`. All ranges are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Predicate {
    /// Matches every record.
    #[default]
    Always,
    /// Effective home-perspective line within `[min, max]`; a missing
    /// bound is open.
    HandicapRange {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// Odds for `side` within `[min, max]`; a missing bound is open.
    OddsRange {
        side: Side,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<f64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<f64>,
    },
    /// `side` is giving goals on the line.
    Favourite { side: Side },
    /// Line is exactly zero.
    LevelBall,
    /// Line is a split (quarter) line.
    QuarterLine,
    WeekRange { min: u32, max: u32 },
    DateRange { from: NaiveDate, to: NaiveDate },
    League { name: String },
    Team { side: Side, name: String },
    /// Auxiliary attribute compared against a constant.
    Attribute { name: String, op: Comparison, value: f64 },
    /// Auxiliary attribute compared against another attribute.
    AttributeCompare { left: String, op: Comparison, right: String },
    Not { predicate: Box<Predicate> },
    All { predicates: Vec<Predicate> },
    Any { predicates: Vec<Predicate> },
}

fn within(value: f64, min: Option<f64>, max: Option<f64>) -> bool {
    min.map_or(true, |m| value >= m) && max.map_or(true, |m| value <= m)
}

impl Predicate {
    pub fn evaluate(&self, record: &MatchRecord) -> bool {
        match self {
            Self::Always => true,
            Self::HandicapRange { min, max } => within(record.handicap.value(), *min, *max),
            Self::OddsRange { side, min, max } => within(record.odds(*side), *min, *max),
            Self::Favourite { side } => {
                let line = record.handicap.value();
                match side {
                    Side::Home => line < 0.0,
                    Side::Away => line > 0.0,
                }
            }
            Self::LevelBall => record.handicap.value() == 0.0,
            Self::QuarterLine => record.handicap.is_quarter(),
            Self::WeekRange { min, max } => record
                .week
                .is_some_and(|week| week >= *min && week <= *max),
            Self::DateRange { from, to } => record
                .date
                .is_some_and(|date| date >= *from && date <= *to),
            Self::League { name } => record.league.as_deref() == Some(name.as_str()),
            Self::Team { side, name } => record.team(*side) == name,
            Self::Attribute { name, op, value } => record
                .attribute(name)
                .is_some_and(|lhs| op.apply(lhs, *value)),
            Self::AttributeCompare { left, op, right } => {
                match (record.attribute(left), record.attribute(right)) {
                    (Some(lhs), Some(rhs)) => op.apply(lhs, rhs),
                    _ => false,
                }
            }
            Self::Not { predicate } => !predicate.evaluate(record),
            Self::All { predicates } => predicates.iter().all(|p| p.evaluate(record)),
            Self::Any { predicates } => predicates.iter().any(|p| p.evaluate(record)),
        }
    }

    pub fn negate(self) -> Self {
        Self::Not {
            predicate: Box::new(self),
        }
    }
}
