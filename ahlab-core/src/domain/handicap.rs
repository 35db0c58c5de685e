//! Handicap lines — single and split (quarter) Asian Handicap lines.
//!
//! Lines are always stated from the home team's perspective: `-1.0` means
//! the home side gives one goal. A split line is two adjacent standard lines
//! exactly 0.5 apart, e.g. `0/-0.5`, jointly meaning `-0.25`. A single
//! quarter value such as `-0.25` is accepted and settles as that split.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from constructing or validating a handicap line.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum HandicapError {
    #[error("handicap component {0} is not finite")]
    NonFinite(f64),

    #[error("handicap component {0} is not a multiple of 0.5")]
    NotHalfStep(f64),

    #[error("handicap value {0} is not a multiple of 0.25")]
    NotQuarterStep(f64),

    #[error("split handicap {first}/{second} components are not exactly 0.5 apart")]
    NotAdjacent { first: f64, second: f64 },

    #[error("cannot parse handicap '{0}'")]
    Parse(String),
}

/// An Asian Handicap line from the home team's perspective.
///
/// Serialized as its textual notation (`"-1"`, `"0/-0.5"`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum HandicapLine {
    /// A standard line; settles as a single bet.
    Single(f64),
    /// Two adjacent standard lines; settles as two half-stake bets.
    Split(f64, f64),
}

fn is_half_step(value: f64) -> bool {
    value.is_finite() && (value * 2.0).fract() == 0.0
}

fn is_quarter_step(value: f64) -> bool {
    value.is_finite() && (value * 4.0).fract() == 0.0
}

fn check_component(value: f64) -> Result<(), HandicapError> {
    if !value.is_finite() {
        return Err(HandicapError::NonFinite(value));
    }
    if !is_half_step(value) {
        return Err(HandicapError::NotHalfStep(value));
    }
    Ok(())
}

impl HandicapLine {
    /// A standard line. Must be a finite multiple of 0.5.
    pub fn single(line: f64) -> Result<Self, HandicapError> {
        check_component(line)?;
        Ok(Self::Single(line))
    }

    /// A split line from two adjacent standard lines.
    pub fn split(first: f64, second: f64) -> Result<Self, HandicapError> {
        let line = Self::Split(first, second);
        line.validate()?;
        Ok(line)
    }

    /// Build a line from its averaged value.
    ///
    /// Half-step values become a `Single`; quarter values are expanded into
    /// the two surrounding standard lines, e.g. `-0.25` becomes `0/-0.5`.
    pub fn from_value(value: f64) -> Result<Self, HandicapError> {
        if !value.is_finite() {
            return Err(HandicapError::NonFinite(value));
        }
        if is_half_step(value) {
            return Ok(Self::Single(value));
        }
        if !is_quarter_step(value) {
            return Err(HandicapError::NotQuarterStep(value));
        }
        Self::split(value + 0.25, value - 0.25)
    }

    /// Check the structural invariants of this line.
    ///
    /// A `Single` may carry a quarter value; it settles as the split
    /// returned by [`normalized`](Self::normalized).
    pub fn validate(&self) -> Result<(), HandicapError> {
        self.normalized().map(|_| ())
    }

    /// The settleable form of this line: quarter-valued singles become the
    /// adjacent split, everything else is returned unchanged once valid.
    pub fn normalized(&self) -> Result<Self, HandicapError> {
        match *self {
            Self::Single(line) => Self::from_value(line),
            Self::Split(first, second) => {
                check_component(first)?;
                check_component(second)?;
                if (first - second).abs() != 0.5 {
                    return Err(HandicapError::NotAdjacent { first, second });
                }
                Ok(*self)
            }
        }
    }

    /// The effective (averaged) line, e.g. `-0.25` for `0/-0.5`.
    pub fn value(&self) -> f64 {
        match *self {
            Self::Single(line) => line,
            Self::Split(first, second) => (first + second) / 2.0,
        }
    }

    pub fn is_split(&self) -> bool {
        matches!(self, Self::Split(..))
    }

    /// True when the effective line sits on a quarter, in either notation.
    pub fn is_quarter(&self) -> bool {
        !is_half_step(self.value())
    }
}

impl fmt::Display for HandicapLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(line) => write!(f, "{line}"),
            Self::Split(first, second) => write!(f, "{first}/{second}"),
        }
    }
}

impl FromStr for HandicapLine {
    type Err = HandicapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |part: &str| -> Result<f64, HandicapError> {
            part.trim()
                .parse::<f64>()
                .map_err(|_| HandicapError::Parse(s.to_string()))
        };

        match s.split_once('/') {
            Some((first, second)) => Self::split(parse(first)?, parse(second)?),
            None => Self::from_value(parse(s)?),
        }
    }
}

impl TryFrom<String> for HandicapLine {
    type Error = HandicapError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<HandicapLine> for String {
    fn from(line: HandicapLine) -> Self {
        line.to_string()
    }
}
