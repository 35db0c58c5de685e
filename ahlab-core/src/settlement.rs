//! Settlement engine — the single place AH bets are graded.
//!
//! A single line settles on the handicap-adjusted goal margin. A split line
//! is settled as two independent single-line bets whose results are combined
//! through a fixed table (see [`Outcome::combine`]).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::{HandicapError, HandicapLine, Side};

/// Errors from `settle`. Every variant is a caller contract violation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SettlementError {
    #[error("malformed handicap line: {0}")]
    Handicap(#[from] HandicapError),

    #[error("odds {0} must be finite and greater than 1.0")]
    InvalidOdds(f64),

    #[error("stake {0} must be finite and non-negative")]
    InvalidStake(f64),
}

/// Result of a settled AH bet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outcome {
    Win,
    HalfWin,
    Push,
    HalfLose,
    Lose,
}

impl Outcome {
    /// Combine the results of the two halves of a split line.
    ///
    /// `(Win, Lose)` cannot occur for adjacent lines under integer scores;
    /// it is graded as a half win and must not be reused for wider pairs.
    pub fn combine(first: Outcome, second: Outcome) -> Outcome {
        use Outcome::*;
        match (first, second) {
            (Win, Win) => Win,
            (Lose, Lose) => Lose,
            (Push, Push) => Push,
            (Win, Push) | (Push, Win) => HalfWin,
            (Lose, Push) | (Push, Lose) => HalfLose,
            (Win, Lose) | (Lose, Win) => HalfWin,
            _ => Push,
        }
    }

    /// Profit of `stake` at decimal `odds` for this outcome.
    pub fn profit(self, odds: f64, stake: f64) -> f64 {
        match self {
            Self::Win => stake * (odds - 1.0),
            Self::HalfWin => stake * (odds - 1.0) / 2.0,
            Self::Push => 0.0,
            Self::HalfLose => -stake / 2.0,
            Self::Lose => -stake,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::HalfWin => "half-win",
            Self::Push => "push",
            Self::HalfLose => "half-lose",
            Self::Lose => "lose",
        }
    }
}

/// A graded bet: outcome plus realized profit for the stake it was settled at.
///
/// The precompute cache stores these at a reference stake of 1 unit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BettingOutcome {
    pub outcome: Outcome,
    pub profit: f64,
}

/// Grade a bet on one standard line.
///
/// The line must already be validated as a multiple of 0.5; `settle` does
/// that before calling in.
pub fn settle_single_line(home_score: u32, away_score: u32, line: f64, side: Side) -> Outcome {
    let (goal_diff, adjusted_line) = match side {
        Side::Home => (home_score as i64 - away_score as i64, line),
        Side::Away => (away_score as i64 - home_score as i64, -line),
    };
    let margin = goal_diff as f64 + adjusted_line;

    if margin > 0.0 {
        Outcome::Win
    } else if margin < 0.0 {
        Outcome::Lose
    } else {
        Outcome::Push
    }
}

/// Grade a bet and compute its profit.
///
/// `handicap` is from the home perspective regardless of `side`. A quarter
/// single line is graded as its adjacent split.
pub fn settle(
    home_score: u32,
    away_score: u32,
    handicap: &HandicapLine,
    side: Side,
    odds: f64,
    stake: f64,
) -> Result<BettingOutcome, SettlementError> {
    let handicap = handicap.normalized()?;
    if !odds.is_finite() || odds <= 1.0 {
        return Err(SettlementError::InvalidOdds(odds));
    }
    if !stake.is_finite() || stake < 0.0 {
        return Err(SettlementError::InvalidStake(stake));
    }

    let outcome = match handicap {
        HandicapLine::Single(line) => settle_single_line(home_score, away_score, line, side),
        HandicapLine::Split(first, second) => Outcome::combine(
            settle_single_line(home_score, away_score, first, side),
            settle_single_line(home_score, away_score, second, side),
        ),
    };

    Ok(BettingOutcome {
        outcome,
        profit: outcome.profit(odds, stake),
    })
}
