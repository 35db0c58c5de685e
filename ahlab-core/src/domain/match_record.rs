//! MatchRecord — one historical fixture with its pre-match AH market and result.

use std::collections::BTreeMap;
use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::handicap::{HandicapError, HandicapLine};
use crate::settlement::SettlementError;

/// Which team a bet backs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Home, Side::Away];

    /// Column index used by per-side arrays (`0` home, `1` away).
    pub fn index(self) -> usize {
        match self {
            Self::Home => 0,
            Self::Away => 1,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::Home => Self::Away,
            Self::Away => Self::Home,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => write!(f, "home"),
            Self::Away => write!(f, "away"),
        }
    }
}

/// Reasons a record cannot take part in a search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RecordError {
    #[error("missing final score")]
    MissingScore,

    #[error("{side} odds {odds} must be finite and greater than 1.0")]
    InvalidOdds { side: Side, odds: f64 },

    #[error("malformed handicap: {0}")]
    Handicap(#[from] HandicapError),

    #[error("settlement failed: {0}")]
    Settlement(#[from] SettlementError),
}

/// A historical match with its AH line, odds and final score.
///
/// Immutable once loaded. `attributes` carries auxiliary pre-match values
/// (league position, rolling form, market metrics) read only by filters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchRecord {
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub league: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub week: Option<u32>,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
    pub handicap: HandicapLine,
    pub home_odds: f64,
    pub away_odds: f64,
    #[serde(default)]
    pub attributes: BTreeMap<String, f64>,
}

impl MatchRecord {
    /// A record with no score and no auxiliary data.
    pub fn new(
        home_team: impl Into<String>,
        away_team: impl Into<String>,
        handicap: HandicapLine,
        home_odds: f64,
        away_odds: f64,
    ) -> Self {
        Self {
            home_team: home_team.into(),
            away_team: away_team.into(),
            league: None,
            date: None,
            week: None,
            home_score: None,
            away_score: None,
            handicap,
            home_odds,
            away_odds,
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_score(mut self, home: u32, away: u32) -> Self {
        self.home_score = Some(home);
        self.away_score = Some(away);
        self
    }

    pub fn with_week(mut self, week: u32) -> Self {
        self.week = Some(week);
        self
    }

    pub fn with_date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_league(mut self, league: impl Into<String>) -> Self {
        self.league = Some(league.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: f64) -> Self {
        self.attributes.insert(name.into(), value);
        self
    }

    /// Decimal odds for backing `side` at this record's line.
    pub fn odds(&self, side: Side) -> f64 {
        match side {
            Side::Home => self.home_odds,
            Side::Away => self.away_odds,
        }
    }

    pub fn team(&self, side: Side) -> &str {
        match side {
            Side::Home => &self.home_team,
            Side::Away => &self.away_team,
        }
    }

    /// Final score as `(home, away)` when both halves are present.
    pub fn score(&self) -> Option<(u32, u32)> {
        Some((self.home_score?, self.away_score?))
    }

    pub fn attribute(&self, name: &str) -> Option<f64> {
        self.attributes.get(name).copied()
    }

    /// Validate the record and return its final score.
    ///
    /// Odds must be finite and strictly above 1.0, the line a multiple of
    /// 0.25 (or a valid split), and both scores present.
    pub fn validate(&self) -> Result<(u32, u32), RecordError> {
        self.handicap.validate()?;
        for side in Side::ALL {
            let odds = self.odds(side);
            if !odds.is_finite() || odds <= 1.0 {
                return Err(RecordError::InvalidOdds { side, odds });
            }
        }
        self.score().ok_or(RecordError::MissingScore)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MatchRecord {
        MatchRecord::new("Arsenal", "Chelsea", HandicapLine::Single(-0.5), 1.95, 1.95)
            .with_score(2, 1)
            .with_week(12)
            .with_attribute("home_position", 3.0)
    }

    #[test]
    fn valid_record_returns_score() {
        assert_eq!(sample().validate().unwrap(), (2, 1));
    }

    #[test]
    fn missing_score_is_rejected() {
        let mut r = sample();
        r.away_score = None;
        assert_eq!(r.validate().unwrap_err(), RecordError::MissingScore);
    }

    #[test]
    fn odds_at_or_below_one_are_rejected() {
        let mut r = sample();
        r.away_odds = 1.0;
        assert_eq!(
            r.validate().unwrap_err(),
            RecordError::InvalidOdds {
                side: Side::Away,
                odds: 1.0
            }
        );
    }

    #[test]
    fn malformed_line_is_rejected() {
        let mut r = sample();
        r.handicap = HandicapLine::Split(0.0, -1.0);
        assert!(matches!(r.validate(), Err(RecordError::Handicap(_))));
    }

    #[test]
    fn quarter_single_line_is_valid() {
        let mut r = sample();
        r.handicap = HandicapLine::Single(-0.75);
        assert_eq!(r.validate().unwrap(), (2, 1));
        r.handicap = HandicapLine::Single(-0.7);
        assert!(matches!(r.validate(), Err(RecordError::Handicap(_))));
    }

    #[test]
    fn side_accessors() {
        let r = sample();
        assert_eq!(r.team(Side::Home), "Arsenal");
        assert_eq!(r.team(Side::Away), "Chelsea");
        assert_eq!(r.attribute("home_position"), Some(3.0));
        assert_eq!(r.attribute("away_position"), None);
        assert_eq!(Side::Home.opposite(), Side::Away);
    }
}
