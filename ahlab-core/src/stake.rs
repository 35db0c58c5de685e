//! Stake sizing policies — map the odds of a bet to the amount staked.
//!
//! Two policies:
//! 1. **Fixed**: the same amount on every bet.
//! 2. **Tiered**: a base stake up to `base_odds`, then one `increment` per
//!    full `step` of odds above it, capped at `max_stake`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Absorbs representation error so that e.g. `(2.0 - 1.9) / 0.1` counts as one full step.
const STEP_EPSILON: f64 = 1e-9;

/// Errors from validating a stake policy's parameters.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum StakeError {
    #[error("stake parameter '{name}' = {value} must be finite and positive")]
    NotPositive { name: &'static str, value: f64 },

    #[error("stake parameter '{name}' = {value} must be finite and non-negative")]
    Negative { name: &'static str, value: f64 },

    #[error("max_stake {max_stake} is below base_stake {base_stake}")]
    CapBelowBase { base_stake: f64, max_stake: f64 },
}

/// Tiered (variable) stake schedule.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TieredStake {
    pub base_odds: f64,
    pub base_stake: f64,
    pub step: f64,
    pub increment: f64,
    pub max_stake: f64,
}

impl Default for TieredStake {
    fn default() -> Self {
        Self {
            base_odds: 1.90,
            base_stake: 100.0,
            step: 0.10,
            increment: 10.0,
            max_stake: 200.0,
        }
    }
}

impl TieredStake {
    pub fn stake_for(&self, odds: f64) -> f64 {
        if odds <= self.base_odds {
            return self.base_stake;
        }
        let steps = ((odds - self.base_odds) / self.step + STEP_EPSILON).floor();
        (self.base_stake + steps * self.increment).min(self.max_stake)
    }

    pub fn validate(&self) -> Result<(), StakeError> {
        positive("base_odds", self.base_odds)?;
        positive("base_stake", self.base_stake)?;
        positive("step", self.step)?;
        non_negative("increment", self.increment)?;
        positive("max_stake", self.max_stake)?;
        if self.max_stake < self.base_stake {
            return Err(StakeError::CapBelowBase {
                base_stake: self.base_stake,
                max_stake: self.max_stake,
            });
        }
        Ok(())
    }
}

fn positive(name: &'static str, value: f64) -> Result<(), StakeError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(StakeError::NotPositive { name, value })
    }
}

fn non_negative(name: &'static str, value: f64) -> Result<(), StakeError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(StakeError::Negative { name, value })
    }
}

/// A stake sizing policy attached to a stake factor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StakePolicy {
    Fixed { amount: f64 },
    Tiered(TieredStake),
}

impl StakePolicy {
    pub fn fixed(amount: f64) -> Self {
        Self::Fixed { amount }
    }

    /// Stake for a bet at decimal `odds`.
    pub fn stake_for(&self, odds: f64) -> f64 {
        match self {
            Self::Fixed { amount } => *amount,
            Self::Tiered(tiered) => tiered.stake_for(odds),
        }
    }

    pub fn validate(&self) -> Result<(), StakeError> {
        match self {
            Self::Fixed { amount } => positive("amount", *amount),
            Self::Tiered(tiered) => tiered.validate(),
        }
    }

    /// Short label for tables and logs.
    pub fn label(&self) -> String {
        match self {
            Self::Fixed { amount } => format!("fixed({amount})"),
            Self::Tiered(t) => format!(
                "tiered({}@{}, +{}/{}, max {})",
                t.base_stake, t.base_odds, t.increment, t.step, t.max_stake
            ),
        }
    }
}
