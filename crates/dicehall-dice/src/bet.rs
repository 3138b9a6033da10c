//! Bet validation.

use std::collections::HashSet;

use dicehall_protocol::BetSelection;
use serde::{Deserialize, Serialize};

use crate::{DiceError, GameMode};

/// A bet covers at most this many colors.
pub const MAX_SELECTED_COLORS: usize = 3;

/// Optional bounds on the total stake of a single bet.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BetLimits {
    #[serde(default)]
    pub min_total: Option<f64>,
    #[serde(default)]
    pub max_total: Option<f64>,
}

impl BetLimits {
    /// No bounds at all.
    pub fn unbounded() -> Self {
        Self::default()
    }
}

/// Highest profit multiplier of any mode.
fn max_profit_multiplier() -> f64 {
    GameMode::ALL
        .iter()
        .map(|mode| mode.table().max_profit())
        .fold(0.0, f64::max)
}

/// Checks that `bet` can be settled: 1–3 distinct colors and a positive,
/// finite per-color amount whose total stake lies within `limits`. The
/// stake and the best possible return must both be finite, so a settled
/// result never carries `inf` or `NaN`.
pub fn validate_bet(bet: &BetSelection, limits: &BetLimits) -> Result<(), DiceError> {
    let colors = &bet.selected_colors;
    if colors.is_empty() {
        return Err(DiceError::NoColors);
    }
    if colors.len() > MAX_SELECTED_COLORS {
        return Err(DiceError::TooManyColors {
            got: colors.len(),
            max: MAX_SELECTED_COLORS,
        });
    }
    let mut seen = HashSet::with_capacity(colors.len());
    for &color in colors {
        if !seen.insert(color) {
            return Err(DiceError::DuplicateColor(color));
        }
    }

    if !bet.bet_amount.is_finite() || bet.bet_amount <= 0.0 {
        return Err(DiceError::InvalidAmount(bet.bet_amount));
    }

    let stake = bet.stake();
    if !stake.is_finite() || !(stake * (1.0 + max_profit_multiplier())).is_finite() {
        return Err(DiceError::StakeTooLarge {
            amount: bet.bet_amount,
            colors: colors.len(),
        });
    }
    if let Some(min) = limits.min_total {
        if stake < min {
            return Err(DiceError::BelowMinimum { stake, min });
        }
    }
    if let Some(max) = limits.max_total {
        if stake > max {
            return Err(DiceError::AboveMaximum { stake, max });
        }
    }
    Ok(())
}
