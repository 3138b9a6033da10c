//! The payout calculator.
//!
//! For each selected color with at least one match, the player gets the
//! stake on that color back plus a profit:
//!
//! ```text
//! jackpot (outcome is a triple of that color):  bet + bet * jackpot
//! otherwise:                                    bet + bet * per_match * matches
//! no match:                                     0
//! ```
//!
//! Net winnings subtract the whole stake (`bet * colors selected`).

use dicehall_protocol::{BetSelection, Outcome};
use serde::{Deserialize, Serialize};

/// Multiplier pair for one game mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PayoutTable {
    /// Profit multiplier per matching die.
    pub per_match: f64,
    /// Profit multiplier when the outcome is a triple of a selected color.
    pub jackpot: f64,
}

impl PayoutTable {
    /// Largest profit multiplier a single color can earn on one roll.
    pub fn max_profit(&self) -> f64 {
        self.jackpot.max(self.per_match * 3.0)
    }
}

/// Which multiplier table applies.
///
/// Multiplayer rooms use `Normal` unless configured otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    #[default]
    Normal,
    TimeAttack,
}

impl GameMode {
    pub const ALL: [GameMode; 2] = [GameMode::Normal, GameMode::TimeAttack];

    /// The fixed multipliers for this mode.
    pub fn table(self) -> PayoutTable {
        match self {
            Self::Normal => PayoutTable {
                per_match: 1.04,
                jackpot: 4.5,
            },
            Self::TimeAttack => PayoutTable {
                per_match: 1.08,
                jackpot: 5.0,
            },
        }
    }
}

impl std::str::FromStr for GameMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(Self::Normal),
            "timeattack" => Ok(Self::TimeAttack),
            other => Err(format!("unknown game mode {other:?}")),
        }
    }
}

/// Everything the calculator derives from one bet and one outcome.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settlement {
    /// Gross amount returned, stake on winning colors included.
    pub total_return: f64,
    /// `total_return - stake`.
    pub net_winnings: f64,
    /// Best match count among the selected colors.
    pub max_matches: u8,
    /// A selected color matched all three dice.
    pub jackpot: bool,
}

/// Settles `bet` against `outcome` under `table`.
///
/// Pure: no state, no I/O. The bet is taken as given; call
/// [`validate_bet`](crate::validate_bet) first to reject duplicates and
/// non-positive amounts.
pub fn settle(bet: &BetSelection, outcome: &Outcome, table: PayoutTable) -> Settlement {
    let amount = bet.bet_amount;
    let mut total_return = 0.0;
    let mut max_matches = 0;
    let mut jackpot = false;

    for &color in &bet.selected_colors {
        let matches = outcome.matches(color);
        if matches == 0 {
            continue;
        }
        max_matches = max_matches.max(matches);

        // Three matches of one color can only happen on a triple.
        let is_jackpot = matches == 3 && outcome.is_triple();
        let profit = if is_jackpot {
            jackpot = true;
            amount * table.jackpot
        } else {
            amount * table.per_match * f64::from(matches)
        };
        total_return += amount + profit;
    }

    Settlement {
        total_return,
        net_winnings: total_return - bet.stake(),
        max_matches,
        jackpot,
    }
}

/// Net winnings only; negative when the bet lost.
pub fn net_winnings(bet: &BetSelection, outcome: &Outcome, mode: GameMode) -> f64 {
    settle(bet, outcome, mode.table()).net_winnings
}
