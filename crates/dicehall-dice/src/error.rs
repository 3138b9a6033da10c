//! Error types for bet validation and payouts.

use dicehall_protocol::Color;

/// A bet that cannot be settled.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DiceError {
    /// No color was selected.
    #[error("select at least one color")]
    NoColors,

    /// More colors than the table allows.
    #[error("at most {max} colors may be selected, got {got}")]
    TooManyColors { got: usize, max: usize },

    /// The same color was selected twice.
    #[error("color {0} selected more than once")]
    DuplicateColor(Color),

    /// The per-color amount is zero, negative, NaN, or infinite.
    #[error("bet amount must be a positive number, got {0}")]
    InvalidAmount(f64),

    /// The stake, or what it could pay back, does not fit in an `f64`.
    #[error("bet amount {amount} on {colors} colors is too large to settle")]
    StakeTooLarge { amount: f64, colors: usize },

    /// Total stake under the configured minimum.
    #[error("total stake {stake} is below the minimum of {min}")]
    BelowMinimum { stake: f64, min: f64 },

    /// Total stake over the configured maximum.
    #[error("total stake {stake} exceeds the maximum of {max}")]
    AboveMaximum { stake: f64, max: f64 },
}

/// Errors at the payout executor boundary.
#[derive(Debug, thiserror::Error)]
pub enum PayoutError {
    /// The bet itself is malformed.
    #[error(transparent)]
    InvalidBet(#[from] DiceError),

    /// A client-asserted amount does not match the recomputed one.
    #[error("claimed {claimed} but the outcome pays {expected}")]
    ClaimMismatch { expected: f64, claimed: f64 },

    /// The bet returns nothing, so there is nothing to transfer.
    #[error("bet did not win anything")]
    NothingToPay,

    /// No destination was given for the transfer.
    #[error("payout destination is missing")]
    MissingDestination,

    /// The house cannot cover the transfer.
    #[error("insufficient house balance: need {required}, have {available}")]
    InsufficientBalance { required: f64, available: f64 },

    /// The executor refused or failed the transfer.
    #[error("payout rejected: {0}")]
    Rejected(String),
}
