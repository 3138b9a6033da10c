//! The payout boundary.
//!
//! A [`PayoutRequest`] can only be built through [`PayoutRequest::authorize`],
//! which recomputes the amount from the outcome and the bet. Whatever a
//! client claims is checked against that recomputation and never used as
//! the amount itself.

use std::future::Future;

use dicehall_protocol::{BetSelection, Outcome};

use crate::payout::settle;
use crate::{BetLimits, GameMode, PayoutError, validate_bet};

/// Tolerance for comparing a claimed amount with the recomputed one.
const CLAIM_TOLERANCE: f64 = 1e-4;

/// An authorized transfer from the house to a player.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutRequest {
    destination: String,
    amount: f64,
    outcome: Outcome,
    bet: BetSelection,
    mode: GameMode,
}

impl PayoutRequest {
    /// Builds a request for the gross return of `bet` on `outcome`.
    ///
    /// When `claimed` is given it must match the recomputed total return.
    /// Fails with [`PayoutError::NothingToPay`] when the bet lost.
    pub fn authorize(
        destination: &str,
        outcome: Outcome,
        bet: BetSelection,
        mode: GameMode,
        claimed: Option<f64>,
    ) -> Result<Self, PayoutError> {
        validate_bet(&bet, &BetLimits::unbounded())?;
        if let Some(claimed) = claimed {
            verify_claim(&outcome, &bet, mode, claimed)?;
        }

        let amount = settle(&bet, &outcome, mode.table()).total_return;
        if amount <= 0.0 {
            return Err(PayoutError::NothingToPay);
        }
        let destination = destination.trim();
        if destination.is_empty() {
            return Err(PayoutError::MissingDestination);
        }

        Ok(Self {
            destination: destination.to_owned(),
            amount,
            outcome,
            bet,
            mode,
        })
    }

    /// Where the winnings go.
    pub fn destination(&self) -> &str {
        &self.destination
    }

    /// Gross amount to transfer.
    pub fn amount(&self) -> f64 {
        self.amount
    }

    /// The roll the amount was computed from.
    pub fn outcome(&self) -> &Outcome {
        &self.outcome
    }

    /// The settled bet.
    pub fn bet(&self) -> &BetSelection {
        &self.bet
    }

    /// Multiplier table the amount was computed with.
    pub fn mode(&self) -> GameMode {
        self.mode
    }
}

/// Checks a client-asserted total return against the real one.
///
/// Returns the recomputed value on success.
pub fn verify_claim(
    outcome: &Outcome,
    bet: &BetSelection,
    mode: GameMode,
    claimed: f64,
) -> Result<f64, PayoutError> {
    let expected = settle(bet, outcome, mode.table()).total_return;
    if (expected - claimed).abs() > CLAIM_TOLERANCE || !claimed.is_finite() {
        return Err(PayoutError::ClaimMismatch { expected, claimed });
    }
    Ok(expected)
}

/// Proof that a transfer went through.
#[derive(Debug, Clone, PartialEq)]
pub struct PayoutReceipt {
    pub reference: String,
    pub amount: f64,
}

/// Moves value for authorized requests.
///
/// Executors are shared across payout tasks, so the returned future must
/// be `Send`. Implementors may write `async fn execute`.
pub trait PayoutExecutor: Send + Sync + 'static {
    fn execute(
        &self,
        request: PayoutRequest,
    ) -> impl Future<Output = Result<PayoutReceipt, PayoutError>> + Send;
}
