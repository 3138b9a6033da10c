//! In-memory house account.

use tokio::sync::Mutex;

use crate::{PayoutError, PayoutExecutor, PayoutReceipt, PayoutRequest};

/// One completed transfer.
#[derive(Debug, Clone, PartialEq)]
pub struct Transfer {
    pub reference: String,
    pub destination: String,
    pub amount: f64,
}

#[derive(Debug)]
struct LedgerState {
    balance: f64,
    reserve: f64,
    transfers: Vec<Transfer>,
    next_reference: u64,
}

/// A [`PayoutExecutor`] that debits a fixed house balance and records
/// every transfer.
///
/// Transfers are all-or-nothing: a request the balance cannot cover
/// leaves the ledger untouched.
#[derive(Debug)]
pub struct HouseLedger {
    state: Mutex<LedgerState>,
}

impl HouseLedger {
    /// A ledger that may pay out its whole balance.
    pub fn new(balance: f64) -> Self {
        Self::with_reserve(balance, 0.0)
    }

    /// A ledger that refuses any payout leaving less than `reserve` in
    /// the house.
    pub fn with_reserve(balance: f64, reserve: f64) -> Self {
        Self {
            state: Mutex::new(LedgerState {
                balance,
                reserve,
                transfers: Vec::new(),
                next_reference: 1,
            }),
        }
    }

    /// Current house balance.
    pub async fn balance(&self) -> f64 {
        self.state.lock().await.balance
    }

    /// Every transfer made so far, oldest first.
    pub async fn transfers(&self) -> Vec<Transfer> {
        self.state.lock().await.transfers.clone()
    }
}

impl PayoutExecutor for HouseLedger {
    async fn execute(&self, request: PayoutRequest) -> Result<PayoutReceipt, PayoutError> {
        let mut state = self.state.lock().await;
        let amount = request.amount();
        if amount > state.balance {
            tracing::warn!(
                destination = request.destination(),
                amount,
                balance = state.balance,
                "house balance too low for payout"
            );
            return Err(PayoutError::InsufficientBalance {
                required: amount,
                available: state.balance,
            });
        }

        if state.balance - amount < state.reserve {
            tracing::warn!(
                destination = request.destination(),
                amount,
                reserve = state.reserve,
                "payout would breach house reserve"
            );
            return Err(PayoutError::Rejected(format!(
                "paying {amount} would leave the house under its reserve of {}",
                state.reserve
            )));
        }

        let reference = format!("tx-{:06}", state.next_reference);
        state.next_reference += 1;
        state.balance -= amount;
        state.transfers.push(Transfer {
            reference: reference.clone(),
            destination: request.destination().to_owned(),
            amount,
        });
        tracing::info!(%reference, destination = request.destination(), amount, "payout transferred");

        Ok(PayoutReceipt { reference, amount })
    }
}
