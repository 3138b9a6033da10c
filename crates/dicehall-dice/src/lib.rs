//! Dice rules for dicehall.
//!
//! Everything in this crate is independent of rooms and sockets:
//!
//! - [`OutcomeSource`]: produces the one shared roll for a round
//! - [`settle`] / [`net_winnings`]: the pure payout calculator
//! - [`validate_bet`]: what a well-formed bet looks like
//! - [`PayoutExecutor`]: the boundary to whatever actually moves value,
//!   with [`HouseLedger`] as the in-memory implementation
//!
//! The payout math lives here once and is shared by every caller, so
//! the amount a player is shown and the amount the executor transfers
//! can never disagree.

mod bet;
mod error;
mod executor;
mod ledger;
mod outcome;
mod payout;

pub use bet::{BetLimits, MAX_SELECTED_COLORS, validate_bet};
pub use error::{DiceError, PayoutError};
pub use executor::{PayoutExecutor, PayoutReceipt, PayoutRequest, verify_claim};
pub use ledger::{HouseLedger, Transfer};
pub use outcome::{OutcomeSource, RandomOutcomes, ScriptedOutcomes, roll_outcome};
pub use payout::{GameMode, PayoutTable, Settlement, net_winnings, settle};
