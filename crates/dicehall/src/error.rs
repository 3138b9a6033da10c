//! Unified error type for dicehall.

use dicehall_dice::{DiceError, PayoutError};
use dicehall_protocol::ProtocolError;
use dicehall_room::RoomError;
use dicehall_transport::TransportError;

/// Top-level error that wraps every layer's error.
///
/// The `#[from]` on each variant lets `?` lift layer errors directly.
#[derive(Debug, thiserror::Error)]
pub enum DicehallError {
    /// Connection, send, or receive failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame could not be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A malformed bet.
    #[error(transparent)]
    Dice(#[from] DiceError),

    /// A payout could not be authorized or executed.
    #[error(transparent)]
    Payout(#[from] PayoutError),

    /// Room or engine failure.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// Bad configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
