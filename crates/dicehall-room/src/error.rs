//! Error types for the room layer.

use dicehall_dice::DiceError;
use dicehall_protocol::RoomCode;
use dicehall_transport::ConnectionId;

/// Errors that can occur during room operations.
///
/// Only `RoomNotFound`, `RoomFull` and `InvalidBet` are ever reported
/// to a client. The rest are logged and dropped.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RoomError {
    /// No live room has this code.
    #[error("room {0} not found")]
    RoomNotFound(RoomCode),

    /// The room is at capacity.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The connection is not a member of the room it addressed.
    #[error("{0} is not in room {1}")]
    NotInRoom(ConnectionId, RoomCode),

    /// The command does not apply in the room's current state.
    #[error("invalid command: {0}")]
    InvalidCommand(String),

    /// A countdown tick arrived for a room or phase that no longer exists.
    #[error("stale timer fire for room {0}")]
    StaleTimerFire(RoomCode),

    /// The submitted bet cannot be settled.
    #[error(transparent)]
    InvalidBet(#[from] DiceError),

    /// The engine task has stopped.
    #[error("room engine is unavailable")]
    EngineUnavailable,
}

impl RoomError {
    /// The text shown to a client whose join failed.
    pub fn join_reason(&self) -> String {
        match self {
            Self::RoomNotFound(_) => "Room not found".to_owned(),
            Self::RoomFull(_) => "Room is full".to_owned(),
            other => other.to_string(),
        }
    }
}
