//! Client and server events.
//!
//! Every frame is one JSON object, adjacently tagged:
//!
//! ```text
//! {"event": "joinRoom", "data": "482913"}
//! {"event": "timerUpdate", "data": 42}
//! {"event": "createRoom"}                  ← events without a payload
//! ```

use serde::{Deserialize, Serialize};

use crate::{BetSelection, Outcome, PlayerResult, RoomCode, RoomSnapshot};

/// Client → server commands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ClientEvent {
    /// Open a new room with the sender as host.
    CreateRoom,

    /// Join an existing room by code.
    JoinRoom(RoomCode),

    /// Open a betting phase (from waiting, or from results for the
    /// next round).
    StartGame(RoomCode),

    /// Submit this round's bet and mark the sender ready.
    PlayerReady { code: RoomCode, bet: BetSelection },

    /// Leave the room.
    LeaveRoom(RoomCode),
}

/// Server → client events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    tag = "event",
    content = "data",
    rename_all = "camelCase",
    rename_all_fields = "camelCase"
)]
pub enum ServerEvent {
    /// To the creator only.
    RoomCreated(RoomCode),

    /// To the joiner only.
    RoomJoined(RoomCode),

    /// To the requester only, after a failed join.
    JoinError(String),

    /// To the room, on any membership or readiness change.
    RoomUpdate(RoomSnapshot),

    /// To the room, on entering a betting phase.
    GameStarted(RoomSnapshot),

    /// To the room, once per countdown tick: seconds remaining.
    TimerUpdate(u32),

    /// To the room, when a round resolves.
    DiceRolled {
        outcome: Outcome,
        room: RoomSnapshot,
        results: Vec<PlayerResult>,
    },

    /// To the requester only: the submitted bet was not accepted.
    BetRejected(String),

    /// To the winning player only: the payout went through.
    PayoutSettled {
        round: u64,
        reference: String,
        amount: f64,
    },

    /// To the winning player only: the payout could not be made.
    PayoutFailed { round: u64, reason: String },
}
