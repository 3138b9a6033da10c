//! Core protocol types: dice symbols, bets, and room snapshots.
//!
//! Everything here is serialized with camelCase field names because the
//! browser client reads them straight off the JSON (`betAmount`,
//! `selectedColors`, `timeLeft`).

use std::fmt;

use dicehall_transport::ConnectionId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A player as seen on the wire.
///
/// Players are anonymous, so this is just the connection number. The
/// newtype keeps it from being mixed up with round counters or amounts.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl From<ConnectionId> for PlayerId {
    fn from(conn: ConnectionId) -> Self {
        Self(conn.into_inner())
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// The six-digit code players type to find a room.
///
/// Serialized as a plain JSON string (`"482913"`). Uniqueness is the
/// registry's job; this type only carries the text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Number of digits in a generated code.
    pub const LEN: usize = 6;

    /// Builds a code from a number in `100_000..=999_999`.
    pub fn from_number(n: u32) -> Self {
        Self(format!("{n:06}"))
    }

    /// Returns the code as text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

impl From<String> for RoomCode {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Dice vocabulary
// ---------------------------------------------------------------------------

/// One face of a die. Every die carries all six colors once.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Yellow,
    Orange,
    Pink,
    Blue,
    Green,
    Red,
}

impl Color {
    /// The full alphabet, in display order.
    pub const ALL: [Color; 6] = [
        Color::Yellow,
        Color::Orange,
        Color::Pink,
        Color::Blue,
        Color::Green,
        Color::Red,
    ];
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Yellow => "yellow",
            Self::Orange => "orange",
            Self::Pink => "pink",
            Self::Blue => "blue",
            Self::Green => "green",
            Self::Red => "red",
        };
        f.write_str(name)
    }
}

/// The shared result of one round: three colors, drawn with replacement.
///
/// Serialized as a bare array, e.g. `["red","blue","red"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Outcome(pub [Color; 3]);

impl Outcome {
    /// How many of the three dice show `color` (0–3).
    pub fn matches(&self, color: Color) -> u8 {
        self.0.iter().filter(|c| **c == color).count() as u8
    }

    /// `true` if all three dice show the same color.
    pub fn is_triple(&self) -> bool {
        self.0[0] == self.0[1] && self.0[1] == self.0[2]
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.0[0], self.0[1], self.0[2])
    }
}

/// What a player stakes on a round.
///
/// `bet_amount` is staked on EACH selected color, so the total stake is
/// `bet_amount * selected_colors.len()`. `wallet` is an optional payout
/// destination; without it winnings are only displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BetSelection {
    pub selected_colors: Vec<Color>,
    pub bet_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet: Option<String>,
}

impl BetSelection {
    /// Convenience constructor without a payout destination.
    pub fn new(selected_colors: Vec<Color>, bet_amount: f64) -> Self {
        Self {
            selected_colors,
            bet_amount,
            wallet: None,
        }
    }

    /// Total amount at risk across all selected colors.
    pub fn stake(&self) -> f64 {
        self.bet_amount * self.selected_colors.len() as f64
    }
}

// ---------------------------------------------------------------------------
// Room views
// ---------------------------------------------------------------------------

/// Lifecycle phase of a room.
///
/// ```text
/// Waiting ──start──→ Betting ──(timer | all ready)──→ Results
///                       ↑                                │
///                       └─────────────start──────────────┘
/// ```
///
/// There is no separate "rolling" phase: the roll happens inside the
/// Betting → Results transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Waiting,
    Betting,
    Results,
}

impl RoomState {
    /// `true` if a start command may open a new betting phase.
    pub fn can_start(&self) -> bool {
        matches!(self, Self::Waiting | Self::Results)
    }

    /// `true` while bets are being collected.
    pub fn accepts_bets(&self) -> bool {
        matches!(self, Self::Betting)
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Betting => write!(f, "betting"),
            Self::Results => write!(f, "results"),
        }
    }
}

/// One member as shown to the rest of the room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub id: PlayerId,
    pub name: String,
    pub ready: bool,
    pub is_host: bool,
    /// The bet submitted in the current betting phase, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bet_data: Option<BetSelection>,
}

/// Full server-authoritative view of a room.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub code: RoomCode,
    /// In join order; the first entry is the host.
    pub players: Vec<PlayerSnapshot>,
    pub capacity: usize,
    pub state: RoomState,
    pub time_left: u32,
    pub outcome: Option<Outcome>,
    pub round: u64,
}

/// One player's settled bet for a round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResult {
    pub player: PlayerId,
    pub bet: BetSelection,
    /// Gross amount returned, stake included.
    pub total_return: f64,
    /// `total_return - stake`; negative when the player lost.
    pub net_winnings: f64,
    /// Highest match count among the selected colors.
    pub max_matches: u8,
    pub jackpot: bool,
}
