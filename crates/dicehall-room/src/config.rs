//! Room configuration.

use std::time::Duration;

use dicehall_dice::{BetLimits, GameMode};
use serde::{Deserialize, Serialize};

pub use dicehall_protocol::RoomState;

/// Settings shared by every room the engine runs.
///
/// Missing fields fall back to [`RoomConfig::default`] when deserialized,
/// so a config file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoomConfig {
    /// Maximum players in one room.
    pub capacity: usize,

    /// Length of a betting phase, in seconds.
    pub betting_window_secs: u32,

    /// Time between countdown ticks. Each tick takes one second off
    /// the displayed time left.
    pub tick_interval: Duration,

    /// Which multiplier table settles rounds.
    pub mode: GameMode,

    /// Bounds on a single bet's total stake.
    pub bet_limits: BetLimits,

    /// Capacity of the engine's command channel.
    pub engine_channel_size: usize,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            capacity: 6,
            betting_window_secs: 60,
            tick_interval: Duration::from_secs(1),
            mode: GameMode::Normal,
            bet_limits: BetLimits::unbounded(),
            engine_channel_size: 64,
        }
    }
}
