//! # dicehall
//!
//! A server-authoritative multiplayer dice-betting server.
//!
//! Players create or join six-digit rooms, bet on up to three of six
//! colors, and every member of a room is settled against the same roll
//! of three dice. The layers, leaves first:
//!
//! - `dicehall-transport`: WebSocket connections
//! - `dicehall-protocol`: JSON events on the wire
//! - `dicehall-dice`: outcomes, payout math, payout execution
//! - `dicehall-room`: rooms, rounds, and the engine task that owns them
//! - this crate: per-connection gateway, server builder, configuration
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use dicehall::prelude::*;
//!
//! # async fn run() -> Result<(), DicehallError> {
//! let server = DicehallServer::builder()
//!     .bind("127.0.0.1:3000")
//!     .build()
//!     .await?;
//! server.run().await
//! # }
//! ```

mod config;
mod error;
mod handler;
mod server;

pub use config::{CONFIG_FILE, ServerConfig};
pub use error::DicehallError;
pub use server::{DicehallServer, DicehallServerBuilder};

/// Everything needed to embed or test a server.
pub mod prelude {
    pub use crate::{DicehallError, DicehallServer, DicehallServerBuilder, ServerConfig};
    pub use dicehall_dice::{
        GameMode, HouseLedger, OutcomeSource, PayoutExecutor, RandomOutcomes, ScriptedOutcomes,
    };
    pub use dicehall_protocol::{
        BetSelection, ClientEvent, Color, Outcome, RoomCode, RoomSnapshot, RoomState, ServerEvent,
    };
    pub use dicehall_room::{EngineHandle, RoomConfig};
}
