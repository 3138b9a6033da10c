//! Wire protocol for dicehall.
//!
//! This crate defines what travels between a browser and the server:
//!
//! - **Dice vocabulary** ([`Color`], [`Outcome`], [`BetSelection`]):
//!   the symbols on the dice and what a player stakes on them.
//! - **Room views** ([`RoomSnapshot`], [`PlayerSnapshot`], [`RoomState`]):
//!   the server-authoritative picture every member receives.
//! - **Events** ([`ClientEvent`], [`ServerEvent`]): one JSON object per
//!   frame, tagged by event name.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, events out.
//!
//! ```text
//! Transport (frames) → Protocol (events) → Room engine (state machine)
//! ```

mod codec;
mod error;
mod events;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, ServerEvent};
pub use types::{
    BetSelection, Color, Outcome, PlayerId, PlayerResult, PlayerSnapshot,
    RoomCode, RoomSnapshot, RoomState,
};
