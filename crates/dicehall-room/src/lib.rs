//! Rooms and rounds for dicehall.
//!
//! A single engine task owns every room. Client commands, disconnects
//! and countdown ticks all arrive as messages on its channels and are
//! applied one at a time, so no two mutations of a room ever interleave.
//!
//! # Key types
//!
//! - [`Room`]: one room's round state machine
//! - [`RoomRegistry`]: code → room map, creation and teardown
//! - [`Countdown`]: the single cancellable betting timer of a room
//! - [`EngineHandle`]: send commands to the running engine

mod config;
mod countdown;
mod engine;
mod error;
mod registry;
mod room;

pub use config::{RoomConfig, RoomState};
pub use countdown::{Countdown, TimerTick};
pub use engine::{EngineHandle, Outbox, spawn_engine};
pub use error::RoomError;
pub use registry::{Departure, RoomRegistry};
pub use room::{Player, Room};
