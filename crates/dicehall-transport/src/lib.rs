//! Connection layer for dicehall.
//!
//! The room engine never sees sockets. It only sees [`ConnectionId`]s,
//! the opaque handles that stand in for anonymous players. This crate
//! turns a listening socket into a stream of [`Connection`]s that can
//! send and receive whole frames.
//!
//! # Feature Flags
//!
//! - `websocket` (default): WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Opaque per-connection identifier.
///
/// Doubles as the player identity inside a room: players are anonymous,
/// so "who sent this" is answered by "which socket sent this".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Wraps a raw id.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// The raw id.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Source of player connections.
pub trait Transport: Send + Sync + 'static {
    /// What `accept` hands back, one per player.
    type Connection: Connection;
    /// Failure opening or accepting a connection.
    type Error: std::error::Error + Send + Sync;

    /// Resolves once the next player has connected.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single bidirectional connection carrying whole frames.
///
/// Sending and receiving must not block each other: the gateway waits
/// on `recv` while room broadcasts are pushed through `send`.
pub trait Connection: Send + Sync + 'static {
    /// Failure moving a frame.
    type Error: std::error::Error + Send + Sync;

    /// Writes one encoded server event.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Next frame from the player, or `Ok(None)` once they hang up.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Says goodbye to the player; later sends fail.
    async fn close(&self) -> Result<(), Self::Error>;

    /// Identity of the player on the other end.
    fn id(&self) -> ConnectionId;
}
