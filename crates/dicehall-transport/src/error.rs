use std::net::SocketAddr;

use crate::ConnectionId;

/// Errors raised while listening for players or moving their frames.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The peer is gone; nothing more can be sent to it.
    #[error("{0} is closed")]
    ConnectionClosed(ConnectionId),

    /// The listening socket could not be opened.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The listener failed to hand over the next socket.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// A socket was accepted but never completed the upgrade.
    #[error("handshake with {peer} failed: {reason}")]
    Handshake { peer: SocketAddr, reason: String },

    /// Writing a frame failed.
    #[error("send to {conn} failed: {reason}")]
    Send { conn: ConnectionId, reason: String },

    /// Reading a frame failed.
    #[error("receive from {conn} failed: {reason}")]
    Receive { conn: ConnectionId, reason: String },
}
