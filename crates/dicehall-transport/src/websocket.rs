//! Players connect over plain WebSockets (`ws://host:port`), one JSON
//! event per frame.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::{self, Message};

use crate::{Connection, ConnectionId, Transport, TransportError};

static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

type PlayerSocket = WebSocketStream<TcpStream>;

/// Listens for player sockets.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Opens the listening socket.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        tracing::info!(addr, "listening for players");
        Ok(Self { listener })
    }

    /// The bound address. Tests bind port 0 and read the real port here.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer) = self.listener.accept().await.map_err(TransportError::Accept)?;

        let socket = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| TransportError::Handshake {
                peer,
                reason: e.to_string(),
            })?;

        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        tracing::debug!(%id, %peer, "player socket upgraded");

        let (writer, reader) = socket.split();
        Ok(WebSocketConnection {
            id,
            peer,
            writer: Mutex::new(writer),
            reader: Mutex::new(reader),
        })
    }
}

/// One player's socket.
///
/// The two directions are locked separately: the gateway sits in `recv`
/// most of the time while room broadcasts go out through `send`.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    writer: Mutex<SplitSink<PlayerSocket, Message>>,
    reader: Mutex<SplitStream<PlayerSocket>>,
}

impl WebSocketConnection {
    /// Remote address of the player.
    pub fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    fn send_error(&self, err: tungstenite::Error) -> TransportError {
        match err {
            tungstenite::Error::ConnectionClosed | tungstenite::Error::AlreadyClosed => {
                TransportError::ConnectionClosed(self.id)
            }
            other => TransportError::Send {
                conn: self.id,
                reason: other.to_string(),
            },
        }
    }
}

/// Browsers expect JSON in text frames; anything that is not UTF-8 goes
/// out as binary.
fn to_message(frame: &[u8]) -> Message {
    match std::str::from_utf8(frame) {
        Ok(text) => Message::Text(text.to_owned().into()),
        Err(_) => Message::Binary(frame.to_vec().into()),
    }
}

/// Payload of a data frame. Control frames carry nothing for the game.
fn payload(msg: Message) -> Option<Vec<u8>> {
    match msg {
        Message::Text(text) => Some(text.as_bytes().to_vec()),
        Message::Binary(data) => Some(data.to_vec()),
        _ => None,
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, data: &[u8]) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .send(to_message(data))
            .await
            .map_err(|e| self.send_error(e))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error> {
        let mut reader = self.reader.lock().await;
        while let Some(next) = reader.next().await {
            let msg = next.map_err(|e| TransportError::Receive {
                conn: self.id,
                reason: e.to_string(),
            })?;
            if msg.is_close() {
                return Ok(None);
            }
            if let Some(frame) = payload(msg) {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.writer
            .lock()
            .await
            .close()
            .await
            .map_err(|e| self.send_error(e))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }
}
