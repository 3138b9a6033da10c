//! Per-connection gateway.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. It owns no game state: inbound frames are decoded and
//! forwarded to the engine, and whatever the engine puts in the
//! connection's outbox is encoded and written back.

use std::sync::Arc;

use dicehall_protocol::{ClientEvent, Codec};
use dicehall_room::EngineHandle;
use dicehall_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::DicehallError;
use crate::server::ServerState;

/// Reports the connection as gone when the handler exits, however it
/// exits.
///
/// `Drop` is synchronous, so the disconnect is sent from a spawned task.
struct DisconnectGuard {
    conn_id: ConnectionId,
    engine: EngineHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let engine = self.engine.clone();
        if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                let _ = engine.disconnect(conn_id).await;
            });
        }
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), DicehallError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "player connected");

    let (outbox, mut inbox) = mpsc::unbounded_channel();
    state.engine.connect(conn_id, outbox).await?;
    let _guard = DisconnectGuard {
        conn_id,
        engine: state.engine.clone(),
    };

    loop {
        tokio::select! {
            frame = conn.recv() => match frame {
                Ok(Some(data)) => forward(&state, conn_id, &data).await?,
                Ok(None) => {
                    tracing::info!(%conn_id, "connection closed");
                    break;
                }
                Err(e) => {
                    tracing::debug!(%conn_id, error = %e, "recv error");
                    break;
                }
            },
            Some(event) = inbox.recv() => {
                let bytes = state.codec.encode(&event)?;
                conn.send(&bytes).await?;
            }
        }
    }

    // _guard drops here → the engine removes the player from its room.
    Ok(())
}

/// Decodes one inbound frame and hands it to the engine.
///
/// Frames that are not a known client event are logged and dropped.
async fn forward<C: Codec>(
    state: &ServerState<C>,
    conn_id: ConnectionId,
    data: &[u8],
) -> Result<(), DicehallError> {
    let event: ClientEvent = match state.codec.decode(data) {
        Ok(event) => event,
        Err(e) => {
            tracing::debug!(%conn_id, error = %e, "failed to decode client event");
            return Ok(());
        }
    };
    state.engine.dispatch(conn_id, event).await?;
    Ok(())
}
