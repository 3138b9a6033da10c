//! The room engine: one Tokio task that owns every room.
//!
//! Connection handlers talk to it through an [`EngineHandle`]. Countdown
//! tasks feed it [`TimerTick`]s on a separate channel. Both are drained
//! by the same `select!` loop, so each command or tick runs to
//! completion before the next one starts.

use std::collections::HashMap;
use std::sync::Arc;

use dicehall_dice::{OutcomeSource, PayoutExecutor, PayoutRequest};
use dicehall_protocol::{
    BetSelection, ClientEvent, Outcome, PlayerResult, RoomCode, RoomSnapshot, ServerEvent,
};
use dicehall_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{Countdown, Departure, RoomConfig, RoomError, RoomRegistry, RoomState, TimerTick};

/// Channel the engine writes a connection's outbound events to.
pub type Outbox = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to the engine through its channel.
enum EngineCommand {
    /// Register a connection's outbox.
    Connect { conn: ConnectionId, outbox: Outbox },

    /// Apply a decoded client event.
    Client { conn: ConnectionId, event: ClientEvent },

    /// The connection is gone: leave its room and forget its outbox.
    Disconnect { conn: ConnectionId },

    RoomCount { reply: oneshot::Sender<usize> },

    Snapshot {
        code: RoomCode,
        reply: oneshot::Sender<Option<RoomSnapshot>>,
    },
}

/// Handle to the running engine.
///
/// Cheap to clone; it is an `mpsc::Sender` wrapper. Every connection
/// handler holds one.
#[derive(Clone)]
pub struct EngineHandle {
    sender: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    /// Registers the outbox for a new connection.
    pub async fn connect(&self, conn: ConnectionId, outbox: Outbox) -> Result<(), RoomError> {
        self.send(EngineCommand::Connect { conn, outbox }).await
    }

    /// Forwards a client event (fire-and-forget).
    pub async fn dispatch(&self, conn: ConnectionId, event: ClientEvent) -> Result<(), RoomError> {
        self.send(EngineCommand::Client { conn, event }).await
    }

    /// Reports that a connection closed.
    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), RoomError> {
        self.send(EngineCommand::Disconnect { conn }).await
    }

    /// Number of live rooms.
    pub async fn room_count(&self) -> Result<usize, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::RoomCount { reply }).await?;
        rx.await.map_err(|_| RoomError::EngineUnavailable)
    }

    /// Current snapshot of a room, or `None` if no such room exists.
    pub async fn snapshot(&self, code: RoomCode) -> Result<Option<RoomSnapshot>, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.send(EngineCommand::Snapshot { code, reply }).await?;
        rx.await.map_err(|_| RoomError::EngineUnavailable)
    }

    async fn send(&self, cmd: EngineCommand) -> Result<(), RoomError> {
        self.sender
            .send(cmd)
            .await
            .map_err(|_| RoomError::EngineUnavailable)
    }
}

/// Starts the engine task and returns a handle to it.
///
/// The engine stops once every handle has been dropped.
pub fn spawn_engine<S, E>(config: RoomConfig, source: S, executor: Arc<E>) -> EngineHandle
where
    S: OutcomeSource,
    E: PayoutExecutor,
{
    let (tx, rx) = mpsc::channel(config.engine_channel_size.max(1));
    let (ticks_tx, ticks_rx) = mpsc::unbounded_channel();

    let engine = RoomEngine {
        registry: RoomRegistry::new(config),
        outboxes: HashMap::new(),
        commands: rx,
        ticks_tx,
        ticks_rx,
        source,
        executor,
    };
    tokio::spawn(engine.run());

    EngineHandle { sender: tx }
}

/// The engine state. Runs inside a Tokio task.
struct RoomEngine<S, E> {
    registry: RoomRegistry,
    outboxes: HashMap<ConnectionId, Outbox>,
    commands: mpsc::Receiver<EngineCommand>,
    ticks_tx: mpsc::UnboundedSender<TimerTick>,
    ticks_rx: mpsc::UnboundedReceiver<TimerTick>,
    source: S,
    executor: Arc<E>,
}

impl<S: OutcomeSource, E: PayoutExecutor> RoomEngine<S, E> {
    async fn run(mut self) {
        tracing::info!("room engine started");

        loop {
            tokio::select! {
                cmd = self.commands.recv() => match cmd {
                    Some(cmd) => self.handle_command(cmd),
                    None => break,
                },
                Some(tick) = self.ticks_rx.recv() => self.handle_tick(tick),
            }
        }

        tracing::info!(rooms = self.registry.len(), "room engine stopped");
    }

    fn handle_command(&mut self, cmd: EngineCommand) {
        match cmd {
            EngineCommand::Connect { conn, outbox } => {
                self.outboxes.insert(conn, outbox);
            }
            EngineCommand::Client { conn, event } => self.handle_event(conn, event),
            EngineCommand::Disconnect { conn } => self.handle_disconnect(conn),
            EngineCommand::RoomCount { reply } => {
                let _ = reply.send(self.registry.len());
            }
            EngineCommand::Snapshot { code, reply } => {
                let _ = reply.send(self.registry.get(&code).map(|room| room.snapshot()));
            }
        }
    }

    fn handle_event(&mut self, conn: ConnectionId, event: ClientEvent) {
        let result = match event {
            ClientEvent::CreateRoom => {
                self.create_room(conn);
                Ok(())
            }
            ClientEvent::JoinRoom(code) => {
                self.join_room(conn, code);
                Ok(())
            }
            ClientEvent::StartGame(code) => self.start_game(conn, &code),
            ClientEvent::PlayerReady { code, bet } => self.player_ready(conn, &code, bet),
            ClientEvent::LeaveRoom(code) => self.leave_room(conn, &code),
        };

        if let Err(err) = result {
            tracing::debug!(%conn, %err, "command ignored");
        }
    }

    fn create_room(&mut self, conn: ConnectionId) {
        self.leave_current_room(conn, None);
        let code = self.registry.create_room(conn);
        self.send_to(conn, ServerEvent::RoomCreated(code.clone()));
        self.broadcast_update(&code);
    }

    fn join_room(&mut self, conn: ConnectionId, code: RoomCode) {
        if self.is_member(conn, &code) {
            self.send_to(conn, ServerEvent::RoomJoined(code));
            return;
        }
        // A failed join keeps the current membership.
        if let Err(err) = self.registry.check_joinable(&code) {
            tracing::debug!(%conn, %err, "join refused");
            self.send_to(conn, ServerEvent::JoinError(err.join_reason()));
            return;
        }

        self.leave_current_room(conn, Some(&code));
        match self.registry.join_room(&code, conn) {
            Ok(_) => {
                self.send_to(conn, ServerEvent::RoomJoined(code.clone()));
                self.broadcast_update(&code);
            }
            Err(err) => self.send_to(conn, ServerEvent::JoinError(err.join_reason())),
        }
    }

    fn start_game(&mut self, conn: ConnectionId, code: &RoomCode) -> Result<(), RoomError> {
        self.require_member(conn, code)?;
        let period = self.registry.config().tick_interval;
        let ticks = self.ticks_tx.clone();
        let room = self
            .registry
            .get_mut(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;

        let timer_code = code.clone();
        room.start_betting(|generation| Countdown::spawn(timer_code, generation, period, ticks))?;
        tracing::info!(%code, round = room.round() + 1, started_by = %conn, "betting opened");

        let snapshot = room.snapshot();
        self.broadcast(code, ServerEvent::GameStarted(snapshot));
        Ok(())
    }

    fn player_ready(
        &mut self,
        conn: ConnectionId,
        code: &RoomCode,
        bet: BetSelection,
    ) -> Result<(), RoomError> {
        self.require_member(conn, code)?;
        let limits = self.registry.config().bet_limits;
        let room = self
            .registry
            .get_mut(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;

        match room.mark_ready(conn, bet, &limits) {
            Ok(all_ready) => {
                tracing::debug!(%code, player = %conn, all_ready, "bet placed");
                self.broadcast_update(code);
                if all_ready {
                    self.resolve_round(code);
                }
                Ok(())
            }
            Err(RoomError::InvalidBet(err)) => {
                tracing::debug!(%code, player = %conn, %err, "bet rejected");
                self.send_to(conn, ServerEvent::BetRejected(err.to_string()));
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    fn leave_room(&mut self, conn: ConnectionId, code: &RoomCode) -> Result<(), RoomError> {
        self.require_member(conn, code)?;
        let departure = self.registry.leave_room(code, conn)?;
        self.after_departure(code, departure);
        Ok(())
    }

    fn handle_disconnect(&mut self, conn: ConnectionId) {
        self.outboxes.remove(&conn);
        for code in self.registry.find_rooms_containing(conn) {
            match self.registry.leave_room(&code, conn) {
                Ok(departure) => self.after_departure(&code, departure),
                Err(err) => tracing::debug!(%conn, %err, "disconnect cleanup failed"),
            }
        }
        tracing::debug!(%conn, "connection released");
    }

    /// Leaves whatever room `conn` is in, except `keep`.
    fn leave_current_room(&mut self, conn: ConnectionId, keep: Option<&RoomCode>) {
        for code in self.registry.find_rooms_containing(conn) {
            if Some(&code) == keep {
                continue;
            }
            if let Ok(departure) = self.registry.leave_room(&code, conn) {
                self.after_departure(&code, departure);
            }
        }
    }

    /// Tells the remaining players and resolves the round if the one who
    /// left was the last player without a bet.
    fn after_departure(&mut self, code: &RoomCode, departure: Departure) {
        if departure == Departure::RoomDestroyed {
            return;
        }
        self.broadcast_update(code);

        let ready_to_roll = self
            .registry
            .get(code)
            .is_some_and(|room| room.state() == RoomState::Betting && room.all_ready());
        if ready_to_roll {
            self.resolve_round(code);
        }
    }

    fn handle_tick(&mut self, tick: TimerTick) {
        let Some(room) = self.registry.get_mut(&tick.code) else {
            tracing::debug!(code = %tick.code, "stale timer fire, room is gone");
            return;
        };

        match room.tick(tick.generation) {
            Ok(time_left) => {
                self.broadcast(&tick.code, ServerEvent::TimerUpdate(time_left));
                if time_left == 0 {
                    self.resolve_round(&tick.code);
                }
            }
            Err(err) => tracing::debug!(%err, generation = tick.generation, "tick dropped"),
        }
    }

    /// Rolls the round, broadcasts the shared outcome, and starts payouts.
    fn resolve_round(&mut self, code: &RoomCode) {
        let mode = self.registry.config().mode;
        let Some(room) = self.registry.get_mut(code) else {
            return;
        };
        let results = match room.roll(&mut self.source, mode) {
            Ok(results) => results,
            Err(err) => {
                tracing::debug!(%code, %err, "roll skipped");
                return;
            }
        };

        let snapshot = room.snapshot();
        let round = snapshot.round;
        let Some(outcome) = snapshot.outcome else {
            return;
        };
        tracing::info!(%code, round, %outcome, settled = results.len(), "dice rolled");

        self.broadcast(
            code,
            ServerEvent::DiceRolled {
                outcome,
                room: snapshot,
                results: results.clone(),
            },
        );
        self.spawn_payouts(round, outcome, results);
    }

    /// Sends winners with a wallet to the payout executor.
    ///
    /// Each transfer runs on its own task; the engine never waits on it.
    fn spawn_payouts(&self, round: u64, outcome: Outcome, results: Vec<PlayerResult>) {
        let mode = self.registry.config().mode;

        for result in results {
            let Some(wallet) = result.bet.wallet.clone() else {
                continue;
            };
            if result.total_return <= 0.0 {
                continue;
            }
            let conn = ConnectionId::new(result.player.0);
            let outbox = self.outboxes.get(&conn).cloned();

            let request = match PayoutRequest::authorize(&wallet, outcome, result.bet, mode, None)
            {
                Ok(request) => request,
                Err(err) => {
                    tracing::warn!(%conn, round, %err, "payout not authorized");
                    if let Some(outbox) = outbox {
                        let _ = outbox.send(ServerEvent::PayoutFailed {
                            round,
                            reason: err.to_string(),
                        });
                    }
                    continue;
                }
            };

            let executor = Arc::clone(&self.executor);
            tokio::spawn(async move {
                let event = match executor.execute(request).await {
                    Ok(receipt) => ServerEvent::PayoutSettled {
                        round,
                        reference: receipt.reference,
                        amount: receipt.amount,
                    },
                    Err(err) => {
                        tracing::warn!(%conn, round, %err, "payout failed");
                        ServerEvent::PayoutFailed {
                            round,
                            reason: err.to_string(),
                        }
                    }
                };
                if let Some(outbox) = outbox {
                    let _ = outbox.send(event);
                }
            });
        }
    }

    fn is_member(&self, conn: ConnectionId, code: &RoomCode) -> bool {
        self.registry
            .get(code)
            .is_some_and(|room| room.is_member(conn))
    }

    fn require_member(&self, conn: ConnectionId, code: &RoomCode) -> Result<(), RoomError> {
        match self.registry.get(code) {
            None => Err(RoomError::RoomNotFound(code.clone())),
            Some(room) if !room.is_member(conn) => Err(RoomError::NotInRoom(conn, code.clone())),
            Some(_) => Ok(()),
        }
    }

    fn broadcast_update(&self, code: &RoomCode) {
        if let Some(room) = self.registry.get(code) {
            self.broadcast(code, ServerEvent::RoomUpdate(room.snapshot()));
        }
    }

    /// Sends `event` to every member of the room, and nobody else.
    fn broadcast(&self, code: &RoomCode, event: ServerEvent) {
        let Some(room) = self.registry.get(code) else {
            return;
        };
        for player in room.players() {
            self.send_to(player.id, event.clone());
        }
    }

    fn send_to(&self, conn: ConnectionId, event: ServerEvent) {
        if let Some(outbox) = self.outboxes.get(&conn) {
            // A closed outbox means the handler is already tearing down.
            let _ = outbox.send(event);
        }
    }
}
