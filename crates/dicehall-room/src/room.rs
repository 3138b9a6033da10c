//! One room's round state machine.
//!
//! ```text
//! Waiting ──start──▶ Betting ──timer at 0 / all ready──▶ Results
//!                       ▲                                   │
//!                       └───────────────start───────────────┘
//! ```
//!
//! A room never owns more than one [`Countdown`]. Starting a phase
//! replaces the old one, and leaving `Betting` cancels it.

use dicehall_dice::{BetLimits, GameMode, OutcomeSource, settle, validate_bet};
use dicehall_protocol::{
    BetSelection, Outcome, PlayerId, PlayerResult, PlayerSnapshot, RoomCode, RoomSnapshot,
};
use dicehall_transport::ConnectionId;

use crate::{Countdown, RoomConfig, RoomError, RoomState};

const DEFAULT_PLAYER_NAME: &str = "Player";

/// A member of a room.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: ConnectionId,
    pub name: String,
    ready: bool,
    bet: Option<BetSelection>,
}

impl Player {
    fn new(id: ConnectionId) -> Self {
        Self {
            id,
            name: DEFAULT_PLAYER_NAME.to_owned(),
            ready: false,
            bet: None,
        }
    }

    /// Submitted a bet during the current betting phase.
    pub fn is_ready(&self) -> bool {
        self.ready && self.bet.is_some()
    }

    /// The bet placed in the current betting phase.
    pub fn bet(&self) -> Option<&BetSelection> {
        self.bet.as_ref()
    }
}

/// A room and its current round.
#[derive(Debug)]
pub struct Room {
    code: RoomCode,
    /// Join order. The first player is the host.
    players: Vec<Player>,
    state: RoomState,
    time_left: u32,
    outcome: Option<Outcome>,
    round: u64,
    countdown: Option<Countdown>,
    next_generation: u64,
    capacity: usize,
    betting_window_secs: u32,
}

impl Room {
    /// Creates a waiting room with `host` as its only player.
    pub fn new(code: RoomCode, host: ConnectionId, config: &RoomConfig) -> Self {
        Self {
            code,
            players: vec![Player::new(host)],
            state: RoomState::Waiting,
            time_left: 0,
            outcome: None,
            round: 0,
            countdown: None,
            next_generation: 0,
            capacity: config.capacity,
            betting_window_secs: config.betting_window_secs,
        }
    }

    /// The six-digit code players join with.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Current phase of the round.
    pub fn state(&self) -> RoomState {
        self.state
    }

    /// Seconds left in the betting window; 0 outside betting.
    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    /// The last roll, if any round has resolved.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Rounds rolled so far.
    pub fn round(&self) -> u64 {
        self.round
    }

    /// Members in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    /// Number of members.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// `true` once the last member has left.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// `true` when no one else can join.
    pub fn is_full(&self) -> bool {
        self.players.len() >= self.capacity
    }

    /// The earliest member still present.
    pub fn host(&self) -> Option<ConnectionId> {
        self.players.first().map(|p| p.id)
    }

    /// Whether `conn` is in this room.
    pub fn is_member(&self, conn: ConnectionId) -> bool {
        self.players.iter().any(|p| p.id == conn)
    }

    /// Whether a betting countdown is running.
    pub fn has_countdown(&self) -> bool {
        self.countdown.is_some()
    }

    /// Appends a player. Fails without touching the room when full.
    pub fn add_player(&mut self, conn: ConnectionId) -> Result<(), RoomError> {
        if self.is_member(conn) {
            return Ok(());
        }
        if self.is_full() {
            return Err(RoomError::RoomFull(self.code.clone()));
        }
        self.players.push(Player::new(conn));
        Ok(())
    }

    /// Removes a player and returns it.
    pub fn remove_player(&mut self, conn: ConnectionId) -> Result<Player, RoomError> {
        let index = self
            .players
            .iter()
            .position(|p| p.id == conn)
            .ok_or_else(|| RoomError::NotInRoom(conn, self.code.clone()))?;
        Ok(self.players.remove(index))
    }

    /// Opens a betting phase.
    ///
    /// Every player's readiness and bet are cleared together, the time
    /// left is reset, and `spawn` is called with a fresh generation to
    /// start the countdown. Any previous countdown is cancelled first.
    /// Outside `Waiting` and `Results` this is a no-op error.
    pub fn start_betting(
        &mut self,
        spawn: impl FnOnce(u64) -> Countdown,
    ) -> Result<(), RoomError> {
        if !self.state.can_start() {
            return Err(RoomError::InvalidCommand(format!(
                "cannot start a round in room {} while {}",
                self.code, self.state
            )));
        }

        for player in &mut self.players {
            player.ready = false;
            player.bet = None;
        }
        self.state = RoomState::Betting;
        self.time_left = self.betting_window_secs;

        self.cancel_countdown();
        self.next_generation += 1;
        self.countdown = Some(spawn(self.next_generation));
        Ok(())
    }

    /// Records a player's bet for the current phase.
    ///
    /// Returns `true` when every player in the room is now ready.
    pub fn mark_ready(
        &mut self,
        conn: ConnectionId,
        bet: BetSelection,
        limits: &BetLimits,
    ) -> Result<bool, RoomError> {
        if !self.state.accepts_bets() {
            return Err(RoomError::InvalidCommand(format!(
                "room {} is not taking bets while {}",
                self.code, self.state
            )));
        }
        validate_bet(&bet, limits)?;

        let code = &self.code;
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == conn)
            .ok_or_else(|| RoomError::NotInRoom(conn, code.clone()))?;
        player.ready = true;
        player.bet = Some(bet);

        Ok(self.all_ready())
    }

    /// Every current player has a bet in for this phase.
    pub fn all_ready(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(Player::is_ready)
    }

    /// Applies one countdown tick and returns the seconds left.
    ///
    /// Ticks from a cancelled or replaced countdown are rejected with
    /// [`RoomError::StaleTimerFire`].
    pub fn tick(&mut self, generation: u64) -> Result<u32, RoomError> {
        let current = self.countdown.as_ref().map(Countdown::generation);
        if self.state != RoomState::Betting || current != Some(generation) {
            return Err(RoomError::StaleTimerFire(self.code.clone()));
        }
        self.time_left = self.time_left.saturating_sub(1);
        Ok(self.time_left)
    }

    /// Ends the betting phase: cancels the countdown, rolls once, and
    /// settles every ready player against that one outcome.
    ///
    /// Players without a bet this phase get no result.
    pub fn roll<S: OutcomeSource + ?Sized>(
        &mut self,
        source: &mut S,
        mode: GameMode,
    ) -> Result<Vec<PlayerResult>, RoomError> {
        if self.state != RoomState::Betting {
            return Err(RoomError::InvalidCommand(format!(
                "room {} has no betting phase to resolve",
                self.code
            )));
        }
        self.cancel_countdown();

        let outcome = source.roll();
        self.outcome = Some(outcome);
        self.round += 1;
        self.state = RoomState::Results;
        self.time_left = 0;

        let table = mode.table();
        let results = self
            .players
            .iter()
            .filter(|p| p.ready)
            .filter_map(|p| {
                let bet = p.bet.as_ref()?;
                let settlement = settle(bet, &outcome, table);
                Some(PlayerResult {
                    player: PlayerId::from(p.id),
                    bet: bet.clone(),
                    total_return: settlement.total_return,
                    net_winnings: settlement.net_winnings,
                    max_matches: settlement.max_matches,
                    jackpot: settlement.jackpot,
                })
            })
            .collect();
        Ok(results)
    }

    /// Drops the active countdown, if any.
    pub fn cancel_countdown(&mut self) {
        if let Some(countdown) = self.countdown.take() {
            countdown.cancel();
        }
    }

    /// The full room as sent to clients.
    pub fn snapshot(&self) -> RoomSnapshot {
        let host = self.host();
        RoomSnapshot {
            code: self.code.clone(),
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    id: PlayerId::from(p.id),
                    name: p.name.clone(),
                    ready: p.ready,
                    is_host: Some(p.id) == host,
                    bet_data: p.bet.clone(),
                })
                .collect(),
            capacity: self.capacity,
            state: self.state,
            time_left: self.time_left,
            outcome: self.outcome,
            round: self.round,
        }
    }
}
