//! Room registry: creates, finds, and destroys rooms.

use std::collections::HashMap;

use dicehall_protocol::{RoomCode, RoomSnapshot};
use dicehall_transport::ConnectionId;
use rand::Rng;

use crate::{Room, RoomConfig, RoomError};

/// Smallest and largest six-digit room codes.
const CODE_RANGE: std::ops::RangeInclusive<u32> = 100_000..=999_999;

/// What happened to a room after a player left it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Departure {
    /// The room still has players.
    Left,
    /// The last player left and the room is gone.
    RoomDestroyed,
}

/// Every live room, keyed by code.
///
/// Owned by the engine task; nothing else holds a room.
#[derive(Debug)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    config: RoomConfig,
}

impl RoomRegistry {
    /// An empty registry whose rooms all use `config`.
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            config,
        }
    }

    /// Settings applied to every room.
    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a waiting room hosted by `host` under a fresh code.
    pub fn create_room(&mut self, host: ConnectionId) -> RoomCode {
        let code = self.fresh_code();
        let room = Room::new(code.clone(), host, &self.config);
        self.rooms.insert(code.clone(), room);
        tracing::info!(%code, %host, "room created");
        code
    }

    /// Random code not used by any live room.
    fn fresh_code(&self) -> RoomCode {
        let mut rng = rand::rng();
        loop {
            let code = RoomCode::from_number(rng.random_range(CODE_RANGE));
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    /// Checks that `code` exists and has a free seat, without joining.
    pub fn check_joinable(&self, code: &RoomCode) -> Result<(), RoomError> {
        let room = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        if room.is_full() {
            return Err(RoomError::RoomFull(code.clone()));
        }
        Ok(())
    }

    /// Adds `conn` to the room and returns the updated snapshot.
    pub fn join_room(
        &mut self,
        code: &RoomCode,
        conn: ConnectionId,
    ) -> Result<RoomSnapshot, RoomError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        room.add_player(conn)?;
        tracing::info!(%code, player = %conn, players = room.len(), "player joined");
        Ok(room.snapshot())
    }

    /// Removes `conn` from the room, destroying the room when it empties.
    ///
    /// Destruction cancels the room's countdown.
    pub fn leave_room(
        &mut self,
        code: &RoomCode,
        conn: ConnectionId,
    ) -> Result<Departure, RoomError> {
        let room = self
            .rooms
            .get_mut(code)
            .ok_or_else(|| RoomError::RoomNotFound(code.clone()))?;
        room.remove_player(conn)?;
        tracing::info!(%code, player = %conn, players = room.len(), "player left");

        if !room.is_empty() {
            return Ok(Departure::Left);
        }
        if let Some(mut room) = self.rooms.remove(code) {
            room.cancel_countdown();
        }
        tracing::info!(%code, "room destroyed");
        Ok(Departure::RoomDestroyed)
    }

    /// Codes of every room `conn` is in. At most one in practice.
    pub fn find_rooms_containing(&self, conn: ConnectionId) -> Vec<RoomCode> {
        self.rooms
            .values()
            .filter(|room| room.is_member(conn))
            .map(|room| room.code().clone())
            .collect()
    }

    /// Looks up a live room.
    pub fn get(&self, code: &RoomCode) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Looks up a live room for mutation.
    pub fn get_mut(&mut self, code: &RoomCode) -> Option<&mut Room> {
        self.rooms.get_mut(code)
    }

    /// Number of live rooms.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// `true` when no room is live.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}
