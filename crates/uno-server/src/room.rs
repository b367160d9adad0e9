//! Game room management.
//!
//! A room is one match's complete server-side state: the lobby roster and,
//! once started, the core `GameState`. The lobby/active split is the
//! `Option<GameState>`, so in-game state cannot exist before the deal.

use rand::Rng;
use thiserror::Error;
use uno_core::{GameAction, GameError, GameEvent, GameState};
use uuid::Uuid;

use crate::protocol::{PlayerSnapshot, RoomSnapshot};

/// Seat capacity of a room.
pub const MAX_PLAYERS: u8 = 10;

/// Minimum players required to start.
pub const MIN_PLAYERS: usize = 2;

#[derive(Debug, Error)]
pub enum RoomError {
    #[error("Room not found")]
    RoomNotFound,

    #[error("Room is full")]
    RoomFull,

    #[error("Game already started")]
    GameAlreadyStarted,

    #[error("Need at least two players to start")]
    NotEnoughPlayers,

    #[error("Only the admin can start the game")]
    NotAdmin,

    #[error("Game not started")]
    GameNotStarted,

    #[error("Player not in room")]
    PlayerNotInRoom,

    #[error("Not your turn")]
    NotYourTurn,

    #[error("Missing name")]
    MissingName,

    #[error(transparent)]
    Game(#[from] GameError),
}

impl RoomError {
    /// Machine-readable rejection kind surfaced on the wire.
    pub fn kind(&self) -> &'static str {
        match self {
            RoomError::RoomNotFound | RoomError::PlayerNotInRoom => "not_found",
            RoomError::NotAdmin | RoomError::NotYourTurn => "forbidden",
            RoomError::RoomFull
            | RoomError::GameAlreadyStarted
            | RoomError::NotEnoughPlayers
            | RoomError::GameNotStarted
            | RoomError::MissingName => "invalid_state",
            RoomError::Game(err) => match err {
                GameError::NotYourTurn | GameError::InvalidSeat => "forbidden",
                GameError::CardNotHeld | GameError::CardNotAllowed => "invalid_move",
                GameError::GameOver => "invalid_state",
                GameError::DeckExhausted => "internal",
            },
        }
    }
}

/// A player in a room. Exactly one player, the creator, is admin.
#[derive(Debug, Clone)]
pub struct RoomPlayer {
    pub id: Uuid,
    pub name: String,
    pub admin: bool,
}

/// Room lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoomStatus {
    Waiting,
    InGame,
    Finished,
}

/// A game room holding up to [`MAX_PLAYERS`] players.
pub struct GameRoom {
    pub id: String,
    pub count: u8,
    pub status: RoomStatus,
    /// Vec order is turn order; fixed once set, never reshuffled.
    pub players: Vec<RoomPlayer>,
    /// The match state, once started.
    pub game: Option<GameState>,
}

impl GameRoom {
    /// Create a room in the lobby state with its admin player. Returns the
    /// room and the admin's freshly assigned id.
    pub fn new(id: String, admin_name: String) -> (Self, Uuid) {
        let admin_id = Uuid::new_v4();
        let room = Self {
            id,
            count: MAX_PLAYERS,
            status: RoomStatus::Waiting,
            players: vec![RoomPlayer {
                id: admin_id,
                name: admin_name,
                admin: true,
            }],
            game: None,
        };
        (room, admin_id)
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.count as usize
    }

    /// Seat index of a player id.
    pub fn seat_of(&self, player_id: Uuid) -> Result<usize, RoomError> {
        self.players
            .iter()
            .position(|p| p.id == player_id)
            .ok_or(RoomError::PlayerNotInRoom)
    }

    /// Append a non-admin player while the room is still in the lobby.
    pub fn add_player(&mut self, name: String) -> Result<Uuid, RoomError> {
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.is_full() {
            return Err(RoomError::RoomFull);
        }

        let player_id = Uuid::new_v4();
        self.players.push(RoomPlayer {
            id: player_id,
            name,
            admin: false,
        });
        Ok(player_id)
    }

    /// Deal the match and flip the room to active. Admin only, two players
    /// minimum.
    pub fn start<R: Rng>(&mut self, requester_id: Uuid, rng: &mut R) -> Result<(), RoomError> {
        let requester = self
            .players
            .iter()
            .find(|p| p.id == requester_id)
            .ok_or(RoomError::PlayerNotInRoom)?;
        if !requester.admin {
            return Err(RoomError::NotAdmin);
        }
        if self.status != RoomStatus::Waiting {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.players.len() < MIN_PLAYERS {
            return Err(RoomError::NotEnoughPlayers);
        }

        self.game = Some(GameState::new(self.players.len(), rng)?);
        self.status = RoomStatus::InGame;
        Ok(())
    }

    /// Apply a game action for a seat. The room flips to finished when the
    /// action decides the match.
    pub fn apply_action<R: Rng>(
        &mut self,
        seat: usize,
        action: GameAction,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, RoomError> {
        let game = self.game.as_mut().ok_or(RoomError::GameNotStarted)?;
        let events = game.apply_action(seat, action, rng)?;
        if game.is_finished() {
            self.status = RoomStatus::Finished;
        }
        Ok(events)
    }

    /// Check that a claimed seat index really belongs to the given player.
    pub fn verify_seat(&self, seat: usize, player_id: Uuid) -> Result<(), RoomError> {
        match self.players.get(seat) {
            Some(player) if player.id == player_id => Ok(()),
            _ => Err(RoomError::NotYourTurn),
        }
    }

    /// Build the sanitized snapshot pushed to clients. Deck bookkeeping is
    /// dropped; hands are fully visible.
    pub fn snapshot(&self) -> RoomSnapshot {
        let game = self.game.as_ref();
        RoomSnapshot {
            id: self.id.clone(),
            count: self.count,
            playing: self.status == RoomStatus::InGame,
            players: self
                .players
                .iter()
                .enumerate()
                .map(|(seat, p)| PlayerSnapshot {
                    id: p.id,
                    name: p.name.clone(),
                    admin: p.admin,
                    cards: game.map(|g| g.hands[seat].clone()).unwrap_or_default(),
                })
                .collect(),
            discard_pile: game.map(|g| g.discard_pile),
            discard_color: game.and_then(|g| g.discard_color),
            current_move: game.map(|g| g.current_move).unwrap_or(0),
            is_reverse: game.map(|g| g.is_reverse).unwrap_or(false),
            draw_pile: game.map(|g| g.drew_this_turn).unwrap_or(false),
            draw_count: game.map(|g| g.draw_count).unwrap_or(0),
            yell_one: game.and_then(|g| g.yell_one),
            penalty: game.and_then(|g| g.pending_catch.map(|c| c.cards)),
            winner: game.and_then(|g| g.winner),
        }
    }
}
