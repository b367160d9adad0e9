//! Websocket protocol messages for the UNO room server.

use serde::{Deserialize, Serialize};
use uno_core::{CardId, Color, GameEvent};
use uuid::Uuid;

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Create a new room; the caller becomes its admin
    CreateRoom { name: String },

    /// Join an existing room while it is still in the lobby
    JoinRoom { room_id: String, name: String },

    /// Fetch the current room snapshot once
    FetchRoom { room_id: String },

    /// Subscribe this connection to a room's update channel
    Subscribe { room_id: String },

    /// Start the game (admin only)
    StartGame { room_id: String, player_id: Uuid },

    /// Draw a card, or absorb any pending penalty
    Draw { room_id: String, player_id: Uuid },

    /// Play a card; `color` binds the pile color for wilds
    Discard {
        room_id: String,
        player_id: Uuid,
        card: CardId,
        color: Option<Color>,
    },

    /// Give up the turn
    Pass {
        room_id: String,
        player_index: usize,
        player_id: Uuid,
    },

    /// Call out the current mover for being down to one card
    Yell { room_id: String, player_index: usize },

    /// Ping for keepalive
    Ping,
}

/// Messages sent from server to client.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Sent once when the connection is established
    Welcome,

    /// Room created successfully
    RoomCreated { room_id: String, player_id: Uuid },

    /// Joined a room successfully
    Joined { player_id: Uuid },

    /// One-shot room snapshot in reply to a fetch
    Room { room: RoomSnapshot },

    /// Pushed to every subscriber after each accepted mutation, and once
    /// immediately upon subscribing
    #[serde(rename = "room:update")]
    RoomUpdate { room: RoomSnapshot },

    /// Action accepted
    Ok { events: Vec<GameEvent> },

    /// Action rejected; `kind` is one of `not_found`, `forbidden`,
    /// `invalid_state`, `invalid_move`, `internal`
    Error { kind: String, message: String },

    /// Pong response
    Pong,
}

/// Sanitized room state pushed to clients. Internal deck bookkeeping is
/// dropped; all hands are fully visible by design.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: String,
    pub count: u8,
    pub playing: bool,
    pub players: Vec<PlayerSnapshot>,
    pub discard_pile: Option<CardId>,
    pub discard_color: Option<Color>,
    pub current_move: usize,
    pub is_reverse: bool,
    /// Whether the current player already took their voluntary draw
    pub draw_pile: bool,
    pub draw_count: u8,
    pub yell_one: Option<usize>,
    /// Pending catch-penalty card count (original wire name kept)
    #[serde(rename = "pennalty")]
    pub penalty: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<usize>,
}

/// One player inside a room snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub id: Uuid,
    pub name: String,
    pub admin: bool,
    pub cards: Vec<CardId>,
}
