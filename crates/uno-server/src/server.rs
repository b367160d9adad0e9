//! WebSocket server, room registry, and broadcast hub.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::room::{GameRoom, RoomError};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use rand::Rng;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uno_core::GameAction;
use uuid::Uuid;

/// Server state shared across all connections.
///
/// Rooms are keyed by their short code. The per-entry DashMap guard
/// serializes all actions against one room while distinct rooms proceed in
/// parallel; guards are always dropped before fan-out so broadcasting never
/// holds a room lock.
pub struct ServerState {
    /// All active rooms
    pub rooms: DashMap<String, GameRoom>,
    /// Per-room subscriber sets, keyed by connection id
    pub subscribers: DashMap<String, HashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>>,
    /// Mapping from connection id to its message sender
    pub senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
}

impl ServerState {
    pub fn new() -> Self {
        Self {
            rooms: DashMap::new(),
            subscribers: DashMap::new(),
            senders: DashMap::new(),
        }
    }

    /// Pick a 6-digit room code not currently in use.
    pub fn generate_room_code(&self) -> String {
        let mut rng = rand::thread_rng();
        loop {
            let code = rng.gen_range(100_000..=999_999u32).to_string();
            if !self.rooms.contains_key(&code) {
                return code;
            }
        }
    }

    /// Send a message to a specific connection.
    pub fn send_to_conn(&self, conn_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&conn_id) {
            let _ = sender.send(msg);
        }
    }

    /// Register a connection on a room's update channel.
    pub fn subscribe(&self, room_id: &str, conn_id: Uuid) {
        if let Some(sender) = self.senders.get(&conn_id) {
            self.subscribers
                .entry(room_id.to_string())
                .or_default()
                .insert(conn_id, sender.clone());
        }
    }

    /// Remove a connection from every room channel it subscribed to.
    pub fn unsubscribe_all(&self, conn_id: Uuid) {
        for mut entry in self.subscribers.iter_mut() {
            entry.value_mut().remove(&conn_id);
        }
    }

    /// Push the current sanitized snapshot to every subscriber of a room.
    /// Best-effort, at-most-once: a closed connection just misses the update.
    pub fn broadcast_room(&self, room_id: &str) {
        let snapshot = match self.rooms.get(room_id) {
            Some(room) => room.snapshot(),
            None => return,
        };
        if let Some(subs) = self.subscribers.get(room_id) {
            for sender in subs.values() {
                let _ = sender.send(ServerMessage::RoomUpdate {
                    room: snapshot.clone(),
                });
            }
        }
    }
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("UNO room server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let conn_id = Uuid::new_v4();

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.senders.insert(conn_id, tx);

    let welcome = serde_json::to_string(&ServerMessage::Welcome)?;
    ws_sender.send(Message::Text(welcome.into())).await?;

    // Forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) {
                    handle_message(conn_id, client_msg, &state);
                } else {
                    warn!("Invalid message from {}: {}", conn_id, text);
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", conn_id);
                break;
            }
            Ok(Message::Ping(_)) => {
                state.send_to_conn(conn_id, ServerMessage::Pong);
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", conn_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    state.unsubscribe_all(conn_id);
    state.senders.remove(&conn_id);
    send_task.abort();

    info!("Connection closed for {}", conn_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(conn_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::CreateRoom { name } => {
            if name.trim().is_empty() {
                send_error(state, conn_id, &RoomError::MissingName);
                return;
            }

            let room_id = state.generate_room_code();
            let (room, player_id) = GameRoom::new(room_id.clone(), name);
            state.rooms.insert(room_id.clone(), room);
            info!("Room {} created by {}", room_id, player_id);

            state.send_to_conn(conn_id, ServerMessage::RoomCreated { room_id, player_id });
        }

        ClientMessage::JoinRoom { room_id, name } => {
            if name.trim().is_empty() {
                send_error(state, conn_id, &RoomError::MissingName);
                return;
            }

            let result = match state.rooms.get_mut(&room_id) {
                Some(mut room) => room.add_player(name),
                None => Err(RoomError::RoomNotFound),
            };
            match result {
                Ok(player_id) => {
                    state.send_to_conn(conn_id, ServerMessage::Joined { player_id });
                    state.broadcast_room(&room_id);
                }
                Err(e) => send_error(state, conn_id, &e),
            }
        }

        ClientMessage::FetchRoom { room_id } => match state.rooms.get(&room_id) {
            Some(room) => {
                let room = room.snapshot();
                state.send_to_conn(conn_id, ServerMessage::Room { room });
            }
            None => send_error(state, conn_id, &RoomError::RoomNotFound),
        },

        ClientMessage::Subscribe { room_id } => match state.rooms.get(&room_id) {
            Some(room) => {
                let snapshot = room.snapshot();
                drop(room);
                state.subscribe(&room_id, conn_id);
                state.send_to_conn(conn_id, ServerMessage::RoomUpdate { room: snapshot });
            }
            None => send_error(state, conn_id, &RoomError::RoomNotFound),
        },

        ClientMessage::StartGame { room_id, player_id } => {
            let result = match state.rooms.get_mut(&room_id) {
                Some(mut room) => room.start(player_id, &mut rand::thread_rng()),
                None => Err(RoomError::RoomNotFound),
            };
            match result {
                Ok(()) => {
                    info!("Room {} started", room_id);
                    state.send_to_conn(conn_id, ServerMessage::Ok { events: vec![] });
                    state.broadcast_room(&room_id);
                }
                Err(e) => send_error(state, conn_id, &e),
            }
        }

        ClientMessage::Draw { room_id, player_id } => {
            apply_game_action(state, conn_id, &room_id, |room| {
                let seat = room.seat_of(player_id)?;
                room.apply_action(seat, GameAction::Draw, &mut rand::thread_rng())
            });
        }

        ClientMessage::Discard {
            room_id,
            player_id,
            card,
            color,
        } => {
            apply_game_action(state, conn_id, &room_id, |room| {
                let seat = room.seat_of(player_id)?;
                room.apply_action(
                    seat,
                    GameAction::Discard { card, color },
                    &mut rand::thread_rng(),
                )
            });
        }

        ClientMessage::Pass {
            room_id,
            player_index,
            player_id,
        } => {
            apply_game_action(state, conn_id, &room_id, |room| {
                room.verify_seat(player_index, player_id)?;
                room.apply_action(player_index, GameAction::Pass, &mut rand::thread_rng())
            });
        }

        ClientMessage::Yell {
            room_id,
            player_index,
        } => {
            apply_game_action(state, conn_id, &room_id, |room| {
                room.apply_action(player_index, GameAction::Yell, &mut rand::thread_rng())
            });
        }

        ClientMessage::Ping => {
            state.send_to_conn(conn_id, ServerMessage::Pong);
        }
    }
}

/// Run one mutation against a room: on success reply to the caller and fan
/// the new snapshot out; on rejection reply with the error and leave the
/// room untouched. The room guard is released before any send.
fn apply_game_action(
    state: &Arc<ServerState>,
    conn_id: Uuid,
    room_id: &str,
    f: impl FnOnce(&mut GameRoom) -> Result<Vec<uno_core::GameEvent>, RoomError>,
) {
    let result = match state.rooms.get_mut(room_id) {
        Some(mut room) => f(&mut room),
        None => Err(RoomError::RoomNotFound),
    };
    match result {
        Ok(events) => {
            state.send_to_conn(conn_id, ServerMessage::Ok { events });
            state.broadcast_room(room_id);
        }
        Err(e) => send_error(state, conn_id, &e),
    }
}

fn send_error(state: &Arc<ServerState>, conn_id: Uuid, err: &RoomError) {
    state.send_to_conn(
        conn_id,
        ServerMessage::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        },
    );
}
