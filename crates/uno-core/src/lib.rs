//! Core engine for a multiplayer UNO-style card game.
//!
//! This crate is the authoritative model of one match: the static card
//! catalog, the used-card sampler with its reshuffle rule, the play-legality
//! predicate, and the turn/penalty state machine. It performs no I/O and
//! knows nothing about rooms, players' identities, or transport; the server
//! crate maps opaque player ids onto seats and pushes snapshots to clients.
//!
//! # Modules
//!
//! - [`cards`]: the fixed 108-card catalog and lookup by id
//! - [`deck`]: used-card tracking and random sampling with reshuffle
//! - [`rules`]: the pure play-legality predicate
//! - [`game`]: match state and action application
//! - [`actions`]: the action/event vocabulary

pub mod actions;
pub mod cards;
pub mod deck;
pub mod game;
pub mod rules;

// Re-export commonly used types
pub use actions::{GameAction, GameEvent};
pub use cards::{catalog, Card, CardId, Color, Special, CARD_COUNT};
pub use deck::Deck;
pub use game::{CatchPenalty, GameError, GameState, FALSE_YELL_PENALTY, INITIAL_HAND_SIZE, MISSED_YELL_PENALTY};
pub use rules::can_play;
