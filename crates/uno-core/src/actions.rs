//! Game actions and resulting events.

use crate::cards::{CardId, Color};
use serde::{Deserialize, Serialize};

/// All actions a player can take during a match.
///
/// The seat taking the action is passed separately to
/// [`GameState::apply_action`](crate::game::GameState::apply_action); for
/// `Yell` that seat is the caller, who need not be the current mover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Take one card voluntarily, or absorb any pending penalty.
    Draw,

    /// Play a card from the hand. `color` binds the pile color when the
    /// card is a wild and is ignored otherwise.
    Discard { card: CardId, color: Option<Color> },

    /// Give up the turn without playing.
    Pass,

    /// Call out the current mover for being down to one card.
    Yell,
}

/// Events that occur as a result of actions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    /// A voluntary card was drawn; the seat keeps the turn.
    CardDrawn { seat: usize, card: CardId },

    /// A penalty batch was force-drawn.
    PenaltyDrawn { seat: usize, count: u8 },

    /// A card was played onto the discard pile.
    CardPlayed {
        seat: usize,
        card: CardId,
        color: Option<Color>,
    },

    /// Someone yelled. A backfired call means the mover was not actually
    /// down to one or two cards and the caller takes the penalty.
    YellCalled { caller: usize, backfired: bool },

    /// The active seat changed.
    TurnChanged { seat: usize },

    /// A seat emptied its hand and won the match.
    GameWon { seat: usize },
}
