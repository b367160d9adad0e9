//! Core match state machine.
//!
//! `GameState` is the authoritative in-memory model of one running match:
//! per-seat hands, the discard pile, the turn pointer, and the two penalty
//! counters. It exists only while a match is active; the lobby phase lives
//! in the room layer, which holds an `Option<GameState>`.

use crate::actions::{GameAction, GameEvent};
use crate::cards::{Card, CardId, Color};
use crate::deck::Deck;
use crate::rules::can_play;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Cards dealt to each seat at the start of a match.
pub const INITIAL_HAND_SIZE: usize = 7;

/// Catch penalty for discarding down to one card without yelling first.
pub const MISSED_YELL_PENALTY: u8 = 2;

/// Catch penalty for yelling at a mover who is not actually down to one card.
pub const FALSE_YELL_PENALTY: u8 = 4;

/// Attempts at drawing a non-wild opening card before giving up.
const OPENING_DRAW_ATTEMPTS: usize = 64;

/// Errors that can occur when applying actions.
#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("No such seat")]
    InvalidSeat,

    #[error("Player does not have this card")]
    CardNotHeld,

    #[error("Card not allowed")]
    CardNotAllowed,

    #[error("Game is over")]
    GameOver,

    #[error("Deck exhausted")]
    DeckExhausted,
}

/// A one-shot forced draw from the yell mechanic, owed by a specific seat
/// and consumed at that seat's next draw, pass, or discard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatchPenalty {
    pub target: usize,
    pub cards: u8,
}

/// The complete state of a running match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// One hand per seat, seat order = turn order.
    pub hands: Vec<Vec<CardId>>,
    /// Top of the discard pile.
    pub discard_pile: CardId,
    /// Color bound to the top card, set only when it is a wild.
    pub discard_color: Option<Color>,
    /// Seat that must act next.
    pub current_move: usize,
    /// Current traversal direction.
    pub is_reverse: bool,
    /// Whether the current seat already took its voluntary draw this turn.
    pub drew_this_turn: bool,
    /// Accumulated stacking draw-two/draw-four penalty.
    pub draw_count: u8,
    /// Seat that most recently yelled, cleared once the turn moves on.
    pub yell_one: Option<usize>,
    /// Pending catch penalty, if any.
    pub pending_catch: Option<CatchPenalty>,
    /// Winning seat, once a hand has emptied.
    pub winner: Option<usize>,
    /// Used-card tracking for the sampler.
    pub deck: Deck,
}

impl GameState {
    /// Deal a new match for `player_count` seats: a non-wild opening discard
    /// first (the whole deck is reset and redrawn while it comes up wild),
    /// then seven cards to each seat. An opening draw-two starts the match
    /// with a two-card penalty already owed.
    pub fn new<R: Rng>(player_count: usize, rng: &mut R) -> Result<Self, GameError> {
        debug_assert!((2..=10).contains(&player_count));

        let mut deck = Deck::new();
        let mut first = deck.take_card(rng, &[])?;
        let mut attempts = 0;
        while Card::get(first).is_some_and(|c| c.is_wild()) {
            attempts += 1;
            if attempts > OPENING_DRAW_ATTEMPTS {
                return Err(GameError::DeckExhausted);
            }
            deck.reset();
            first = deck.take_card(rng, &[])?;
        }

        let draw_count = if Card::get(first).is_some_and(|c| c.is_draw_two()) {
            2
        } else {
            0
        };

        let mut hands = vec![Vec::with_capacity(INITIAL_HAND_SIZE); player_count];
        for hand in &mut hands {
            for _ in 0..INITIAL_HAND_SIZE {
                hand.push(deck.take_card(rng, &[])?);
            }
        }

        Ok(Self {
            hands,
            discard_pile: first,
            discard_color: None,
            current_move: 0,
            is_reverse: false,
            drew_this_turn: false,
            draw_count,
            yell_one: None,
            pending_catch: None,
            winner: None,
            deck,
        })
    }

    /// Number of seats in the match.
    pub fn player_count(&self) -> usize {
        self.hands.len()
    }

    /// Whether a seat has already won.
    pub fn is_finished(&self) -> bool {
        self.winner.is_some()
    }

    /// Every card id currently in circulation: all hands plus the top of
    /// the discard pile. These survive a deck reshuffle.
    pub fn cards_in_play(&self) -> Vec<CardId> {
        let mut in_play: Vec<CardId> = self.hands.iter().flatten().copied().collect();
        in_play.push(self.discard_pile);
        in_play
    }

    /// Seat reached by moving `steps` seats from the current one in the
    /// active direction, wrapping around the table.
    pub fn advance(&self, steps: usize) -> usize {
        self.seat_after(steps, self.is_reverse)
    }

    fn seat_after(&self, steps: usize, reverse: bool) -> usize {
        let n = self.hands.len() as isize;
        let dir = if reverse { -1 } else { 1 };
        (self.current_move as isize + steps as isize * dir).rem_euclid(n) as usize
    }

    /// Sample `total` cards against a scratch copy of the deck, keeping
    /// `in_play` current so a mid-batch reshuffle cannot deal the same id
    /// twice. Returns the updated deck and the drawn ids; the caller commits
    /// both only once every fallible step of the action has succeeded, so a
    /// rejected action leaves the state untouched.
    fn sample_cards<R: Rng>(
        &self,
        rng: &mut R,
        total: u8,
        in_play: &mut Vec<CardId>,
    ) -> Result<(Deck, Vec<CardId>), GameError> {
        let mut deck = self.deck.clone();
        let mut drawn = Vec::with_capacity(total as usize);
        for _ in 0..total {
            let card = deck.take_card(rng, in_play)?;
            in_play.push(card);
            drawn.push(card);
        }
        Ok((deck, drawn))
    }

    /// Catch-penalty cards owed by `seat`, if any.
    fn pending_catch_for(&self, seat: usize) -> u8 {
        match self.pending_catch {
            Some(catch) if catch.target == seat => catch.cards,
            _ => 0,
        }
    }

    /// Apply an action taken by `seat`. On success the state is mutated and
    /// the resulting events are returned; on failure the state is untouched.
    pub fn apply_action<R: Rng>(
        &mut self,
        seat: usize,
        action: GameAction,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.winner.is_some() {
            return Err(GameError::GameOver);
        }
        if seat >= self.hands.len() {
            return Err(GameError::InvalidSeat);
        }

        match action {
            GameAction::Draw => self.apply_draw(seat, rng),
            GameAction::Discard { card, color } => self.apply_discard(seat, card, color, rng),
            GameAction::Pass => self.apply_pass(seat, rng),
            GameAction::Yell => Ok(self.apply_yell(seat)),
        }
    }

    fn apply_draw<R: Rng>(
        &mut self,
        seat: usize,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        if seat != self.current_move {
            return Err(GameError::NotYourTurn);
        }

        let mut events = Vec::new();
        let mut in_play = self.cards_in_play();
        let catch = self.pending_catch_for(seat);
        let total = self.draw_count + catch;

        if total > 0 {
            // A pending penalty is absorbed in full and the turn is lost.
            let (deck, drawn) = self.sample_cards(rng, total, &mut in_play)?;
            self.deck = deck;
            self.hands[seat].extend(drawn);
            if catch > 0 {
                self.pending_catch = None;
            }
            events.push(GameEvent::PenaltyDrawn { seat, count: total });

            self.current_move = self.advance(1);
            self.draw_count = 0;
            self.drew_this_turn = false;
            events.push(GameEvent::TurnChanged {
                seat: self.current_move,
            });
        } else {
            // Voluntary single draw; the seat keeps the turn.
            let (deck, drawn) = self.sample_cards(rng, 1, &mut in_play)?;
            let card = drawn[0];
            self.deck = deck;
            self.hands[seat].push(card);
            self.drew_this_turn = true;
            events.push(GameEvent::CardDrawn { seat, card });
        }

        self.yell_one = None;
        Ok(events)
    }

    fn apply_pass<R: Rng>(
        &mut self,
        seat: usize,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        if seat != self.current_move {
            return Err(GameError::NotYourTurn);
        }

        let mut events = Vec::new();
        let catch = self.pending_catch_for(seat);
        if catch > 0 {
            let mut in_play = self.cards_in_play();
            let (deck, drawn) = self.sample_cards(rng, catch, &mut in_play)?;
            self.deck = deck;
            self.hands[seat].extend(drawn);
            self.pending_catch = None;
            events.push(GameEvent::PenaltyDrawn { seat, count: catch });
        }

        // Passing walks away from a stacking penalty without absorbing it.
        self.current_move = self.advance(1);
        self.draw_count = 0;
        self.drew_this_turn = false;
        self.yell_one = None;
        events.push(GameEvent::TurnChanged {
            seat: self.current_move,
        });
        Ok(events)
    }

    fn apply_discard<R: Rng>(
        &mut self,
        seat: usize,
        card: CardId,
        color: Option<Color>,
        rng: &mut R,
    ) -> Result<Vec<GameEvent>, GameError> {
        if seat != self.current_move {
            return Err(GameError::NotYourTurn);
        }
        let position = self.hands[seat]
            .iter()
            .position(|&c| c == card)
            .ok_or(GameError::CardNotHeld)?;
        if !can_play(
            card,
            self.discard_pile,
            self.discard_color,
            self.draw_count,
            &self.hands[seat],
        ) {
            return Err(GameError::CardNotAllowed);
        }
        // can_play validated the id
        let played = *Card::get(card).ok_or(GameError::CardNotAllowed)?;

        let had_single_card = self.hands[seat].len() == 1;
        // The old top card stays protected from a reshuffle until this
        // action completes; the played card is the next top.
        let mut in_play = self.cards_in_play();

        // With exactly two players a reverse acts as a skip: two steps,
        // direction unchanged. Otherwise a reverse flips the direction
        // before the single step, landing on the previous seat.
        let two_players = self.hands.len() == 2;
        let steps = if (two_players && played.is_reverse()) || played.is_skip() {
            2
        } else {
            1
        };
        let new_reverse = if played.is_reverse() && !two_players {
            !self.is_reverse
        } else {
            self.is_reverse
        };
        let next = self.seat_after(steps, new_reverse);

        // The yell stands only when the mover called it on themselves.
        let standing_yell = self.yell_one.filter(|&y| y == seat);
        let remaining = self.hands[seat].len() - 1;
        let mut catch = self.pending_catch_for(seat);
        if standing_yell.is_none() && (remaining == 1 || had_single_card) {
            catch += MISSED_YELL_PENALTY;
        }

        // Sampling is the only fallible step; everything after this point
        // commits, so a rejected action leaves the state untouched.
        let mut events = Vec::new();
        let penalty_draw = if catch > 0 {
            Some(self.sample_cards(rng, catch, &mut in_play)?)
        } else {
            None
        };

        self.hands[seat].remove(position);
        if let Some((deck, drawn)) = penalty_draw {
            self.deck = deck;
            self.hands[seat].extend(drawn);
            events.push(GameEvent::PenaltyDrawn { seat, count: catch });
        }
        if self.pending_catch.is_some_and(|c| c.target == seat) {
            self.pending_catch = None;
        }
        self.is_reverse = new_reverse;

        if played.is_wild_draw_four() {
            self.draw_count += 4;
        } else if played.is_draw_two() {
            self.draw_count += 2;
        }

        self.current_move = next;
        self.discard_pile = card;
        self.discard_color = if played.is_wild() { color } else { None };
        self.drew_this_turn = false;
        self.yell_one = standing_yell;

        events.push(GameEvent::CardPlayed {
            seat,
            card,
            color: self.discard_color,
        });
        events.push(GameEvent::TurnChanged { seat: next });

        if self.hands[seat].is_empty() {
            self.winner = Some(seat);
            events.push(GameEvent::GameWon { seat });
        }
        Ok(events)
    }

    fn apply_yell(&mut self, caller: usize) -> Vec<GameEvent> {
        // A mover already down to one or two cards is safe to call out;
        // anything more and the accusation backfires on the caller. A yell
        // that does not backfire leaves an earlier caller's outstanding
        // debt in place; it is only consumed at its target's next turn.
        let backfired = self.hands[self.current_move].len() > 2;
        if backfired {
            let cards = FALSE_YELL_PENALTY + self.pending_catch_for(caller);
            self.pending_catch = Some(CatchPenalty {
                target: caller,
                cards,
            });
        }
        self.yell_one = Some(caller);
        vec![GameEvent::YellCalled { caller, backfired }]
    }
}
