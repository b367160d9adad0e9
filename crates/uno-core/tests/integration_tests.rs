//! Integration tests for the UNO game engine.
//!
//! These tests drive whole matches through the public action surface and
//! check the properties the engine guarantees between accepted actions.

use rand::rngs::ThreadRng;
use uno_core::*;

/// Every card in circulation must be tracked as used by the deck, and no id
/// may be in circulation twice.
fn assert_consistent(game: &GameState) {
    let in_play = game.cards_in_play();
    let mut seen = Vec::with_capacity(in_play.len());
    for &id in &in_play {
        assert!(
            Card::get(id).is_some(),
            "unknown id {} in circulation",
            id
        );
        assert!(
            game.deck.is_used(id),
            "id {} in circulation but not marked used",
            id
        );
        assert!(!seen.contains(&id), "id {} in circulation twice", id);
        seen.push(id);
    }
}

/// First card in the current seat's hand that the validator accepts.
fn find_playable(game: &GameState) -> Option<CardId> {
    let seat = game.current_move;
    game.hands[seat]
        .iter()
        .copied()
        .find(|&card| {
            can_play(
                card,
                game.discard_pile,
                game.discard_color,
                game.draw_count,
                &game.hands[seat],
            )
        })
}

/// Take one sensible action for the current seat, the way a simple client
/// would: absorb penalties, play when possible, otherwise draw then pass.
fn step(game: &mut GameState, rng: &mut ThreadRng) {
    let seat = game.current_move;

    if let Some(card) = find_playable(game) {
        // Yell before going down to one card so the match can actually end.
        if game.hands[seat].len() <= 2 && game.yell_one != Some(seat) {
            game.apply_action(seat, GameAction::Yell, rng).unwrap();
        }
        let color = Card::get(card)
            .unwrap()
            .is_wild()
            .then_some(Color::Red);
        game.apply_action(seat, GameAction::Discard { card, color }, rng)
            .unwrap();
    } else if game.draw_count > 0 || !game.drew_this_turn {
        game.apply_action(seat, GameAction::Draw, rng).unwrap();
    } else {
        game.apply_action(seat, GameAction::Pass, rng).unwrap();
    }
}

#[test]
fn test_full_match_stays_consistent() {
    let mut rng = rand::thread_rng();
    for &players in &[2, 3, 4] {
        let mut game = GameState::new(players, &mut rng).unwrap();
        assert_consistent(&game);

        for _ in 0..2000 {
            // Stop short of pinning the whole catalog in hands; a real match
            // rarely gets close, but random play can.
            if game.is_finished() || game.cards_in_play().len() > 90 {
                break;
            }
            step(&mut game, &mut rng);
            assert_consistent(&game);
        }

        if let Some(winner) = game.winner {
            assert!(game.hands[winner].is_empty());
        }
    }
}

#[test]
fn test_plain_number_advances_one_seat() {
    let mut rng = rand::thread_rng();
    let mut game = GameState::new(4, &mut rng).unwrap();
    game.discard_pile = find_card(|c| c.color == Some(Color::Red) && c.number == Some(5));
    game.discard_color = None;
    game.draw_count = 0;

    let card = find_card(|c| c.color == Some(Color::Red) && c.number == Some(8));
    game.hands[0] = vec![card, filler(0), filler(1)];

    game.apply_action(0, GameAction::Discard { card, color: None }, &mut rng)
        .unwrap();
    assert_eq!(game.current_move, 1);
}

#[test]
fn test_skip_advances_two_seats() {
    let mut rng = rand::thread_rng();
    let mut game = GameState::new(4, &mut rng).unwrap();
    game.discard_pile = find_card(|c| c.color == Some(Color::Red) && c.number == Some(5));
    game.discard_color = None;
    game.draw_count = 0;

    let card = find_card(|c| c.color == Some(Color::Red) && c.special == Special::Skip);
    game.hands[0] = vec![card, filler(0), filler(1)];

    game.apply_action(0, GameAction::Discard { card, color: None }, &mut rng)
        .unwrap();
    assert_eq!(game.current_move, 2);
}

#[test]
fn test_two_player_reverse_round_trip() {
    let mut rng = rand::thread_rng();
    let mut game = GameState::new(2, &mut rng).unwrap();
    game.discard_pile = find_card(|c| c.color == Some(Color::Red) && c.number == Some(5));
    game.discard_color = None;
    game.draw_count = 0;

    let reverse = find_card(|c| c.color == Some(Color::Red) && c.special == Special::Reverse);
    game.hands[0] = vec![reverse, filler(0), filler(1)];

    game.apply_action(
        0,
        GameAction::Discard {
            card: reverse,
            color: None,
        },
        &mut rng,
    )
    .unwrap();

    // Heads-up, a reverse is a skip: direction unchanged and seat 0 moves
    // again without seat 1 ever acting.
    assert!(!game.is_reverse);
    assert_eq!(game.current_move, 0);
}

#[test]
fn test_stacking_draw_two_chain() {
    let mut rng = rand::thread_rng();
    let mut game = GameState::new(3, &mut rng).unwrap();

    // Seat 0 just played a draw-two.
    let d2_red = find_card(|c| c.color == Some(Color::Red) && c.special == Special::DrawTwo);
    let d2_blue = find_card(|c| c.color == Some(Color::Blue) && c.special == Special::DrawTwo);
    game.discard_pile = d2_red;
    game.discard_color = None;
    game.draw_count = 2;
    game.current_move = 1;
    game.hands[1] = vec![d2_blue, filler(0), filler(1)];

    // Seat 1 counter-stacks: legal, and the pot grows to 4.
    game.apply_action(
        1,
        GameAction::Discard {
            card: d2_blue,
            color: None,
        },
        &mut rng,
    )
    .unwrap();
    assert_eq!(game.draw_count, 4);
    assert_eq!(game.current_move, 2);

    // Seat 2 cannot counter-stack: any ordinary card is rejected, and a
    // draw absorbs all four cards and forfeits the turn.
    let ordinary = game.hands[2]
        .iter()
        .copied()
        .find(|&c| !Card::get(c).unwrap().is_draw_two())
        .unwrap();
    assert!(matches!(
        game.apply_action(
            2,
            GameAction::Discard {
                card: ordinary,
                color: None
            },
            &mut rng
        ),
        Err(GameError::CardNotAllowed)
    ));

    let before = game.hands[2].len();
    game.apply_action(2, GameAction::Draw, &mut rng).unwrap();
    assert_eq!(game.hands[2].len(), before + 4);
    assert_eq!(game.draw_count, 0);
    assert_eq!(game.current_move, 0);
}

#[test]
fn test_missed_yell_catch_penalty() {
    let mut rng = rand::thread_rng();
    let mut game = GameState::new(3, &mut rng).unwrap();
    game.discard_pile = find_card(|c| c.color == Some(Color::Red) && c.number == Some(5));
    game.discard_color = None;
    game.draw_count = 0;
    game.yell_one = None;

    let card = find_card(|c| c.color == Some(Color::Red) && c.number == Some(8));
    game.hands[0] = vec![card, filler(0)];

    game.apply_action(0, GameAction::Discard { card, color: None }, &mut rng)
        .unwrap();

    // Nobody yelled: the two-card catch penalty lands immediately, leaving
    // seat 0 with three cards instead of one.
    assert_eq!(game.hands[0].len(), 1 + MISSED_YELL_PENALTY as usize);
    assert!(game.winner.is_none());
}

#[test]
fn test_false_accusation_penalizes_the_caller() {
    let mut rng = rand::thread_rng();
    let mut game = GameState::new(4, &mut rng).unwrap();
    // The mover holds three cards, so the call is false.
    game.hands[game.current_move] = vec![filler(0), filler(1), filler(2)];

    game.apply_action(3, GameAction::Yell, &mut rng).unwrap();
    assert_eq!(
        game.pending_catch,
        Some(CatchPenalty {
            target: 3,
            cards: FALSE_YELL_PENALTY
        })
    );

    // The mover plays on unaffected; the caller absorbs the four cards at
    // their own next turn.
    let mover = game.current_move;
    game.apply_action(mover, GameAction::Draw, &mut rng).unwrap();
    assert_eq!(
        game.pending_catch,
        Some(CatchPenalty {
            target: 3,
            cards: FALSE_YELL_PENALTY
        })
    );

    game.current_move = 3;
    let before = game.hands[3].len();
    game.apply_action(3, GameAction::Draw, &mut rng).unwrap();
    assert_eq!(game.hands[3].len(), before + FALSE_YELL_PENALTY as usize);
    assert!(game.pending_catch.is_none());
}

fn find_card(pred: impl Fn(&Card) -> bool) -> CardId {
    catalog().iter().find(|c| pred(c)).unwrap().id
}

/// Distinct green number cards used to pad hands in scenarios.
fn filler(nth: usize) -> CardId {
    catalog()
        .iter()
        .filter(|c| c.color == Some(Color::Green) && c.number.is_some())
        .nth(nth)
        .unwrap()
        .id
}
