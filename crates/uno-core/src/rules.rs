//! Play-legality rules.
//!
//! A single pure predicate deciding whether a candidate card may be thrown
//! on the current discard pile. No state is touched here; the game applies
//! the effects separately.

use crate::cards::{Card, CardId, Color, Special};

/// Decide whether `card` may be played on top of `pile`.
///
/// `bound_color` is the color chosen by whoever played the top card, set only
/// when that card is a wild. `draw_count` is the accumulated stacking
/// draw-two/draw-four penalty; while it is non-zero only a matching stacking
/// special may be thrown. `hand` is the full hand of the player throwing,
/// needed for the wild-draw-four color constraint.
///
/// Unknown card ids are never legal.
pub fn can_play(
    card: CardId,
    pile: CardId,
    bound_color: Option<Color>,
    draw_count: u8,
    hand: &[CardId],
) -> bool {
    let (card, pile) = match (Card::get(card), Card::get(pile)) {
        (Some(c), Some(p)) => (c, p),
        _ => return false,
    };

    if draw_count > 0 {
        // Only counter-stacking is allowed: draw-four on draw-four,
        // draw-two on draw-two. Everything else waits out the penalty.
        return (pile.is_wild_draw_four() && card.is_wild_draw_four())
            || (pile.is_draw_two() && card.is_draw_two());
    }

    if card.is_wild_draw_four() {
        // Legal only when the hand holds nothing of the pile's effective
        // color: the pile's own color, or the bound color on a wild pile.
        let effective = pile.color.or(bound_color);
        let holds_matching = match effective {
            Some(color) => hand
                .iter()
                .filter_map(|&id| Card::get(id))
                .any(|held| held.color == Some(color)),
            None => false,
        };
        return !holds_matching;
    }

    (card.number.is_some() && card.number == pile.number)
        || (card.color.is_some() && card.color == pile.color)
        || (pile.is_wild() && card.color.is_some() && card.color == bound_color)
        || (card.special != Special::None && card.special == pile.special)
        || card.special == Special::Wild
}
