//! The static card catalog.
//!
//! A standard 108-card UNO deck, addressed by a 1-based `CardId`. Per color:
//! one 0, two each of 1-9, two skips, two reverses, two draw-twos (25 cards,
//! 100 total across the four colors), plus four wilds and four wild-draw-fours.
//! The catalog is built once at first use and never mutated; the same id is
//! shared by every physical copy in circulation, so uniqueness is tracked
//! per copy by the deck, not per id.

use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// 1-based index into the catalog.
pub type CardId = u16;

/// Number of cards in the catalog.
pub const CARD_COUNT: u16 = 108;

/// The four playable colors. Wilds have no intrinsic color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Red,
    Yellow,
    Green,
    Blue,
}

impl Color {
    pub const ALL: [Color; 4] = [Color::Red, Color::Yellow, Color::Green, Color::Blue];
}

/// Special effect carried by a card, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Special {
    None,
    Skip,
    Reverse,
    DrawTwo,
    Wild,
    WildDrawFour,
}

/// A single catalog entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub color: Option<Color>,
    pub number: Option<u8>,
    pub special: Special,
}

impl Card {
    /// Look up a catalog entry by id. Returns `None` for ids outside `1..=CARD_COUNT`.
    pub fn get(id: CardId) -> Option<&'static Card> {
        catalog().get(id.checked_sub(1)? as usize)
    }

    pub fn is_skip(&self) -> bool {
        self.special == Special::Skip
    }

    pub fn is_reverse(&self) -> bool {
        self.special == Special::Reverse
    }

    pub fn is_draw_two(&self) -> bool {
        self.special == Special::DrawTwo
    }

    /// True for both plain wilds and wild-draw-fours.
    pub fn is_wild(&self) -> bool {
        matches!(self.special, Special::Wild | Special::WildDrawFour)
    }

    pub fn is_wild_draw_four(&self) -> bool {
        self.special == Special::WildDrawFour
    }
}

/// The full catalog, built on first access.
pub fn catalog() -> &'static [Card] {
    static CATALOG: OnceLock<Vec<Card>> = OnceLock::new();
    CATALOG.get_or_init(build_catalog)
}

fn build_catalog() -> Vec<Card> {
    let mut cards = Vec::with_capacity(CARD_COUNT as usize);
    let mut push = |color: Option<Color>, number: Option<u8>, special: Special| {
        let id = cards.len() as CardId + 1;
        cards.push(Card {
            id,
            color,
            number,
            special,
        });
    };

    for color in Color::ALL {
        push(Some(color), Some(0), Special::None);
        for number in 1..=9 {
            push(Some(color), Some(number), Special::None);
            push(Some(color), Some(number), Special::None);
        }
        for special in [Special::Skip, Special::Reverse, Special::DrawTwo] {
            push(Some(color), None, special);
            push(Some(color), None, special);
        }
    }
    for _ in 0..4 {
        push(None, None, Special::Wild);
    }
    for _ in 0..4 {
        push(None, None, Special::WildDrawFour);
    }

    debug_assert_eq!(cards.len(), CARD_COUNT as usize);
    cards
}
