//! Temperature Fan-Out
//!
//! The instrument reports every input's temperature in one flat vector. Each
//! of the up to eight input cards (A–H) contributes a configured number of
//! readings, in card order; [`demux`] splits the vector back per card.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::Index;

use crate::error::{CurveError, Result};

/// Number of card slots
pub const MAX_CARDS: usize = 8;

/// Inputs a single card can carry
pub const MAX_INPUTS_PER_CARD: usize = 4;

/// Input card slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardSlot {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
    H,
}

impl CardSlot {
    /// All slots in fan-out order
    pub const ALL: [CardSlot; MAX_CARDS] = [
        CardSlot::A,
        CardSlot::B,
        CardSlot::C,
        CardSlot::D,
        CardSlot::E,
        CardSlot::F,
        CardSlot::G,
        CardSlot::H,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn letter(self) -> char {
        (b'A' + self as u8) as char
    }
}

impl fmt::Display for CardSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// Per-card readings produced by [`demux`]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CardReadings {
    cards: [Vec<f64>; MAX_CARDS],
}

impl CardReadings {
    /// Readings for one card
    pub fn card(&self, slot: CardSlot) -> &[f64] {
        &self.cards[slot.index()]
    }

    /// Number of readings for one card
    pub fn len(&self, slot: CardSlot) -> usize {
        self.cards[slot.index()].len()
    }

    /// Total readings across all cards
    pub fn total(&self) -> usize {
        self.cards.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (CardSlot, &[f64])> {
        CardSlot::ALL
            .into_iter()
            .zip(self.cards.iter().map(Vec::as_slice))
    }
}

impl Index<CardSlot> for CardReadings {
    type Output = [f64];

    fn index(&self, slot: CardSlot) -> &[f64] {
        self.card(slot)
    }
}

/// Split `readings` across the eight card slots
///
/// Card `g` receives the next `counts[g]` readings in their original order.
/// The counts must add up to `readings.len()`. An empty `readings` means there
/// is nothing to extract yet and yields empty outputs whatever the counts
/// are. Counts above [`MAX_INPUTS_PER_CARD`] are a configuration error that is
/// checked before this runs.
pub fn demux(readings: &[f64], counts: &[u8; MAX_CARDS]) -> Result<CardReadings> {
    if readings.is_empty() {
        return Ok(CardReadings::default());
    }

    let expected: usize = counts.iter().map(|&c| usize::from(c)).sum();
    if expected != readings.len() {
        return Err(CurveError::CountMismatch {
            expected,
            actual: readings.len(),
        });
    }

    let mut out = CardReadings::default();
    let mut rest = readings;
    for (card, &count) in out.cards.iter_mut().zip(counts) {
        let (taken, remaining) = rest.split_at(usize::from(count));
        card.extend_from_slice(taken);
        rest = remaining;
    }

    Ok(out)
}
