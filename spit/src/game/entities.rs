use rand::{Rng, seq::SliceRandom};
use serde::{Deserialize, Deserializer, Serialize};
use std::{collections::VecDeque, fmt};
use thiserror::Error;

use super::constants::{self, DECK_SIZE, MAX_RANK, WRAPAROUND_DISTANCE};

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Spade, Suit::Heart, Suit::Club, Suit::Diamond];
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Placeholder for card ranks (ace=1u8 ... king=13u8).
pub type Value = u8;

/// A card is a tuple of a rank and a suit.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl Card {
    #[must_use]
    pub const fn rank(&self) -> Value {
        self.0
    }

    #[must_use]
    pub const fn suit(&self) -> Suit {
        self.1
    }

    /// Whether two cards differ in rank by one. Aces sit next to both twos
    /// and kings.
    #[must_use]
    pub fn is_adjacent(&self, other: &Card) -> bool {
        matches!(self.0.abs_diff(other.0), 1 | WRAPAROUND_DISTANCE)
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = match self.0 {
            1 => "A",
            11 => "J",
            12 => "Q",
            13 => "K",
            v => &v.to_string(),
        };
        let repr = format!("{value}/{}", self.1);
        write!(f, "{repr:>4}")
    }
}

/// Asking a deck for more cards than it holds. Layout refills never hit
/// this (they use [`Deck::deal_one`]); seeing it means the caller's card
/// accounting is off.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
#[error("can't deal {requested} card(s) from a deck with {remaining} left")]
pub struct DeckExhausted {
    pub requested: usize,
    pub remaining: usize,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Deck {
    cards: VecDeque<Card>,
}

impl Deck {
    /// Remove and return the top `n` cards.
    pub fn deal(&mut self, n: usize) -> Result<Vec<Card>, DeckExhausted> {
        if n > self.cards.len() {
            return Err(DeckExhausted {
                requested: n,
                remaining: self.cards.len(),
            });
        }
        Ok(self.cards.drain(..n).collect())
    }

    /// Remove and return the top card, if there is one.
    pub fn deal_one(&mut self) -> Option<Card> {
        self.cards.pop_front()
    }

    pub fn shuffle(&mut self) {
        self.shuffle_with(&mut rand::rng());
    }

    pub fn shuffle_with<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.make_contiguous().shuffle(rng);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.iter()
    }
}

impl Default for Deck {
    fn default() -> Self {
        let mut cards = VecDeque::with_capacity(DECK_SIZE);
        for suit in Suit::ALL {
            for value in 1..=MAX_RANK {
                cards.push_back(Card(value, suit));
            }
        }
        Self { cards }
    }
}

impl From<Vec<Card>> for Deck {
    fn from(value: Vec<Card>) -> Self {
        Self {
            cards: value.into(),
        }
    }
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Username(String);

impl Username {
    pub fn new(s: &str) -> Self {
        let mut username: String = s
            .trim()
            .chars()
            .map(|c| if c.is_whitespace() { '_' } else { c })
            .collect();
        if let Some((idx, _)) = username.char_indices().nth(constants::MAX_NAME_LENGTH) {
            username.truncate(idx);
        }
        Self(username)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de> Deserialize<'de> for Username {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::new(&s))
    }
}

impl From<String> for Username {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

/// Type alias for a player's position in the game. Seats index into the
/// player list and double as the pile a player flips onto.
pub type SeatIndex = usize;

/// A player's face-up row of card slots.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Layout(pub Vec<Option<Card>>);

impl Layout {
    #[must_use]
    pub fn get(&self, slot: usize) -> Option<Card> {
        self.0.get(slot).copied().flatten()
    }

    /// Number of slots still holding a card.
    #[must_use]
    pub fn count(&self) -> usize {
        self.0.iter().flatten().count()
    }

    /// Whether every slot is empty.
    #[must_use]
    pub fn is_cleared(&self) -> bool {
        self.0.iter().all(Option::is_none)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Occupied slots paired with their indices.
    pub fn cards(&self) -> impl Iterator<Item = (usize, Card)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(slot, card)| card.map(|card| (slot, card)))
    }
}

impl fmt::Display for Layout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = self
            .0
            .iter()
            .map(|card| match card {
                Some(card) => card.to_string(),
                None => "  --".to_string(),
            })
            .collect::<Vec<_>>()
            .join(" ");
        write!(f, "{repr}")
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Player {
    deck: Deck,
    layout: Layout,
}

impl Player {
    /// Create a player, dealing their layout off the top of their deck.
    pub fn new(mut deck: Deck, layout_size: usize) -> Result<Self, DeckExhausted> {
        let layout = deck.deal(layout_size)?.into_iter().map(Some).collect();
        Ok(Self {
            deck,
            layout: Layout(layout),
        })
    }

    #[must_use]
    pub fn from_parts(layout: Vec<Option<Card>>, deck: Deck) -> Self {
        Self {
            deck,
            layout: Layout(layout),
        }
    }

    /// Take the card at `slot` and refill the slot from the deck. The slot
    /// stays empty once the deck runs out.
    pub fn play_card(&mut self, slot: usize) -> Option<Card> {
        let entry = self.layout.0.get_mut(slot)?;
        let card = entry.take()?;
        *entry = self.deck.deal_one();
        Some(card)
    }

    pub fn deal_card(&mut self) -> Option<Card> {
        self.deck.deal_one()
    }

    #[must_use]
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    #[must_use]
    pub fn cards_left(&self) -> usize {
        self.deck.len()
    }

    /// Out of cards everywhere: nothing in the layout and nothing to draw.
    #[must_use]
    pub fn is_out(&self) -> bool {
        self.layout.is_cleared() && self.deck.is_empty()
    }
}

/// A request to move the card in `slot` of the sender's layout onto center
/// pile `pile`.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct PlayAction {
    pub slot: usize,
    pub pile: usize,
}

impl fmt::Display for PlayAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot {} onto pile {}", self.slot, self.pile)
    }
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OpponentView {
    pub seat: SeatIndex,
    pub layout: Layout,
    pub deck_size: usize,
}

/// The game as seen by one seat. Clients never mutate this; every update
/// replaces it wholesale.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClientView {
    pub seat: SeatIndex,
    pub layout: Layout,
    pub deck_size: usize,
    pub piles: Vec<Card>,
    pub opponents: Vec<OpponentView>,
}

impl ClientView {
    /// The first opponent. In a two-player game, the only one.
    #[must_use]
    pub fn opponent(&self) -> Option<&OpponentView> {
        self.opponents.first()
    }
}

impl fmt::Display for ClientView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for opponent in &self.opponents {
            writeln!(
                f,
                "seat {} [{:>2} left] {}",
                opponent.seat, opponent.deck_size, opponent.layout
            )?;
        }
        let piles = self
            .piles
            .iter()
            .map(Card::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        writeln!(f, "piles          {piles}")?;
        write!(f, "you    [{:>2} left] {}", self.deck_size, self.layout)
    }
}
