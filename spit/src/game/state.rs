//! Authoritative rules state for one game of Spit.
//!
//! Everything here is plain data manipulation. The session layer decides
//! *when* to call [`GameState::play`] or [`GameState::flip`]; this module
//! only decides whether the call is legal and what it changes.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use super::constants::{
    DECK_SIZE, DEFAULT_LAYOUT_SIZE, DEFAULT_NUM_GAME_PILES, DEFAULT_NUM_PLAYERS, MAX_PLAYERS,
};
use super::entities::{
    Card, ClientView, Deck, DeckExhausted, Layout, OpponentView, Player, SeatIndex,
};

/// Reasons a play is refused. None of these mutate the game.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Error, PartialEq, Serialize)]
pub enum PlayError {
    #[error("game is already over")]
    GameOver,
    #[error("seat {0} does not exist")]
    InvalidSeat(SeatIndex),
    #[error("layout slot {0} does not exist")]
    InvalidSlot(usize),
    #[error("pile {0} does not exist")]
    InvalidPile(usize),
    #[error("layout slot {0} is empty")]
    EmptySlot(usize),
    #[error("{card} can't go on {pile}")]
    NotAdjacent { card: Card, pile: Card },
}

#[derive(Debug, Error, Eq, PartialEq)]
pub enum SettingsError {
    #[error("need between 2 and {MAX_PLAYERS} players, got {0}")]
    PlayerCount(usize),
    #[error("need at least one center pile per player ({players}), got {piles}")]
    PileCount { piles: usize, players: usize },
    #[error("layout size must be at least 1")]
    LayoutSize,
    #[error("a deck can't cover a layout of {layout_size} plus {piles_per_player} pile card(s)")]
    NotEnoughCards {
        layout_size: usize,
        piles_per_player: usize,
    },
}

/// Reasons a game can't be dealt.
#[derive(Debug, Error, Eq, PartialEq)]
pub enum DealError {
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Deck(#[from] DeckExhausted),
    #[error("no decks to deal from")]
    NoPlayers,
}

/// Game configuration settings
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct GameSettings {
    pub num_players: usize,
    pub num_game_piles: usize,
    pub layout_size: usize,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::new(DEFAULT_NUM_PLAYERS, DEFAULT_NUM_GAME_PILES, DEFAULT_LAYOUT_SIZE)
    }
}

impl GameSettings {
    #[must_use]
    pub const fn new(num_players: usize, num_game_piles: usize, layout_size: usize) -> Self {
        Self {
            num_players,
            num_game_piles,
            layout_size,
        }
    }

    /// Check that a game with these settings can be dealt and that every
    /// seat has its own pile to flip onto.
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(2..=MAX_PLAYERS).contains(&self.num_players) {
            return Err(SettingsError::PlayerCount(self.num_players));
        }
        if self.num_game_piles < self.num_players {
            return Err(SettingsError::PileCount {
                piles: self.num_game_piles,
                players: self.num_players,
            });
        }
        if self.layout_size == 0 {
            return Err(SettingsError::LayoutSize);
        }
        let piles_per_player = self.num_game_piles.div_ceil(self.num_players);
        if self.layout_size + piles_per_player > DECK_SIZE {
            return Err(SettingsError::NotEnoughCards {
                layout_size: self.layout_size,
                piles_per_player,
            });
        }
        Ok(())
    }
}

/// How a finished game ended.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GameOutcome {
    Winner(SeatIndex),
    Draw,
}

impl fmt::Display for GameOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Winner(seat) => write!(f, "seat {seat} won"),
            Self::Draw => write!(f, "draw"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GameState {
    players: Vec<Player>,
    piles: Vec<Card>,
}

impl GameState {
    /// Deal a fresh game: every player gets their own shuffled deck.
    pub fn new(settings: &GameSettings) -> Result<Self, DealError> {
        settings.validate()?;
        let decks = (0..settings.num_players)
            .map(|_| {
                let mut deck = Deck::default();
                deck.shuffle();
                deck
            })
            .collect();
        Self::with_decks(decks, settings.num_game_piles, settings.layout_size)
    }

    /// Deal a game from the given decks without shuffling them. Layouts come
    /// off the top first, then pile `i` takes a card from player
    /// `i % players`.
    pub fn with_decks(
        decks: Vec<Deck>,
        num_game_piles: usize,
        layout_size: usize,
    ) -> Result<Self, DealError> {
        if decks.is_empty() {
            return Err(DealError::NoPlayers);
        }
        let mut players = decks
            .into_iter()
            .map(|deck| Player::new(deck, layout_size))
            .collect::<Result<Vec<_>, _>>()?;
        let num_players = players.len();
        let mut piles = Vec::with_capacity(num_game_piles);
        for i in 0..num_game_piles {
            let player = &mut players[i % num_players];
            let remaining = player.cards_left();
            let card = player.deal_card().ok_or(DeckExhausted {
                requested: 1,
                remaining,
            })?;
            piles.push(card);
        }
        Ok(Self { players, piles })
    }

    /// Assemble a game from explicit parts. Used to replay or stage
    /// specific positions.
    #[must_use]
    pub fn from_parts(players: Vec<Player>, piles: Vec<Card>) -> Self {
        Self { players, piles }
    }

    #[must_use]
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    #[must_use]
    pub fn piles(&self) -> &[Card] {
        &self.piles
    }

    #[must_use]
    pub fn num_players(&self) -> usize {
        self.players.len()
    }

    fn check_play(&self, seat: SeatIndex, slot: usize, pile: usize) -> Result<Card, PlayError> {
        if self.game_over().is_some() {
            return Err(PlayError::GameOver);
        }
        let player = self.players.get(seat).ok_or(PlayError::InvalidSeat(seat))?;
        if slot >= player.layout().len() {
            return Err(PlayError::InvalidSlot(slot));
        }
        let top = *self.piles.get(pile).ok_or(PlayError::InvalidPile(pile))?;
        let card = player.layout().get(slot).ok_or(PlayError::EmptySlot(slot))?;
        if card.is_adjacent(&top) {
            Ok(card)
        } else {
            Err(PlayError::NotAdjacent { card, pile: top })
        }
    }

    #[must_use]
    pub fn is_legal(&self, seat: SeatIndex, slot: usize, pile: usize) -> bool {
        self.check_play(seat, slot, pile).is_ok()
    }

    /// Move the card in `seat`'s `slot` onto `pile`, refilling the slot from
    /// that player's deck. Returns the card that was played.
    pub fn play(&mut self, seat: SeatIndex, slot: usize, pile: usize) -> Result<Card, PlayError> {
        self.check_play(seat, slot, pile)?;
        let card = self.players[seat]
            .play_card(slot)
            .ok_or(PlayError::EmptySlot(slot))?;
        self.piles[pile] = card;
        Ok(card)
    }

    /// Whether any card in any layout can go on any pile.
    #[must_use]
    pub fn moves_available(&self) -> bool {
        self.players.iter().any(|player| {
            player
                .layout()
                .cards()
                .any(|(_, card)| self.piles.iter().any(|top| card.is_adjacent(top)))
        })
    }

    /// Deal one card from every player that still has a deck onto their
    /// own pile. Only happens when nobody can move and the game isn't over;
    /// otherwise nothing changes. Returns the seats that flipped.
    pub fn flip(&mut self) -> Vec<SeatIndex> {
        if self.moves_available() || self.game_over().is_some() {
            return Vec::new();
        }
        let mut flipped = Vec::with_capacity(self.players.len());
        for (seat, player) in self.players.iter_mut().enumerate() {
            let Some(pile) = self.piles.get_mut(seat) else {
                continue;
            };
            if let Some(card) = player.deal_card() {
                *pile = card;
                flipped.push(seat);
            }
        }
        flipped
    }

    /// `None` while the game is still going.
    ///
    /// A player who has run out of cards entirely wins outright. Failing
    /// that, a game that is stuck (no moves, nothing left to flip) is a draw
    /// when everyone holds the same number of cards, and otherwise goes to
    /// the player holding the fewest.
    #[must_use]
    pub fn game_over(&self) -> Option<GameOutcome> {
        if let Some(seat) = self.players.iter().position(Player::is_out) {
            return Some(GameOutcome::Winner(seat));
        }
        let decks_empty = self.players.iter().all(|p| p.cards_left() == 0);
        if !decks_empty || self.moves_available() {
            return None;
        }
        let counts: Vec<usize> = self.players.iter().map(|p| p.layout().count()).collect();
        let fewest = counts.iter().copied().min()?;
        if counts.iter().all(|&count| count == fewest) {
            Some(GameOutcome::Draw)
        } else {
            counts
                .iter()
                .position(|&count| count == fewest)
                .map(GameOutcome::Winner)
        }
    }

    /// Project the game for one seat.
    #[must_use]
    pub fn view_for(&self, seat: SeatIndex) -> ClientView {
        let (layout, deck_size) = self
            .players
            .get(seat)
            .map(|p| (p.layout().clone(), p.cards_left()))
            .unwrap_or((Layout::default(), 0));
        let opponents = self
            .players
            .iter()
            .enumerate()
            .filter(|(other, _)| *other != seat)
            .map(|(other, p)| OpponentView {
                seat: other,
                layout: p.layout().clone(),
                deck_size: p.cards_left(),
            })
            .collect();
        ClientView {
            seat,
            layout,
            deck_size,
            piles: self.piles.clone(),
            opponents,
        }
    }
}
