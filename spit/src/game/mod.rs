//! Spit game engine - cards, decks, and the authoritative rules state.
//!
//! This module provides:
//! - Card and deck primitives with rank adjacency (aces wrap both ways)
//! - Players with their layouts and draw decks
//! - The rules state: legality checks, plays, flips, and win/draw detection
//! - Per-seat client views

pub mod constants;
pub mod entities;
pub mod state;

pub use state::{DealError, GameOutcome, GameSettings, GameState, PlayError, SettingsError};
