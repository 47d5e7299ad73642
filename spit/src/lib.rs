//! # Spit
//!
//! A two-player, real-time game of Spit played over the network, with the
//! server as the single source of truth.
//!
//! Both players play at once from their own layouts onto shared center
//! piles. A card can go on a pile when it's one rank away from the pile's
//! top card, with aces and kings next to each other. When nobody can move,
//! every player flips a card from their deck onto their own pile. The first
//! player to run out of cards wins.
//!
//! ## Core Modules
//!
//! - [`game`]: Cards, decks, layouts, and the rules state
//! - [`session`]: The server-side session state machine
//! - [`net`]: Networking components (codec, hub, server, client, driver)
//! - [`bot`]: A client that plays by itself
//!
//! ## Example
//!
//! ```
//! use spit::{GameSettings, GameState};
//!
//! let game = GameState::new(&GameSettings::default()).unwrap();
//! assert_eq!(game.num_players(), 2);
//! assert!(game.game_over().is_none());
//! ```

/// Core game logic and entities.
pub mod game;
pub use game::{
    DealError, GameOutcome, GameSettings, GameState, PlayError, SettingsError,
    constants::{self, DEFAULT_LAYOUT_SIZE, MAX_PLAYERS},
    entities::{self, Card, ClientView, PlayAction, Username},
};

/// Networking components for client-server communication.
pub mod net;
pub use net::{
    client::Client,
    driver::{Driver, Frontend, GameResult},
    messages, server, utils,
};

/// The authoritative session state machine.
pub mod session;

/// Automatic play.
pub mod bot;
