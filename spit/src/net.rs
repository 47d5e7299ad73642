//! Networking layer for client-server communication.
//!
//! This module provides TCP-based networking with a length-prefixed binary
//! protocol using bincode serialization. The server uses `mio` for
//! non-blocking I/O; clients use plain blocking sockets.

/// Blocking TCP client for connecting to a Spit server.
pub mod client;

/// Readiness-driven connection multiplexing.
pub mod connection;

/// Listener/sender threads that run a client through a game.
pub mod driver;

/// Network error types.
pub mod errors;

/// Message types for client-server communication protocol.
pub mod messages;

/// Single-threaded game server event loop.
pub mod server;

/// Utilities for binary message serialization and framing.
pub mod utils;
