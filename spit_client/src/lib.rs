//! Internal modules for the Spit client.
//!
//! This library provides command parsing and terminal rendering used by the
//! spit_client binary.

pub mod commands;
pub mod console;
