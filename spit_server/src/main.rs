//! Spit game server.
//!
//! Hosts a single game: waits for every seat to fill, runs the game, and
//! exits once the result has been acknowledged or a player leaves.

mod config;

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;
use spit::server;

use config::{Overrides, ServerConfig};

const HELP: &str = "\
Host a game of Spit

USAGE:
  spit_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SPIT_BIND or 0.0.0.0:9000]
  --players    N           Number of players           [default: env SPIT_PLAYERS or 2]
  --piles      N           Number of center piles      [default: env SPIT_PILES or 2]
  --layout     N           Cards in each layout        [default: env SPIT_LAYOUT or 4]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SPIT_BIND                Server bind address (e.g., 0.0.0.0:9000)
  SPIT_PLAYERS             Number of players (2-4)
  SPIT_PILES               Number of center piles (at least one per player)
  SPIT_LAYOUT              Cards in each layout
  SPIT_POLL_TIMEOUT_MS     How often to check for shutdown
  RUST_LOG                 Log level (e.g., info, debug)
";

fn main() -> Result<(), Error> {
    // Load .env file if it exists
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = Overrides {
        bind: pargs.opt_value_from_str("--bind")?,
        players: pargs.opt_value_from_str("--players")?,
        piles: pargs.opt_value_from_str("--piles")?,
        layout: pargs.opt_value_from_str("--layout")?,
    };
    let config = ServerConfig::from_env(overrides)?;
    config.validate()?;

    // Catching signals for exit.
    let interrupt = Arc::new(AtomicBool::new(false));
    {
        let interrupt = interrupt.clone();
        set_handler(move || interrupt.store(true, Ordering::Relaxed))?;
    }

    env_logger::builder().format_target(false).init();
    info!(
        "Starting Spit server at {} ({} players, {} piles, layout of {})",
        config.bind,
        config.settings.num_players,
        config.settings.num_game_piles,
        config.settings.layout_size
    );

    let reason = server::run_until(config.bind, config.spit_config(), &interrupt)?;
    info!("Server stopped: {reason}");
    Ok(())
}
