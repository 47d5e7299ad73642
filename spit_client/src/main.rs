//! A terminal Spit client.
//!
//! Connects to a Spit server, answers the handshake, and then either reads
//! plays from stdin or lets the bot play.

use anyhow::{Error, bail};
use log::info;
use pico_args::Arguments;
use std::{io, net::SocketAddr, time::Duration};

use spit::{
    Client, Driver, Username, bot::AutoPlayer, messages::ClientMessage, net::driver::DriverStatus,
};
use spit_client::{
    commands::{COMMANDS_HELP, Command, parse_command},
    console::{Console, result_screen},
};

const HELP: &str = "\
Play a game of Spit

USAGE:
  spit_client [OPTIONS]

OPTIONS:
  --server     IP:PORT     Server socket address  [default: 127.0.0.1:9000]
  --name       NAME        Name to show the other players  [default: $USER]
  --delay      MS          Bot pause before each play  [default: 300]

FLAGS:
  --bot                    Let the computer play
  -h, --help               Print help information
";

struct Args {
    server: SocketAddr,
    name: Username,
    bot: bool,
    delay: Duration,
}

fn main() -> Result<(), Error> {
    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        server: pargs
            .opt_value_from_str("--server")?
            .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 9000))),
        name: Username::new(
            &pargs
                .opt_value_from_str::<_, String>("--name")?
                .unwrap_or_else(whoami::username),
        ),
        bot: pargs.contains("--bot"),
        delay: Duration::from_millis(pargs.opt_value_from_str("--delay")?.unwrap_or(300)),
    };

    env_logger::builder().format_target(false).init();
    run(args)
}

fn run(args: Args) -> Result<(), Error> {
    let client = Client::connect(&args.server)?;
    info!("Connected to {} as {}", args.server, args.name);

    let (driver, quit) = if args.bot {
        let driver = Driver::start(client, args.name, AutoPlayer::with_delay(args.delay))?;
        (driver, false)
    } else {
        let driver = Driver::start(client, args.name, Console::new())?;
        let quit = read_commands(&driver)?;
        (driver, quit)
    };

    match driver.join()? {
        Some(result) if args.bot => {
            println!("{}", result_screen(result.reason, result.detail.as_deref()));
        }
        Some(_) => {}
        None if quit => println!("You left the game."),
        None => bail!("disconnected before the game finished"),
    }
    Ok(())
}

/// Turn stdin lines into intents until the game stops or the player quits.
/// Returns whether the player quit.
fn read_commands(driver: &Driver) -> Result<bool, Error> {
    let intents = driver.intents();
    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            driver.quit();
            return Ok(true);
        }
        if driver.status() == DriverStatus::Stopping {
            return Ok(false);
        }
        match parse_command(&line) {
            Ok(Command::Send(ClientMessage::Quitting)) => {
                driver.quit();
                return Ok(true);
            }
            Ok(Command::Send(msg)) => intents.push(msg),
            Ok(Command::Help) => println!("{COMMANDS_HELP}"),
            Err(error) => println!("{error}"),
        }
    }
}
