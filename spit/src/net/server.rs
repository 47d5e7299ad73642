use anyhow::{Context, Error};
use log::{error, info, warn};
use std::{
    net::{Ipv4Addr, SocketAddr, UdpSocket},
    sync::atomic::{AtomicBool, Ordering},
    time::{Duration, Instant},
};

use super::{
    super::{
        game::{GameSettings, GameState},
        session::Session,
    },
    connection::{ConnectionId, Handler, Hub},
    messages::{ClientMessage, StopReason},
};

/// How long the event loop waits before checking for an interrupt.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(1);

/// How long final messages get to reach clients once the game is over.
pub const FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Any routable address works; nothing is ever sent to it.
const ROUTE_PROBE: &str = "8.8.8.8:80";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SpitConfig {
    pub settings: GameSettings,
    pub poll_timeout: Duration,
}

impl Default for SpitConfig {
    fn default() -> Self {
        Self {
            settings: GameSettings::default(),
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }
}

impl Handler for Session {
    type Message = ClientMessage;

    fn accepting(&self) -> bool {
        self.is_accepting()
    }

    fn is_running(&self) -> bool {
        !self.is_stopped()
    }

    fn on_connect(&mut self, hub: &mut Hub, id: ConnectionId, addr: SocketAddr) {
        Session::on_connect(self, hub, id, addr);
    }

    fn on_message(&mut self, hub: &mut Hub, id: ConnectionId, msg: ClientMessage) {
        Session::on_message(self, hub, id, msg);
    }

    fn on_disconnect(&mut self, hub: &mut Hub, id: ConnectionId) {
        Session::on_disconnect(self, hub, id);
    }
}

/// The address clients should be told to use. A wildcard bind is resolved
/// to the interface that routes outwards.
fn reachable_addr(local: SocketAddr) -> SocketAddr {
    if !local.ip().is_unspecified() {
        return local;
    }
    let outbound = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).and_then(|socket| {
        socket.connect(ROUTE_PROBE)?;
        socket.local_addr()
    });
    match outbound {
        Ok(probe) => SocketAddr::new(probe.ip(), local.port()),
        Err(error) => {
            warn!("couldn't find an outward address: {error}");
            local
        }
    }
}

/// Host one game and return once it's over.
pub fn run(addr: SocketAddr, config: SpitConfig) -> Result<StopReason, Error> {
    run_until(addr, config, &AtomicBool::new(false))
}

/// Host one game, giving up early once `interrupt` is set. Clients are told
/// the server was killed in that case.
pub fn run_until(
    addr: SocketAddr,
    config: SpitConfig,
    interrupt: &AtomicBool,
) -> Result<StopReason, Error> {
    config.settings.validate()?;
    let game = GameState::new(&config.settings)?;
    let mut hub = Hub::bind(addr).with_context(|| format!("couldn't bind to {addr}"))?;
    let ip_info = reachable_addr(hub.local_addr()?).to_string();
    info!(
        "waiting for {} players at {ip_info}",
        config.settings.num_players
    );

    let mut session = Session::new(game, ip_info);
    while !session.is_stopped() {
        if interrupt.load(Ordering::Relaxed) {
            session.shutdown(&mut hub);
            break;
        }
        if let Err(error) = hub.receive_one(&mut session, Some(config.poll_timeout)) {
            error!("event loop failed: {error}");
            session.shutdown(&mut hub);
            hub.flush_pending(Instant::now() + FLUSH_TIMEOUT);
            return Err(error.into());
        }
    }
    hub.flush_pending(Instant::now() + FLUSH_TIMEOUT);

    let reason = session.stop_reason().unwrap_or(StopReason::ServerKilled);
    match session.outcome() {
        Some(outcome) => info!("game finished: {outcome}"),
        None => info!("game ended early: {reason}"),
    }
    Ok(reason)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicBool;

    use super::{SpitConfig, reachable_addr, run_until};
    use crate::{game::GameSettings, net::messages::StopReason};

    #[test]
    fn specific_addresses_are_kept() {
        let addr = "192.168.1.20:9000".parse().unwrap();
        assert_eq!(reachable_addr(addr), addr);
    }

    #[test]
    fn wildcard_keeps_its_port() {
        let addr = "0.0.0.0:9000".parse().unwrap();
        assert_eq!(reachable_addr(addr).port(), 9000);
    }

    #[test]
    fn interrupted_server_stops_as_killed() {
        let config = SpitConfig::default();
        let interrupt = AtomicBool::new(true);
        let reason = run_until("127.0.0.1:0".parse().unwrap(), config, &interrupt).unwrap();
        assert_eq!(reason, StopReason::ServerKilled);
    }

    #[test]
    fn invalid_settings_are_refused() {
        let config = SpitConfig {
            settings: GameSettings::new(2, 1, 4),
            ..Default::default()
        };
        let interrupt = AtomicBool::new(true);
        assert!(run_until("127.0.0.1:0".parse().unwrap(), config, &interrupt).is_err());
    }
}
