//! Server configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use spit::{GameSettings, SettingsError, server::SpitConfig};
use std::{net::SocketAddr, time::Duration};

/// Port the server listens on when nothing else is given. The default
/// bind address is every interface on this port.
pub const DEFAULT_PORT: u16 = 9000;

/// Complete server configuration loaded from CLI flags and environment variables
#[derive(Debug, Clone, Copy)]
pub struct ServerConfig {
    /// Server bind address
    pub bind: SocketAddr,
    /// Game shape
    pub settings: GameSettings,
    /// How often the event loop wakes up to check for shutdown
    pub poll_timeout: Duration,
}

/// Values given on the command line. Anything left out falls back to the
/// environment, then to the defaults.
#[derive(Debug, Default)]
pub struct Overrides {
    pub bind: Option<SocketAddr>,
    pub players: Option<usize>,
    pub piles: Option<usize>,
    pub layout: Option<usize>,
}

impl ServerConfig {
    /// Load configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns error if a variable is set but can't be parsed
    pub fn from_env(overrides: Overrides) -> Result<Self, ConfigError> {
        let defaults = GameSettings::default();

        let bind = match overrides.bind {
            Some(bind) => bind,
            None => parse_env_or("SPIT_BIND", SocketAddr::from(([0, 0, 0, 0], DEFAULT_PORT)))?,
        };

        let settings = GameSettings::new(
            overrides
                .players
                .map_or_else(|| parse_env_or("SPIT_PLAYERS", defaults.num_players), Ok)?,
            overrides
                .piles
                .map_or_else(|| parse_env_or("SPIT_PILES", defaults.num_game_piles), Ok)?,
            overrides
                .layout
                .map_or_else(|| parse_env_or("SPIT_LAYOUT", defaults.layout_size), Ok)?,
        );

        let poll_timeout_ms = parse_env_or(
            "SPIT_POLL_TIMEOUT_MS",
            SpitConfig::default().poll_timeout.as_millis() as u64,
        )?;

        Ok(ServerConfig {
            bind,
            settings,
            poll_timeout: Duration::from_millis(poll_timeout_ms),
        })
    }

    /// Validate configuration after loading
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_timeout.is_zero() {
            return Err(ConfigError::Invalid {
                var: "SPIT_POLL_TIMEOUT_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        self.settings.validate().map_err(|error| {
            let var = match error {
                SettingsError::PlayerCount(_) => "SPIT_PLAYERS",
                SettingsError::PileCount { .. } => "SPIT_PILES",
                SettingsError::LayoutSize | SettingsError::NotEnoughCards { .. } => "SPIT_LAYOUT",
            };
            ConfigError::Invalid {
                var: var.to_string(),
                reason: error.to_string(),
            }
        })
    }

    #[must_use]
    pub fn spit_config(&self) -> SpitConfig {
        SpitConfig {
            settings: self.settings,
            poll_timeout: self.poll_timeout,
        }
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Helper to parse environment variable with default fallback. A variable
/// that is set but unparseable is an error rather than silently ignored.
fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match std::env::var(key) {
        Ok(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("can't parse {value:?}"),
        }),
        Err(_) => Ok(default),
    }
}
