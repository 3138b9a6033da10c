//! Server configuration, loaded from `dicehall.toml` and the environment.

use std::path::Path;

use dicehall_dice::GameMode;
use dicehall_room::RoomConfig;
use serde::{Deserialize, Serialize};

use crate::DicehallError;

/// Config file read by [`ServerConfig::load`], relative to the working
/// directory.
pub const CONFIG_FILE: &str = "dicehall.toml";

/// Top-level server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Starting bankroll of the in-memory house ledger.
    pub house_balance: f64,
    /// Payouts that would drop the bankroll below this are refused.
    pub house_reserve: f64,
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:3000".to_string(),
            house_balance: 1_000_000.0,
            house_reserve: 0.0,
            room: RoomConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Load config from `dicehall.toml` if it exists, then apply env var
    /// overrides.
    pub fn load() -> Self {
        let mut config = Self::load_file(Path::new(CONFIG_FILE));
        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Reads a config file, falling back to defaults when it is missing
    /// or does not parse.
    pub fn load_file(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "loaded configuration");
                    config
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), "{e}, using defaults");
                    Self::default()
                }
            },
            Err(_) => {
                tracing::info!(path = %path.display(), "no config file found, using defaults");
                Self::default()
            }
        }
    }

    /// Parses config file contents; missing keys take their defaults.
    pub fn from_toml(content: &str) -> Result<Self, DicehallError> {
        toml::from_str(content).map_err(|e| DicehallError::Config(e.to_string()))
    }

    /// Applies `DICEHALL_*` and `PORT` overrides read through `lookup`.
    ///
    /// Empty or unparsable values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(addr) = var("DICEHALL_LISTEN_ADDR") {
            self.listen_addr = addr;
        }
        if let Some(port) = var("PORT").and_then(|p| p.trim().parse::<u16>().ok()) {
            let host = self
                .listen_addr
                .rsplit_once(':')
                .map_or(self.listen_addr.as_str(), |(host, _)| host);
            self.listen_addr = format!("{host}:{port}");
        }
        if let Some(balance) = var("DICEHALL_HOUSE_BALANCE").and_then(|v| v.parse::<f64>().ok()) {
            self.house_balance = balance;
        }
        if let Some(secs) =
            var("DICEHALL_BETTING_WINDOW_SECS").and_then(|v| v.parse::<u32>().ok())
        {
            self.room.betting_window_secs = secs;
        }
        if let Some(mode) = var("DICEHALL_MODE") {
            match mode.parse::<GameMode>() {
                Ok(mode) => self.room.mode = mode,
                Err(e) => tracing::warn!("ignoring DICEHALL_MODE: {e}"),
            }
        }
    }

    /// Rejects values the server cannot run with.
    pub fn validate(&self) -> Result<(), DicehallError> {
        if self.listen_addr.parse::<std::net::SocketAddr>().is_err() {
            return Err(DicehallError::Config(format!(
                "listen_addr {:?} is not a valid socket address",
                self.listen_addr
            )));
        }
        if self.room.capacity == 0 {
            return Err(DicehallError::Config("room.capacity must be > 0".into()));
        }
        if self.room.betting_window_secs == 0 {
            return Err(DicehallError::Config(
                "room.betting_window_secs must be > 0".into(),
            ));
        }
        if self.room.tick_interval.is_zero() {
            return Err(DicehallError::Config(
                "room.tick_interval must be > 0".into(),
            ));
        }
        if !self.house_balance.is_finite() || self.house_balance < 0.0 {
            return Err(DicehallError::Config(
                "house_balance must be a non-negative number".into(),
            ));
        }
        if !self.house_reserve.is_finite() || self.house_reserve < 0.0 {
            return Err(DicehallError::Config(
                "house_reserve must be a non-negative number".into(),
            ));
        }
        Ok(())
    }
}
