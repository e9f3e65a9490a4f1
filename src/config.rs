// Live Auction Configuration - layered settings for the server binary

//! Server configuration
//!
//! Settings are layered, later sources overriding earlier ones:
//! 1. built-in defaults
//! 2. `auction.toml` in the working directory (optional), or the file passed
//!    with `--config` (required when given)
//! 3. environment variables prefixed with `AUCTION`, using `__` between
//!    nesting levels, e.g. `AUCTION_SERVER__PORT=4001` or `AUCTION_LOG_LEVEL=debug`
//!
//! The server binary loads `.env` before any of this runs, so values there
//! behave like real environment variables.

use std::path::Path;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::Result;

/// Default config file looked up next to the binary's working directory
pub const DEFAULT_CONFIG_FILE: &str = "auction";

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub cors_enabled: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 4000,
            cors_enabled: true,
        }
    }
}

/// Auction engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuctionSettings {
    /// Used when `createAuction` omits `duration`
    pub default_duration_secs: u32,
    /// Bids with less time than this left extend the deadline (extended bidding only)
    pub soft_close_window_secs: u32,
    /// Buffer size of each subscription channel
    pub event_capacity: usize,
}

impl Default for AuctionSettings {
    fn default() -> Self {
        Self {
            default_duration_secs: 30,
            soft_close_window_secs: 10,
            event_capacity: 1000,
        }
    }
}

/// Complete application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub auction: AuctionSettings,
    /// tracing filter used when `RUST_LOG` is not set
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            auction: AuctionSettings::default(),
            log_level: "info".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from defaults, then `path` (or the optional `auction.toml` when
    /// `None`), then the environment
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let defaults = AppConfig::default();

        let builder = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.cors_enabled", defaults.server.cors_enabled)?
            .set_default(
                "auction.default_duration_secs",
                i64::from(defaults.auction.default_duration_secs),
            )?
            .set_default(
                "auction.soft_close_window_secs",
                i64::from(defaults.auction.soft_close_window_secs),
            )?
            .set_default(
                "auction.event_capacity",
                i64::try_from(defaults.auction.event_capacity).unwrap_or(i64::MAX),
            )?
            .set_default("log_level", defaults.log_level)?;

        let builder = match path {
            Some(path) => builder.add_source(File::from(path).required(true)),
            None => builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false)),
        };

        let config = builder
            .add_source(
                Environment::with_prefix("AUCTION")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Socket address string for the HTTP listener
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
