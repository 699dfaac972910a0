// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Client configuration management.
//!
//! Configuration is stored in `<config dir>/moviematch/config.toml` and includes:
//! - `gateway`: realtime gateway URL and connection timeouts
//! - `reconnect`: attempt budget and backoff bounds
//! - `poll`: fallback poll intervals per topic kind
//! - `api`: query endpoint and optional credential

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::credentials::TOKEN_ENV;
use crate::error::{Error, Result};
use crate::sync::{BackoffPolicy, ConnectionConfig, PollIntervals, SyncConfig};

const CONFIG_DIR_NAME: &str = "moviematch";
const CONFIG_FILE_NAME: &str = "config.toml";

/// Client configuration stored in `config.toml`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub reconnect: ReconnectConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

/// Realtime gateway settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// WebSocket URL (`ws://` or `wss://`).
    #[serde(default = "default_gateway_url")]
    pub url: String,
    /// Max time to wait for `connection_ack` in milliseconds (default: 10000).
    #[serde(default = "default_handshake_timeout_ms")]
    pub handshake_timeout_ms: u64,
    /// Dead-connection window when the gateway does not advertise one (default: 300000).
    #[serde(default = "default_keepalive_timeout_ms")]
    pub keepalive_timeout_ms: u64,
}

/// Reconnection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Attempts before a topic falls back to polling (default: 5).
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry in milliseconds (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Upper bound on the retry delay in milliseconds (default: 30000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

/// Fallback poll intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_room_interval_ms")]
    pub room_interval_ms: u64,
    #[serde(default = "default_vote_interval_ms")]
    pub vote_interval_ms: u64,
    #[serde(default = "default_match_interval_ms")]
    pub match_interval_ms: u64,
}

/// Query endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    /// GraphQL HTTP endpoint (`http://` or `https://`).
    #[serde(default = "default_api_url")]
    pub url: String,
    /// Bearer credential. `MOVIEMATCH_TOKEN` takes precedence.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Per-request timeout in milliseconds (default: 10000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_gateway_url() -> String {
    "ws://localhost:7890/graphql/realtime".to_string()
}

fn default_handshake_timeout_ms() -> u64 {
    10_000
}

fn default_keepalive_timeout_ms() -> u64 {
    300_000
}

fn default_max_attempts() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    30_000
}

fn default_room_interval_ms() -> u64 {
    5_000
}

fn default_vote_interval_ms() -> u64 {
    5_000
}

fn default_match_interval_ms() -> u64 {
    3_000
}

fn default_api_url() -> String {
    "http://localhost:7890/graphql".to_string()
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for GatewayConfig {
    fn default() -> Self {
        GatewayConfig {
            url: default_gateway_url(),
            handshake_timeout_ms: default_handshake_timeout_ms(),
            keepalive_timeout_ms: default_keepalive_timeout_ms(),
        }
    }
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        ReconnectConfig {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            room_interval_ms: default_room_interval_ms(),
            vote_interval_ms: default_vote_interval_ms(),
            match_interval_ms: default_match_interval_ms(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        ApiConfig {
            url: default_api_url(),
            token: None,
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl Config {
    /// Loads configuration from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(Error::ConfigNotFound(path.display().to_string()));
            }
            Err(e) => return Err(Error::Config(format!("failed to read config: {}", e))),
        };
        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;
        Ok(config)
    }

    /// Loads the effective configuration.
    ///
    /// An explicit path must exist; a missing file at the default location
    /// yields the defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Config::load(path),
            None => match default_path() {
                Ok(path) if path.exists() => Config::load(&path),
                _ => Ok(Config::default()),
            },
        }
    }

    /// Saves configuration to `path`, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("failed to serialize config: {}", e)))?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Checks values that would make the client unusable.
    pub fn validate(&self) -> Result<()> {
        let gateway = &self.gateway.url;
        if !(gateway.starts_with("ws://") || gateway.starts_with("wss://")) {
            return Err(Error::InvalidConfig {
                field: "gateway.url",
                reason: format!("'{}' is not a WebSocket URL", gateway),
                hint: "use a ws:// or wss:// URL",
            });
        }
        let api = &self.api.url;
        if !(api.starts_with("http://") || api.starts_with("https://")) {
            return Err(Error::InvalidConfig {
                field: "api.url",
                reason: format!("'{}' is not an HTTP URL", api),
                hint: "use an http:// or https:// URL",
            });
        }
        if self.reconnect.max_attempts == 0 {
            return Err(Error::InvalidConfig {
                field: "reconnect.max_attempts",
                reason: "must be at least 1".to_string(),
                hint: "the default is 5",
            });
        }
        if self.reconnect.base_delay_ms > self.reconnect.max_delay_ms {
            return Err(Error::InvalidConfig {
                field: "reconnect.base_delay_ms",
                reason: "exceeds reconnect.max_delay_ms".to_string(),
                hint: "the defaults are 1000 and 30000",
            });
        }
        let intervals = [
            ("poll.room_interval_ms", self.poll.room_interval_ms),
            ("poll.vote_interval_ms", self.poll.vote_interval_ms),
            ("poll.match_interval_ms", self.poll.match_interval_ms),
        ];
        for (field, value) in intervals {
            if value == 0 {
                return Err(Error::InvalidConfig {
                    field,
                    reason: "must be greater than zero".to_string(),
                    hint: "intervals are in milliseconds",
                });
            }
        }
        if self.gateway.handshake_timeout_ms == 0 {
            return Err(Error::InvalidConfig {
                field: "gateway.handshake_timeout_ms",
                reason: "must be greater than zero".to_string(),
                hint: "the default is 10000",
            });
        }
        Ok(())
    }

    /// The credential to use: `MOVIEMATCH_TOKEN`, then `api.token`.
    pub fn token(&self) -> Option<String> {
        self.token_with(std::env::var(TOKEN_ENV).ok())
    }

    fn token_with(&self, env_value: Option<String>) -> Option<String> {
        env_value
            .filter(|t| !t.is_empty())
            .or_else(|| self.api.token.clone().filter(|t| !t.is_empty()))
    }

    /// Sync client settings derived from this configuration.
    pub fn sync_config(&self) -> SyncConfig {
        SyncConfig {
            connection: ConnectionConfig {
                url: self.gateway.url.clone(),
                handshake_timeout: Duration::from_millis(self.gateway.handshake_timeout_ms),
                keepalive_timeout: Duration::from_millis(self.gateway.keepalive_timeout_ms),
            },
            max_attempts: self.reconnect.max_attempts,
            backoff: BackoffPolicy::new(
                Duration::from_millis(self.reconnect.base_delay_ms),
                Duration::from_millis(self.reconnect.max_delay_ms),
            ),
            poll: PollIntervals {
                room: Duration::from_millis(self.poll.room_interval_ms),
                vote: Duration::from_millis(self.poll.vote_interval_ms),
                match_found: Duration::from_millis(self.poll.match_interval_ms),
            },
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.api.request_timeout_ms)
    }
}

/// Default config file location.
pub fn default_path() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
        .ok_or(Error::NoConfigDir)
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
