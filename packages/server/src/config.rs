//! Server configuration.
//!
//! Every flag can also be set through a `KAIGI_*` environment variable, so the
//! server starts with zero configuration for local development.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use thiserror::Error;

use crate::domain::HistoryLimits;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{0} must be greater than zero")]
    ZeroValue(&'static str),
    #[error("unknown log level '{0}' (expected one of trace, debug, info, warn, error)")]
    UnknownLogLevel(String),
}

#[derive(Parser, Debug, Clone)]
#[command(name = "kaigi-server")]
#[command(about = "Room coordination and signaling server for video meetings", long_about = None)]
pub struct ServerConfig {
    /// Host address to bind the server to
    #[arg(short = 'H', long, env = "KAIGI_HOST", default_value = "127.0.0.1")]
    pub host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, env = "KAIGI_PORT", default_value_t = 5000)]
    pub port: u16,

    /// Default log level, overridden by RUST_LOG
    #[arg(long, env = "KAIGI_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Maximum number of strokes kept per room
    #[arg(long, env = "KAIGI_STROKE_HISTORY_LIMIT", default_value_t = 20_000)]
    pub stroke_history_limit: usize,

    /// Maximum number of chat messages kept per room
    #[arg(long, env = "KAIGI_CHAT_HISTORY_LIMIT", default_value_t = 1_000)]
    pub chat_history_limit: usize,

    /// Deadline for looking up a joining user's role, in milliseconds
    #[arg(long, env = "KAIGI_ROLE_LOOKUP_TIMEOUT_MS", default_value_t = 3_000)]
    pub role_lookup_timeout_ms: u64,

    /// JSON file mapping user ids to roles (admin, manager, user)
    #[arg(long, env = "KAIGI_USER_ROSTER")]
    pub user_roster: Option<PathBuf>,

    /// Reject WebSocket upgrades that carry no x-authenticated-user header
    #[arg(long, env = "KAIGI_REQUIRE_IDENTITY_HEADER")]
    pub require_identity_header: bool,
}

impl ServerConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stroke_history_limit == 0 {
            return Err(ConfigError::ZeroValue("stroke-history-limit"));
        }
        if self.chat_history_limit == 0 {
            return Err(ConfigError::ZeroValue("chat-history-limit"));
        }
        if self.role_lookup_timeout_ms == 0 {
            return Err(ConfigError::ZeroValue("role-lookup-timeout-ms"));
        }
        let level = self.log_level.to_ascii_lowercase();
        if !LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::UnknownLogLevel(self.log_level.clone()));
        }
        Ok(())
    }

    pub fn history_limits(&self) -> HistoryLimits {
        HistoryLimits {
            strokes: self.stroke_history_limit,
            messages: self.chat_history_limit,
        }
    }

    pub fn role_lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.role_lookup_timeout_ms)
    }
}
