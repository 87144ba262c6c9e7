//! Bot settings loaded from config.toml
//!
//! The file has a `[bot]` table for owners, helpers, development mode, and the
//! handler timeout, plus optional `[commands.<name>]` tables that override a
//! command's built-in restrictions and rate limits. Every key is optional; a
//! missing file means defaults.

use crate::{
    config::owners,
    core::policy::RateLimitConfig,
    errors::{Error, Result},
};
use poise::serenity_prelude::UserId;
use serde::Deserialize;
use std::{collections::HashMap, path::Path, time::Duration};
use tracing::info;

/// Environment variable naming the settings file.
pub const CONFIG_PATH_VAR: &str = "BOT_CONFIG";
/// Environment variable forcing development mode on.
pub const DEVELOPMENT_MODE_VAR: &str = "DEVELOPMENT_MODE";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Bot-wide settings
    pub bot: BotSettings,
    /// Per-command overrides keyed by command name
    pub commands: HashMap<String, CommandOverride>,
}

/// Bot-wide settings
#[derive(Debug, Default, Deserialize, Clone)]
#[serde(default)]
pub struct BotSettings {
    /// Discord user IDs of bot owners
    pub owner_ids: Vec<u64>,
    /// Discord user IDs allowed to run helper-only commands
    pub helper_ids: Vec<u64>,
    /// Suppresses failure telemetry while developing
    pub development_mode: bool,
    /// Maximum time a command handler may run
    pub handler_timeout_secs: Option<u64>,
}

/// Overrides for a single command
#[derive(Debug, Default, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct CommandOverride {
    /// Switches the command off (owners can still run it)
    pub disabled: Option<bool>,
    /// Restricts the command to premium users
    pub premium_only: Option<bool>,
    /// Replaces the command's built-in rate limits
    pub ratelimit: Option<RateLimitConfig>,
}

impl Settings {
    /// Owners from the file merged with owners from `BOT_OWNER_IDS`.
    #[must_use]
    pub fn owners(&self) -> Vec<UserId> {
        let mut all = owners::user_ids(&self.bot.owner_ids);
        for id in owners::owner_ids_from_env() {
            if !all.contains(&id) {
                all.push(id);
            }
        }
        all
    }

    /// Helper user IDs.
    #[must_use]
    pub fn helpers(&self) -> Vec<UserId> {
        owners::user_ids(&self.bot.helper_ids)
    }

    /// Whether development mode is on, either in the file or via `DEVELOPMENT_MODE`.
    #[must_use]
    pub fn development_mode(&self) -> bool {
        self.bot.development_mode
            || std::env::var(DEVELOPMENT_MODE_VAR)
                .is_ok_and(|value| matches!(value.trim(), "1" | "true" | "yes"))
    }

    /// Handler timeout, if configured. Zero disables the timeout.
    #[must_use]
    pub fn handler_timeout(&self) -> Option<Duration> {
        self.bot
            .handler_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }

    /// Override for `command`, if one is configured.
    #[must_use]
    pub fn command_override(&self, command: &str) -> Option<&CommandOverride> {
        self.commands.get(command)
    }
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns an error if the TOML syntax is invalid or a value has the wrong type.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads settings from a TOML file. A missing file yields default settings.
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No settings file at {:?}; using defaults.", path);
        return Ok(Settings::default());
    }

    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path:?}: {e}"),
    })?;
    parse_settings(&contents)
}

/// Loads settings from `BOT_CONFIG`, or `./config.toml` when unset.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.toml".to_string());
    load_settings(path)
}
