//! Owner configuration from environment variables.
//!
//! Owners can be listed in `config.toml`, in the `BOT_OWNER_IDS` environment
//! variable (comma-separated Discord user IDs), or both. Keeping them in `.env`
//! avoids committing personal IDs alongside the rest of the configuration.

use poise::serenity_prelude::UserId;
use tracing::warn;

/// Environment variable holding comma-separated owner IDs.
pub const OWNER_IDS_VAR: &str = "BOT_OWNER_IDS";

/// Parses comma-separated Discord user IDs, skipping blanks and invalid entries.
///
/// # Returns
///
/// Every valid, non-zero ID in the order given. Invalid entries are logged and dropped.
#[must_use]
pub fn parse_user_ids(raw: &str) -> Vec<UserId> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .filter_map(|entry| match entry.parse::<u64>() {
            Ok(id) if id != 0 => Some(UserId::new(id)),
            _ => {
                warn!("Ignoring invalid user ID {:?} in {}", entry, OWNER_IDS_VAR);
                None
            }
        })
        .collect()
}

/// Gets the owner IDs configured in the environment, if any.
#[must_use]
pub fn owner_ids_from_env() -> Vec<UserId> {
    std::env::var(OWNER_IDS_VAR)
        .map(|raw| parse_user_ids(&raw))
        .unwrap_or_default()
}

/// Converts raw IDs from the config file, dropping zero (which is never a valid snowflake).
#[must_use]
pub fn user_ids(raw: &[u64]) -> Vec<UserId> {
    raw.iter()
        .copied()
        .filter(|id| *id != 0)
        .map(UserId::new)
        .collect()
}
