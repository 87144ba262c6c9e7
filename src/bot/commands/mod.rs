//! Bundled slash commands and their registration.
//!
//! [`build_registry`] assembles every command, applies `[commands.<name>]`
//! overrides from the settings file, and returns the map the dispatcher looks
//! commands up in. [`create_commands`] produces the matching Discord
//! definitions.

/// General utility commands
pub mod general;

/// Owner-only premium management
pub mod premium;

/// Command usage statistics
pub mod stats;

use crate::{
    config::settings::{CommandOverride, Settings},
    core::registry::{CommandDescriptor, CommandMap},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use tracing::info;

/// Applies a settings override to a command.
#[must_use]
pub fn apply_override(
    mut descriptor: CommandDescriptor,
    overrides: &CommandOverride,
) -> CommandDescriptor {
    if let Some(disabled) = overrides.disabled {
        descriptor = descriptor.disabled(disabled);
    }
    if let Some(premium_only) = overrides.premium_only {
        descriptor = descriptor.premium_only(premium_only);
    }
    if let Some(ratelimit) = overrides.ratelimit {
        descriptor = descriptor.ratelimit(ratelimit);
    }
    descriptor
}

fn configured(descriptor: CommandDescriptor, settings: &Settings) -> CommandDescriptor {
    match settings.command_override(&descriptor.name) {
        Some(overrides) => {
            info!("Applying settings override to /{}", descriptor.name);
            apply_override(descriptor, overrides)
        }
        None => descriptor,
    }
}

/// Builds the command map with every bundled command.
#[must_use]
pub fn build_registry(database: &DatabaseConnection, settings: &Settings) -> CommandMap {
    let descriptors: Vec<CommandDescriptor> = vec![
        general::ping(),
        general::about(),
        stats::stats(database.clone()),
        premium::premium(database.clone()),
    ]
    .into_iter()
    .map(|descriptor| configured(descriptor, settings))
    .collect();

    let help = configured(general::help(&descriptors), settings);

    descriptors
        .into_iter()
        .chain(std::iter::once(help))
        .fold(CommandMap::default(), CommandMap::register)
}

/// Discord definitions for every command in `registry`.
#[must_use]
pub fn create_commands(registry: &CommandMap) -> Vec<serenity::CreateCommand> {
    registry
        .descriptors()
        .iter()
        .map(|descriptor| {
            let command = serenity::CreateCommand::new(descriptor.name.clone())
                .description(descriptor.description.clone());
            match descriptor.name.as_str() {
                "premium" => command.set_options(premium::options()),
                _ => command,
            }
        })
        .collect()
}
