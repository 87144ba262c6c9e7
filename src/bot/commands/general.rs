//! General commands - ping, help, and about.
//!
//! None of these touch the database. `help` is built from the finished command
//! list so it always matches what is actually registered.

use crate::{
    core::{
        policy::{RateLimitConfig, ScopeLimit},
        registry::{CommandContext, CommandDescriptor, CommandHandler, Reply, ReplyEmbed},
    },
    errors::Result,
};
use async_trait::async_trait;
use poise::serenity_prelude::Permissions;
use std::{fmt::Write as _, time::Duration};

/// Responds with "Pong!" to test bot connectivity.
pub struct Ping;

#[async_trait]
impl CommandHandler for Ping {
    async fn run(&self, ctx: CommandContext<'_>) -> Result<()> {
        ctx.say("🏓 Pong!").await
    }
}

/// `/ping`, limited to three uses per user every ten seconds.
#[must_use]
pub fn ping() -> CommandDescriptor {
    CommandDescriptor::new("ping", "Checks if the bot is responsive", Ping).ratelimit(
        RateLimitConfig::default().with_user(ScopeLimit::strict(3, Duration::from_secs(10))),
    )
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct HelpEntry {
    name: String,
    description: String,
    tag: Option<&'static str>,
}

impl HelpEntry {
    fn from_descriptor(descriptor: &CommandDescriptor) -> Self {
        let tag = if descriptor.super_user_only {
            Some("owner only")
        } else if descriptor.helper_user_only {
            Some("helpers")
        } else if descriptor.premium_only {
            Some("premium")
        } else {
            None
        };
        Self {
            name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            tag,
        }
    }
}

/// Lists the available commands.
pub struct Help {
    entries: Vec<HelpEntry>,
}

impl Help {
    /// Help over `descriptors`. Disabled commands are left out.
    #[must_use]
    pub fn new<'a>(descriptors: impl IntoIterator<Item = &'a CommandDescriptor>) -> Self {
        let mut entries: Vec<HelpEntry> = descriptors
            .into_iter()
            .filter(|descriptor| !descriptor.disabled)
            .map(HelpEntry::from_descriptor)
            .collect();
        entries.push(HelpEntry {
            name: "help".to_string(),
            description: HELP_DESCRIPTION.to_string(),
            tag: None,
        });
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Self { entries }
    }

    fn render(&self) -> String {
        let mut text = String::from("**Available commands**\n");
        for entry in &self.entries {
            let _ = write!(text, "• `/{}` - {}", entry.name, entry.description);
            if let Some(tag) = entry.tag {
                let _ = write!(text, " _({tag})_");
            }
            text.push('\n');
        }
        text
    }
}

#[async_trait]
impl CommandHandler for Help {
    async fn run(&self, ctx: CommandContext<'_>) -> Result<()> {
        ctx.responder.reply(Reply::ephemeral(self.render())).await
    }
}

const HELP_DESCRIPTION: &str = "Shows the available commands";

/// `/help` over the other registered commands.
#[must_use]
pub fn help<'a>(descriptors: impl IntoIterator<Item = &'a CommandDescriptor>) -> CommandDescriptor {
    CommandDescriptor::new("help", HELP_DESCRIPTION, Help::new(descriptors))
}

/// Shows what the bot is, as an embed.
pub struct About;

#[async_trait]
impl CommandHandler for About {
    async fn run(&self, ctx: CommandContext<'_>) -> Result<()> {
        let embed = ReplyEmbed {
            title: env!("CARGO_PKG_NAME").to_string(),
            description: "Slash commands with permission checks and rate limits.".to_string(),
            fields: vec![
                (
                    "Version".to_string(),
                    env!("CARGO_PKG_VERSION").to_string(),
                    true,
                ),
                (
                    "Library".to_string(),
                    "serenity + poise".to_string(),
                    true,
                ),
            ],
            colour: Some(0x0058_65F2),
        };
        ctx.responder.reply(Reply::default().with_embed(embed)).await
    }
}

/// `/about`. Needs Embed Links where it is used.
#[must_use]
pub fn about() -> CommandDescriptor {
    CommandDescriptor::new("about", "Shows information about the bot", About)
        .bot_permissions(Permissions::EMBED_LINKS)
}
