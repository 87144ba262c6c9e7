//! `/premium` - owner-only management of premium users.
//!
//! Takes an `action` choice (`grant`, `revoke`, or `list`) and a `user` option
//! for the first two.

use crate::{
    core::{
        premium,
        registry::{CommandContext, CommandDescriptor, CommandHandler, Reply},
    },
    errors::Result,
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::fmt::Write as _;

/// Option holding the action to perform.
pub const ACTION_OPTION: &str = "action";
/// Option holding the target user.
pub const USER_OPTION: &str = "user";

/// Grants, revokes, and lists premium access.
pub struct Premium {
    database: DatabaseConnection,
}

impl Premium {
    /// Premium management backed by `database`.
    #[must_use]
    pub const fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    async fn grant(&self, target: serenity::UserId, granted_by: serenity::UserId) -> Result<String> {
        let grant = premium::grant_premium(&self.database, target, granted_by).await?;
        Ok(format!(
            "✅ <@{target}> has premium (granted {}).",
            grant.granted_at.format("%Y-%m-%d")
        ))
    }

    async fn revoke(&self, target: serenity::UserId) -> Result<String> {
        if premium::revoke_premium(&self.database, target).await? {
            Ok(format!("✅ Revoked premium from <@{target}>."))
        } else {
            Ok(format!("ℹ️ <@{target}> did not have premium."))
        }
    }

    async fn list(&self) -> Result<String> {
        let users = premium::list_premium_users(&self.database).await?;
        if users.is_empty() {
            return Ok("No premium users.".to_string());
        }

        let mut text = format!("**Premium users ({})**\n", users.len());
        for user in users {
            let _ = writeln!(
                text,
                "• <@{}> since {}",
                user.user_id,
                user.granted_at.format("%Y-%m-%d")
            );
        }
        Ok(text)
    }
}

#[async_trait]
impl CommandHandler for Premium {
    async fn run(&self, ctx: CommandContext<'_>) -> Result<()> {
        let options = &ctx.invocation.options;
        let target = options.user(USER_OPTION);

        let text = match (options.string(ACTION_OPTION), target) {
            (Some("grant"), Some(target)) => self.grant(target, ctx.invocation.user_id).await?,
            (Some("revoke"), Some(target)) => self.revoke(target).await?,
            (Some("grant" | "revoke"), None) => "❌ Choose a user.".to_string(),
            (Some("list"), _) => self.list().await?,
            _ => "❌ Unknown action. Use grant, revoke, or list.".to_string(),
        };

        ctx.responder.reply(Reply::ephemeral(text)).await
    }
}

/// `/premium`, restricted to bot owners.
#[must_use]
pub fn premium(database: DatabaseConnection) -> CommandDescriptor {
    CommandDescriptor::new("premium", "Manages premium users", Premium::new(database))
        .super_user_only()
}

/// Slash command options for `/premium`.
#[must_use]
pub fn options() -> Vec<serenity::CreateCommandOption> {
    vec![
        serenity::CreateCommandOption::new(
            serenity::CommandOptionType::String,
            ACTION_OPTION,
            "What to do",
        )
        .required(true)
        .add_string_choice("grant", "grant")
        .add_string_choice("revoke", "revoke")
        .add_string_choice("list", "list"),
        serenity::CreateCommandOption::new(
            serenity::CommandOptionType::User,
            USER_OPTION,
            "User to grant or revoke",
        ),
    ]
}
