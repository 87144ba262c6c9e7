//! Slash command interactions.
//!
//! [`invocation_from`] copies everything the dispatcher needs out of a
//! [`serenity::CommandInteraction`]; [`InteractionResponder`] answers it. The
//! first reply becomes the interaction response and later replies are sent as
//! follow-ups, since Discord accepts exactly one initial response.

use crate::{
    core::registry::{CommandOptions, Invocation, OptionValue, Reply, ReplyEmbed, Responder},
    errors::Result,
};
use async_trait::async_trait;
use poise::serenity_prelude as serenity;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Builds an [`Invocation`] from a slash command interaction.
#[must_use]
pub fn invocation_from(command: &serenity::CommandInteraction) -> Invocation {
    let user_permissions = command
        .member
        .as_ref()
        .and_then(|member| member.permissions)
        .unwrap_or_else(serenity::Permissions::empty);
    let bot_permissions = command
        .app_permissions
        .unwrap_or_else(serenity::Permissions::empty);

    let options: CommandOptions = command
        .data
        .options
        .iter()
        .filter_map(|option| option_value(&option.value).map(|value| (option.name.clone(), value)))
        .collect();

    let invocation = Invocation::new(command.data.name.clone(), command.user.id)
        .with_bot_permissions(bot_permissions)
        .with_user_permissions(user_permissions)
        .with_options(options);

    match command.guild_id {
        Some(guild_id) => invocation.in_guild(guild_id),
        None => invocation,
    }
}

/// Converts a top-level option value. Subcommands and entity types other than
/// users are not used by any command and are dropped.
fn option_value(value: &serenity::CommandDataOptionValue) -> Option<OptionValue> {
    match value {
        serenity::CommandDataOptionValue::String(text) => Some(OptionValue::String(text.clone())),
        serenity::CommandDataOptionValue::Integer(number) => Some(OptionValue::Integer(*number)),
        serenity::CommandDataOptionValue::Number(number) => Some(OptionValue::Number(*number)),
        serenity::CommandDataOptionValue::Boolean(flag) => Some(OptionValue::Boolean(*flag)),
        serenity::CommandDataOptionValue::User(user_id) => Some(OptionValue::User(*user_id)),
        _ => None,
    }
}

fn create_embed(embed: &ReplyEmbed) -> serenity::CreateEmbed {
    let mut builder = serenity::CreateEmbed::new()
        .title(embed.title.clone())
        .description(embed.description.clone())
        .fields(
            embed
                .fields
                .iter()
                .map(|(name, value, inline)| (name.clone(), value.clone(), *inline)),
        );
    if let Some(colour) = embed.colour {
        builder = builder.colour(colour);
    }
    builder
}

/// Replies to a single slash command interaction.
pub struct InteractionResponder {
    http: Arc<serenity::Http>,
    interaction: serenity::CommandInteraction,
    responded: AtomicBool,
}

impl InteractionResponder {
    /// Creates a responder for `interaction`.
    #[must_use]
    pub const fn new(http: Arc<serenity::Http>, interaction: serenity::CommandInteraction) -> Self {
        Self {
            http,
            interaction,
            responded: AtomicBool::new(false),
        }
    }

    async fn respond(&self, reply: &Reply) -> Result<()> {
        let mut message =
            serenity::CreateInteractionResponseMessage::new().ephemeral(reply.ephemeral);
        if !reply.text.is_empty() {
            message = message.content(reply.text.clone());
        }
        if let Some(embed) = &reply.embed {
            message = message.embed(create_embed(embed));
        }

        self.interaction
            .create_response(&self.http, serenity::CreateInteractionResponse::Message(message))
            .await?;
        Ok(())
    }

    async fn follow_up(&self, reply: &Reply) -> Result<()> {
        let mut followup =
            serenity::CreateInteractionResponseFollowup::new().ephemeral(reply.ephemeral);
        if !reply.text.is_empty() {
            followup = followup.content(reply.text.clone());
        }
        if let Some(embed) = &reply.embed {
            followup = followup.embed(create_embed(embed));
        }

        self.interaction.create_followup(&self.http, followup).await?;
        Ok(())
    }
}

#[async_trait]
impl Responder for InteractionResponder {
    async fn reply(&self, reply: Reply) -> Result<()> {
        if self.responded.swap(true, Ordering::SeqCst) {
            return self.follow_up(&reply).await;
        }

        let result = self.respond(&reply).await;
        if result.is_err() {
            // Nothing was acknowledged, so the next reply must try the initial response again.
            self.responded.store(false, Ordering::SeqCst);
        }
        result
    }
}
