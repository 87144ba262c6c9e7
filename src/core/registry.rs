//! Command registry - descriptors, handlers, and the data an invocation carries.
//!
//! Everything here is framework-agnostic: the bot layer converts Discord
//! interactions into [`Invocation`]s and implements [`Responder`] on top of the
//! interaction API, while commands implement [`CommandHandler`].

use crate::{core::policy::RateLimitConfig, errors::Result};
use async_trait::async_trait;
use poise::serenity_prelude::{GuildId, Permissions, UserId};
use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    sync::Arc,
};

/// A single resolved option value supplied with a command.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionValue {
    /// Free text or a string choice
    String(String),
    /// Whole number
    Integer(i64),
    /// Floating point number
    Number(f64),
    /// True/false flag
    Boolean(bool),
    /// A Discord user
    User(UserId),
}

/// Options supplied with an invocation, keyed by option name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommandOptions(BTreeMap<String, OptionValue>);

impl CommandOptions {
    /// Adds an option, replacing any previous value with the same name.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: OptionValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    /// String option by name.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.0.get(name) {
            Some(OptionValue::String(value)) => Some(value),
            _ => None,
        }
    }

    /// User option by name.
    #[must_use]
    pub fn user(&self, name: &str) -> Option<UserId> {
        match self.0.get(name) {
            Some(OptionValue::User(value)) => Some(*value),
            _ => None,
        }
    }

    /// Boolean option by name.
    #[must_use]
    pub fn boolean(&self, name: &str) -> Option<bool> {
        match self.0.get(name) {
            Some(OptionValue::Boolean(value)) => Some(*value),
            _ => None,
        }
    }

    /// Whether no options were supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, OptionValue)> for CommandOptions {
    fn from_iter<I: IntoIterator<Item = (String, OptionValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// One inbound command event, already stripped of Discord specifics.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// Name of the requested command
    pub command: String,
    /// Caller
    pub user_id: UserId,
    /// Guild the command was used in; `None` in direct messages
    pub guild_id: Option<GuildId>,
    /// Permissions the bot holds where the command was used
    pub bot_permissions: Permissions,
    /// Permissions the caller holds where the command was used
    pub user_permissions: Permissions,
    /// Options supplied with the command
    pub options: CommandOptions,
}

impl Invocation {
    /// Invocation with no guild, no permissions, and no options.
    #[must_use]
    pub fn new(command: impl Into<String>, user_id: UserId) -> Self {
        Self {
            command: command.into(),
            user_id,
            guild_id: None,
            bot_permissions: Permissions::empty(),
            user_permissions: Permissions::empty(),
            options: CommandOptions::default(),
        }
    }

    /// Marks the invocation as coming from a guild.
    #[must_use]
    pub fn in_guild(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    /// Sets the permissions held by the bot.
    #[must_use]
    pub fn with_bot_permissions(mut self, permissions: Permissions) -> Self {
        self.bot_permissions = permissions;
        self
    }

    /// Sets the permissions held by the caller.
    #[must_use]
    pub fn with_user_permissions(mut self, permissions: Permissions) -> Self {
        self.user_permissions = permissions;
        self
    }

    /// Sets the supplied options.
    #[must_use]
    pub fn with_options(mut self, options: CommandOptions) -> Self {
        self.options = options;
        self
    }
}

/// Rich embed attached to a reply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplyEmbed {
    /// Embed title
    pub title: String,
    /// Body text
    pub description: String,
    /// `(name, value, inline)` fields
    pub fields: Vec<(String, String, bool)>,
    /// Sidebar colour as `0xRRGGBB`
    pub colour: Option<u32>,
}

/// Payload sent back to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reply {
    /// Message content
    pub text: String,
    /// Whether only the caller can see the reply
    pub ephemeral: bool,
    /// Optional embed
    pub embed: Option<ReplyEmbed>,
}

impl Reply {
    /// Public reply with plain text.
    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Reply only the caller can see.
    #[must_use]
    pub fn ephemeral(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ephemeral: true,
            embed: None,
        }
    }

    /// Attaches an embed.
    #[must_use]
    pub fn with_embed(mut self, embed: ReplyEmbed) -> Self {
        self.embed = Some(embed);
        self
    }
}

/// Channel replies are sent through.
#[async_trait]
pub trait Responder: Send + Sync {
    /// Sends a reply to the caller.
    async fn reply(&self, reply: Reply) -> Result<()>;
}

/// What a handler gets to work with.
#[derive(Clone, Copy)]
pub struct CommandContext<'a> {
    /// The invocation being handled
    pub invocation: &'a Invocation,
    /// Where to send replies
    pub responder: &'a dyn Responder,
    /// Whether the caller is a bot owner
    pub is_owner: bool,
}

impl CommandContext<'_> {
    /// Sends a public plain-text reply.
    pub async fn say(&self, text: impl Into<String> + Send) -> Result<()> {
        self.responder.reply(Reply::text(text)).await
    }
}

/// A command's own logic.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Runs the command. Errors are reported to the caller as a generic failure.
    async fn run(&self, ctx: CommandContext<'_>) -> Result<()>;
}

/// Everything the dispatcher needs to know about a command.
#[derive(Clone)]
pub struct CommandDescriptor {
    /// Slash command name
    pub name: String,
    /// Short description shown in Discord
    pub description: String,
    /// Disabled commands can only be run by owners
    pub disabled: bool,
    /// Only owners may run this command
    pub super_user_only: bool,
    /// Only owners and premium users may run this command
    pub premium_only: bool,
    /// Only owners and helpers may run this command
    pub helper_user_only: bool,
    /// Permissions the bot needs where the command is used
    pub required_bot_permissions: Permissions,
    /// Permissions the caller needs where the command is used
    pub required_user_permissions: Permissions,
    /// Rate limits, if any
    pub ratelimit: Option<RateLimitConfig>,
    /// The command's logic
    pub handler: Arc<dyn CommandHandler>,
}

impl CommandDescriptor {
    /// Descriptor with no restrictions and no rate limit.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        handler: impl CommandHandler + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            disabled: false,
            super_user_only: false,
            premium_only: false,
            helper_user_only: false,
            required_bot_permissions: Permissions::empty(),
            required_user_permissions: Permissions::empty(),
            ratelimit: None,
            handler: Arc::new(handler),
        }
    }

    /// Sets whether the command is disabled.
    #[must_use]
    pub fn disabled(mut self, disabled: bool) -> Self {
        self.disabled = disabled;
        self
    }

    /// Restricts the command to owners.
    #[must_use]
    pub fn super_user_only(mut self) -> Self {
        self.super_user_only = true;
        self
    }

    /// Restricts the command to owners and premium users.
    #[must_use]
    pub fn premium_only(mut self, premium_only: bool) -> Self {
        self.premium_only = premium_only;
        self
    }

    /// Restricts the command to owners and helpers.
    #[must_use]
    pub fn helper_user_only(mut self) -> Self {
        self.helper_user_only = true;
        self
    }

    /// Permissions the bot must hold.
    #[must_use]
    pub fn bot_permissions(mut self, permissions: Permissions) -> Self {
        self.required_bot_permissions = permissions;
        self
    }

    /// Permissions the caller must hold.
    #[must_use]
    pub fn user_permissions(mut self, permissions: Permissions) -> Self {
        self.required_user_permissions = permissions;
        self
    }

    /// Rate limits applied after authorization.
    #[must_use]
    pub fn ratelimit(mut self, config: RateLimitConfig) -> Self {
        self.ratelimit = Some(config);
        self
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("disabled", &self.disabled)
            .field("super_user_only", &self.super_user_only)
            .field("premium_only", &self.premium_only)
            .field("helper_user_only", &self.helper_user_only)
            .field("required_bot_permissions", &self.required_bot_permissions)
            .field("required_user_permissions", &self.required_user_permissions)
            .field("ratelimit", &self.ratelimit)
            .finish_non_exhaustive()
    }
}

/// Source of command descriptors.
pub trait CommandRegistry: Send + Sync {
    /// Descriptor registered under `name`, if any.
    fn lookup(&self, name: &str) -> Option<Arc<CommandDescriptor>>;
}

/// In-memory registry keyed by command name.
#[derive(Debug, Default, Clone)]
pub struct CommandMap {
    commands: HashMap<String, Arc<CommandDescriptor>>,
}

impl CommandMap {
    /// Adds a command, replacing any previous command with the same name.
    #[must_use]
    pub fn register(mut self, descriptor: CommandDescriptor) -> Self {
        self.commands
            .insert(descriptor.name.clone(), Arc::new(descriptor));
        self
    }

    /// All registered commands, sorted by name.
    #[must_use]
    pub fn descriptors(&self) -> Vec<Arc<CommandDescriptor>> {
        let mut all: Vec<_> = self.commands.values().map(Arc::clone).collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Number of registered commands.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether no commands are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandRegistry for CommandMap {
    fn lookup(&self, name: &str) -> Option<Arc<CommandDescriptor>> {
        self.commands.get(name).map(Arc::clone)
    }
}
