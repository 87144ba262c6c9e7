//! Bot layer - Discord-specific interface and command handlers
//!
//! Commands are not poise commands: every slash command interaction is routed
//! from the poise event handler into the [`InteractionDispatcher`], which runs
//! authorization and rate limiting before the command's handler.

/// Bundled slash commands
pub mod commands;
/// Discord interaction handlers
pub mod handlers;

use crate::{
    config::settings::Settings,
    core::{
        dispatch::InteractionDispatcher,
        permissions::BotPermissionEvaluator,
        policy::RateLimiterRegistry,
        registry::{CommandMap, CommandRegistry},
        telemetry::DatabaseTelemetry,
    },
    errors::{Error, Result},
};
use poise::serenity_prelude as serenity;
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

/// Environment variable naming a guild to register commands in instead of globally.
pub const DEV_GUILD_VAR: &str = "DEV_GUILD_ID";

/// Shared data available to the event handler.
pub struct BotData {
    /// Routes interactions to commands
    pub dispatcher: Arc<InteractionDispatcher>,
    /// Every registered command
    pub commands: Arc<CommandMap>,
}

impl BotData {
    /// Wires the dispatcher and commands to `database` according to `settings`.
    #[must_use]
    pub fn new(settings: &Settings, database: &DatabaseConnection) -> Self {
        let commands = Arc::new(commands::build_registry(database, settings));
        let evaluator = Arc::new(BotPermissionEvaluator::new(
            settings.owners(),
            settings.helpers(),
            database.clone(),
        ));
        let telemetry = Arc::new(DatabaseTelemetry::new(database.clone()));

        let dispatcher = InteractionDispatcher::new(
            Arc::clone(&commands) as Arc<dyn CommandRegistry>,
            evaluator,
            Arc::new(RateLimiterRegistry::default()),
            telemetry,
        )
        .development_mode(settings.development_mode())
        .handler_timeout(settings.handler_timeout());

        Self {
            dispatcher: Arc::new(dispatcher),
            commands,
        }
    }
}

async fn on_error(error: poise::FrameworkError<'_, BotData, Error>) {
    match error {
        poise::FrameworkError::Setup { error, .. } => {
            error!("Failed to start bot: {:?}", error);
        }
        poise::FrameworkError::EventHandler { error, event, .. } => {
            error!("Error handling {}: {:?}", event.snake_case_name(), error);
        }
        error => {
            if let Err(e) = poise::builtins::on_error(error).await {
                error!("Error while handling error: {}", e);
            }
        }
    }
}

async fn event_handler(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, BotData, Error>,
    data: &BotData,
) -> Result<()> {
    let serenity::FullEvent::InteractionCreate { interaction } = event else {
        return Ok(());
    };
    let serenity::Interaction::Command(command) = interaction else {
        return Ok(());
    };

    let invocation = handlers::invocation_from(command);
    let responder = handlers::InteractionResponder::new(Arc::clone(&ctx.http), command.clone());
    if let Err(rejection) = data.dispatcher.dispatch(&invocation, &responder).await {
        debug!(
            command = %invocation.command,
            user = %invocation.user_id,
            "Interaction ended early: {}",
            rejection
        );
    }
    Ok(())
}

fn dev_guild() -> Option<serenity::GuildId> {
    let raw = std::env::var(DEV_GUILD_VAR).ok()?;
    match raw.trim().parse::<u64>() {
        Ok(id) if id != 0 => Some(serenity::GuildId::new(id)),
        _ => {
            error!("Ignoring invalid {} {:?}", DEV_GUILD_VAR, raw);
            None
        }
    }
}

async fn register_commands(
    ctx: &serenity::Context,
    definitions: Vec<serenity::CreateCommand>,
) -> Result<()> {
    let count = definitions.len();
    if let Some(guild_id) = dev_guild() {
        guild_id.set_commands(&ctx.http, definitions).await?;
        info!("Registered {} commands in guild {}", count, guild_id);
    } else {
        serenity::Command::set_global_commands(&ctx.http, definitions).await?;
        info!("Registered {} commands globally", count);
    }
    Ok(())
}

/// Connects to Discord and serves slash commands until the client stops.
#[instrument(skip_all)]
pub async fn run_bot(
    token: String,
    settings: Settings,
    database: DatabaseConnection,
) -> Result<()> {
    let data = BotData::new(&settings, &database);
    let definitions = commands::create_commands(&data.commands);

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: vec![],
            event_handler: |ctx, event, framework, data| {
                Box::pin(event_handler(ctx, event, framework, data))
            },
            on_error: |error| Box::pin(on_error(error)),
            ..Default::default()
        })
        .setup(move |ctx, ready, _framework| {
            Box::pin(async move {
                info!("Logged in as {}", ready.user.name);
                register_commands(ctx, definitions).await?;
                Ok(data)
            })
        })
        .build();

    let intents = serenity::GatewayIntents::GUILDS;

    info!("Setting up Serenity client for Poise framework...");
    let mut client = serenity::ClientBuilder::new(&token, intents)
        .framework(framework)
        .await
        .inspect_err(|e| error!("Error creating client: {:?}", e))?;

    info!("Starting bot client...");
    client
        .start()
        .await
        .inspect_err(|e| error!("Client error: {:?}", e))?;
    Ok(())
}
