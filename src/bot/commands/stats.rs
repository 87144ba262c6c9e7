//! `/stats` - command usage counters.

use crate::{
    core::{
        policy::{RateLimitConfig, ScopeLimit},
        registry::{CommandContext, CommandDescriptor, CommandHandler},
        telemetry,
    },
    errors::Result,
};
use async_trait::async_trait;
use sea_orm::DatabaseConnection;
use std::{fmt::Write as _, time::Duration};

/// How many commands the usage table shows.
const TOP_COMMANDS: usize = 5;

/// Reports how often commands have run and failed.
pub struct Stats {
    database: DatabaseConnection,
}

impl Stats {
    /// Stats read from `database`.
    #[must_use]
    pub const fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    async fn render(&self) -> Result<String> {
        let totals = telemetry::command_totals(&self.database).await?;
        let usage = telemetry::usage_by_command(&self.database).await?;

        let mut text = format!(
            "📊 **Command usage**\nExecuted: {} | Failed: {}\n",
            totals.executed, totals.failed
        );
        if usage.is_empty() {
            text.push_str("No commands have run yet.");
            return Ok(text);
        }

        for row in usage.iter().take(TOP_COMMANDS) {
            let _ = writeln!(
                text,
                "• `/{}` - {} run, {} failed",
                row.command, row.executed, row.failed
            );
        }
        Ok(text)
    }
}

#[async_trait]
impl CommandHandler for Stats {
    async fn run(&self, ctx: CommandContext<'_>) -> Result<()> {
        let text = self.render().await?;
        ctx.say(text).await
    }
}

/// `/stats`. Every use counts against a shared global budget, and each user
/// may ask twice every thirty seconds.
#[must_use]
pub fn stats(database: DatabaseConnection) -> CommandDescriptor {
    CommandDescriptor::new("stats", "Shows command usage statistics", Stats::new(database))
        .ratelimit(
            RateLimitConfig::default()
                .with_global(ScopeLimit::passive(60, Duration::from_secs(60)))
                .with_user(ScopeLimit::strict(2, Duration::from_secs(30))),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        core::{
            registry::Invocation,
            telemetry::{DatabaseTelemetry, TelemetryCollector},
        },
        test_utils::{RecordingResponder, setup_test_db},
    };
    use poise::serenity_prelude::UserId;

    #[tokio::test]
    async fn test_stats_empty_database() -> Result<()> {
        let db = setup_test_db().await?;
        let text = Stats::new(db).render().await?;
        assert!(text.contains("Executed: 0 | Failed: 0"));
        assert!(text.contains("No commands have run yet."));
        Ok(())
    }

    #[tokio::test]
    async fn test_stats_reports_usage() -> Result<()> {
        let db = setup_test_db().await?;
        let telemetry = DatabaseTelemetry::new(db.clone());
        telemetry.increment_executed("ping").await?;
        telemetry.increment_executed("ping").await?;
        telemetry.increment_executed("about").await?;
        telemetry.increment_failed("about").await?;

        let invocation = Invocation::new("stats", UserId::new(1));
        let responder = RecordingResponder::default();
        let ctx = CommandContext {
            invocation: &invocation,
            responder: &responder,
            is_owner: false,
        };
        Stats::new(db).run(ctx).await?;

        let text = responder.last().map(|r| r.text).unwrap_or_default();
        assert!(text.contains("Executed: 3 | Failed: 1"));
        assert!(text.contains("`/ping` - 2 run, 0 failed"));
        assert!(text.contains("`/about` - 1 run, 1 failed"));
        Ok(())
    }
}
