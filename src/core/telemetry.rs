//! Command execution telemetry - counters for executed and failed commands.
//!
//! The dispatcher reports through [`TelemetryCollector`]; the bot persists the
//! counters per command with [`DatabaseTelemetry`]. Each increment is a single
//! `INSERT ... ON CONFLICT (command) DO UPDATE SET n = n + 1` statement, so
//! concurrent interactions never lose increments, including a command's first.

use crate::{
    entities::{CommandStat, command_stat},
    errors::Result,
};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    QueryOrder, Set,
    prelude::*,
    sea_query::{Expr, OnConflict},
};

/// Sink for command execution counters.
#[async_trait]
pub trait TelemetryCollector: Send + Sync {
    /// Records that `command`'s handler started.
    async fn increment_executed(&self, command: &str) -> Result<()>;

    /// Records that `command`'s handler failed.
    async fn increment_failed(&self, command: &str) -> Result<()>;
}

/// Totals across every command.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommandTotals {
    /// Handlers started
    pub executed: i64,
    /// Handlers that failed
    pub failed: i64,
}

#[derive(Debug, Clone, Copy)]
enum Counter {
    Executed,
    Failed,
}

impl Counter {
    const fn column(self) -> command_stat::Column {
        match self {
            Self::Executed => command_stat::Column::Executed,
            Self::Failed => command_stat::Column::Failed,
        }
    }
}

/// Telemetry collector persisting counters in the `command_stats` table.
#[derive(Debug, Clone)]
pub struct DatabaseTelemetry {
    database: DatabaseConnection,
}

impl DatabaseTelemetry {
    /// Creates a collector writing to `database`.
    #[must_use]
    pub const fn new(database: DatabaseConnection) -> Self {
        Self { database }
    }

    async fn increment(&self, command: &str, counter: Counter) -> Result<()> {
        let now = Utc::now().naive_utc();
        let (executed, failed) = match counter {
            Counter::Executed => (1, 0),
            Counter::Failed => (0, 1),
        };
        let row = command_stat::ActiveModel {
            command: Set(command.to_string()),
            executed: Set(executed),
            failed: Set(failed),
            updated_at: Set(now),
            ..Default::default()
        };

        CommandStat::insert(row)
            .on_conflict(
                OnConflict::column(command_stat::Column::Command)
                    .value(counter.column(), Expr::col(counter.column()).add(1))
                    .value(command_stat::Column::UpdatedAt, Expr::value(now))
                    .to_owned(),
            )
            .exec_without_returning(&self.database)
            .await?;

        Ok(())
    }
}

#[async_trait]
impl TelemetryCollector for DatabaseTelemetry {
    async fn increment_executed(&self, command: &str) -> Result<()> {
        self.increment(command, Counter::Executed).await
    }

    async fn increment_failed(&self, command: &str) -> Result<()> {
        self.increment(command, Counter::Failed).await
    }
}

/// Sums the counters of every command.
pub async fn command_totals(db: &DatabaseConnection) -> Result<CommandTotals> {
    let rows = CommandStat::find().all(db).await?;
    Ok(rows.iter().fold(CommandTotals::default(), |acc, row| CommandTotals {
        executed: acc.executed + row.executed,
        failed: acc.failed + row.failed,
    }))
}

/// Per-command counters, most used first.
pub async fn usage_by_command(db: &DatabaseConnection) -> Result<Vec<command_stat::Model>> {
    CommandStat::find()
        .order_by_desc(command_stat::Column::Executed)
        .order_by_asc(command_stat::Column::Command)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Counters for a single command, if it has ever run.
pub async fn stats_for_command(
    db: &DatabaseConnection,
    command: &str,
) -> Result<Option<command_stat::Model>> {
    CommandStat::find()
        .filter(command_stat::Column::Command.eq(command))
        .one(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::setup_test_db;

    #[tokio::test]
    async fn test_first_increment_creates_row() -> Result<()> {
        let db = setup_test_db().await?;
        let telemetry = DatabaseTelemetry::new(db.clone());

        assert!(stats_for_command(&db, "ping").await?.is_none());

        telemetry.increment_executed("ping").await?;
        let stats = stats_for_command(&db, "ping").await?;
        assert!(stats.as_ref().is_some_and(|s| s.executed == 1 && s.failed == 0));

        Ok(())
    }

    #[tokio::test]
    async fn test_counters_accumulate_per_command() -> Result<()> {
        let db = setup_test_db().await?;
        let telemetry = DatabaseTelemetry::new(db.clone());

        for _ in 0..3 {
            telemetry.increment_executed("ping").await?;
        }
        telemetry.increment_failed("ping").await?;
        telemetry.increment_executed("help").await?;
        telemetry.increment_failed("about").await?;

        let totals = command_totals(&db).await?;
        assert_eq!(totals, CommandTotals { executed: 4, failed: 2 });

        let usage = usage_by_command(&db).await?;
        let names: Vec<_> = usage.iter().map(|s| s.command.as_str()).collect();
        assert_eq!(names, ["ping", "help", "about"]);
        assert_eq!(usage[0].executed, 3);
        assert_eq!(usage[0].failed, 1);

        Ok(())
    }

    #[tokio::test]
    async fn test_concurrent_first_increments_are_all_counted() -> Result<()> {
        let db = setup_test_db().await?;
        let telemetry = DatabaseTelemetry::new(db.clone());

        let (a, b, c) = tokio::join!(
            telemetry.increment_executed("ping"),
            telemetry.increment_executed("ping"),
            telemetry.increment_failed("ping"),
        );
        a?;
        b?;
        c?;

        let stats = stats_for_command(&db, "ping").await?;
        assert!(stats.as_ref().is_some_and(|s| s.executed == 2 && s.failed == 1));
        assert_eq!(usage_by_command(&db).await?.len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_totals_empty_database() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(command_totals(&db).await?, CommandTotals::default());
        Ok(())
    }
}
