//! Shared test utilities for the gatekeeper bot.
//!
//! This module provides an in-memory database, a manually driven clock, and
//! recording fakes for every collaborator the dispatcher talks to.

#![allow(clippy::unwrap_used)]

use crate::{
    core::{
        clock::Clock,
        permissions::PermissionEvaluator,
        registry::{CommandContext, CommandHandler, Reply, Responder},
        telemetry::TelemetryCollector,
    },
    errors::{Error, Result},
};
use async_trait::async_trait;
use poise::serenity_prelude::UserId;
use sea_orm::DatabaseConnection;
use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, AtomicUsize, Ordering},
    },
    time::Duration,
};

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all database tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    /// Moves the clock forward by `by`.
    pub fn advance(&self, by: Duration) {
        let ms = u64::try_from(by.as_millis()).unwrap();
        self.now.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Responder that records every reply, optionally failing each send.
#[derive(Debug, Default)]
pub struct RecordingResponder {
    replies: Mutex<Vec<Reply>>,
    fail: bool,
}

impl RecordingResponder {
    /// A responder whose every send fails.
    pub fn failing() -> Self {
        Self {
            replies: Mutex::default(),
            fail: true,
        }
    }

    /// Every reply sent so far.
    pub fn replies(&self) -> Vec<Reply> {
        self.replies.lock().unwrap().clone()
    }

    /// The most recent reply.
    pub fn last(&self) -> Option<Reply> {
        self.replies.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl Responder for RecordingResponder {
    async fn reply(&self, reply: Reply) -> Result<()> {
        if self.fail {
            return Err(Error::Command {
                message: "responder unavailable".to_string(),
            });
        }
        self.replies.lock().unwrap().push(reply);
        Ok(())
    }
}

/// Telemetry collector that counts calls, optionally failing each one.
#[derive(Debug, Default)]
pub struct RecordingTelemetry {
    executed: AtomicUsize,
    failed: AtomicUsize,
    fail: bool,
}

impl RecordingTelemetry {
    /// A collector whose every call fails (after counting).
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Number of `increment_executed` calls.
    pub fn executed(&self) -> usize {
        self.executed.load(Ordering::SeqCst)
    }

    /// Number of `increment_failed` calls.
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    fn outcome(&self) -> Result<()> {
        if self.fail {
            Err(Error::Command {
                message: "telemetry store unavailable".to_string(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl TelemetryCollector for RecordingTelemetry {
    async fn increment_executed(&self, _command: &str) -> Result<()> {
        self.executed.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }

    async fn increment_failed(&self, _command: &str) -> Result<()> {
        self.failed.fetch_add(1, Ordering::SeqCst);
        self.outcome()
    }
}

/// Permission evaluator with fixed owner, helper, and premium sets.
#[derive(Debug, Default)]
pub struct StaticEvaluator {
    owners: HashSet<UserId>,
    helpers: HashSet<UserId>,
    premium: HashSet<UserId>,
    premium_fails: bool,
}

impl StaticEvaluator {
    /// Evaluator with a single owner.
    pub fn with_owner(owner: UserId) -> Self {
        Self {
            owners: HashSet::from([owner]),
            ..Self::default()
        }
    }

    /// Adds a helper.
    pub fn helper(mut self, user_id: UserId) -> Self {
        self.helpers.insert(user_id);
        self
    }

    /// Adds a premium user.
    pub fn premium(mut self, user_id: UserId) -> Self {
        self.premium.insert(user_id);
        self
    }

    /// Makes every premium lookup fail.
    pub fn failing_premium(mut self) -> Self {
        self.premium_fails = true;
        self
    }
}

#[async_trait]
impl PermissionEvaluator for StaticEvaluator {
    fn is_owner(&self, user_id: UserId) -> bool {
        self.owners.contains(&user_id)
    }

    fn is_helper(&self, user_id: UserId) -> bool {
        self.helpers.contains(&user_id)
    }

    async fn is_premium(&self, user_id: UserId) -> Result<bool> {
        if self.premium_fails {
            return Err(Error::Command {
                message: "premium store unavailable".to_string(),
            });
        }
        Ok(self.premium.contains(&user_id))
    }
}

/// Handler that does nothing.
pub struct NoopHandler;

#[async_trait]
impl CommandHandler for NoopHandler {
    async fn run(&self, _ctx: CommandContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Handler that counts its calls. Clones share the same counters.
#[derive(Debug, Clone, Default)]
pub struct CountingHandler {
    calls: Arc<AtomicUsize>,
    owner_calls: Arc<AtomicUsize>,
}

impl CountingHandler {
    /// Number of times the handler ran.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Number of runs where the caller was an owner.
    pub fn owner_calls(&self) -> usize {
        self.owner_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CommandHandler for CountingHandler {
    async fn run(&self, ctx: CommandContext<'_>) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if ctx.is_owner {
            self.owner_calls.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

/// Handler that always fails.
pub struct FailingHandler;

impl FailingHandler {
    /// Internal error text that must never reach the caller.
    pub const MESSAGE: &'static str = "database row 42 is corrupt";
}

#[async_trait]
impl CommandHandler for FailingHandler {
    async fn run(&self, _ctx: CommandContext<'_>) -> Result<()> {
        Err(Error::Command {
            message: Self::MESSAGE.to_string(),
        })
    }
}

/// Handler that never finishes.
pub struct PendingHandler;

#[async_trait]
impl CommandHandler for PendingHandler {
    async fn run(&self, _ctx: CommandContext<'_>) -> Result<()> {
        std::future::pending::<()>().await;
        Ok(())
    }
}
