//! Caller capability lookups used by the authorization gate.
//!
//! Discord permissions are `serenity::Permissions` bitflags, so "has every
//! required permission" is a subset test. Owner, helper, and premium status come
//! from a [`PermissionEvaluator`].

use crate::{core::premium, errors::Result};
use async_trait::async_trait;
use poise::serenity_prelude::{Permissions, UserId};
use sea_orm::DatabaseConnection;
use std::collections::HashSet;

/// Answers who the caller is, as far as authorization is concerned.
#[async_trait]
pub trait PermissionEvaluator: Send + Sync {
    /// Whether `user_id` is a bot owner (superuser).
    fn is_owner(&self, user_id: UserId) -> bool;

    /// Whether `user_id` may run helper-only commands.
    fn is_helper(&self, _user_id: UserId) -> bool {
        false
    }

    /// Whether `user_id` has premium access.
    async fn is_premium(&self, user_id: UserId) -> Result<bool>;
}

/// Permissions in `required` that `granted` lacks.
#[must_use]
pub fn missing_permissions(granted: Permissions, required: Permissions) -> Permissions {
    required.difference(granted)
}

/// Human-readable, comma-separated permission names ("Embed Links, Send Messages").
#[must_use]
pub fn describe_permissions(permissions: Permissions) -> String {
    permissions.get_permission_names().join(", ")
}

/// Evaluator backed by configured owner/helper lists and the premium table.
#[derive(Debug, Clone)]
pub struct BotPermissionEvaluator {
    owners: HashSet<UserId>,
    helpers: HashSet<UserId>,
    database: DatabaseConnection,
}

impl BotPermissionEvaluator {
    /// Creates an evaluator for the given owners and helpers.
    #[must_use]
    pub fn new(
        owners: impl IntoIterator<Item = UserId>,
        helpers: impl IntoIterator<Item = UserId>,
        database: DatabaseConnection,
    ) -> Self {
        Self {
            owners: owners.into_iter().collect(),
            helpers: helpers.into_iter().collect(),
            database,
        }
    }
}

#[async_trait]
impl PermissionEvaluator for BotPermissionEvaluator {
    fn is_owner(&self, user_id: UserId) -> bool {
        self.owners.contains(&user_id)
    }

    fn is_helper(&self, user_id: UserId) -> bool {
        self.helpers.contains(&user_id)
    }

    async fn is_premium(&self, user_id: UserId) -> Result<bool> {
        premium::is_premium(&self.database, user_id).await
    }
}
