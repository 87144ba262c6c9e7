//! Authorization gate - the ordered checks run before rate limiting.
//!
//! Checks run in [`AuthorizationCheck::ORDER`] and the first failure wins, so a
//! caller only ever sees one rejection per invocation. Owners bypass every check
//! except the bot-permission check: the bot cannot act without its own
//! permissions no matter who asks.

use crate::core::{
    permissions::{PermissionEvaluator, describe_permissions, missing_permissions},
    registry::{CommandDescriptor, Invocation},
};
use poise::serenity_prelude::{Permissions, UserId};
use std::{fmt, sync::Arc};
use tracing::{debug, warn};

/// The individual checks of the gate, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthorizationCheck {
    /// Command switched off
    Disabled,
    /// Owner-only command
    SuperUserOnly,
    /// Premium-only command
    PremiumOnly,
    /// Helper-only command
    HelperUserOnly,
    /// Bot lacks required permissions
    BotPermissions,
    /// Caller lacks required permissions
    UserPermissions,
}

impl AuthorizationCheck {
    /// Evaluation order. Changing it changes which rejection callers see.
    pub const ORDER: [Self; 6] = [
        Self::Disabled,
        Self::SuperUserOnly,
        Self::PremiumOnly,
        Self::HelperUserOnly,
        Self::BotPermissions,
        Self::UserPermissions,
    ];
}

/// A failed authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDenial {
    /// The command is disabled
    Disabled,
    /// The command is restricted to owners
    SuperUserOnly,
    /// The command is restricted to premium users
    PremiumOnly,
    /// The command is restricted to helpers
    HelperUserOnly,
    /// The bot is missing these permissions
    MissingBotPermissions(Permissions),
    /// The caller is missing these permissions
    MissingUserPermissions(Permissions),
}

impl AuthorizationDenial {
    /// The check that produced this denial.
    #[must_use]
    pub const fn check(&self) -> AuthorizationCheck {
        match self {
            Self::Disabled => AuthorizationCheck::Disabled,
            Self::SuperUserOnly => AuthorizationCheck::SuperUserOnly,
            Self::PremiumOnly => AuthorizationCheck::PremiumOnly,
            Self::HelperUserOnly => AuthorizationCheck::HelperUserOnly,
            Self::MissingBotPermissions(_) => AuthorizationCheck::BotPermissions,
            Self::MissingUserPermissions(_) => AuthorizationCheck::UserPermissions,
        }
    }

    /// Message shown to the caller.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Disabled => "🚫 This command is currently unavailable.".to_string(),
            Self::SuperUserOnly => "🔒 Only the bot owner can use this command.".to_string(),
            Self::PremiumOnly => "💎 This command is only available to premium users.".to_string(),
            Self::HelperUserOnly => "🛠️ Only bot helpers can use this command.".to_string(),
            Self::MissingBotPermissions(missing) => format!(
                "⚠️ I need the following permissions to run this command: {}",
                describe_permissions(*missing)
            ),
            Self::MissingUserPermissions(missing) => format!(
                "🔒 You need the following permissions to use this command: {}",
                describe_permissions(*missing)
            ),
        }
    }
}

impl fmt::Display for AuthorizationDenial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("command disabled"),
            Self::SuperUserOnly => f.write_str("owner only"),
            Self::PremiumOnly => f.write_str("premium only"),
            Self::HelperUserOnly => f.write_str("helper only"),
            Self::MissingBotPermissions(missing) => write!(f, "bot missing {missing:?}"),
            Self::MissingUserPermissions(missing) => write!(f, "user missing {missing:?}"),
        }
    }
}

/// Runs the authorization checks for an invocation.
#[derive(Clone)]
pub struct AuthorizationGate {
    evaluator: Arc<dyn PermissionEvaluator>,
}

impl AuthorizationGate {
    /// Creates a gate backed by `evaluator`.
    #[must_use]
    pub fn new(evaluator: Arc<dyn PermissionEvaluator>) -> Self {
        Self { evaluator }
    }

    /// Whether `user_id` is an owner.
    #[must_use]
    pub fn is_owner(&self, user_id: UserId) -> bool {
        self.evaluator.is_owner(user_id)
    }

    /// Runs every check in order, returning the first denial.
    pub async fn authorize(
        &self,
        descriptor: &CommandDescriptor,
        invocation: &Invocation,
    ) -> Result<(), AuthorizationDenial> {
        let is_owner = self.is_owner(invocation.user_id);

        for check in AuthorizationCheck::ORDER {
            if let Some(denial) = self.evaluate(check, descriptor, invocation, is_owner).await {
                debug!(
                    command = %descriptor.name,
                    user_id = %invocation.user_id,
                    ?check,
                    "Authorization denied"
                );
                return Err(denial);
            }
        }

        Ok(())
    }

    async fn evaluate(
        &self,
        check: AuthorizationCheck,
        descriptor: &CommandDescriptor,
        invocation: &Invocation,
        is_owner: bool,
    ) -> Option<AuthorizationDenial> {
        match check {
            AuthorizationCheck::Disabled => {
                (descriptor.disabled && !is_owner).then_some(AuthorizationDenial::Disabled)
            }
            AuthorizationCheck::SuperUserOnly => (descriptor.super_user_only && !is_owner)
                .then_some(AuthorizationDenial::SuperUserOnly),
            AuthorizationCheck::PremiumOnly => {
                if !descriptor.premium_only || is_owner {
                    return None;
                }
                (!self.is_premium(invocation.user_id).await)
                    .then_some(AuthorizationDenial::PremiumOnly)
            }
            AuthorizationCheck::HelperUserOnly => (descriptor.helper_user_only
                && !is_owner
                && !self.evaluator.is_helper(invocation.user_id))
            .then_some(AuthorizationDenial::HelperUserOnly),
            AuthorizationCheck::BotPermissions => {
                let missing = missing_permissions(
                    invocation.bot_permissions,
                    descriptor.required_bot_permissions,
                );
                (!missing.is_empty()).then_some(AuthorizationDenial::MissingBotPermissions(missing))
            }
            AuthorizationCheck::UserPermissions => {
                if is_owner {
                    return None;
                }
                let missing = missing_permissions(
                    invocation.user_permissions,
                    descriptor.required_user_permissions,
                );
                (!missing.is_empty())
                    .then_some(AuthorizationDenial::MissingUserPermissions(missing))
            }
        }
    }

    async fn is_premium(&self, user_id: UserId) -> bool {
        // A failed lookup denies access rather than failing the whole interaction.
        self.evaluator
            .is_premium(user_id)
            .await
            .inspect_err(|e| warn!("Premium lookup failed for {}: {}", user_id, e))
            .unwrap_or(false)
    }
}
