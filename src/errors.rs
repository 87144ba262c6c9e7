//! Unified error types for the gatekeeper bot.
//!
//! [`Error`] covers application-level failures (configuration, database, Discord
//! framework). [`DispatchError`] is the taxonomy of interaction outcomes that the
//! dispatcher handles locally: every variant is turned into a user-facing reply at
//! the dispatcher boundary and never propagates further.

use crate::core::{authorization::AuthorizationDenial, duration::format_duration, policy::Scope};
use std::time::Duration;
use thiserror::Error;

/// Application error type shared by configuration, persistence, and command code.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration file or value could not be loaded
    #[error("Configuration error: {message}")]
    Config {
        /// Human-readable description of the problem
        message: String,
    },

    /// Database operation failed
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Filesystem or socket I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Required environment variable missing or malformed
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    /// A command could not complete its work
    #[error("Command execution error: {message}")]
    Command {
        /// Description of the failure, logged but never shown to users
        message: String,
    },

    /// A command handler exceeded the configured execution timeout
    #[error("Command `{command}` timed out after {timeout:?}")]
    Timeout {
        /// Name of the command that timed out
        command: String,
        /// Configured timeout
        timeout: Duration,
    },

    /// Serenity/Poise framework failure
    #[error("Serenity/Poise framework error: {0}")]
    #[allow(clippy::enum_variant_names)]
    FrameworkError(Box<poise::serenity_prelude::Error>),
}

impl From<poise::serenity_prelude::Error> for Error {
    fn from(value: poise::serenity_prelude::Error) -> Self {
        Self::FrameworkError(Box::new(value))
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons an interaction did not complete successfully.
///
/// The first three variants are rejections (the handler never ran); the last is
/// a failure of the handler itself.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// No command is registered under the requested name
    #[error("command `{name}` not found")]
    CommandNotFound {
        /// Name the caller asked for
        name: String,
    },

    /// One of the authorization checks failed
    #[error("authorization denied: {0}")]
    AuthorizationDenied(AuthorizationDenial),

    /// A strict rate-limit scope is exhausted
    #[error("rate limited at {scope} scope for {remaining:?}")]
    RateLimited {
        /// Scope that rejected the call
        scope: Scope,
        /// Time until the scope's window resets
        remaining: Duration,
    },

    /// The command handler returned an error or timed out
    #[error("command handler failed: {source}")]
    HandlerFailure {
        /// Underlying failure; never shown to the caller
        #[source]
        source: Error,
    },
}

impl DispatchError {
    /// Message shown to the caller for this outcome.
    ///
    /// Handler failures always get the same generic text so internal causes never leak.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::CommandNotFound { name } => {
                format!("❌ The command `{name}` could not be found.")
            }
            Self::AuthorizationDenied(denial) => denial.user_message(),
            Self::RateLimited { scope, remaining } => format!(
                "⏳ {} Try again in {}.",
                scope.limited_message(),
                format_duration(*remaining)
            ),
            Self::HandlerFailure { .. } => {
                "❌ Something went wrong while running this command. Please try again later."
                    .to_string()
            }
        }
    }

    /// Whether the handler never ran because a check turned the call away.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        !matches!(self, Self::HandlerFailure { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_failure_message_hides_cause() {
        let err = DispatchError::HandlerFailure {
            source: Error::Command {
                message: "secret table exploded".to_string(),
            },
        };
        assert!(!err.user_message().contains("secret"));
        assert!(!err.is_rejection());
    }

    #[test]
    fn test_rate_limited_message_includes_wait() {
        let err = DispatchError::RateLimited {
            scope: Scope::User,
            remaining: Duration::from_secs(120),
        };
        assert!(err.user_message().contains("2 minutes"));
        assert!(err.is_rejection());
    }

    #[test]
    fn test_command_not_found_names_command() {
        let err = DispatchError::CommandNotFound {
            name: "nope".to_string(),
        };
        assert!(err.user_message().contains("`nope`"));
    }
}
