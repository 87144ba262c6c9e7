//! Per-command rate-limit policies and the registry that owns their state.
//!
//! A policy bundles up to three [`RateLimitManager`]s (global, guild, user). Each
//! configured scope is either *strict* (an exhausted scope blocks the command) or
//! *passive* (quota is consumed on every evaluation but never blocks).
//!
//! Scopes are evaluated in the fixed order global → guild → user. A strict scope
//! that is limited stops evaluation immediately. Strict scopes that pass are only
//! consumed once every strict scope has passed, so a rejection never leaves a
//! strict scope partially charged. Passive scopes are consumed as soon as they
//! are reached.

use crate::core::{
    clock::{Clock, MonotonicClock},
    limiter::RateLimitManager,
};
use dashmap::DashMap;
use poise::serenity_prelude::{GuildId, UserId};
use serde::Deserialize;
use std::{fmt, sync::Arc, time::Duration};
use tracing::debug;

/// Granularity at which a rate limit is tracked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// One bucket per command, shared by every caller
    Global,
    /// One bucket per guild
    Guild,
    /// One bucket per user
    User,
}

impl Scope {
    /// Evaluation order of scopes within a policy.
    pub const ORDER: [Self; 3] = [Self::Global, Self::Guild, Self::User];

    /// First sentence of the wait message shown when this scope rejects a call.
    #[must_use]
    pub const fn limited_message(self) -> &'static str {
        match self {
            Self::Global => "This command is being used too much right now.",
            Self::Guild => "This command is being used too much in this server.",
            Self::User => "You are using this command too quickly.",
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Global => f.write_str("global"),
            Self::Guild => f.write_str("guild"),
            Self::User => f.write_str("user"),
        }
    }
}

const fn default_strict() -> bool {
    true
}

/// Limit for one scope, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct ScopeLimit {
    /// Units allowed per window
    pub limit: u32,
    /// Window length in milliseconds
    pub window_ms: u64,
    /// Whether exhaustion blocks the command (`true`) or is only tracked (`false`)
    #[serde(default = "default_strict")]
    pub strict: bool,
}

impl ScopeLimit {
    /// A scope that blocks the command once exhausted.
    #[must_use]
    pub fn strict(limit: u32, window: Duration) -> Self {
        Self {
            limit,
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
            strict: true,
        }
    }

    /// A scope that is consumed on every call but never blocks.
    #[must_use]
    pub fn passive(limit: u32, window: Duration) -> Self {
        Self {
            strict: false,
            ..Self::strict(limit, window)
        }
    }

    /// Window length as a `Duration`.
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

/// Rate-limit configuration attached to a command descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct RateLimitConfig {
    /// Limit shared by every caller of the command
    pub global: Option<ScopeLimit>,
    /// Limit per guild
    pub guild: Option<ScopeLimit>,
    /// Limit per user
    pub user: Option<ScopeLimit>,
}

impl RateLimitConfig {
    /// Sets the global scope limit.
    #[must_use]
    pub const fn with_global(mut self, limit: ScopeLimit) -> Self {
        self.global = Some(limit);
        self
    }

    /// Sets the guild scope limit.
    #[must_use]
    pub const fn with_guild(mut self, limit: ScopeLimit) -> Self {
        self.guild = Some(limit);
        self
    }

    /// Sets the user scope limit.
    #[must_use]
    pub const fn with_user(mut self, limit: ScopeLimit) -> Self {
        self.user = Some(limit);
        self
    }

    /// Limit configured for `scope`, if any.
    #[must_use]
    pub const fn scope(&self, scope: Scope) -> Option<ScopeLimit> {
        match scope {
            Scope::Global => self.global,
            Scope::Guild => self.guild,
            Scope::User => self.user,
        }
    }
}

/// Outcome of evaluating a policy for one call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyDecision {
    /// Every strict scope passed; the command may run
    Proceed,
    /// A strict scope is exhausted
    Rejected {
        /// Scope that rejected the call
        scope: Scope,
        /// Time until that scope's window resets
        remaining: Duration,
    },
}

#[derive(Debug)]
struct ScopedManager {
    manager: RateLimitManager,
    strict: bool,
}

impl ScopedManager {
    fn from_limit(limit: ScopeLimit) -> Self {
        Self {
            manager: RateLimitManager::new(limit.limit, limit.window()),
            strict: limit.strict,
        }
    }
}

/// Live rate-limit state for one command.
#[derive(Debug)]
pub struct CommandRateLimitPolicy {
    global: Option<ScopedManager>,
    guild: Option<ScopedManager>,
    user: Option<ScopedManager>,
}

impl CommandRateLimitPolicy {
    /// Builds managers for every scope present in `config`.
    #[must_use]
    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self {
            global: config.global.map(ScopedManager::from_limit),
            guild: config.guild.map(ScopedManager::from_limit),
            user: config.user.map(ScopedManager::from_limit),
        }
    }

    /// Manager for `scope`, if the scope is configured.
    #[must_use]
    pub fn manager(&self, scope: Scope) -> Option<&RateLimitManager> {
        self.scoped(scope).map(|scoped| &scoped.manager)
    }

    const fn scoped(&self, scope: Scope) -> Option<&ScopedManager> {
        match scope {
            Scope::Global => self.global.as_ref(),
            Scope::Guild => self.guild.as_ref(),
            Scope::User => self.user.as_ref(),
        }
    }

    /// Evaluates every configured scope for one call at time `now`.
    ///
    /// The guild scope is skipped entirely when `guild_id` is `None`.
    pub fn evaluate(
        &self,
        command: &str,
        guild_id: Option<GuildId>,
        user_id: UserId,
        now: u64,
    ) -> PolicyDecision {
        let mut passed = Vec::with_capacity(Scope::ORDER.len());

        for scope in Scope::ORDER {
            let Some(scoped) = self.scoped(scope) else {
                continue;
            };
            let identifier = match scope {
                Scope::Global => command.to_string(),
                Scope::Guild => match guild_id {
                    Some(guild_id) => guild_id.to_string(),
                    None => continue,
                },
                Scope::User => user_id.to_string(),
            };

            let handle = scoped.manager.acquire(&identifier, now);
            if !scoped.strict {
                handle.consume();
                continue;
            }

            let state = handle.state();
            if state.limited {
                debug!(
                    command,
                    %scope,
                    identifier = %identifier,
                    remaining_ms = u64::try_from(state.remaining.as_millis()).unwrap_or(u64::MAX),
                    "Rate limit reached"
                );
                return PolicyDecision::Rejected {
                    scope,
                    remaining: state.remaining,
                };
            }
            passed.push(handle);
        }

        for handle in passed {
            handle.consume();
        }
        PolicyDecision::Proceed
    }
}

/// Owner of every command's rate-limit state.
///
/// Injected into the dispatcher; tests get isolation by building a fresh one.
#[derive(Debug)]
pub struct RateLimiterRegistry {
    policies: DashMap<String, Arc<CommandRateLimitPolicy>>,
    clock: Arc<dyn Clock>,
}

impl Default for RateLimiterRegistry {
    fn default() -> Self {
        Self::new(Arc::new(MonotonicClock::default()))
    }
}

impl RateLimiterRegistry {
    /// Creates an empty registry driven by `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            policies: DashMap::new(),
            clock,
        }
    }

    /// Evaluates the policy of `command`, creating its state from `config` on first use.
    pub fn evaluate(
        &self,
        command: &str,
        config: &RateLimitConfig,
        guild_id: Option<GuildId>,
        user_id: UserId,
    ) -> PolicyDecision {
        let policy = Arc::clone(
            self.policies
                .entry(command.to_string())
                .or_insert_with(|| Arc::new(CommandRateLimitPolicy::from_config(config)))
                .value(),
        );

        policy.evaluate(command, guild_id, user_id, self.clock.now_millis())
    }

    /// State for `command`, if it has been evaluated at least once.
    #[must_use]
    pub fn policy(&self, command: &str) -> Option<Arc<CommandRateLimitPolicy>> {
        self.policies
            .get(command)
            .map(|policy| Arc::clone(policy.value()))
    }
}
