//! Interaction dispatcher - routes one invocation through the full gate.
//!
//! Each invocation moves through `resolving → authorizing → rate-limiting →
//! executing` and ends completed, rejected, or errored. Rejections and errors are
//! answered here with an ephemeral reply; the returned outcome exists for logging
//! and tests and never needs further handling.

use crate::{
    core::{
        authorization::AuthorizationGate,
        permissions::PermissionEvaluator,
        policy::{PolicyDecision, RateLimiterRegistry},
        registry::{CommandContext, CommandDescriptor, CommandRegistry, Invocation, Reply, Responder},
        telemetry::TelemetryCollector,
    },
    errors::{DispatchError, Error},
};
use std::{sync::Arc, time::Duration};
use tracing::{debug, error, info, instrument, warn};

/// Result of dispatching one invocation. The caller has already been answered.
pub type DispatchOutcome = std::result::Result<(), DispatchError>;

/// Orchestrates command resolution, authorization, rate limiting, and execution.
pub struct InteractionDispatcher {
    registry: Arc<dyn CommandRegistry>,
    gate: AuthorizationGate,
    ratelimits: Arc<RateLimiterRegistry>,
    telemetry: Arc<dyn TelemetryCollector>,
    development_mode: bool,
    handler_timeout: Option<Duration>,
}

impl InteractionDispatcher {
    /// Creates a dispatcher in production mode with no handler timeout.
    #[must_use]
    pub fn new(
        registry: Arc<dyn CommandRegistry>,
        evaluator: Arc<dyn PermissionEvaluator>,
        ratelimits: Arc<RateLimiterRegistry>,
        telemetry: Arc<dyn TelemetryCollector>,
    ) -> Self {
        Self {
            registry,
            gate: AuthorizationGate::new(evaluator),
            ratelimits,
            telemetry,
            development_mode: false,
            handler_timeout: None,
        }
    }

    /// In development mode handler failures are not counted.
    #[must_use]
    pub fn development_mode(mut self, enabled: bool) -> Self {
        self.development_mode = enabled;
        self
    }

    /// Bounds handler execution; an elapsed timeout counts as a handler failure.
    #[must_use]
    pub fn handler_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.handler_timeout = timeout;
        self
    }

    /// Rate-limit state shared by every command.
    #[must_use]
    pub fn ratelimits(&self) -> &RateLimiterRegistry {
        &self.ratelimits
    }

    /// Handles one invocation end to end, answering the caller on rejection or failure.
    #[instrument(skip_all, fields(command = %invocation.command, user_id = %invocation.user_id))]
    pub async fn dispatch(&self, invocation: &Invocation, responder: &dyn Responder) -> DispatchOutcome {
        let outcome = self.process(invocation, responder).await;

        match &outcome {
            Ok(()) => debug!("Command completed"),
            Err(err) => {
                if err.is_rejection() {
                    debug!("Command rejected: {}", err);
                }
                // Best effort: a failed notice must not turn into another failure.
                if let Err(e) = responder.reply(Reply::ephemeral(err.user_message())).await {
                    error!("Failed to send error message: {}", e);
                }
            }
        }

        outcome
    }

    async fn process(&self, invocation: &Invocation, responder: &dyn Responder) -> DispatchOutcome {
        let descriptor = self.registry.lookup(&invocation.command).ok_or_else(|| {
            DispatchError::CommandNotFound {
                name: invocation.command.clone(),
            }
        })?;

        self.gate
            .authorize(&descriptor, invocation)
            .await
            .map_err(DispatchError::AuthorizationDenied)?;

        if let Some(config) = &descriptor.ratelimit {
            let decision = self.ratelimits.evaluate(
                &descriptor.name,
                config,
                invocation.guild_id,
                invocation.user_id,
            );
            if let PolicyDecision::Rejected { scope, remaining } = decision {
                return Err(DispatchError::RateLimited { scope, remaining });
            }
        }

        self.execute(&descriptor, invocation, responder).await
    }

    async fn execute(
        &self,
        descriptor: &CommandDescriptor,
        invocation: &Invocation,
        responder: &dyn Responder,
    ) -> DispatchOutcome {
        if let Err(e) = self.telemetry.increment_executed(&descriptor.name).await {
            warn!("Failed to record execution of `{}`: {}", descriptor.name, e);
        }

        let ctx = CommandContext {
            invocation,
            responder,
            is_owner: self.gate.is_owner(invocation.user_id),
        };
        let run = descriptor.handler.run(ctx);
        let result = match self.handler_timeout {
            Some(timeout) => tokio::time::timeout(timeout, run)
                .await
                .unwrap_or_else(|_| {
                    Err(Error::Timeout {
                        command: descriptor.name.clone(),
                        timeout,
                    })
                }),
            None => run.await,
        };

        match result {
            Ok(()) => {
                info!("Command `{}` executed", descriptor.name);
                Ok(())
            }
            Err(source) => {
                error!("Error in command `{}`: {:?}", descriptor.name, source);
                if !self.development_mode {
                    if let Err(e) = self.telemetry.increment_failed(&descriptor.name).await {
                        warn!("Failed to record failure of `{}`: {}", descriptor.name, e);
                    }
                }
                Err(DispatchError::HandlerFailure { source })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{
            authorization::AuthorizationDenial,
            clock::Clock,
            policy::{RateLimitConfig, Scope, ScopeLimit},
            registry::CommandMap,
        },
        test_utils::{
            CountingHandler, FailingHandler, ManualClock, PendingHandler, RecordingResponder,
            RecordingTelemetry, StaticEvaluator,
        },
    };
    use poise::serenity_prelude::{GuildId, Permissions, UserId};

    const OWNER: UserId = UserId::new(1);
    const USER: UserId = UserId::new(2);
    const MINUTE: Duration = Duration::from_secs(60);

    struct Harness {
        dispatcher: InteractionDispatcher,
        clock: Arc<ManualClock>,
        telemetry: Arc<RecordingTelemetry>,
        responder: RecordingResponder,
    }

    fn harness(registry: CommandMap) -> Harness {
        harness_with(registry, RecordingTelemetry::default())
    }

    fn harness_with(registry: CommandMap, telemetry: RecordingTelemetry) -> Harness {
        let clock = Arc::new(ManualClock::default());
        let telemetry = Arc::new(telemetry);
        let dispatcher = InteractionDispatcher::new(
            Arc::new(registry),
            Arc::new(StaticEvaluator::with_owner(OWNER)),
            Arc::new(RateLimiterRegistry::new(Arc::clone(&clock) as Arc<dyn Clock>)),
            Arc::clone(&telemetry) as Arc<dyn TelemetryCollector>,
        );
        Harness {
            dispatcher,
            clock,
            telemetry,
            responder: RecordingResponder::default(),
        }
    }

    impl Harness {
        async fn run(&self, invocation: &Invocation) -> DispatchOutcome {
            self.dispatcher.dispatch(invocation, &self.responder).await
        }
    }

    #[tokio::test]
    async fn test_user_scope_limit_blocks_until_window_passes() {
        let handler = CountingHandler::default();
        let registry = CommandMap::default().register(
            CommandDescriptor::new("ping", "Pong", handler.clone())
                .ratelimit(RateLimitConfig::default().with_user(ScopeLimit::strict(1, MINUTE))),
        );
        let h = harness(registry);
        let invocation = Invocation::new("ping", USER);

        assert!(h.run(&invocation).await.is_ok());

        h.clock.advance(Duration::from_secs(20));
        match h.run(&invocation).await {
            Err(DispatchError::RateLimited { scope, remaining }) => {
                assert_eq!(scope, Scope::User);
                assert!(remaining <= MINUTE);
                assert_eq!(remaining, Duration::from_secs(40));
            }
            other => panic!("expected rate limit, got {other:?}"),
        }
        assert_eq!(handler.calls(), 1);
        assert!(h.responder.last().unwrap().text.contains("40 seconds"));

        h.clock.advance(Duration::from_secs(40));
        assert!(h.run(&invocation).await.is_ok());
        assert_eq!(handler.calls(), 2);
    }

    #[tokio::test]
    async fn test_disabled_command_runs_only_for_owner() {
        let handler = CountingHandler::default();
        let registry = CommandMap::default()
            .register(CommandDescriptor::new("jam", "Jam", handler.clone()).disabled(true));
        let h = harness(registry);

        assert!(h.run(&Invocation::new("jam", OWNER)).await.is_ok());
        assert_eq!(handler.calls(), 1);

        let outcome = h.run(&Invocation::new("jam", USER)).await;
        assert!(matches!(
            outcome,
            Err(DispatchError::AuthorizationDenied(AuthorizationDenial::Disabled))
        ));
        assert_eq!(handler.calls(), 1);

        let reply = h.responder.last().unwrap();
        assert!(reply.ephemeral);
        assert_eq!(reply.text, AuthorizationDenial::Disabled.user_message());
    }

    #[tokio::test]
    async fn test_missing_bot_permission_is_named() {
        let handler = CountingHandler::default();
        let registry = CommandMap::default().register(
            CommandDescriptor::new("about", "About", handler.clone())
                .bot_permissions(Permissions::EMBED_LINKS),
        );
        let h = harness(registry);
        let base = Invocation::new("about", USER).in_guild(GuildId::new(10));

        let lacking = base.clone().with_bot_permissions(Permissions::SEND_MESSAGES);
        let outcome = h.run(&lacking).await;
        assert!(matches!(
            outcome,
            Err(DispatchError::AuthorizationDenied(AuthorizationDenial::MissingBotPermissions(p)))
                if p == Permissions::EMBED_LINKS
        ));
        assert!(h.responder.last().unwrap().text.contains("Embed Links"));

        let granted = base.with_bot_permissions(Permissions::SEND_MESSAGES | Permissions::EMBED_LINKS);
        assert!(h.run(&granted).await.is_ok());
        assert_eq!(handler.calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_command_has_no_side_effects() {
        let registry = CommandMap::default().register(
            CommandDescriptor::new("ping", "Pong", CountingHandler::default())
                .ratelimit(RateLimitConfig::default().with_user(ScopeLimit::strict(1, MINUTE))),
        );
        let h = harness(registry);

        let outcome = h.run(&Invocation::new("pong", USER)).await;
        assert!(matches!(outcome, Err(DispatchError::CommandNotFound { ref name }) if name == "pong"));

        assert!(h.dispatcher.ratelimits().policy("pong").is_none());
        assert!(h.dispatcher.ratelimits().policy("ping").is_none());
        assert_eq!(h.telemetry.executed(), 0);
        assert_eq!(h.telemetry.failed(), 0);
    }

    #[tokio::test]
    async fn test_authorization_rejection_skips_rate_limit() {
        let registry = CommandMap::default().register(
            CommandDescriptor::new("admin", "Admin", CountingHandler::default())
                .super_user_only()
                .ratelimit(RateLimitConfig::default().with_user(ScopeLimit::passive(5, MINUTE))),
        );
        let h = harness(registry);

        let outcome = h.run(&Invocation::new("admin", USER)).await;
        assert!(matches!(
            outcome,
            Err(DispatchError::AuthorizationDenied(AuthorizationDenial::SuperUserOnly))
        ));
        assert!(h.dispatcher.ratelimits().policy("admin").is_none());
    }

    #[tokio::test]
    async fn test_handler_failure_is_counted_and_hidden() {
        let registry = CommandMap::default().register(CommandDescriptor::new(
            "broken",
            "Always fails",
            FailingHandler,
        ));
        let h = harness(registry);

        let outcome = h.run(&Invocation::new("broken", USER)).await;
        assert!(matches!(outcome, Err(DispatchError::HandlerFailure { .. })));
        assert_eq!(h.telemetry.executed(), 1);
        assert_eq!(h.telemetry.failed(), 1);

        let reply = h.responder.last().unwrap();
        assert!(reply.ephemeral);
        assert!(!reply.text.contains(FailingHandler::MESSAGE));
    }

    #[tokio::test]
    async fn test_development_mode_suppresses_failure_count() {
        let registry = CommandMap::default().register(CommandDescriptor::new(
            "broken",
            "Always fails",
            FailingHandler,
        ));
        let mut h = harness(registry);
        h.dispatcher = h.dispatcher.development_mode(true);

        let outcome = h.run(&Invocation::new("broken", USER)).await;
        assert!(matches!(outcome, Err(DispatchError::HandlerFailure { .. })));
        assert_eq!(h.telemetry.executed(), 1);
        assert_eq!(h.telemetry.failed(), 0);
    }

    #[tokio::test]
    async fn test_telemetry_failure_does_not_reach_caller() {
        let handler = CountingHandler::default();
        let registry =
            CommandMap::default().register(CommandDescriptor::new("ping", "Pong", handler.clone()));
        let h = harness_with(registry, RecordingTelemetry::failing());

        assert!(h.run(&Invocation::new("ping", USER)).await.is_ok());
        assert_eq!(handler.calls(), 1);
        assert!(h.responder.replies().is_empty());
    }

    #[tokio::test]
    async fn test_reply_failure_on_rejection_is_swallowed() {
        let h = harness(CommandMap::default());
        let responder = RecordingResponder::failing();

        let outcome = h.dispatcher.dispatch(&Invocation::new("nope", USER), &responder).await;
        assert!(matches!(outcome, Err(DispatchError::CommandNotFound { .. })));
    }

    #[tokio::test(start_paused = true)]
    async fn test_handler_timeout_counts_as_failure() {
        let registry = CommandMap::default().register(CommandDescriptor::new(
            "stuck",
            "Never finishes",
            PendingHandler,
        ));
        let mut h = harness(registry);
        h.dispatcher = h.dispatcher.handler_timeout(Some(Duration::from_secs(5)));

        let outcome = h.run(&Invocation::new("stuck", USER)).await;
        assert!(matches!(
            outcome,
            Err(DispatchError::HandlerFailure {
                source: Error::Timeout { .. }
            })
        ));
        assert_eq!(h.telemetry.failed(), 1);
    }

    #[tokio::test]
    async fn test_passive_global_consumed_even_when_user_scope_rejects() {
        let registry = CommandMap::default().register(
            CommandDescriptor::new("stats", "Stats", CountingHandler::default()).ratelimit(
                RateLimitConfig::default()
                    .with_global(ScopeLimit::passive(100, MINUTE))
                    .with_user(ScopeLimit::strict(1, MINUTE)),
            ),
        );
        let h = harness(registry);
        let invocation = Invocation::new("stats", USER);

        assert!(h.run(&invocation).await.is_ok());
        assert!(h.run(&invocation).await.is_err());

        let policy = h.dispatcher.ratelimits().policy("stats").unwrap();
        assert_eq!(policy.manager(Scope::Global).unwrap().count("stats"), Some(2));
        assert_eq!(policy.manager(Scope::User).unwrap().count("2"), Some(1));
    }

    #[tokio::test]
    async fn test_handler_sees_owner_flag() {
        let handler = CountingHandler::default();
        let registry =
            CommandMap::default().register(CommandDescriptor::new("ping", "Pong", handler.clone()));
        let h = harness(registry);

        h.run(&Invocation::new("ping", OWNER)).await.unwrap();
        h.run(&Invocation::new("ping", USER)).await.unwrap();
        assert_eq!(handler.owner_calls(), 1);
    }
}
