//! Core logic - framework-agnostic authorization, rate limiting, and dispatch.
//!
//! Nothing in here talks to Discord directly; the bot layer converts interactions
//! into [`registry::Invocation`]s and implements [`registry::Responder`].

/// Ordered authorization checks
pub mod authorization;
/// Fixed-window rate-limit buckets
pub mod bucket;
/// Time source for rate-limit windows
pub mod clock;
/// Interaction dispatcher
pub mod dispatch;
/// Coarse duration formatting for wait messages
pub mod duration;
/// Per-scope bucket managers
pub mod limiter;
/// Owner, helper, premium, and Discord permission checks
pub mod permissions;
/// Per-command rate-limit policies and their registry
pub mod policy;
/// Premium user storage
pub mod premium;
/// Command descriptors, handlers, and invocations
pub mod registry;
/// Command execution counters
pub mod telemetry;
