//! Discord interaction handlers
//!
//! This module turns gateway interactions into framework-agnostic invocations
//! and sends replies back through the interaction webhook.

/// Slash command interaction conversion and replies
pub mod interaction;

pub use interaction::{InteractionResponder, invocation_from};
