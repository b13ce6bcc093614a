//! Reply correlator: routes a non-command message to the run that owns
//! its thread.

use vmm_domain::InboundEvent;

use crate::parser::parse_config;
use crate::registry::{Handoff, RunSignal, SessionRegistry};

/// What happened to an inbound reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyOutcome {
    /// Parsed and handed to the waiting run.
    Delivered,
    /// Parsed, but the run already had a pending reply or stopped waiting.
    Absorbed,
    /// No run owns this thread.
    NoSession,
    /// The thread is active but the bot was not mentioned.
    MissingMention,
    /// Nothing but the mention; the run keeps waiting.
    Empty,
}

/// Match `event` to a session by thread identity and forward its parsed
/// configuration. Misses are not errors: most chat traffic is unrelated.
pub fn correlate(registry: &SessionRegistry, bot_name: &str, event: &InboundEvent) -> ReplyOutcome {
    if event.thread_id.is_empty() {
        return ReplyOutcome::NoSession;
    }
    let Some(session) = registry.get(&event.thread_id) else {
        tracing::debug!(thread_id = %event.thread_id, "reply outside any active thread");
        return ReplyOutcome::NoSession;
    };
    if !event.mentions(bot_name) {
        tracing::debug!(thread_id = %event.thread_id, "reply without bot mention ignored");
        return ReplyOutcome::MissingMention;
    }
    if event.text.trim().is_empty() {
        tracing::debug!(thread_id = %event.thread_id, "empty reply ignored");
        return ReplyOutcome::Empty;
    }

    let config = parse_config(&event.text);
    tracing::info!(
        thread_id = %event.thread_id,
        run_id = %session.run_id,
        user_id = %event.sender.user_id,
        keys = config.len(),
        "reply correlated to run"
    );

    match session.deliver(RunSignal::Reply(config)) {
        Handoff::Delivered => ReplyOutcome::Delivered,
        Handoff::Absorbed => {
            tracing::debug!(run_id = %session.run_id, "duplicate or late reply absorbed");
            ReplyOutcome::Absorbed
        }
    }
}
