//! `/release`: escape hatch for abandoned runs.
//!
//! Only accepted from inside the active run's thread. The release is
//! delivered to that run as a cancellation signal and the slot is freed on
//! its behalf; a run that is already provisioning keeps its subprocess but
//! can no longer touch the slot or a newer run's session.

use vmm_domain::Command;

use crate::coordinator::Coordinator;
use crate::messages;
use crate::registry::{Handoff, RunSignal};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// No run is active.
    NothingActive,
    /// Issued from a different thread; nothing changed.
    WrongThread,
    /// The slot was freed.
    Released,
}

impl Coordinator {
    pub async fn release(&self, command: &Command) -> ReleaseOutcome {
        let Some(active) = self.registry.active() else {
            tracing::info!(user_id = %command.user_id(), "release requested with no active run");
            self.send(command.message_id(), messages::NOTHING_TO_RELEASE, false)
                .await;
            return ReleaseOutcome::NothingActive;
        };

        if active.thread_id != command.thread_id() {
            tracing::info!(
                user_id = %command.user_id(),
                thread_id = %command.thread_id(),
                active_thread_id = %active.thread_id,
                "release requested from outside the active thread"
            );
            self.send(
                &active.message_id,
                &messages::release_from_thread(command.user_id()),
                true,
            )
            .await;
            return ReleaseOutcome::WrongThread;
        }

        if let Some(session) = self.registry.take_run(&active.thread_id, active.run_id) {
            if session.deliver(RunSignal::Release) == Handoff::Absorbed {
                tracing::debug!(run_id = %active.run_id, "run is past waiting; release not observed");
            }
        }
        self.registry.clear_active(active.run_id);
        let freed = self.slot.release(active.run_id);
        tracing::info!(
            run_id = %active.run_id,
            user_id = %command.user_id(),
            freed,
            "lock released by user"
        );

        self.send(command.message_id(), messages::LOCK_RELEASED, false)
            .await;
        ReleaseOutcome::Released
    }
}
