//! Drains the ingress queue on a fixed tick and runs each command on its
//! own task. Fan-out is unbounded; `/create_vm` handlers contend on the job
//! slot, not here.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::coordinator::Coordinator;

/// Start the dispatcher loop. It runs until `shutdown` is cancelled; handlers
/// already spawned are left to finish on their own.
pub fn spawn_dispatcher(coordinator: Arc<Coordinator>, shutdown: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(coordinator.settings().poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(
            poll_interval_ms = coordinator.settings().poll_interval.as_millis() as u64,
            "dispatcher started"
        );

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    tracing::info!(queued = coordinator.queue().len(), "dispatcher stopping");
                    break;
                }
                _ = interval.tick() => {}
            }

            while let Some(command) = coordinator.queue().dequeue() {
                let coordinator = coordinator.clone();
                tokio::spawn(async move { coordinator.handle(command).await });
            }
        }
    })
}
