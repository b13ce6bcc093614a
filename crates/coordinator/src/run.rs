//! Run coordinator: the `/create_vm` workflow.
//!
//! ```text
//! Idle → SlotRequested → TemplateSent → Provisioning → Done
//!            │                 │              │
//!            ▼                 ├─► TimedOut   └─► Failed
//!         Rejected             └─► Cancelled (/release)
//! ```
//!
//! The slot is taken before any other work and is released on every exit
//! path through the run's [`SlotGuard`].

use tokio::sync::mpsc;
use tracing::Instrument;
use vmm_domain::{Command, Error, ProvisionRequest, ReplyReceipt};

use crate::coordinator::Coordinator;
use crate::messages;
use crate::parser::ParsedConfig;
use crate::registry::{ActiveRun, RunSignal, Session};
use crate::slot::SlotGuard;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// States & outcomes
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    SlotRequested,
    TemplateSent,
    Provisioning,
    Done,
}

/// Terminal state of one `/create_vm` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Another run holds the slot.
    Rejected,
    /// The template could not be sent; the slot was released.
    DeliveryFailed,
    /// No reply arrived within the waiting window.
    TimedOut,
    /// `/release` freed the slot while the run was waiting.
    Cancelled,
    Provisioned { addresses: Vec<String> },
    Failed { reason: String },
}

fn enter(state: RunState) {
    tracing::debug!(state = ?state, "run state");
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Workflow
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

impl Coordinator {
    /// Drive one `/create_vm` command to a terminal state.
    pub async fn create_vm(&self, command: &Command) -> RunOutcome {
        let Some(guard) = self.slot.try_acquire() else {
            tracing::info!(user_id = %command.user_id(), "slot busy, rejecting create_vm");
            self.send(command.message_id(), messages::BUSY, false).await;
            return RunOutcome::Rejected;
        };

        let span = tracing::info_span!(
            "create_vm",
            run_id = %guard.run_id(),
            user_id = %command.user_id(),
        );
        self.drive(command, guard).instrument(span).await
    }

    async fn drive(&self, command: &Command, guard: SlotGuard) -> RunOutcome {
        let run_id = guard.run_id();
        enter(RunState::SlotRequested);

        let receipt = match self
            .transport
            .reply(command.message_id(), &self.settings.template, true)
            .await
        {
            Ok(receipt) => receipt,
            Err(e) => {
                tracing::warn!(error = %e, "failed to send template, releasing slot");
                guard.release();
                return RunOutcome::DeliveryFailed;
            }
        };
        if receipt.thread_id.is_empty() {
            tracing::warn!(
                message_id = %receipt.message_id,
                "template sent without a thread, releasing slot"
            );
            guard.release();
            return RunOutcome::DeliveryFailed;
        }

        let (handoff, mut signals) = mpsc::channel(1);
        self.registry.put(
            &receipt.thread_id,
            Session::new(
                run_id,
                command.user_id(),
                command.message_id(),
                &receipt.message_id,
                &receipt.thread_id,
                handoff,
            ),
        );
        self.registry.set_active(ActiveRun {
            run_id,
            message_id: receipt.message_id.clone(),
            thread_id: receipt.thread_id.clone(),
            user_id: command.user_id().to_owned(),
            started_at: chrono::Utc::now(),
        });
        enter(RunState::TemplateSent);
        tracing::info!(thread_id = %receipt.thread_id, "template sent, awaiting reply");

        let config = tokio::select! {
            signal = signals.recv() => match signal {
                Some(RunSignal::Reply(config)) => config,
                Some(RunSignal::Release) | None => {
                    tracing::info!(thread_id = %receipt.thread_id, "run released while awaiting reply");
                    self.forget(&receipt, run_id);
                    return RunOutcome::Cancelled;
                }
            },
            _ = tokio::time::sleep(self.settings.reply_timeout) => {
                tracing::info!(thread_id = %receipt.thread_id, "no reply within waiting window");
                self.forget(&receipt, run_id);
                guard.release();
                self.send(&receipt.message_id, messages::REPLY_TIMEOUT, true).await;
                return RunOutcome::TimedOut;
            }
        };

        self.provision(command, &receipt, guard, config).await
    }

    async fn provision(
        &self,
        command: &Command,
        receipt: &ReplyReceipt,
        guard: SlotGuard,
        config: ParsedConfig,
    ) -> RunOutcome {
        let run_id = guard.run_id();
        enter(RunState::Provisioning);

        let request = ProvisionRequest {
            workdir: receipt.thread_id.clone(),
            config,
        };
        let timeout = self.settings.provision_timeout;
        let result = match tokio::time::timeout(timeout, self.provisioner.provision(request)).await
        {
            Ok(result) => result,
            Err(_) => Err(Error::Timeout(format!(
                "provisioning exceeded {}s",
                timeout.as_secs()
            ))),
        };

        self.forget(receipt, run_id);
        if !guard.release() {
            tracing::info!("slot was released externally during provisioning");
        }
        enter(RunState::Done);

        match result {
            Ok(addresses) => {
                tracing::info!(addresses = ?addresses, "provisioning succeeded");
                let text = messages::provisioned(command.user_id(), &addresses);
                match self.transport.reply(&receipt.message_id, &text, true).await {
                    Ok(_) => RunOutcome::Provisioned { addresses },
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to report provisioning result");
                        self.send(&receipt.message_id, messages::PROVISION_FAILED, true)
                            .await;
                        RunOutcome::Failed {
                            reason: format!("reporting result: {e}"),
                        }
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "provisioning failed");
                self.send(&receipt.message_id, messages::PROVISION_FAILED, true)
                    .await;
                RunOutcome::Failed {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Drop this run's session and active marker, leaving newer runs alone.
    fn forget(&self, receipt: &ReplyReceipt, run_id: uuid::Uuid) {
        self.registry.take_run(&receipt.thread_id, run_id);
        self.registry.clear_active(run_id);
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Tests
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
