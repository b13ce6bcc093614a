//! The coordinator object: one per process, shared by every handler.
//!
//! Owns the ingress queue, the job slot, and the session registry, plus
//! handles to the two collaborators. Built once at startup and passed around
//! as `Arc<Coordinator>`; tests build as many independent instances as they
//! need.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use vmm_domain::config::Config;
use vmm_domain::{ChatTransport, Command, CommandKind, InboundEvent, Provisioner, ReplyReceipt};

use crate::correlator::{correlate, ReplyOutcome};
use crate::messages;
use crate::queue::IngressQueue;
use crate::registry::SessionRegistry;
use crate::slot::JobSlot;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Settings
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone)]
pub struct CoordinatorSettings {
    /// Mention marker a reply must carry.
    pub bot_name: String,
    /// Waiting window between sending the template and giving up.
    pub reply_timeout: Duration,
    /// Bound on one provisioning execution.
    pub provision_timeout: Duration,
    /// Dispatcher poll interval.
    pub poll_interval: Duration,
    /// Template text published on `/create_vm`.
    pub template: String,
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self::from_config(&Config::default(), messages::DEFAULT_TEMPLATE.to_owned())
    }
}

impl CoordinatorSettings {
    pub fn from_config(config: &Config, template: String) -> Self {
        Self {
            bot_name: config.lark.bot_name.clone(),
            reply_timeout: config.coordinator.reply_timeout(),
            provision_timeout: config.coordinator.provision_timeout(),
            poll_interval: config.coordinator.poll_interval(),
            template,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Coordinator
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What [`Coordinator::ingest`] did with an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    /// A slash-command was queued for the dispatcher.
    Queued,
    /// Plain text went through the reply correlator.
    Reply(ReplyOutcome),
}

/// Operator view of the coordinator.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStatus {
    pub slot_held: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_thread_id: Option<String>,
    /// When the active run took the slot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active_since: Option<DateTime<Utc>>,
    pub sessions: usize,
    pub queued: usize,
}

pub struct Coordinator {
    pub(crate) transport: Arc<dyn ChatTransport>,
    pub(crate) provisioner: Arc<dyn Provisioner>,
    pub(crate) queue: IngressQueue,
    pub(crate) slot: Arc<JobSlot>,
    pub(crate) registry: SessionRegistry,
    pub(crate) settings: CoordinatorSettings,
}

impl Coordinator {
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        provisioner: Arc<dyn Provisioner>,
        settings: CoordinatorSettings,
    ) -> Self {
        Self {
            transport,
            provisioner,
            queue: IngressQueue::new(),
            slot: Arc::new(JobSlot::new()),
            registry: SessionRegistry::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &CoordinatorSettings {
        &self.settings
    }

    pub fn queue(&self) -> &IngressQueue {
        &self.queue
    }

    pub fn slot(&self) -> &JobSlot {
        &self.slot
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    /// Classify an inbound event: commands are queued, everything else is
    /// offered to the reply correlator right away.
    pub fn ingest(&self, event: InboundEvent) -> Ingested {
        let command = Command::from_event(event);
        if command.is_reply() {
            let outcome = correlate(&self.registry, &self.settings.bot_name, &command.event);
            return Ingested::Reply(outcome);
        }

        tracing::info!(
            command = ?command.kind,
            args = ?command.args,
            user_id = %command.user_id(),
            message_id = %command.message_id(),
            "command received"
        );
        self.queue.enqueue(command);
        Ingested::Queued
    }

    /// Run the handler for one dequeued command to completion.
    pub async fn handle(&self, command: Command) {
        match &command.kind {
            CommandKind::CreateVm => {
                let outcome = self.create_vm(&command).await;
                tracing::info!(outcome = ?outcome, "create_vm finished");
            }
            CommandKind::Help => {
                self.send(command.message_id(), messages::HELP, false).await;
            }
            CommandKind::Release => {
                let outcome = self.release(&command).await;
                tracing::info!(outcome = ?outcome, "release handled");
            }
            CommandKind::Unknown(token) => {
                self.send(command.message_id(), &messages::unknown_command(token), false)
                    .await;
            }
            CommandKind::Reply => {
                correlate(&self.registry, &self.settings.bot_name, &command.event);
            }
        }
    }

    pub fn status(&self) -> CoordinatorStatus {
        let active = self.registry.active();
        CoordinatorStatus {
            slot_held: self.slot.is_held(),
            active_since: active.as_ref().map(|a| a.started_at),
            active_thread_id: active.map(|a| a.thread_id),
            sessions: self.registry.len(),
            queued: self.queue.len(),
        }
    }

    /// Send a reply, logging (not propagating) delivery failures.
    pub(crate) async fn send(
        &self,
        message_id: &str,
        text: &str,
        reply_in_thread: bool,
    ) -> Option<ReplyReceipt> {
        match self.transport.reply(message_id, text, reply_in_thread).await {
            Ok(receipt) => Some(receipt),
            Err(e) => {
                tracing::warn!(message_id = %message_id, error = %e, "failed to send reply");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{coordinator, event, FakeProvisioner, FakeTransport};

    #[test]
    fn commands_are_queued_and_replies_correlated() {
        let transport = Arc::new(FakeTransport::new());
        let c = coordinator(transport, Arc::new(FakeProvisioner::succeeding(vec![])));

        assert_eq!(c.ingest(event("om_1", "", "/create_vm")), Ingested::Queued);
        assert_eq!(
            c.ingest(event("om_2", "t9", "numvcpus = 4")),
            Ingested::Reply(ReplyOutcome::NoSession)
        );
        assert_eq!(c.queue().len(), 1);
        assert_eq!(c.status().queued, 1);
    }

    #[tokio::test]
    async fn help_replies_with_help_text() {
        let transport = Arc::new(FakeTransport::new());
        let c = coordinator(transport.clone(), Arc::new(FakeProvisioner::succeeding(vec![])));

        c.handle(Command::from_event(event("om_1", "", "/help"))).await;

        let sent = transport.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].message_id, "om_1");
        assert_eq!(sent[0].text, messages::HELP);
        assert!(!sent[0].in_thread);
    }

    #[tokio::test]
    async fn unknown_command_points_at_help() {
        let transport = Arc::new(FakeTransport::new());
        let c = coordinator(transport.clone(), Arc::new(FakeProvisioner::succeeding(vec![])));

        c.handle(Command::from_event(event("om_1", "", "/destroy"))).await;

        assert!(transport.sent()[0].text.contains("/destroy"));
    }

    #[test]
    fn status_when_idle() {
        let c = coordinator(
            Arc::new(FakeTransport::new()),
            Arc::new(FakeProvisioner::succeeding(vec![])),
        );
        let status = c.status();
        assert!(!status.slot_held);
        assert!(status.active_thread_id.is_none());
        assert_eq!(status.sessions, 0);
    }
}
