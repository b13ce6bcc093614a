//! Session registry: which conversation thread owns which in-flight run.
//!
//! Entries are keyed by thread identity. Each entry carries the sending half
//! of its run's handoff channel, so a reply can only ever reach the run that
//! published the template in that thread. The registry also tracks the
//! active run (template message + thread) for `/release`.

use std::collections::HashMap;
use std::time::Instant;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::parser::ParsedConfig;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// What a waiting run can be told.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunSignal {
    /// The user answered with an edited template.
    Reply(ParsedConfig),
    /// `/release` was issued from the run's thread.
    Release,
}

/// Result of handing a signal to a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Handoff {
    Delivered,
    /// The run already has a pending signal or has stopped listening.
    Absorbed,
}

/// One run awaiting (or acting on) user input.
#[derive(Debug, Clone)]
pub struct Session {
    pub run_id: Uuid,
    pub user_id: String,
    /// The `/create_vm` message that started the run.
    pub root_id: String,
    /// The message carrying the template.
    pub parent_id: String,
    /// The thread created for the run.
    pub thread_id: String,
    pub created_at: Instant,
    handoff: mpsc::Sender<RunSignal>,
}

impl Session {
    pub fn new(
        run_id: Uuid,
        user_id: impl Into<String>,
        root_id: impl Into<String>,
        parent_id: impl Into<String>,
        thread_id: impl Into<String>,
        handoff: mpsc::Sender<RunSignal>,
    ) -> Self {
        Self {
            run_id,
            user_id: user_id.into(),
            root_id: root_id.into(),
            parent_id: parent_id.into(),
            thread_id: thread_id.into(),
            created_at: Instant::now(),
            handoff,
        }
    }

    /// Hand `signal` to the run without waiting.
    pub fn deliver(&self, signal: RunSignal) -> Handoff {
        match self.handoff.try_send(signal) {
            Ok(()) => Handoff::Delivered,
            Err(_) => Handoff::Absorbed,
        }
    }
}

/// The run `/release` is allowed to target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRun {
    pub run_id: Uuid,
    /// The template message, where release instructions are posted.
    pub message_id: String,
    pub thread_id: String,
    /// Who issued the `/create_vm`.
    pub user_id: String,
    pub started_at: DateTime<Utc>,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Registry
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Session>>,
    active: RwLock<Option<ActiveRun>>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            active: RwLock::new(None),
        }
    }

    pub fn put(&self, thread_id: &str, session: Session) {
        self.sessions.write().insert(thread_id.to_owned(), session);
    }

    pub fn get(&self, thread_id: &str) -> Option<Session> {
        self.sessions.read().get(thread_id).cloned()
    }

    pub fn delete(&self, thread_id: &str) -> Option<Session> {
        self.sessions.write().remove(thread_id)
    }

    /// Remove the entry for `thread_id` only if it still belongs to `run_id`.
    pub fn take_run(&self, thread_id: &str, run_id: Uuid) -> Option<Session> {
        let mut sessions = self.sessions.write();
        match sessions.get(thread_id) {
            Some(session) if session.run_id == run_id => sessions.remove(thread_id),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }

    // ── active run ───────────────────────────────────────────────────

    pub fn set_active(&self, active: ActiveRun) {
        *self.active.write() = Some(active);
    }

    pub fn active(&self) -> Option<ActiveRun> {
        self.active.read().clone()
    }

    /// Forget the active run if it is `run_id`.
    pub fn clear_active(&self, run_id: Uuid) {
        let mut active = self.active.write();
        if active.as_ref().is_some_and(|a| a.run_id == run_id) {
            *active = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(run_id: Uuid, thread: &str) -> (Session, mpsc::Receiver<RunSignal>) {
        let (tx, rx) = mpsc::channel(1);
        (Session::new(run_id, "u1", "om_root", "om_tpl", thread, tx), rx)
    }

    #[test]
    fn put_get_delete() {
        let registry = SessionRegistry::new();
        let run_id = Uuid::new_v4();
        let (s, _rx) = session(run_id, "t1");
        registry.put("t1", s);

        assert_eq!(registry.get("t1").map(|s| s.run_id), Some(run_id));
        assert!(registry.get("t2").is_none());
        assert!(registry.delete("t1").is_some());
        assert!(registry.is_empty());
    }

    #[test]
    fn take_run_checks_ownership() {
        let registry = SessionRegistry::new();
        let run_id = Uuid::new_v4();
        let (s, _rx) = session(run_id, "t1");
        registry.put("t1", s);

        assert!(registry.take_run("t1", Uuid::new_v4()).is_none());
        assert_eq!(registry.len(), 1);
        assert!(registry.take_run("t1", run_id).is_some());
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn handoff_buffers_one_and_absorbs_the_rest() {
        let (s, mut rx) = session(Uuid::new_v4(), "t1");
        assert_eq!(s.deliver(RunSignal::Release), Handoff::Delivered);
        assert_eq!(s.deliver(RunSignal::Release), Handoff::Absorbed);
        assert_eq!(rx.recv().await, Some(RunSignal::Release));
    }

    #[test]
    fn handoff_to_stopped_run_is_absorbed() {
        let (s, rx) = session(Uuid::new_v4(), "t1");
        drop(rx);
        assert_eq!(s.deliver(RunSignal::Release), Handoff::Absorbed);
    }

    #[test]
    fn clear_active_ignores_other_runs() {
        let registry = SessionRegistry::new();
        let run_id = Uuid::new_v4();
        registry.set_active(ActiveRun {
            run_id,
            message_id: "om_tpl".into(),
            thread_id: "t1".into(),
            user_id: "u1".into(),
            started_at: Utc::now(),
        });

        registry.clear_active(Uuid::new_v4());
        assert!(registry.active().is_some());
        registry.clear_active(run_id);
        assert!(registry.active().is_none());
    }
}
