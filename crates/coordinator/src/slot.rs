//! Job slot: the single-flight admission token for provisioning runs.
//!
//! Acquisition never waits: a caller that loses the race is told so
//! immediately and reports "busy". Ownership is tagged with the winning
//! run's id, so a release only takes effect for the run that currently
//! holds the slot. Each acquisition is released at most once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use uuid::Uuid;

pub struct JobSlot {
    holder: Mutex<Option<Uuid>>,
    acquisitions: AtomicU64,
    releases: AtomicU64,
}

impl Default for JobSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl JobSlot {
    pub fn new() -> Self {
        Self {
            holder: Mutex::new(None),
            acquisitions: AtomicU64::new(0),
            releases: AtomicU64::new(0),
        }
    }

    /// Try to take the slot for a fresh run. Returns `None` if it is held.
    pub fn try_acquire(self: &Arc<Self>) -> Option<SlotGuard> {
        let mut holder = self.holder.lock();
        if holder.is_some() {
            return None;
        }
        let run_id = Uuid::new_v4();
        *holder = Some(run_id);
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        Some(SlotGuard {
            slot: Arc::clone(self),
            run_id,
            released: false,
        })
    }

    /// Free the slot if `run_id` holds it. Returns `true` if this call
    /// released it.
    pub fn release(&self, run_id: Uuid) -> bool {
        let mut holder = self.holder.lock();
        if *holder != Some(run_id) {
            return false;
        }
        *holder = None;
        self.releases.fetch_add(1, Ordering::Relaxed);
        true
    }

    pub fn is_held(&self) -> bool {
        self.holder.lock().is_some()
    }

    /// The run currently holding the slot.
    pub fn holder(&self) -> Option<Uuid> {
        *self.holder.lock()
    }

    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    pub fn releases(&self) -> u64 {
        self.releases.load(Ordering::Relaxed)
    }
}

/// Proof of slot ownership held by a run. Releases on drop.
pub struct SlotGuard {
    slot: Arc<JobSlot>,
    run_id: Uuid,
    released: bool,
}

impl SlotGuard {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Release now. Returns `false` if the slot had already been taken away
    /// from this run (e.g. by `/release`).
    pub fn release(mut self) -> bool {
        self.released = true;
        self.slot.release(self.run_id)
    }
}

impl Drop for SlotGuard {
    fn drop(&mut self) {
        if !self.released {
            self.slot.release(self.run_id);
        }
    }
}

impl std::fmt::Debug for SlotGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotGuard").field("run_id", &self.run_id).finish()
    }
}
