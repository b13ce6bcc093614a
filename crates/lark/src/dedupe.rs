//! Redelivery filter for event callbacks.
//!
//! Lark retries a callback until it sees a 200 within its deadline, so the
//! same `event_id` can arrive more than once. Ids are remembered for `ttl`.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

pub struct DedupeStore {
    ttl: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl DedupeStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            seen: Mutex::new(HashMap::new()),
        }
    }

    /// Record `id`. Returns `false` if it was already seen within the TTL.
    pub fn check_and_insert(&self, id: &str) -> bool {
        let now = Instant::now();
        let mut seen = self.seen.lock();
        match seen.get(id) {
            Some(at) if now.duration_since(*at) < self.ttl => false,
            _ => {
                seen.insert(id.to_owned(), now);
                true
            }
        }
    }

    /// Drop expired ids. Returns how many were removed.
    pub fn prune(&self) -> usize {
        let now = Instant::now();
        let mut seen = self.seen.lock();
        let before = seen.len();
        seen.retain(|_, at| now.duration_since(*at) < self.ttl);
        before - seen.len()
    }

    pub fn len(&self) -> usize {
        self.seen.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.lock().is_empty()
    }
}
