//! Ingress queue: unbounded FIFO between message arrival and dispatch.
//!
//! The lock is held only for the push/pop itself, never across I/O.

use std::collections::VecDeque;

use parking_lot::Mutex;
use vmm_domain::Command;

pub struct IngressQueue {
    commands: Mutex<VecDeque<Command>>,
}

impl Default for IngressQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl IngressQueue {
    pub fn new() -> Self {
        Self {
            commands: Mutex::new(VecDeque::new()),
        }
    }

    /// Append to the tail. Never blocks on anything but the push itself.
    pub fn enqueue(&self, command: Command) {
        self.commands.lock().push_back(command);
    }

    /// Remove and return the head, or `None` when empty.
    pub fn dequeue(&self) -> Option<Command> {
        self.commands.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.commands.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.lock().is_empty()
    }
}
