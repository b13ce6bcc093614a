//! In-memory collaborators for unit tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::watch;
use vmm_domain::{
    ChatTransport, Error, InboundEvent, ProvisionRequest, Provisioner, ReplyReceipt, Result,
    Sender,
};

use crate::coordinator::{Coordinator, CoordinatorSettings};

pub const BOT: &str = "VM-Manager";

/// A reply the fake transport accepted.
#[derive(Debug, Clone)]
pub struct SentReply {
    /// The message replied to.
    pub message_id: String,
    pub text: String,
    pub in_thread: bool,
    /// Id of the bot's new message.
    pub reply_id: String,
    pub thread_id: String,
}

pub struct FakeTransport {
    sent: Mutex<Vec<SentReply>>,
    counter: AtomicUsize,
    failing: AtomicBool,
    threadless: AtomicBool,
    sent_count: watch::Sender<usize>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self {
            sent: Mutex::new(Vec::new()),
            counter: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            threadless: AtomicBool::new(false),
            sent_count: watch::channel(0).0,
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Accept replies but never report a thread id.
    pub fn set_threadless(&self, threadless: bool) {
        self.threadless.store(threadless, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<SentReply> {
        self.sent.lock().clone()
    }

    /// Wait until at least `n` replies went out.
    pub async fn wait_for_sends(&self, n: usize) {
        let mut rx = self.sent_count.subscribe();
        rx.wait_for(|count| *count >= n)
            .await
            .expect("sender lives as long as the transport");
    }
}

#[async_trait]
impl ChatTransport for FakeTransport {
    async fn reply(&self, message_id: &str, text: &str, reply_in_thread: bool) -> Result<ReplyReceipt> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(Error::Chat("transport down".into()));
        }

        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        let reply_id = format!("om_bot_{n}");
        let mut sent = self.sent.lock();
        // Replies to a bot message stay in that message's thread.
        let existing = sent
            .iter()
            .find(|s| s.reply_id == message_id)
            .map(|s| s.thread_id.clone());
        let thread_id = match existing {
            _ if self.threadless.load(Ordering::SeqCst) => String::new(),
            Some(thread) => thread,
            None if reply_in_thread => format!("thread-{n}"),
            None => String::new(),
        };
        sent.push(SentReply {
            message_id: message_id.to_owned(),
            text: text.to_owned(),
            in_thread: reply_in_thread,
            reply_id: reply_id.clone(),
            thread_id: thread_id.clone(),
        });
        let total = sent.len();
        drop(sent);
        self.sent_count.send_replace(total);

        Ok(ReplyReceipt {
            message_id: reply_id,
            thread_id,
        })
    }
}

pub struct FakeProvisioner {
    result: std::result::Result<Vec<String>, String>,
    delay: Duration,
    requests: Mutex<Vec<ProvisionRequest>>,
}

impl FakeProvisioner {
    pub fn succeeding(addresses: Vec<String>) -> Self {
        Self {
            result: Ok(addresses),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_owned()),
            delay: Duration::ZERO,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn requests(&self) -> Vec<ProvisionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl Provisioner for FakeProvisioner {
    async fn provision(&self, request: ProvisionRequest) -> Result<Vec<String>> {
        self.requests.lock().push(request);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result
            .clone()
            .map_err(|message| Error::provisioning("terraform apply", message))
    }
}

/// Coordinator with default windows (5 min reply, 10 min provisioning).
pub fn coordinator(
    transport: Arc<FakeTransport>,
    provisioner: Arc<FakeProvisioner>,
) -> Arc<Coordinator> {
    Arc::new(Coordinator::new(
        transport,
        provisioner,
        CoordinatorSettings::default(),
    ))
}

/// An event from user `u1` that mentions the bot.
pub fn event(message_id: &str, thread_id: &str, text: &str) -> InboundEvent {
    InboundEvent {
        sender: Sender {
            user_id: "u1".into(),
            ..Default::default()
        },
        message_id: message_id.into(),
        thread_id: thread_id.into(),
        text: text.into(),
        mentions: vec![BOT.into()],
        ..Default::default()
    }
}
