//! Chat-transport contract: the inbound event shape the coordinator reads
//! and the outbound "reply in thread" operation it calls.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Inbound
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Identity of the user who sent a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    #[serde(default)]
    pub union_id: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub open_id: String,
}

/// A normalized inbound chat message.
///
/// `text` has already had mention placeholders stripped by the transport;
/// `mentions` holds the display names of everyone mentioned.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    pub sender: Sender,
    pub message_id: String,
    #[serde(default)]
    pub root_id: String,
    #[serde(default)]
    pub parent_id: String,
    /// Empty when the message was not posted inside a thread.
    #[serde(default)]
    pub thread_id: String,
    pub text: String,
    #[serde(default)]
    pub mentions: Vec<String>,
}

impl InboundEvent {
    /// Whether `name` is among the message's mention markers.
    pub fn mentions(&self, name: &str) -> bool {
        self.mentions.iter().any(|m| m == name)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Outbound
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Identity of a message the bot just sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyReceipt {
    pub message_id: String,
    /// The thread the reply landed in (freshly created for threaded replies
    /// to a top-level message).
    pub thread_id: String,
}

/// Outbound side of the chat transport.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Reply to `message_id` with plain `text`. With `reply_in_thread` the
    /// reply is scoped to (or opens) a conversation thread.
    async fn reply(
        &self,
        message_id: &str,
        text: &str,
        reply_in_thread: bool,
    ) -> Result<ReplyReceipt>;
}

/// Render an @-mention of `user_id` in the chat's rich-text markup.
pub fn mention_user(user_id: &str) -> String {
    format!("<at user_id=\"{user_id}\">{user_id}</at>")
}
