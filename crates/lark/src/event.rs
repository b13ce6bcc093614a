//! Event-callback decoding (schema 2.0).

use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde::Deserialize;
use vmm_domain::{Error, InboundEvent, Result, Sender};

pub const MESSAGE_RECEIVE: &str = "im.message.receive_v1";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Decoded callback
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq)]
pub enum Callback {
    /// Endpoint ownership check; answer with the challenge.
    UrlVerification { challenge: String, token: String },
    /// A text message the bot can see.
    Message {
        event_id: String,
        token: String,
        event: InboundEvent,
    },
    /// Anything else; acknowledged and dropped.
    Ignored {
        event_id: String,
        event_type: String,
        token: String,
    },
}

impl Callback {
    /// Verification token carried by the callback.
    pub fn token(&self) -> &str {
        match self {
            Self::UrlVerification { token, .. }
            | Self::Message { token, .. }
            | Self::Ignored { token, .. } => token,
        }
    }

    pub fn event_id(&self) -> Option<&str> {
        match self {
            Self::UrlVerification { .. } => None,
            Self::Message { event_id, .. } | Self::Ignored { event_id, .. } => Some(event_id),
        }
    }
}

// ── wire shapes ─────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    challenge: Option<String>,
    #[serde(default)]
    token: Option<String>,
    #[serde(default)]
    header: Option<EventHeader>,
    #[serde(default)]
    event: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EventHeader {
    #[serde(default)]
    event_id: String,
    #[serde(default)]
    event_type: String,
    #[serde(default)]
    token: String,
}

#[derive(Debug, Deserialize)]
struct MessageEvent {
    sender: EventSender,
    message: EventMessage,
}

#[derive(Debug, Deserialize)]
struct EventSender {
    #[serde(default)]
    sender_id: Sender,
}

#[derive(Debug, Deserialize)]
struct EventMessage {
    message_id: String,
    #[serde(default)]
    root_id: String,
    #[serde(default)]
    parent_id: String,
    #[serde(default)]
    thread_id: String,
    #[serde(default)]
    message_type: String,
    /// JSON-encoded body, `{"text": "..."}` for text messages.
    #[serde(default)]
    content: String,
    #[serde(default)]
    mentions: Vec<Mention>,
}

#[derive(Debug, Deserialize)]
struct Mention {
    key: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct TextContent {
    #[serde(default)]
    text: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub fn parse_callback(body: &[u8]) -> Result<Callback> {
    let envelope: Envelope = serde_json::from_slice(body)?;

    if envelope.kind.as_deref() == Some("url_verification") {
        return Ok(Callback::UrlVerification {
            challenge: envelope.challenge.unwrap_or_default(),
            token: envelope.token.unwrap_or_default(),
        });
    }

    let header = envelope
        .header
        .ok_or_else(|| Error::Chat("callback without header".into()))?;

    let payload = match envelope.event {
        Some(payload) if header.event_type == MESSAGE_RECEIVE => payload,
        _ => {
            return Ok(Callback::Ignored {
                event_id: header.event_id,
                event_type: header.event_type,
                token: header.token,
            })
        }
    };

    let message: MessageEvent = serde_json::from_value(payload)?;
    if message.message.message_type != "text" {
        return Ok(Callback::Ignored {
            event_id: header.event_id,
            event_type: format!("{} ({})", header.event_type, message.message.message_type),
            token: header.token,
        });
    }

    Ok(Callback::Message {
        event_id: header.event_id,
        token: header.token,
        event: into_inbound(message)?,
    })
}

fn into_inbound(raw: MessageEvent) -> Result<InboundEvent> {
    let message = raw.message;
    let content: TextContent = if message.content.is_empty() {
        TextContent::default()
    } else {
        serde_json::from_str(&message.content)?
    };

    let keys: Vec<&str> = message.mentions.iter().map(|m| m.key.as_str()).collect();
    let text = strip_mentions(&content.text, &keys);

    Ok(InboundEvent {
        sender: raw.sender.sender_id,
        message_id: message.message_id,
        root_id: message.root_id,
        parent_id: message.parent_id,
        thread_id: message.thread_id,
        text,
        mentions: message.mentions.into_iter().map(|m| m.name).collect(),
    })
}

/// Mention placeholder as Lark writes it into the text (`@_user_1`, `@_all`),
/// with the whitespace around it.
static MENTION: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*(@_\w+)\s*").unwrap());

/// Remove each listed mention placeholder and the whitespace around it, then
/// trim. Placeholders not in `keys` are left alone.
pub fn strip_mentions(text: &str, keys: &[&str]) -> String {
    let cleaned = MENTION.replace_all(text, |caps: &Captures<'_>| {
        if keys.contains(&&caps[1]) {
            " ".to_owned()
        } else {
            caps[0].to_owned()
        }
    });
    cleaned.trim().to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn message_callback(content: &str, thread_id: &str) -> Vec<u8> {
        json!({
            "schema": "2.0",
            "header": {
                "event_id": "ev_1",
                "event_type": "im.message.receive_v1",
                "token": "v-token",
                "create_time": "1700000000000",
                "app_id": "cli_x",
                "tenant_key": "t"
            },
            "event": {
                "sender": {
                    "sender_id": {"union_id": "on_1", "user_id": "u1", "open_id": "ou_1"},
                    "sender_type": "user"
                },
                "message": {
                    "message_id": "om_2",
                    "root_id": "om_1",
                    "parent_id": "om_bot",
                    "thread_id": thread_id,
                    "chat_id": "oc_1",
                    "chat_type": "group",
                    "message_type": "text",
                    "content": content,
                    "mentions": [
                        {"key": "@_user_1", "id": {"open_id": "ou_bot"}, "name": "VM-Manager", "tenant_key": "t"}
                    ]
                }
            }
        })
        .to_string()
        .into_bytes()
    }

    #[test]
    fn url_verification() {
        let body = br#"{"challenge":"ajls384kdjx98XX","token":"v-token","type":"url_verification"}"#;
        let cb = parse_callback(body).unwrap();
        assert_eq!(
            cb,
            Callback::UrlVerification {
                challenge: "ajls384kdjx98XX".into(),
                token: "v-token".into()
            }
        );
        assert_eq!(cb.event_id(), None);
    }

    #[test]
    fn text_message_is_normalized() {
        let content = json!({"text": "@_user_1 numvcpus = 4\nhostname = \"db-01\""}).to_string();
        let cb = parse_callback(&message_callback(&content, "omt_1")).unwrap();

        let Callback::Message { event_id, token, event } = cb else {
            panic!("expected message, got {cb:?}");
        };
        assert_eq!(event_id, "ev_1");
        assert_eq!(token, "v-token");
        assert_eq!(event.sender.user_id, "u1");
        assert_eq!(event.sender.open_id, "ou_1");
        assert_eq!(event.message_id, "om_2");
        assert_eq!(event.root_id, "om_1");
        assert_eq!(event.thread_id, "omt_1");
        assert_eq!(event.text, "numvcpus = 4\nhostname = \"db-01\"");
        assert!(event.mentions("VM-Manager"));
    }

    #[test]
    fn command_after_mention() {
        let content = json!({"text": "@_user_1 /create_vm"}).to_string();
        let Callback::Message { event, .. } = parse_callback(&message_callback(&content, "")).unwrap()
        else {
            panic!("expected message");
        };
        assert_eq!(event.text, "/create_vm");
        assert_eq!(event.thread_id, "");
    }

    #[test]
    fn other_events_are_ignored() {
        let body = json!({
            "schema": "2.0",
            "header": {"event_id": "ev_9", "event_type": "im.chat.member.bot.added_v1", "token": "v-token"},
            "event": {}
        })
        .to_string();
        let cb = parse_callback(body.as_bytes()).unwrap();
        assert!(matches!(cb, Callback::Ignored { ref event_type, .. } if event_type == "im.chat.member.bot.added_v1"));
        assert_eq!(cb.token(), "v-token");
        assert_eq!(cb.event_id(), Some("ev_9"));
    }

    #[test]
    fn malformed_body() {
        assert!(parse_callback(b"{").is_err());
        assert!(parse_callback(b"{}").is_err());
    }

    #[test]
    fn strip_mentions_collapses_surrounding_whitespace() {
        assert_eq!(strip_mentions("@_user_1   hello", &["@_user_1"]), "hello");
        assert_eq!(strip_mentions("a @_user_1 b", &["@_user_1"]), "a b");
        assert_eq!(
            strip_mentions("@_user_1 x @_user_2", &["@_user_1", "@_user_2"]),
            "x"
        );
        assert_eq!(strip_mentions("no mention", &[]), "no mention");
    }

    #[test]
    fn strip_mentions_only_removes_listed_keys() {
        assert_eq!(strip_mentions("@_user_10 hi", &["@_user_1"]), "@_user_10 hi");
        assert_eq!(
            strip_mentions("@_user_1 ping @_user_2", &["@_user_1"]),
            "ping @_user_2"
        );
        assert_eq!(strip_mentions("@_all deploy", &["@_all"]), "deploy");
    }
}
