//! Commands extracted from inbound chat events.

use serde::{Deserialize, Serialize};

use crate::chat::InboundEvent;

/// What an inbound message asks for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    /// `/create_vm` or `/createvm`.
    CreateVm,
    /// `/help`.
    Help,
    /// `/release`.
    Release,
    /// Any other slash-command.
    Unknown(String),
    /// Plain text; a candidate reply to an in-flight run.
    Reply,
}

impl CommandKind {
    /// Map a leading slash token to a command kind.
    pub fn from_token(token: &str) -> Self {
        match token {
            "/create_vm" | "/createvm" => Self::CreateVm,
            "/help" => Self::Help,
            "/release" => Self::Release,
            other => Self::Unknown(other.to_owned()),
        }
    }
}

/// A unit of work: the kind, its whitespace-separated arguments, and the
/// event it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    pub kind: CommandKind,
    pub args: Vec<String>,
    pub event: InboundEvent,
}

impl Command {
    /// Classify an inbound event. Text starting with `/` is a command;
    /// everything else (including empty text) is a reply.
    pub fn from_event(event: InboundEvent) -> Self {
        let trimmed = event.text.trim_start();
        if !trimmed.starts_with('/') {
            return Self {
                kind: CommandKind::Reply,
                args: Vec::new(),
                event,
            };
        }

        let mut parts = trimmed.split_whitespace();
        let kind = parts
            .next()
            .map(CommandKind::from_token)
            .unwrap_or(CommandKind::Reply);
        let args = parts.map(str::to_owned).collect();
        Self { kind, args, event }
    }

    pub fn is_reply(&self) -> bool {
        self.kind == CommandKind::Reply
    }

    pub fn message_id(&self) -> &str {
        &self.event.message_id
    }

    pub fn thread_id(&self) -> &str {
        &self.event.thread_id
    }

    pub fn user_id(&self) -> &str {
        &self.event.sender.user_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(text: &str) -> InboundEvent {
        InboundEvent {
            message_id: "om_1".into(),
            text: text.into(),
            ..Default::default()
        }
    }

    #[test]
    fn both_create_spellings() {
        assert_eq!(Command::from_event(event("/create_vm")).kind, CommandKind::CreateVm);
        assert_eq!(Command::from_event(event("/createvm")).kind, CommandKind::CreateVm);
    }

    #[test]
    fn arguments_are_split_on_whitespace() {
        let cmd = Command::from_event(event("/help  me   please"));
        assert_eq!(cmd.kind, CommandKind::Help);
        assert_eq!(cmd.args, vec!["me", "please"]);
    }

    #[test]
    fn plain_text_is_a_reply() {
        let cmd = Command::from_event(event("numvcpus = 4"));
        assert!(cmd.is_reply());
        assert!(cmd.args.is_empty());
    }

    #[test]
    fn empty_text_is_a_reply() {
        assert!(Command::from_event(event("")).is_reply());
    }

    #[test]
    fn unknown_slash_command_keeps_token() {
        let cmd = Command::from_event(event("/destroy all"));
        assert_eq!(cmd.kind, CommandKind::Unknown("/destroy".into()));
    }
}
