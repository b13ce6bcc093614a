//! Shared types for the VM-Manager workspace.
//!
//! Holds the configuration tree, the error enum, the chat/command types that
//! flow from the transport into the coordinator, and the two collaborator
//! traits ([`chat::ChatTransport`], [`provision::Provisioner`]) the core
//! consumes as black boxes.

pub mod chat;
pub mod command;
pub mod config;
pub mod error;
pub mod provision;

pub use chat::{ChatTransport, InboundEvent, ReplyReceipt, Sender};
pub use command::{Command, CommandKind};
pub use error::{Error, Result};
pub use provision::{ProvisionRequest, Provisioner};
