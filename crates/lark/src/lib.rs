//! Lark (Feishu) open-platform transport: event-callback decoding on the way
//! in, the IM reply API on the way out.

pub mod client;
pub mod dedupe;
pub mod event;
pub mod verify;

pub use client::LarkClient;
pub use dedupe::DedupeStore;
pub use event::{parse_callback, Callback};
pub use verify::token_eq;
