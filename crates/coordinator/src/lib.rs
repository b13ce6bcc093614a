//! Conversation-correlated, single-flight job coordination.
//!
//! A `/create_vm` command takes the [`slot::JobSlot`], publishes a template
//! into a new chat thread, and waits for the user's edited copy to come back
//! through the [`correlator`] before provisioning. Only one run holds the slot
//! at a time; everyone else is told the system is busy.

pub mod coordinator;
pub mod correlator;
pub mod dispatcher;
pub mod messages;
pub mod parser;
pub mod queue;
pub mod registry;
pub mod release;
pub mod run;
pub mod slot;

#[cfg(test)]
mod testing;

pub use coordinator::{Coordinator, CoordinatorSettings, CoordinatorStatus, Ingested};
pub use correlator::ReplyOutcome;
pub use dispatcher::spawn_dispatcher;
pub use parser::{parse_config, ParsedConfig};
pub use release::ReleaseOutcome;
pub use run::RunOutcome;
