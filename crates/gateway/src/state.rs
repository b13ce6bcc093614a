use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use vmm_coordinator::Coordinator;
use vmm_domain::config::Config;
use vmm_lark::DedupeStore;

/// Shared application state passed to all API handlers.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub coordinator: Arc<Coordinator>,
    /// Recently seen callback `event_id`s.
    pub dedupe: Arc<DedupeStore>,
    /// Expected callback verification token; `None` skips the check.
    pub verification_token: Option<Arc<str>>,
    /// Cancelled on SIGINT/SIGTERM; background loops stop on it.
    pub shutdown: CancellationToken,
}
