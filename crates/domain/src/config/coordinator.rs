use std::time::Duration;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Run coordination timings
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoordinatorConfig {
    /// How long a run waits for the user's edited template.
    #[serde(default = "d_reply_timeout_secs")]
    pub reply_timeout_secs: u64,
    /// Upper bound on a single provisioning execution.
    #[serde(default = "d_provision_timeout_secs")]
    pub provision_timeout_secs: u64,
    /// Dispatcher poll interval for the ingress queue.
    #[serde(default = "d_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// How long inbound event ids are remembered for redelivery dedupe.
    #[serde(default = "d_dedupe_ttl_secs")]
    pub dedupe_ttl_secs: u64,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            reply_timeout_secs: d_reply_timeout_secs(),
            provision_timeout_secs: d_provision_timeout_secs(),
            poll_interval_ms: d_poll_interval_ms(),
            dedupe_ttl_secs: d_dedupe_ttl_secs(),
        }
    }
}

impl CoordinatorConfig {
    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs)
    }

    pub fn provision_timeout(&self) -> Duration {
        Duration::from_secs(self.provision_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn dedupe_ttl(&self) -> Duration {
        Duration::from_secs(self.dedupe_ttl_secs)
    }
}

fn d_reply_timeout_secs() -> u64 {
    300
}

fn d_provision_timeout_secs() -> u64 {
    600
}

fn d_poll_interval_ms() -> u64 {
    1_000
}

fn d_dedupe_ttl_secs() -> u64 {
    86_400
}
