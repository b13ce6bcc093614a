//! Provisioning-collaborator contract.

use std::collections::HashMap;

use async_trait::async_trait;

use crate::error::Result;

/// Everything a provisioner needs for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvisionRequest {
    /// Name of the per-run working directory (the run's thread identity).
    pub workdir: String,
    /// Key/value pairs parsed from the user's edited template.
    pub config: HashMap<String, String>,
}

/// Executes a provisioning job and reports the resulting addresses.
///
/// The coordinator bounds the call with its execution timeout by dropping
/// the future; implementations must not leave work running once dropped.
#[async_trait]
pub trait Provisioner: Send + Sync {
    async fn provision(&self, request: ProvisionRequest) -> Result<Vec<String>>;
}
