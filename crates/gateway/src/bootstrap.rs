//! AppState construction and background-task spawning.

use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use vmm_coordinator::messages::DEFAULT_TEMPLATE;
use vmm_coordinator::{spawn_dispatcher, Coordinator, CoordinatorSettings};
use vmm_domain::config::{Config, ConfigSeverity};
use vmm_lark::{DedupeStore, LarkClient};
use vmm_terraform::TerraformProvisioner;

use crate::state::AppState;

/// How often expired callback ids are dropped from the dedupe store.
const DEDUPE_PRUNE_INTERVAL: std::time::Duration = std::time::Duration::from_secs(600);

/// Validate config, initialize every subsystem and return a fully-wired
/// [`AppState`].
pub fn build_app_state(config: Arc<Config>, shutdown: CancellationToken) -> anyhow::Result<AppState> {
    // ── Config validation ────────────────────────────────────────────
    let issues = config.validate();
    for issue in &issues {
        match issue.severity {
            ConfigSeverity::Warning => tracing::warn!("config: {issue}"),
            ConfigSeverity::Error => tracing::error!("config: {issue}"),
        }
    }
    let error_count = issues
        .iter()
        .filter(|i| i.severity == ConfigSeverity::Error)
        .count();
    if error_count > 0 {
        anyhow::bail!("config validation failed with {error_count} error(s)");
    }

    // ── Lark client ──────────────────────────────────────────────────
    let app_id = require_env(&config.lark.app_id_env)?;
    let app_secret = require_env(&config.lark.app_secret_env)?;
    let lark = Arc::new(
        LarkClient::new(&config.lark, app_id, app_secret).context("building Lark client")?,
    );
    tracing::info!(api_base = %config.lark.api_base, "Lark client ready");

    let verification_token = std::env::var(&config.lark.verification_token_env)
        .ok()
        .filter(|t| !t.is_empty())
        .map(Arc::<str>::from);
    if verification_token.is_none() {
        tracing::warn!(
            env = %config.lark.verification_token_env,
            "no verification token configured, event callbacks are not authenticated"
        );
    }

    // ── Provisioner ──────────────────────────────────────────────────
    let provisioner = Arc::new(TerraformProvisioner::new(config.provisioning.clone()));
    tracing::info!(
        terraform = %config.provisioning.terraform_bin,
        work_root = %config.provisioning.work_root.display(),
        "terraform provisioner ready"
    );

    // ── Coordinator ──────────────────────────────────────────────────
    let template = load_template(&config.provisioning.template_path);
    let settings = CoordinatorSettings::from_config(&config, template);
    let coordinator = Arc::new(Coordinator::new(lark, provisioner, settings));

    Ok(AppState {
        dedupe: Arc::new(DedupeStore::new(config.coordinator.dedupe_ttl())),
        config,
        coordinator,
        verification_token,
        shutdown,
    })
}

fn require_env(name: &str) -> anyhow::Result<String> {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .with_context(|| format!("environment variable {name} is not set"))
}

/// Read the template published on `/create_vm`, falling back to the built-in
/// one when the file is unreadable.
pub fn load_template(path: &Path) -> String {
    match std::fs::read_to_string(path) {
        Ok(template) => {
            tracing::info!(path = %path.display(), "template loaded");
            template
        }
        Err(e) => {
            tracing::warn!(
                path = %path.display(),
                error = %e,
                "template not readable, using built-in template"
            );
            DEFAULT_TEMPLATE.to_owned()
        }
    }
}

/// Start the dispatcher and the housekeeping loop. Both stop when
/// `state.shutdown` is cancelled; the dispatcher's handle is returned so the
/// caller can wait for it.
pub fn spawn_background_tasks(state: &AppState) -> JoinHandle<()> {
    // ── Periodic dedupe pruning ──────────────────────────────────────
    {
        let dedupe = state.dedupe.clone();
        let shutdown = state.shutdown.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(DEDUPE_PRUNE_INTERVAL);
            loop {
                tokio::select! {
                    _ = shutdown.cancelled() => break,
                    _ = interval.tick() => {
                        let pruned = dedupe.prune();
                        if pruned > 0 {
                            tracing::debug!(pruned, remaining = dedupe.len(), "dedupe store pruned");
                        }
                    }
                }
            }
        });
    }

    // ── Command dispatcher ───────────────────────────────────────────
    spawn_dispatcher(state.coordinator.clone(), state.shutdown.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("terraform.tfvars");
        std::fs::write(&path, "vm_name = \"x\"\n").unwrap();
        assert_eq!(load_template(&path), "vm_name = \"x\"\n");
    }

    #[test]
    fn missing_template_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(
            load_template(&dir.path().join("absent.tfvars")),
            DEFAULT_TEMPLATE
        );
    }

    #[test]
    fn missing_env_is_reported() {
        let err = require_env("VMM_TEST_SURELY_UNSET_VARIABLE").unwrap_err();
        assert!(err.to_string().contains("VMM_TEST_SURELY_UNSET_VARIABLE"));
    }
}
