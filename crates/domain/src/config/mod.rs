mod coordinator;
mod lark;
mod observability;
mod provisioning;
mod server;

pub use coordinator::*;
pub use lark::*;
pub use observability::*;
pub use provisioning::*;
pub use server::*;

use serde::{Deserialize, Serialize};
use std::fmt;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub lark: LarkConfig,
    #[serde(default)]
    pub coordinator: CoordinatorConfig,
    #[serde(default)]
    pub provisioning: ProvisioningConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Config validation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Severity level for a configuration issue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSeverity {
    Error,
    Warning,
}

/// A single configuration validation issue.
#[derive(Debug, Clone)]
pub struct ConfigError {
    pub severity: ConfigSeverity,
    pub field: String,
    pub message: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.severity {
            ConfigSeverity::Error => "ERROR",
            ConfigSeverity::Warning => "WARN",
        };
        write!(f, "[{tag}] {}: {}", self.field, self.message)
    }
}

impl ConfigError {
    fn error(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Error,
            field: field.into(),
            message: message.into(),
        }
    }

    fn warning(field: &str, message: impl Into<String>) -> Self {
        Self {
            severity: ConfigSeverity::Warning,
            field: field.into(),
            message: message.into(),
        }
    }
}

impl Config {
    /// Validate the configuration and return a list of issues.
    ///
    /// Returns an empty vec when everything looks good.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        if self.server.port == 0 {
            errors.push(ConfigError::error("server.port", "port must be greater than 0"));
        }
        if self.server.host.is_empty() {
            errors.push(ConfigError::error("server.host", "host must not be empty"));
        }

        if self.lark.api_base.is_empty() {
            errors.push(ConfigError::error("lark.api_base", "api_base must not be empty"));
        }
        if self.lark.bot_name.trim().is_empty() {
            errors.push(ConfigError::error(
                "lark.bot_name",
                "bot_name must not be empty (replies are matched on it)",
            ));
        }
        for (field, env) in [
            ("lark.app_id_env", &self.lark.app_id_env),
            ("lark.app_secret_env", &self.lark.app_secret_env),
        ] {
            if std::env::var(env).map(|v| v.is_empty()).unwrap_or(true) {
                errors.push(ConfigError::warning(
                    field,
                    format!("environment variable {env} is not set; replies will fail"),
                ));
            }
        }

        if self.coordinator.reply_timeout_secs == 0 {
            errors.push(ConfigError::error(
                "coordinator.reply_timeout_secs",
                "reply timeout must be greater than 0",
            ));
        }
        if self.coordinator.provision_timeout_secs == 0 {
            errors.push(ConfigError::error(
                "coordinator.provision_timeout_secs",
                "provisioning timeout must be greater than 0",
            ));
        }
        if self.coordinator.poll_interval_ms == 0 {
            errors.push(ConfigError::error(
                "coordinator.poll_interval_ms",
                "poll interval must be greater than 0",
            ));
        }

        if self.provisioning.terraform_bin.is_empty() {
            errors.push(ConfigError::error(
                "provisioning.terraform_bin",
                "terraform_bin must not be empty",
            ));
        }
        if self.provisioning.output_key.is_empty() {
            errors.push(ConfigError::error(
                "provisioning.output_key",
                "output_key must not be empty",
            ));
        }
        if !self.provisioning.template_path.exists() {
            errors.push(ConfigError::warning(
                "provisioning.template_path",
                format!(
                    "{} not found; the built-in template will be sent",
                    self.provisioning.template_path.display()
                ),
            ));
        }

        errors
    }
}
