use std::path::Path;

use async_trait::async_trait;
use vmm_domain::config::ProvisioningConfig;
use vmm_domain::{ProvisionRequest, Provisioner, Result};

use crate::workdir::Workdir;
use crate::{exec, output, tfvars};

/// Runs `init`, `apply` and `output` for one request in a fresh working
/// directory.
pub struct TerraformProvisioner {
    config: ProvisioningConfig,
}

impl TerraformProvisioner {
    pub fn new(config: ProvisioningConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProvisioningConfig {
        &self.config
    }
}

#[async_trait]
impl Provisioner for TerraformProvisioner {
    async fn provision(&self, request: ProvisionRequest) -> Result<Vec<String>> {
        let bin = self.config.terraform_bin.as_str();
        let workdir =
            Workdir::stage(&self.config.work_root, &request.workdir, &self.config.assets).await?;
        let dir = workdir.path();
        tracing::info!(dir = %dir.display(), keys = request.config.len(), "running terraform");

        let result = self.apply(bin, dir, &request).await;
        workdir.remove().await;
        result
    }
}

impl TerraformProvisioner {
    async fn apply(
        &self,
        bin: &str,
        dir: &Path,
        request: &ProvisionRequest,
    ) -> Result<Vec<String>> {
        tfvars::write(dir, &request.config).await?;
        exec::run(bin, dir, "init", &["init", "-input=false"]).await?;
        exec::run(bin, dir, "apply", &["apply", "-auto-approve", "-input=false"]).await?;
        let raw = exec::capture(bin, dir, "output", &["output", "-json"]).await?;

        output::addresses(&raw, &self.config.output_key)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use std::collections::{BTreeMap, HashMap};
    use std::os::unix::fs::PermissionsExt;
    use std::path::PathBuf;

    use super::*;

    /// A stand-in `terraform` that logs its subcommands and checks the
    /// staged directory.
    fn fake_terraform(dir: &Path, apply_exit: i32) -> PathBuf {
        let log = dir.join("calls.log");
        let script = format!(
            r#"#!/bin/sh
echo "$1 $(basename "$PWD")" >> "{log}"
case "$1" in
  init) test -L main.tf || exit 9 ;;
  apply) grep -q 'vm_name = "web"' terraform.tfvars || exit 8; exit {apply_exit} ;;
  output) printf '{{"ip": {{"value": ["10.0.0.5"]}}}}' ;;
esac
"#,
            log = log.display(),
        );
        let path = dir.join("terraform");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn provisioner(scratch: &Path, apply_exit: i32) -> TerraformProvisioner {
        let main_tf = scratch.join("main.tf");
        std::fs::write(&main_tf, "").unwrap();
        TerraformProvisioner::new(ProvisioningConfig {
            terraform_bin: fake_terraform(scratch, apply_exit).display().to_string(),
            work_root: scratch.join("generate"),
            assets: BTreeMap::from([(main_tf, "main.tf".to_string())]),
            ..Default::default()
        })
    }

    fn request() -> ProvisionRequest {
        ProvisionRequest {
            workdir: "omt_run".into(),
            config: HashMap::from([("vm_name".to_string(), "web".to_string())]),
        }
    }

    #[tokio::test]
    async fn runs_steps_in_order_and_cleans_up() {
        let scratch = tempfile::tempdir().unwrap();
        let p = provisioner(scratch.path(), 0);

        let addresses = p.provision(request()).await.unwrap();

        assert_eq!(addresses, vec!["10.0.0.5"]);
        let calls = std::fs::read_to_string(scratch.path().join("calls.log")).unwrap();
        assert_eq!(calls, "init omt_run\napply omt_run\noutput omt_run\n");
        assert!(!scratch.path().join("generate/omt_run").exists());
    }

    #[tokio::test]
    async fn apply_failure_names_step_and_cleans_up() {
        let scratch = tempfile::tempdir().unwrap();
        let p = provisioner(scratch.path(), 1);

        let err = p.provision(request()).await.unwrap_err();

        assert!(err.to_string().starts_with("provisioning apply"), "{err}");
        let calls = std::fs::read_to_string(scratch.path().join("calls.log")).unwrap();
        assert!(!calls.contains("output"));
        assert!(!scratch.path().join("generate/omt_run").exists());
    }
}
