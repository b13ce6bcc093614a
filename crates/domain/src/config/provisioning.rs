use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Terraform provisioning
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProvisioningConfig {
    /// Terraform executable (name on `PATH` or absolute path).
    #[serde(default = "d_terraform_bin")]
    pub terraform_bin: String,
    /// Parent directory for per-run working directories.
    #[serde(default = "d_work_root")]
    pub work_root: PathBuf,
    /// Template published to the user on `/create_vm`.
    #[serde(default = "d_template_path")]
    pub template_path: PathBuf,
    /// Files symlinked into every working directory: source path → link name.
    #[serde(default = "d_assets")]
    pub assets: BTreeMap<PathBuf, String>,
    /// Terraform output holding the list of provisioned addresses.
    #[serde(default = "d_output_key")]
    pub output_key: String,
}

impl Default for ProvisioningConfig {
    fn default() -> Self {
        Self {
            terraform_bin: d_terraform_bin(),
            work_root: d_work_root(),
            template_path: d_template_path(),
            assets: d_assets(),
            output_key: d_output_key(),
        }
    }
}

fn d_terraform_bin() -> String {
    "terraform".into()
}

fn d_work_root() -> PathBuf {
    PathBuf::from("generate")
}

fn d_template_path() -> PathBuf {
    PathBuf::from("terraform/terraform.tfvars")
}

fn d_assets() -> BTreeMap<PathBuf, String> {
    [
        ("terraform/main.tf", "main.tf"),
        ("terraform/variable.tf", "variable.tf"),
        ("terraform/.terraform", ".terraform"),
        ("terraform/.terraform.lock.hcl", ".terraform.lock.hcl"),
        ("cloud-init/userdata.yaml", "userdata.yaml"),
    ]
    .into_iter()
    .map(|(src, dest)| (PathBuf::from(src), dest.to_owned()))
    .collect()
}

fn d_output_key() -> String {
    "ip".into()
}
