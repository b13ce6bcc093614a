//! Terraform-backed [`vmm_domain::Provisioner`].
//!
//! Each run gets its own working directory under the configured work root,
//! populated with symlinks to the shared Terraform assets and a generated
//! `terraform.tfvars`. The directory is removed when the run ends, however it
//! ends.

pub mod exec;
pub mod output;
pub mod provisioner;
pub mod tfvars;
pub mod workdir;

pub use provisioner::TerraformProvisioner;
