//! User-facing texts.

use vmm_domain::chat::mention_user;

/// Sent when the configured template file cannot be read.
pub const DEFAULT_TEMPLATE: &str = r#"esxi_hostname  = "ip"
esxi_hostport  = 22
esxi_hostssl   = 443
esxi_username  = "root"
esxi_password  = "password"
ssh_username   = "ubuntu"
ssh_public_key = ""
hostname       = "vm"
vm_name        = "vm"
numvcpus       = 2
memory         = 2048
disk_size      = 10
disk_type      = "thin"
ovf_source     = "source_url"
clone_from_vm  = ""
datastore      = "datastore"
network_name   = "VM Network"
"#;

pub const HELP: &str = r#"/create_vm - create a virtual machine (also /createvm)
/release - free the provisioning lock (reply inside the run's thread)
/help - show this message

Reply to the template inside its thread, mentioning the bot, with the edited values:
esxi_hostname  = "ip"            # ESXi host address
esxi_hostport  = 22
esxi_hostssl   = 443
esxi_username  = "root"
esxi_password  = "password"
ssh_username   = "ubuntu"        # SSH user name
ssh_public_key = ""
hostname       = "vm"
vm_name        = "vm"            # VM name, must be unique
numvcpus       = 2               # CPU cores
memory         = 2048            # memory in MB
disk_size      = 10              # disk size in GB
disk_type      = "thin"          # thin or thick
ovf_source     = "source_url"    # OVF image to deploy from
clone_from_vm  = ""              # existing VM to clone, empty for none
datastore      = "datastore"     # datastore name
network_name   = "VM Network"    # network name
"#;

pub const BUSY: &str = "Another VM deployment is running. Please try again later.";
pub const REPLY_TIMEOUT: &str = "Configuration timeout. Please try again.";
pub const PROVISION_FAILED: &str = "Failed to create VM. Please try again.";
pub const LOCK_RELEASED: &str = "Lock released";
pub const NOTHING_TO_RELEASE: &str = "No VM deployment is holding the lock.";

pub fn provisioned(user_id: &str, addresses: &[String]) -> String {
    format!(
        "{} VM successfully created with IP addresses:\n{}",
        mention_user(user_id),
        addresses.join("\n")
    )
}

pub fn release_from_thread(user_id: &str) -> String {
    format!(
        "{} Please release the lock by replying to the bot with /release within this thread!",
        mention_user(user_id)
    )
}

pub fn unknown_command(token: &str) -> String {
    format!("Unknown command {token}. Send /help for the list of commands.")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provisioned_lists_every_address() {
        let text = provisioned("u1", &["10.0.0.5".into(), "10.0.0.6".into()]);
        assert!(text.starts_with("<at user_id=\"u1\">u1</at>"));
        assert!(text.ends_with("10.0.0.5\n10.0.0.6"));
    }

    #[test]
    fn default_template_parses_cleanly() {
        let config = crate::parser::parse_config(DEFAULT_TEMPLATE);
        assert_eq!(config.len(), 17);
        assert_eq!(config["network_name"], "VM Network");
    }
}
