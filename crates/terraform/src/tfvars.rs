//! `terraform.tfvars` rendering.

use std::collections::HashMap;
use std::path::Path;

use vmm_domain::{Error, Result};

pub const FILE_NAME: &str = "terraform.tfvars";

/// One `key = "value"` line per entry, sorted by key. Every value is written
/// as a string; Terraform converts to the declared variable type.
pub fn render(config: &HashMap<String, String>) -> String {
    let mut keys: Vec<&String> = config.keys().collect();
    keys.sort();

    let mut out = String::new();
    for key in keys {
        out.push_str(key);
        out.push_str(" = \"");
        out.push_str(&escape(&config[key]));
        out.push_str("\"\n");
    }
    out
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

pub async fn write(dir: &Path, config: &HashMap<String, String>) -> Result<()> {
    let path = dir.join(FILE_NAME);
    tokio::fs::write(&path, render(config))
        .await
        .map_err(|e| Error::provisioning("tfvars", format!("writing {}: {e}", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn sorted_and_quoted() {
        let rendered = render(&config(&[("numvcpus", "4"), ("hostname", "db-01")]));
        assert_eq!(rendered, "hostname = \"db-01\"\nnumvcpus = \"4\"\n");
    }

    #[test]
    fn quotes_and_backslashes_are_escaped() {
        let rendered = render(&config(&[("ssh_public_key", r#"ssh-rsa "x" C:\k"#)]));
        assert_eq!(rendered, "ssh_public_key = \"ssh-rsa \\\"x\\\" C:\\\\k\"\n");
    }

    #[test]
    fn empty_config_renders_nothing() {
        assert!(render(&HashMap::new()).is_empty());
    }

    #[tokio::test]
    async fn writes_into_directory() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), &config(&[("vm_name", "web")])).await.unwrap();

        let written = std::fs::read_to_string(dir.path().join(FILE_NAME)).unwrap();
        assert_eq!(written, "vm_name = \"web\"\n");
    }
}
