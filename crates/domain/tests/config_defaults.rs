use std::path::PathBuf;

use vmm_domain::config::Config;

#[test]
fn default_host_is_localhost() {
    let config = Config::default();
    assert_eq!(config.server.host, "127.0.0.1");
    assert_eq!(config.server.port, 8080);
}

#[test]
fn empty_file_uses_all_defaults() {
    let config: Config = toml::from_str("").unwrap();
    assert_eq!(config.lark.bot_name, "VM-Manager");
    assert_eq!(config.coordinator.reply_timeout_secs, 300);
    assert_eq!(config.coordinator.provision_timeout_secs, 600);
    assert_eq!(config.provisioning.terraform_bin, "terraform");
    assert_eq!(config.provisioning.output_key, "ip");
}

#[test]
fn default_assets_cover_terraform_inputs() {
    let config = Config::default();
    let assets = &config.provisioning.assets;
    assert_eq!(assets.len(), 5);
    assert_eq!(
        assets.get(&PathBuf::from("terraform/main.tf")).map(String::as_str),
        Some("main.tf")
    );
    assert_eq!(
        assets.get(&PathBuf::from("cloud-init/userdata.yaml")).map(String::as_str),
        Some("userdata.yaml")
    );
}

#[test]
fn partial_sections_parse() {
    let toml_str = r#"
[lark]
bot_name = "Provisioner"
api_base = "https://open.larksuite.com"

[coordinator]
reply_timeout_secs = 60

[provisioning]
work_root = "/var/lib/vm-manager/runs"
"#;
    let config: Config = toml::from_str(toml_str).unwrap();
    assert_eq!(config.lark.bot_name, "Provisioner");
    assert_eq!(config.lark.app_id_env, "APP_ID");
    assert_eq!(config.coordinator.reply_timeout_secs, 60);
    assert_eq!(config.coordinator.poll_interval_ms, 1_000);
    assert_eq!(
        config.provisioning.work_root,
        PathBuf::from("/var/lib/vm-manager/runs")
    );
}

#[test]
fn config_survives_toml_roundtrip() {
    let config = Config::default();
    let rendered = toml::to_string_pretty(&config).unwrap();
    let parsed: Config = toml::from_str(&rendered).unwrap();
    assert_eq!(parsed.lark.verification_token_env, "LARK_VERIFICATION_TOKEN");
    assert_eq!(parsed.provisioning.assets, config.provisioning.assets);
}
