use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Lark / Feishu chat transport
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LarkConfig {
    /// Open platform base URL (`https://open.larksuite.com` for Lark,
    /// `https://open.feishu.cn` for Feishu).
    #[serde(default = "d_api_base")]
    pub api_base: String,
    /// Environment variable holding the app id.
    #[serde(default = "d_app_id_env")]
    pub app_id_env: String,
    /// Environment variable holding the app secret.
    #[serde(default = "d_app_secret_env")]
    pub app_secret_env: String,
    /// Environment variable holding the event-callback verification token.
    /// If unset, inbound callbacks are accepted without a token check.
    #[serde(default = "d_verification_token_env")]
    pub verification_token_env: String,
    /// Display name of the bot. Replies must mention it to be considered.
    #[serde(default = "d_bot_name")]
    pub bot_name: String,
    #[serde(default = "d_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for LarkConfig {
    fn default() -> Self {
        Self {
            api_base: d_api_base(),
            app_id_env: d_app_id_env(),
            app_secret_env: d_app_secret_env(),
            verification_token_env: d_verification_token_env(),
            bot_name: d_bot_name(),
            request_timeout_ms: d_request_timeout_ms(),
        }
    }
}

fn d_api_base() -> String {
    "https://open.feishu.cn".into()
}

fn d_app_id_env() -> String {
    "APP_ID".into()
}

fn d_app_secret_env() -> String {
    "APP_SECRET".into()
}

fn d_verification_token_env() -> String {
    "LARK_VERIFICATION_TOKEN".into()
}

fn d_bot_name() -> String {
    "VM-Manager".into()
}

fn d_request_timeout_ms() -> u64 {
    10_000
}
