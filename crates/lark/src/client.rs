//! Outbound side of the Lark open platform.
//!
//! Only the two calls the bot needs: tenant token issuance and message reply.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use uuid::Uuid;
use vmm_domain::config::LarkConfig;
use vmm_domain::{ChatTransport, Error, ReplyReceipt, Result};

const TOKEN_PATH: &str = "/open-apis/auth/v3/tenant_access_token/internal";

/// Refresh the tenant token this long before Lark says it expires.
const REFRESH_MARGIN: Duration = Duration::from_secs(300);

/// Response codes meaning the tenant token is missing, invalid or expired.
const TOKEN_REJECTED: &[i64] = &[99991661, 99991663, 99991668];

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Wire types
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Serialize)]
struct TokenRequest<'a> {
    app_id: &'a str,
    app_secret: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    code: i64,
    #[serde(default)]
    msg: String,
    #[serde(default)]
    tenant_access_token: String,
    /// Seconds until expiry.
    #[serde(default)]
    expire: u64,
}

#[derive(Serialize)]
struct ReplyRequest<'a> {
    /// JSON-encoded `{"text": ...}`.
    content: String,
    msg_type: &'a str,
    reply_in_thread: bool,
    /// Idempotency key; Lark drops a second request with the same value.
    uuid: String,
}

#[derive(Deserialize)]
struct ApiResponse<T> {
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<T>,
}

#[derive(Deserialize)]
struct SentMessage {
    message_id: String,
    #[serde(default)]
    thread_id: String,
}

struct CachedToken {
    value: String,
    refresh_at: Instant,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Client
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct LarkClient {
    http: Client,
    base_url: String,
    app_id: String,
    app_secret: String,
    /// Held across the refresh request so concurrent callers wait for one
    /// token instead of each fetching their own.
    token: Mutex<Option<CachedToken>>,
}

impl LarkClient {
    pub fn new(cfg: &LarkConfig, app_id: String, app_secret: String) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(cfg.request_timeout_ms))
            .build()
            .map_err(|e| Error::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: cfg.api_base.trim_end_matches('/').to_owned(),
            app_id,
            app_secret,
            token: Mutex::new(None),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    // ── tenant token ─────────────────────────────────────────────────

    async fn tenant_token(&self) -> Result<String> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref() {
            if Instant::now() < token.refresh_at {
                return Ok(token.value.clone());
            }
        }

        let resp = self
            .http
            .post(self.url(TOKEN_PATH))
            .json(&TokenRequest {
                app_id: &self.app_id,
                app_secret: &self.app_secret,
            })
            .send()
            .await
            .map_err(|e| Error::Http(format!("tenant token: {e}")))?;
        let status = resp.status();
        let body = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("tenant token: {e}")))?;
        let parsed: TokenResponse = serde_json::from_str(&body)
            .map_err(|_| Error::Http(format!("tenant token returned {status}: {body}")))?;

        if parsed.code != 0 || parsed.tenant_access_token.is_empty() {
            return Err(Error::Chat(format!(
                "tenant token rejected: code {} {}",
                parsed.code, parsed.msg
            )));
        }

        let ttl = Duration::from_secs(parsed.expire).saturating_sub(REFRESH_MARGIN);
        tracing::debug!(expire_secs = parsed.expire, "tenant access token refreshed");
        *cached = Some(CachedToken {
            value: parsed.tenant_access_token.clone(),
            refresh_at: Instant::now() + ttl,
        });
        Ok(parsed.tenant_access_token)
    }

    async fn invalidate_token(&self) {
        *self.token.lock().await = None;
    }

    // ── reply ────────────────────────────────────────────────────────

    async fn post_reply(
        &self,
        message_id: &str,
        body: &ReplyRequest<'_>,
    ) -> Result<ApiResponse<SentMessage>> {
        let token = self.tenant_token().await?;
        let resp = self
            .http
            .post(self.url(&format!("/open-apis/im/v1/messages/{message_id}/reply")))
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| Error::Http(format!("reply: {e}")))?;
        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| Error::Http(format!("reply: {e}")))?;
        serde_json::from_str(&text)
            .map_err(|_| Error::Http(format!("reply returned {status}: {text}")))
    }
}

#[async_trait]
impl ChatTransport for LarkClient {
    async fn reply(&self, message_id: &str, text: &str, reply_in_thread: bool) -> Result<ReplyReceipt> {
        let body = ReplyRequest {
            content: serde_json::json!({ "text": text }).to_string(),
            msg_type: "text",
            reply_in_thread,
            uuid: Uuid::new_v4().to_string(),
        };

        let mut resp = self.post_reply(message_id, &body).await?;
        if TOKEN_REJECTED.contains(&resp.code) {
            tracing::info!(code = resp.code, "tenant token rejected, refreshing");
            self.invalidate_token().await;
            resp = self.post_reply(message_id, &body).await?;
        }

        if resp.code != 0 {
            return Err(Error::Chat(format!(
                "reply to {message_id} failed: code {} {}",
                resp.code, resp.msg
            )));
        }
        let sent = resp
            .data
            .ok_or_else(|| Error::Chat(format!("reply to {message_id} returned no data")))?;

        tracing::debug!(
            message_id = %message_id,
            reply_id = %sent.message_id,
            thread_id = %sent.thread_id,
            reply_in_thread,
            "reply sent"
        );
        Ok(ReplyReceipt {
            message_id: sent.message_id,
            thread_id: sent.thread_id,
        })
    }
}
