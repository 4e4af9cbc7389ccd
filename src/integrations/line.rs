//! LINE Messaging API 集成
//!
//! 通过 Webhook 接收消息（X-Line-Signature 签名校验），交给 Journal 处理后用 Reply API 回复。
//! 签名不符时拒绝整个请求体；签名通过后 Webhook 一律应答成功，回复投递失败只记日志。

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Router,
};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::core::Journal;

const LINE_REPLY_URL: &str = "https://api.line.me/v2/bot/message/reply";

/// LINE 服务状态
pub struct LineState {
    pub journal: Arc<Journal>,
    pub access_token: String,
    pub channel_secret: String,
}

/// Webhook 请求体
#[derive(Debug, Deserialize)]
pub struct WebhookPayload {
    #[serde(default)]
    pub events: Vec<WebhookEvent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookEvent {
    #[serde(rename = "type")]
    pub event_type: String,
    pub reply_token: Option<String>,
    pub source: Option<WebhookSource>,
    pub message: Option<WebhookMessage>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookSource {
    pub user_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WebhookMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub text: Option<String>,
}

/// Reply API 请求体
#[derive(Debug, Serialize)]
struct ReplyRequest<'a> {
    #[serde(rename = "replyToken")]
    reply_token: &'a str,
    messages: Vec<ReplyMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct ReplyMessage<'a> {
    #[serde(rename = "type")]
    msg_type: &'a str,
    text: &'a str,
}

/// 创建 LINE 路由
pub fn create_router(state: Arc<LineState>) -> Router {
    Router::new()
        .route("/callback", post(webhook_receive))
        .route("/health", get(|| async { "OK" }))
        .with_state(state)
}

/// base64(HMAC-SHA256(channel_secret, body))，与 X-Line-Signature 比对
fn signature(channel_secret: &str, body: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(channel_secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(body.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

/// POST /callback - 接收 LINE 消息
async fn webhook_receive(
    State(state): State<Arc<LineState>>,
    headers: HeaderMap,
    body: String,
) -> Result<&'static str, StatusCode> {
    let provided = headers
        .get("X-Line-Signature")
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if signature(&state.channel_secret, &body) != provided {
        tracing::warn!("invalid webhook signature, rejecting");
        return Err(StatusCode::BAD_REQUEST);
    }

    let payload: WebhookPayload = match serde_json::from_str(&body) {
        Ok(p) => p,
        Err(e) => {
            tracing::warn!(error = %e, "unparsable webhook payload");
            return Err(StatusCode::BAD_REQUEST);
        }
    };

    for event in payload.events {
        if event.event_type != "message" {
            continue;
        }
        let Some(message) = event.message else { continue };
        if message.msg_type != "text" {
            continue;
        }
        let Some(text) = message.text else { continue };
        let Some(reply_token) = event.reply_token else { continue };
        let user_id = event
            .source
            .and_then(|s| s.user_id)
            .unwrap_or_else(|| "unknown".to_string());

        let reply = state.journal.process(&text, &user_id).await;

        if let Err(e) = send_reply(&state.access_token, &reply_token, &reply).await {
            tracing::error!(error = %e, "failed to send LINE reply");
        }
    }

    Ok("OK")
}

/// 通过 Reply API 发送单条文本回复
async fn send_reply(access_token: &str, reply_token: &str, text: &str) -> anyhow::Result<()> {
    let req = ReplyRequest {
        reply_token,
        messages: vec![ReplyMessage {
            msg_type: "text",
            text,
        }],
    };

    let client = reqwest::Client::new();
    let resp = client
        .post(LINE_REPLY_URL)
        .bearer_auth(access_token)
        .json(&req)
        .send()
        .await?;

    if !resp.status().is_success() {
        let text = resp.text().await?;
        anyhow::bail!("LINE reply API error: {}", text);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_matches_known_vector() {
        // echo -n 'body' | openssl dgst -sha256 -hmac 'secret' -binary | base64
        assert_eq!(
            signature("secret", "body"),
            "3EaYNVf+oSe0OvchRn65s/3iM4/j4U9RlSqoR4wT01U="
        );
    }

    #[test]
    fn signature_depends_on_secret_and_body() {
        assert_ne!(signature("secret", "body"), signature("other", "body"));
        assert_ne!(signature("secret", "body"), signature("secret", "other"));
    }

    #[test]
    fn webhook_payload_parses_camel_case_fields() {
        let body = r#"{"events":[{"type":"message","replyToken":"abc","source":{"userId":"U1"},"message":{"type":"text","text":"hi"}}]}"#;
        let payload: WebhookPayload = serde_json::from_str(body).unwrap();
        let event = &payload.events[0];
        assert_eq!(event.reply_token.as_deref(), Some("abc"));
        assert_eq!(
            event.source.as_ref().and_then(|s| s.user_id.as_deref()),
            Some("U1")
        );
        assert_eq!(
            event.message.as_ref().and_then(|m| m.text.as_deref()),
            Some("hi")
        );
    }
}
