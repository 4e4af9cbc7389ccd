//! Ollama 兼容 API 客户端
//!
//! POST `{model, prompt, stream:false, format?:"json"}` 到 /api/generate 形式的端点，
//! 可选 Bearer 凭证，读取 `{response}` 正文。失败只记日志，不向上抛。

use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::llm::LlmClient;

static JSON_OBJECT_RE: OnceLock<Regex> = OnceLock::new();

/// 截取正文中首个 `{` 到最后一个 `}` 的贪婪片段并解析；无对象或不可解析时返回 None
pub(crate) fn extract_json_object(raw: &str) -> Option<serde_json::Value> {
    let re = JSON_OBJECT_RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").unwrap());
    let m = re.find(raw)?;
    serde_json::from_str(m.as_str()).ok()
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// Ollama 兼容客户端：持有端点 URL、模型名与可选凭证
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
    api_key: Option<String>,
}

impl OllamaClient {
    pub fn new(url: &str, model: &str, api_key: Option<&str>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.to_string(),
            model: model.to_string(),
            api_key: api_key.map(String::from),
        }
    }

    /// 单次生成调用；任何失败路径都折叠为 None 并带上下文记日志
    async fn request(&self, prompt: &str, format: Option<&str>, timeout: Duration) -> Option<String> {
        let payload = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            format,
        };

        tracing::debug!(
            timeout_secs = timeout.as_secs(),
            structured = format.is_some(),
            "calling LLM backend"
        );

        let mut req = self.http.post(&self.url).timeout(timeout).json(&payload);
        if let Some(key) = &self.api_key {
            req = req.bearer_auth(key);
        }

        match req.send().await {
            Ok(resp) if resp.status().is_success() => match resp.json::<GenerateResponse>().await {
                Ok(body) => Some(body.response),
                Err(e) => {
                    tracing::warn!(error = %e, "LLM response body was not the expected shape");
                    None
                }
            },
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "LLM backend returned non-success status");
                None
            }
            Err(e) if e.is_timeout() => {
                tracing::warn!(timeout_secs = timeout.as_secs(), "LLM call timed out");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "LLM call failed");
                None
            }
        }
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str, timeout: Duration) -> Option<String> {
        self.request(prompt, None, timeout).await
    }

    async fn generate_json(&self, prompt: &str, timeout: Duration) -> Option<serde_json::Value> {
        let raw = self.request(prompt, Some("json"), timeout).await?;
        let parsed = extract_json_object(&raw);
        if parsed.is_none() {
            tracing::warn!("no parsable JSON object in structured LLM response");
        }
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_finds_object_with_surrounding_prose() {
        let raw = "Sure! Here you go:\n{\"intent\": \"STORE\"}\nLet me know.";
        let v = extract_json_object(raw).unwrap();
        assert_eq!(v["intent"], "STORE");
    }

    #[test]
    fn extract_handles_nested_multiline_objects() {
        let raw = "{\n  \"date\": \"2024-06-02\",\n  \"inner\": {\"time\": \"12:00\"}\n}";
        let v = extract_json_object(raw).unwrap();
        assert_eq!(v["inner"]["time"], "12:00");
    }

    #[test]
    fn extract_is_greedy_first_to_last_brace() {
        // 贪婪匹配跨越两个对象之间的文本，整体不是合法 JSON
        assert!(extract_json_object("{\"a\": 1} and {\"b\": 2}").is_none());
    }

    #[test]
    fn extract_without_braces_is_none() {
        assert!(extract_json_object("no json here").is_none());
    }
}
