//! LLM 客户端抽象
//!
//! 所有后端（Ollama 兼容 / Mock）实现 LlmClient：generate（自由文本）、generate_json（结构化）。
//! 契约是全函数：传输失败、超时、非 2xx、JSON 不可解析一律折叠为 None，不向调用方抛错；
//! 调用方必须把「无结果」当软失败处理。

use std::time::Duration;

use async_trait::async_trait;

/// LLM 客户端 trait：超时按次指定（意图解析与回复生成用不同预算）
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 自由文本模式：原样返回响应正文
    async fn generate(&self, prompt: &str, timeout: Duration) -> Option<String>;

    /// 结构化模式：要求后端输出 JSON，从正文截取首个 `{` 到最后一个 `}` 并解析
    async fn generate_json(&self, prompt: &str, timeout: Duration) -> Option<serde_json::Value>;
}
