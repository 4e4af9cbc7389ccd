//! 回复生成
//!
//! 把操作结果交给 LLM 组织成一句自然语言确认；网关无结果或空响应时退回调用方
//! 提供的确定性兜底句，保证后端完全不可用时用户也总能收到回复。

use std::sync::Arc;
use std::time::Duration;

use crate::llm::LlmClient;

/// 回复生成器：持有 LLM 客户端与生成超时
pub struct ResponseComposer {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl ResponseComposer {
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// 自由文本模式生成确认句；失败时返回 fallback
    pub async fn compose(
        &self,
        operation: &str,
        details: &serde_json::Value,
        fallback: &str,
    ) -> String {
        let prompt = build_prompt(operation, details);
        match self.llm.generate(&prompt, self.timeout).await {
            Some(text) if !text.trim().is_empty() => text.trim().to_string(),
            _ => {
                tracing::info!(operation, "composer falling back to deterministic reply");
                fallback.to_string()
            }
        }
    }
}

fn build_prompt(operation: &str, details: &serde_json::Value) -> String {
    format!(
        r#"You are a smart assistant that parses user requests about tasks and schedules.

Generate a natural, human-like response to tell user that the action was successful for the following operation:
Operation: {operation}
Details: {details}

You should make the response friendly and human-like.

Only return the response text, nothing else."#
    )
}
