//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按脚本化队列依次弹出回复，队列耗尽后一律返回 None（模拟后端完全不可用），并统计调用次数。

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use crate::llm::ollama::extract_json_object;
use crate::llm::LlmClient;

/// Mock 客户端：预置回复队列 + 调用计数
#[derive(Debug, Default)]
pub struct MockLlmClient {
    replies: Mutex<VecDeque<Option<String>>>,
    calls: AtomicUsize,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一串回复，每次调用按序弹出；None 表示该次调用失败
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        Self {
            replies: Mutex::new(replies.into_iter().map(|r| r.map(Into::into)).collect()),
            calls: AtomicUsize::new(0),
        }
    }

    /// 已收到的调用次数
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self) -> Option<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.replies.lock().unwrap().pop_front().flatten()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn generate(&self, _prompt: &str, _timeout: Duration) -> Option<String> {
        self.next_reply()
    }

    async fn generate_json(&self, _prompt: &str, _timeout: Duration) -> Option<serde_json::Value> {
        self.next_reply().as_deref().and_then(extract_json_object)
    }
}
