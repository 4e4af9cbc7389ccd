//! LLM 层：客户端抽象与实现（Ollama 兼容 / Mock）

pub mod mock;
pub mod ollama;
pub mod traits;

pub use mock::MockLlmClient;
pub use ollama::OllamaClient;
pub use traits::LlmClient;
