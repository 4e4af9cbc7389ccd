//! 核心编排层：错误类型、LLM 后端选择与请求编排

pub mod error;
pub mod orchestrator;

pub use error::JournalError;
pub use orchestrator::{create_llm_from_config, Journal};
