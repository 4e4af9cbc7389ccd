//! Jot - 会话式任务日志智能体
//!
//! 模块划分：
//! - **compose**: 回复生成（LLM 自然语言确认 + 确定性兜底句）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 编排层（意图路由、任务操作、错误类型）
//! - **integrations**: 外部集成（LINE Messaging Webhook）
//! - **intent**: 意图解析（LLM 结构化分类与字段抽取）
//! - **llm**: LLM 客户端抽象与实现（Ollama 兼容 / Mock）
//! - **observability**: tracing 日志初始化
//! - **store**: 任务库（单文件 JSON 全量重写持久化）

pub mod compose;
pub mod config;
pub mod core;
pub mod integrations;
pub mod intent;
pub mod llm;
pub mod observability;
pub mod store;
