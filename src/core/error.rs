//! 错误类型
//!
//! 只有持久化路径走错误通道；LLM 网关的软失败统一用 Option 表达，不在此列。

use thiserror::Error;

/// 任务库读写过程中可能出现的错误
#[derive(Error, Debug)]
pub enum JournalError {
    #[error("store io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
