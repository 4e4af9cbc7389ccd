//! Jot - 会话式任务日志智能体
//!
//! 入口：初始化日志、加载配置、构建 Journal，并以本地 REPL 方式处理输入（固定用户 local）。
//! LINE Webhook 前端见 jot-line（--features line）。

use anyhow::Context;
use jot::config::{load_config, AppConfig};
use jot::core::Journal;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    jot::observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    tracing::info!(
        db = %cfg.store.db_path.display(),
        model = %cfg.llm.model,
        "jot starting"
    );

    let journal = Journal::from_config(&cfg);

    println!("jot ready. Type a request (Ctrl-D to quit).");

    let stdin = BufReader::new(tokio::io::stdin());
    let mut lines = stdin.lines();
    while let Some(line) = lines.next_line().await.context("stdin read failed")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let reply = journal.process(line, "local").await;
        println!("{}", reply);
    }

    Ok(())
}
