//! Jot LINE 服务
//!
//! 通过 LINE Messaging API Webhook 与 Journal 对话。
//!
//! 环境变量:
//! - LINE_CHANNEL_ACCESS_TOKEN: 频道访问令牌（亦可用 JOT__LINE__CHANNEL_ACCESS_TOKEN）
//! - LINE_CHANNEL_SECRET: 频道密钥，用于 Webhook 签名校验
//!
//! 启动: cargo run --bin jot-line --features line

#[cfg(feature = "line")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    use std::sync::Arc;

    use anyhow::Context;
    use jot::config::{load_config, AppConfig};
    use jot::core::Journal;
    use jot::integrations::line::{create_router, LineState};

    jot::observability::init();

    let cfg = load_config(None).unwrap_or_else(|e| {
        tracing::warn!("Config load failed ({}), using defaults", e);
        AppConfig::default()
    });

    let access_token = cfg
        .line
        .channel_access_token
        .clone()
        .or_else(|| std::env::var("LINE_CHANNEL_ACCESS_TOKEN").ok())
        .context("LINE_CHANNEL_ACCESS_TOKEN must be set")?;
    let channel_secret = cfg
        .line
        .channel_secret
        .clone()
        .or_else(|| std::env::var("LINE_CHANNEL_SECRET").ok())
        .context("LINE_CHANNEL_SECRET must be set")?;

    let journal = Arc::new(Journal::from_config(&cfg));

    let state = Arc::new(LineState {
        journal,
        access_token,
        channel_secret,
    });
    let app = create_router(state);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], cfg.line.port));
    tracing::info!("jot LINE server listening on http://{}", addr);
    tracing::info!("Webhook URL: http://YOUR_HOST:{}/callback", cfg.line.port);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(not(feature = "line"))]
fn main() {
    eprintln!("请使用 --features line 编译: cargo run --bin jot-line --features line");
    std::process::exit(1);
}
