//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `JOT__*` 覆盖（双下划线表示嵌套，如 `JOT__LLM__MODEL=gemma3:4b`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub llm: LlmSection,
    pub store: StoreSection,
    pub line: LineSection,
}

/// [llm] 段：后端地址、模型、凭证与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// 生成端点（Ollama 风格 /api/generate）；置空时退回 Mock
    pub url: String,
    pub model: String,
    /// Bearer 凭证；未设置时请求不带 Authorization 头
    pub api_key: Option<String>,
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            url: default_llm_url(),
            model: default_model(),
            api_key: None,
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_llm_url() -> String {
    "http://localhost:11434/api/generate".to_string()
}

fn default_model() -> String {
    "gemma3:4b".to_string()
}

/// [llm.timeouts] 段：意图解析与回复生成的独立超时（秒）
///
/// 意图解析是分类+抽取的复合生成任务，预算给得更长。
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    pub intent: u64,
    pub compose: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            intent: 200,
            compose: 120,
        }
    }
}

/// [store] 段：任务库文件路径
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    pub db_path: PathBuf,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("journal_db.json"),
        }
    }
}

/// [line] 段：频道凭证与监听端口（jot-line 用）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LineSection {
    pub channel_access_token: Option<String>,
    pub channel_secret: Option<String>,
    pub port: u16,
}

impl Default for LineSection {
    fn default() -> Self {
        Self {
            channel_access_token: None,
            channel_secret: None,
            port: 5000,
        }
    }
}

/// 从 config 目录加载配置，环境变量 JOT__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 JOT__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("JOT")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_usable() {
        let cfg = AppConfig::default();
        assert!(cfg.llm.url.contains("/api/generate"));
        assert_eq!(cfg.llm.timeouts.intent, 200);
        assert_eq!(cfg.llm.timeouts.compose, 120);
        assert_eq!(cfg.store.db_path, PathBuf::from("journal_db.json"));
        assert_eq!(cfg.line.port, 5000);
    }

    #[test]
    fn intent_timeout_is_longer_than_compose() {
        let cfg = AppConfig::default();
        assert!(cfg.llm.timeouts.intent > cfg.llm.timeouts.compose);
    }
}
