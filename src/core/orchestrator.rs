//! 请求编排：意图路由与任务操作
//!
//! process 是全函数：解析意图 → 分派 store/retrieve/remove → 组织回复，
//! 每条失败路径都折叠成一句面向用户的字符串，绝不向传输层抛错。
//! 任务库挂在 tokio Mutex 后面，同一库实例上的读写被线性化；锁不跨 LLM 往返持有。

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use serde_json::json;
use tokio::sync::Mutex;

use crate::compose::ResponseComposer;
use crate::config::AppConfig;
use crate::intent::{Intent, IntentParser, ParsedIntent};
use crate::llm::{LlmClient, MockLlmClient, OllamaClient};
use crate::store::TaskStore;

/// 意图解析失败（超时/不可解析）时的致歉句
const REPLY_PARSE_FAILED: &str = "Sorry, I couldn't understand your request. The system took too long to respond. Please try a simpler message.";
const REPLY_NO_DESCRIPTION: &str = "I couldn't identify what task you want me to store.";
const REPLY_SAVE_FAILED: &str = "Sorry, I encountered an error while saving the task.";
const REPLY_NO_TASKS: &str = "You don't have any scheduled tasks for that time.";
const REPLY_NEED_DATE: &str = "I need a specific date to remove tasks.";
const REPLY_REMOVE_FAILED: &str = "Sorry, I encountered an error while removing the tasks.";
const REPLY_UNKNOWN_INTENT: &str = "I'm not sure what you want me to do. You can ask me to store tasks, check your schedule, or remove tasks.";

/// 根据配置选择 LLM 后端；端点置空时退回 Mock 并告警
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    if cfg.llm.url.is_empty() {
        tracing::warn!("no LLM endpoint configured, using Mock LLM");
        Arc::new(MockLlmClient::new())
    } else {
        tracing::info!(url = %cfg.llm.url, model = %cfg.llm.model, "using LLM backend");
        Arc::new(OllamaClient::new(
            &cfg.llm.url,
            &cfg.llm.model,
            cfg.llm.api_key.as_deref(),
        ))
    }
}

/// 任务日志智能体：编排意图解析、任务操作与回复生成
pub struct Journal {
    parser: IntentParser,
    composer: ResponseComposer,
    store: Mutex<TaskStore>,
}

impl Journal {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        store: TaskStore,
        intent_timeout: Duration,
        compose_timeout: Duration,
    ) -> Self {
        Self {
            parser: IntentParser::new(llm.clone(), intent_timeout),
            composer: ResponseComposer::new(llm, compose_timeout),
            store: Mutex::new(store),
        }
    }

    /// 从配置构建：选择 LLM 后端并加载任务库
    pub fn from_config(cfg: &AppConfig) -> Self {
        let llm = create_llm_from_config(cfg);
        let store = TaskStore::load(&cfg.store.db_path);
        Self::new(
            llm,
            store,
            Duration::from_secs(cfg.llm.timeouts.intent),
            Duration::from_secs(cfg.llm.timeouts.compose),
        )
    }

    /// 顶层入口：对单条用户输入产出一条回复
    pub async fn process(&self, user_text: &str, user_id: &str) -> String {
        tracing::info!(user = user_id, "processing request");

        let Some(parsed) = self.parser.parse(user_text, Local::now()).await else {
            return REPLY_PARSE_FAILED.to_string();
        };

        match parsed.intent {
            Some(Intent::Store) => self.store_task(&parsed, user_id).await,
            Some(Intent::Retrieve) => self.retrieve_tasks(&parsed, user_id).await,
            Some(Intent::Remove) => self.remove_tasks(parsed.date.as_deref(), user_id).await,
            Some(Intent::Unknown) | None => REPLY_UNKNOWN_INTENT.to_string(),
        }
    }

    async fn store_task(&self, parsed: &ParsedIntent, user_id: &str) -> String {
        let Some(description) = parsed
            .task_description
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
        else {
            return REPLY_NO_DESCRIPTION.to_string();
        };

        // 先追加后落盘；落盘失败只回错误句，不再请求 LLM 描述一次未发生的保存。
        // 内存里保留这次追加（已知的一致性缺口）。
        let task = {
            let mut store = self.store.lock().await;
            let task = store.append(
                user_id,
                description,
                parsed.date.clone(),
                parsed.time.clone(),
                parsed.location.clone(),
            );
            if let Err(e) = store.save() {
                tracing::error!(error = %e, "failed to persist stored task");
                return REPLY_SAVE_FAILED.to_string();
            }
            task
        };

        let details = json!({
            "task": task.description,
            "date": task.date,
            "time": task.time,
            "location": task.location,
        });
        let fallback = format!("✓ Task saved: {}", task.description);
        self.composer
            .compose("STORE_TASK", &details, &fallback)
            .await
    }

    async fn retrieve_tasks(&self, parsed: &ParsedIntent, user_id: &str) -> String {
        if let Some(context) = &parsed.query_context {
            // 检索只按日期精确匹配，query_context 仅随日志携带
            tracing::debug!(%context, "query context carried but not used for filtering");
        }

        let matches = {
            let store = self.store.lock().await;
            store.query(user_id, parsed.date.as_deref())
        };

        if matches.is_empty() {
            return REPLY_NO_TASKS.to_string();
        }

        let listed: Vec<_> = matches
            .iter()
            .map(|t| {
                json!({
                    "description": t.description,
                    "time": t.time,
                    "location": t.location,
                    "date": t.date,
                })
            })
            .collect();

        let details = json!({
            "tasks": listed,
            "count": matches.len(),
            "date": parsed.date,
        });
        let fallback = format!("You have {} task(s) scheduled.", matches.len());
        self.composer
            .compose("RETRIEVE_TASKS", &details, &fallback)
            .await
    }

    async fn remove_tasks(&self, date: Option<&str>, user_id: &str) -> String {
        let Some(date) = date.map(str::trim).filter(|d| !d.is_empty()) else {
            return REPLY_NEED_DATE.to_string();
        };

        let count = {
            let mut store = self.store.lock().await;
            let count = store.remove_for(user_id, date);
            if count == 0 {
                // 无匹配：列表未变，不重写文件
                return format!("You don't have any tasks scheduled for {}.", date);
            }
            if let Err(e) = store.save() {
                tracing::error!(error = %e, "failed to persist removal");
                return REPLY_REMOVE_FAILED.to_string();
            }
            count
        };

        let details = json!({ "count": count, "date": date });
        let fallback = format!("✓ Removed {} task(s) from {}.", count, date);
        self.composer
            .compose("REMOVE_TASKS", &details, &fallback)
            .await
    }
}
