//! 意图解析
//!
//! 构造单条分类提示词（嵌入当前日期时间与用户原文），走结构化模式请求 LLM，
//! 产出类型化的 ParsedIntent。网关无结果时原样上抛 None，由编排层对用户致歉，不重试。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, Local};
use serde::Deserialize;

use crate::llm::LlmClient;

/// 分类出的意图
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Store,
    Retrieve,
    Remove,
    /// 后端给出走样/未知值时落到这里
    Unknown,
}

/// 单次请求产出的结构化意图；用后即弃，不持久化
#[derive(Debug, Clone, Deserialize)]
pub struct ParsedIntent {
    /// 只认大写枚举值；其余字符串与非字符串值一律落 Unknown，由编排层回「不知道做什么」
    #[serde(default, deserialize_with = "lenient_intent")]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub task_description: Option<String>,
    /// `YYYY-MM-DD`，相对日期已由后端按提示词规则换算
    #[serde(default)]
    pub date: Option<String>,
    /// `HH:MM`
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    /// 解析出但当前操作集不用于过滤，仅随日志携带
    #[serde(default)]
    pub query_context: Option<String>,
}

fn lenient_intent<'de, D>(deserializer: D) -> Result<Option<Intent>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(match s.as_str() {
            "STORE" => Intent::Store,
            "RETRIEVE" => Intent::Retrieve,
            "REMOVE" => Intent::Remove,
            _ => Intent::Unknown,
        }),
        _ => Some(Intent::Unknown),
    })
}

/// 意图解析器：持有 LLM 客户端与长超时（分类+抽取是较慢的生成任务）
pub struct IntentParser {
    llm: Arc<dyn LlmClient>,
    timeout: Duration,
}

impl IntentParser {
    pub fn new(llm: Arc<dyn LlmClient>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// 解析用户输入；网关无结果或 JSON 走样时返回 None
    pub async fn parse(&self, user_text: &str, now: DateTime<Local>) -> Option<ParsedIntent> {
        let prompt = build_prompt(user_text, now);
        let value = self.llm.generate_json(&prompt, self.timeout).await?;

        match serde_json::from_value::<ParsedIntent>(value) {
            Ok(parsed) => {
                tracing::info!(intent = ?parsed.intent, "intent parsed");
                Some(parsed)
            }
            Err(e) => {
                tracing::warn!(error = %e, "intent JSON did not match the expected shape");
                None
            }
        }
    }
}

/// 分类提示词：当前日期时间 + 用户原文 + 固定 JSON 键约定 + 相对日期换算规则
fn build_prompt(user_text: &str, now: DateTime<Local>) -> String {
    let current_date = now.format("%Y-%m-%d");
    let current_time = now.format("%H:%M");
    let tomorrow = (now + ChronoDuration::days(1)).format("%Y-%m-%d");

    format!(
        r#"You are a smart assistant helping to parse user requests about tasks and schedules.
Current date: {current_date}
Current time: {current_time}

Analyze this user input: "{user_text}"

Determine:
1. Is this a STORE request (adding a new task), RETRIEVE request (asking about existing tasks), or REMOVE request (deleting tasks)?
2. What is the task description (if storing)?
3. What is the date and time? Calculate the actual date if relative terms like "tomorrow", "today", "next Monday" are used.
4. What is the location (if mentioned)?

Return a JSON object with this structure:
{{
    "intent": "STORE" or "RETRIEVE" or "REMOVE",
    "task_description": "description of task or null",
    "date": "YYYY-MM-DD format or null",
    "time": "HH:MM format or null",
    "location": "location or null",
    "query_context": "description of what user wants to retrieve/remove (if RETRIEVE/REMOVE)"
}}

Be smart about date parsing:
- "tomorrow" = {tomorrow}
- "today" = {current_date}
- Handle day names and calculate the correct date

Only return the JSON, nothing else."#
    )
}
