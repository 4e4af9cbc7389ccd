//! 任务库
//!
//! 单文件 JSON 数组持久化：进程启动时整读，每次变更整写（pretty 格式），保持插入顺序。
//! 文件缺失视为空库；读失败降级为空库并记日志。

use std::path::{Path, PathBuf};

use chrono::Local;
use serde::{Deserialize, Serialize};

use crate::core::JournalError;

/// 持久化的任务记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// 单调递增分配，同一库文件内唯一（删除不回收编号）
    pub id: u64,
    pub user_id: String,
    pub description: String,
    /// `YYYY-MM-DD`
    pub date: Option<String>,
    /// `HH:MM`
    pub time: Option<String>,
    pub location: Option<String>,
    /// 创建时间，写入后不变
    pub created_at: String,
}

/// 任务库：内存 Vec + 背靠文件
#[derive(Debug)]
pub struct TaskStore {
    path: PathBuf,
    tasks: Vec<Task>,
    next_id: u64,
}

impl TaskStore {
    /// 从 JSON 文件加载；文件不存在返回空库
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let tasks = if path.exists() {
            match std::fs::read_to_string(&path)
                .map_err(JournalError::from)
                .and_then(|data| {
                    serde_json::from_str::<Vec<Task>>(&data).map_err(JournalError::from)
                }) {
                Ok(tasks) => {
                    tracing::info!(count = tasks.len(), "loaded tasks from store file");
                    tasks
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %path.display(),
                        "failed to load store file, starting empty"
                    );
                    Vec::new()
                }
            }
        } else {
            tracing::info!(path = %path.display(), "no store file yet, starting empty");
            Vec::new()
        };

        let next_id = tasks.iter().map(|t| t.id).max().unwrap_or(0) + 1;
        Self {
            path,
            tasks,
            next_id,
        }
    }

    /// 写回 JSON 文件（全量重写）；父目录不存在时自动创建
    pub fn save(&self) -> Result<(), JournalError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&self.tasks)?)?;
        Ok(())
    }

    /// 追加一条任务并返回其副本；id 取自单调计数器
    pub fn append(
        &mut self,
        user_id: &str,
        description: &str,
        date: Option<String>,
        time: Option<String>,
        location: Option<String>,
    ) -> Task {
        let task = Task {
            id: self.next_id,
            user_id: user_id.to_string(),
            description: description.to_string(),
            date,
            time,
            location,
            created_at: Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        };
        self.next_id += 1;
        self.tasks.push(task.clone());
        task
    }

    /// 按用户过滤；给定日期时再按精确字符串匹配过滤
    pub fn query(&self, user_id: &str, date: Option<&str>) -> Vec<Task> {
        self.tasks
            .iter()
            .filter(|t| t.user_id == user_id)
            .filter(|t| match date {
                Some(d) => t.date.as_deref() == Some(d),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// 删除 (user_id, date) 的全部匹配，返回删除条数；无匹配时列表不变
    pub fn remove_for(&mut self, user_id: &str, date: &str) -> usize {
        let before = self.tasks.len();
        self.tasks
            .retain(|t| !(t.user_id == user_id && t.date.as_deref() == Some(date)));
        before - self.tasks.len()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store(path: &Path) -> TaskStore {
        let mut store = TaskStore::load(path);
        store.append("U1", "lunch with Amy", Some("2024-06-02".into()), Some("12:00".into()), None);
        store.append("U1", "dentist", Some("2024-06-02".into()), None, Some("clinic".into()));
        store.append("U1", "report", Some("2024-06-03".into()), None, None);
        store.append("U2", "gym", Some("2024-06-02".into()), None, None);
        store
    }

    #[test]
    fn load_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TaskStore::load(dir.path().join("journal_db.json"));
        assert!(store.is_empty());
    }

    #[test]
    fn load_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal_db.json");
        std::fs::write(&path, "not json at all").unwrap();
        let store = TaskStore::load(&path);
        assert!(store.is_empty());
    }

    #[test]
    fn save_load_round_trip_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal_db.json");
        let store = seeded_store(&path);
        store.save().unwrap();

        let reloaded = TaskStore::load(&path);
        assert_eq!(reloaded.tasks(), store.tasks());
        let descriptions: Vec<_> = reloaded.tasks().iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descriptions, ["lunch with Amy", "dentist", "report", "gym"]);
    }

    #[test]
    fn query_without_date_returns_all_user_tasks_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir.path().join("journal_db.json"));

        let tasks = store.query("U1", None);
        assert_eq!(tasks.len(), 3);
        assert!(tasks.iter().all(|t| t.user_id == "U1"));
        assert_eq!(tasks[0].id, 1);
        assert_eq!(tasks[2].id, 3);
    }

    #[test]
    fn query_with_date_matches_exactly() {
        let dir = tempfile::tempdir().unwrap();
        let store = seeded_store(&dir.path().join("journal_db.json"));

        let tasks = store.query("U1", Some("2024-06-02"));
        assert_eq!(tasks.len(), 2);
        // 重复查询结果一致
        assert_eq!(store.query("U1", Some("2024-06-02")), tasks);
        assert!(store.query("U1", Some("2024-07-01")).is_empty());
    }

    #[test]
    fn remove_is_scoped_to_user_and_date() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = seeded_store(&dir.path().join("journal_db.json"));

        assert_eq!(store.remove_for("U1", "2024-06-02"), 2);
        assert_eq!(store.len(), 2);
        // 其他用户与其他日期不受影响
        assert_eq!(store.query("U2", Some("2024-06-02")).len(), 1);
        assert_eq!(store.query("U1", Some("2024-06-03")).len(), 1);
        // 再删一次是空操作
        assert_eq!(store.remove_for("U1", "2024-06-02"), 0);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn ids_stay_unique_across_removals() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("journal_db.json");
        let mut store = seeded_store(&path);

        store.remove_for("U1", "2024-06-02");
        let task = store.append("U1", "new task", None, None, None);
        // 计数器不回退到 len+1，不与存活记录撞号
        assert_eq!(task.id, 5);
        assert!(store.tasks().iter().filter(|t| t.id == task.id).count() == 1);

        store.save().unwrap();
        let mut reloaded = TaskStore::load(&path);
        let next = reloaded.append("U1", "after reload", None, None, None);
        assert_eq!(next.id, 6);
    }
}
