//! Comment and history log records
//!
//! Both are append-only children of a task, returned most-recent-first.

use serde::{Deserialize, Serialize};

use crate::serde_helpers;

/// A comment left on a task
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default, deserialize_with = "serde_helpers::optional_string")]
    pub comment_key: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::optional_string")]
    pub task_key: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::optional_string")]
    pub admin_key: Option<String>,
    /// Author display name, when the backend joins it in
    #[serde(default)]
    pub admin_name: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One history line (`"[인쇄] 완료"`, `"대기 -> 진행중"`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    #[serde(default, deserialize_with = "serde_helpers::optional_string")]
    pub log_key: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::optional_string")]
    pub task_key: Option<String>,
    #[serde(default, deserialize_with = "serde_helpers::optional_string")]
    pub admin_key: Option<String>,
    #[serde(default)]
    pub admin_name: Option<String>,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `POST /comments` and `POST /logs` body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewRecord {
    pub task_key: String,
    pub admin_key: Option<String>,
    pub content: String,
}

impl NewRecord {
    pub fn new(task_key: impl Into<String>, admin_key: Option<String>, content: impl Into<String>) -> Self {
        Self {
            task_key: task_key.into(),
            admin_key,
            content: content.into(),
        }
    }
}
