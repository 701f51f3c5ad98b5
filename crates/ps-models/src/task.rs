//! Task model
//!
//! One production job, as returned by `GET /tasks` and `GET /tasks/:key`.

use chrono::{DateTime, NaiveDateTime, Utc};
use ps_core::traits::{Keyed, SoftDeletable, Timestamped};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::record::{Comment, LogEntry};
use crate::serde_helpers;
use crate::task_detail::{self, TaskDetail};

/// Task priority
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "Option<String>")]
pub enum TaskPriority {
    #[default]
    #[serde(rename = "보통")]
    Normal,
    #[serde(rename = "중요")]
    Important,
    #[serde(rename = "긴급")]
    Urgent,
}

impl TaskPriority {
    pub const ALL: [TaskPriority; 3] = [Self::Normal, Self::Important, Self::Urgent];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "보통",
            Self::Important => "중요",
            Self::Urgent => "긴급",
        }
    }

    /// Parse a label; unknown labels are `None`
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == label.trim())
    }
}

impl From<Option<String>> for TaskPriority {
    fn from(value: Option<String>) -> Self {
        value.as_deref().and_then(Self::parse).unwrap_or_default()
    }
}

impl std::fmt::Display for TaskPriority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whole-task progress status. Unknown backend values read as `대기`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "Option<String>")]
pub enum TaskProgress {
    #[default]
    #[serde(rename = "대기")]
    Waiting,
    #[serde(rename = "진행중")]
    InProgress,
    #[serde(rename = "완료")]
    Done,
}

impl TaskProgress {
    pub const ALL: [TaskProgress; 3] = [Self::Waiting, Self::InProgress, Self::Done];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Waiting => "대기",
            Self::InProgress => "진행중",
            Self::Done => "완료",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == label.trim())
    }
}

impl From<Option<String>> for TaskProgress {
    fn from(value: Option<String>) -> Self {
        value.as_deref().and_then(Self::parse).unwrap_or_default()
    }
}

impl std::fmt::Display for TaskProgress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    #[serde(default, deserialize_with = "serde_helpers::optional_string")]
    pub task_key: Option<String>,

    #[serde(default, deserialize_with = "serde_helpers::optional_string")]
    pub admin_key: Option<String>,

    #[serde(default)]
    pub task_title: String,

    /// Client company
    #[serde(default)]
    pub task_company: String,

    #[serde(default)]
    pub task_priority: TaskPriority,

    #[serde(default)]
    pub task_progressing: TaskProgress,

    #[serde(default)]
    pub task_order_date: Option<String>,

    #[serde(default)]
    pub task_delivery_date: Option<String>,

    #[serde(default, with = "task_detail::as_json_string")]
    pub task_detail: TaskDetail,

    #[serde(default)]
    pub created_at: Option<String>,

    #[serde(default)]
    pub updated_at: Option<String>,

    #[serde(default, deserialize_with = "serde_helpers::flag")]
    pub task_del: bool,

    /// Present on the single-task endpoint only
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub comments: Vec<Comment>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub logs: Vec<LogEntry>,
}

impl Task {
    pub fn new(key: impl Into<String>, title: impl Into<String>, company: impl Into<String>) -> Self {
        Self {
            task_key: Some(key.into()),
            task_title: title.into(),
            task_company: company.into(),
            ..Default::default()
        }
    }

    pub fn with_detail(mut self, detail: TaskDetail) -> Self {
        self.task_detail = detail;
        self
    }

    pub fn with_progress(mut self, progress: TaskProgress) -> Self {
        self.task_progressing = progress;
        self
    }

    /// Key for cache entries, logs and push payloads; empty when missing
    pub fn key_or_empty(&self) -> &str {
        self.task_key.as_deref().unwrap_or("")
    }
}

impl Keyed for Task {
    fn key(&self) -> Option<&str> {
        self.task_key.as_deref()
    }
}

impl Timestamped for Task {
    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at.as_deref().and_then(parse_timestamp)
    }

    fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at.as_deref().and_then(parse_timestamp)
    }
}

impl SoftDeletable for Task {
    fn is_deleted(&self) -> bool {
        self.task_del
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
                .ok()
                .map(|dt| dt.and_utc())
        })
}

/// `POST /tasks` body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub admin_key: Option<String>,

    #[validate(length(max = 200))]
    pub task_title: String,

    #[validate(length(max = 100))]
    pub task_company: String,

    pub task_priority: TaskPriority,
    pub task_progressing: TaskProgress,
    pub task_order_date: Option<String>,
    pub task_delivery_date: Option<String>,

    #[serde(with = "task_detail::as_json_string")]
    pub task_detail: TaskDetail,
}

/// `PATCH /tasks/:key` body; only the present fields change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    /// Full encoded detail, never a diff
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_detail: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_progressing: Option<TaskProgress>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_del: Option<u8>,
}

impl UpdateTask {
    pub fn detail(detail: &TaskDetail) -> Self {
        Self {
            task_detail: Some(task_detail::encode(detail)),
            ..Default::default()
        }
    }

    pub fn progress(progress: TaskProgress) -> Self {
        Self {
            task_progressing: Some(progress),
            ..Default::default()
        }
    }

    pub fn soft_delete() -> Self {
        Self {
            task_del: Some(1),
            ..Default::default()
        }
    }
}

/// `GET /tasks/count` body: per-status totals across every page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    #[serde(default, alias = "all", alias = "전체")]
    pub total: u64,
    #[serde(default, alias = "대기")]
    pub waiting: u64,
    #[serde(default, alias = "진행중")]
    pub in_progress: u64,
    #[serde(default, alias = "완료")]
    pub done: u64,
}

impl TaskCounts {
    pub fn for_progress(&self, progress: TaskProgress) -> u64 {
        match progress {
            TaskProgress::Waiting => self.waiting,
            TaskProgress::InProgress => self.in_progress,
            TaskProgress::Done => self.done,
        }
    }
}
