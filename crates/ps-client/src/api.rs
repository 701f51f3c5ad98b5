//! Backend REST contract
//!
//! | operation | endpoint |
//! |-----------|----------|
//! | `list_tasks` | `GET /tasks?page&limit` |
//! | `task_counts` | `GET /tasks/count` |
//! | `get_task` | `GET /tasks/:key` |
//! | `update_task` | `PATCH /tasks/:key` |
//! | `create_task` | `POST /tasks` |
//! | `create_comment` | `POST /comments` |
//! | `create_log` | `POST /logs` |
//! | `get_options` | `GET /options` |
//! | `get_user` | `GET /users/:id` |
//! | `update_push_settings` | `PATCH /users/:key` |
//! | `list_push_recipients` | `GET /users?pushEnabled=1` |

use async_trait::async_trait;
use ps_core::{Page, PageParams, PsResult};
use ps_models::{
    CreateTask, NewRecord, OptionCatalog, PushRecipient, PushSettings, Task, TaskCounts,
    UpdateTask, UserRecord,
};

/// Query selecting users that opted into push
pub const USERS_PUSH_QUERY: (&str, &str) = ("pushEnabled", "1");

#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait TaskApi: Send + Sync {
    async fn list_tasks(&self, params: PageParams) -> PsResult<Page<Task>>;

    async fn task_counts(&self) -> PsResult<TaskCounts>;

    /// Single task with its comments and logs
    async fn get_task(&self, key: &str) -> PsResult<Task>;

    async fn create_task(&self, task: &CreateTask) -> PsResult<Task>;

    /// Partial update; only the fields present in `update` change
    async fn update_task(&self, key: &str, update: &UpdateTask) -> PsResult<()>;

    async fn create_comment(&self, record: &NewRecord) -> PsResult<()>;

    async fn create_log(&self, record: &NewRecord) -> PsResult<()>;

    async fn get_options(&self) -> PsResult<OptionCatalog>;

    /// `None` when the backend has no row for `id`
    async fn get_user(&self, id: &str) -> PsResult<Option<UserRecord>>;

    async fn update_push_settings(&self, admin_key: &str, settings: &PushSettings) -> PsResult<()>;

    /// Users with push enabled and a token
    async fn list_push_recipients(&self) -> PsResult<Vec<PushRecipient>>;
}
