//! Journal Service
//!
//! Writes history lines through the backend's `POST /logs`.

use std::sync::Arc;

use ps_client::TaskApi;
use ps_core::PsError;
use ps_models::NewRecord;
use thiserror::Error;
use tracing::{debug, warn};

use crate::change::ChangeEntry;

/// Journal service errors
#[derive(Debug, Error)]
pub enum JournalError {
    #[error("Task has no key to attach a log to")]
    MissingTaskKey,
    #[error("Log write failed: {0}")]
    Write(#[from] PsError),
}

pub type JournalResult<T> = Result<T, JournalError>;

impl From<JournalError> for PsError {
    fn from(err: JournalError) -> Self {
        match err {
            JournalError::MissingTaskKey => PsError::Internal(JournalError::MissingTaskKey.to_string()),
            JournalError::Write(inner) => inner,
        }
    }
}

/// Journal service for task history
#[derive(Clone)]
pub struct JournalService {
    api: Arc<dyn TaskApi>,
}

impl JournalService {
    pub fn new(api: Arc<dyn TaskApi>) -> Self {
        Self { api }
    }

    /// Append one history line for a task
    pub async fn record(
        &self,
        task_key: &str,
        admin_key: Option<&str>,
        entry: &ChangeEntry,
    ) -> JournalResult<NewRecord> {
        if task_key.trim().is_empty() {
            return Err(JournalError::MissingTaskKey);
        }

        let record = NewRecord::new(task_key, admin_key.map(str::to_string), entry.to_log_text());
        self.api.create_log(&record).await?;

        debug!(task_key, content = %record.content, "history entry recorded");
        Ok(record)
    }

    /// Append a history line after a change already committed.
    ///
    /// Failures are logged and swallowed; returns whether the line was written.
    pub async fn record_best_effort(
        &self,
        task_key: &str,
        admin_key: Option<&str>,
        entry: &ChangeEntry,
    ) -> bool {
        match self.record(task_key, admin_key, entry).await {
            Ok(_) => true,
            Err(e) => {
                warn!(task_key, entry = %entry, error = %e, "history entry was not recorded");
                false
            }
        }
    }
}
