//! Service context shared by every service

use std::sync::Arc;

use ps_client::TaskApi;
use ps_journals::{ChangeEntry, JournalService};
use ps_notifications::{Notifier, PushOutcome, TaskNotice};
use tracing::debug;

use crate::cache::QueryCache;

/// Collaborators a service runs against, plus who is acting
#[derive(Clone)]
pub struct ServiceContext {
    pub api: Arc<dyn TaskApi>,
    pub cache: Arc<QueryCache>,
    pub journals: JournalService,
    pub notifier: Arc<dyn Notifier>,
    /// `ADMIN_KEY` of the signed-in user, stamped on logs and comments
    pub admin_key: Option<String>,
    pub send_notifications: bool,
}

impl ServiceContext {
    pub fn new(api: Arc<dyn TaskApi>, cache: Arc<QueryCache>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            journals: JournalService::new(Arc::clone(&api)),
            api,
            cache,
            notifier,
            admin_key: None,
            send_notifications: true,
        }
    }

    pub fn with_admin_key(mut self, admin_key: Option<String>) -> Self {
        self.admin_key = admin_key;
        self
    }

    pub fn without_notifications(mut self) -> Self {
        self.send_notifications = false;
        self
    }

    /// Push a change to every recipient; `None` when notifications are off
    pub async fn announce(
        &self,
        task_key: Option<&str>,
        task_title: &str,
        entry: &ChangeEntry,
    ) -> Option<PushOutcome> {
        if !self.send_notifications {
            debug!(entry = %entry, "notifications off, not announcing");
            return None;
        }
        let notice = TaskNotice::new(
            entry.push_title(),
            entry.push_body(task_title),
            task_key.map(str::to_string),
        );
        Some(self.notifier.notify(notice).await)
    }

    /// One history line for a committed change; failures only warn
    pub async fn journal(&self, task_key: &str, entry: &ChangeEntry) -> bool {
        self.journals
            .record_best_effort(task_key, self.admin_key.as_deref(), entry)
            .await
    }
}
