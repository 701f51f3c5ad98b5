//! Comments and history tab
//!
//! Comments and logs arrive with the task detail, most recent first. The tab
//! shows them five at a time.

use ps_contracts::{CommentContract, Contract};
use ps_core::ServiceResult;
use ps_models::NewRecord;
use tracing::{info, warn};

use crate::base::ServiceContext;
use crate::cache::QueryKey;

pub const HISTORY_PAGE_SIZE: usize = 5;

/// Client-side pager over an already loaded record list
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPager<T> {
    items: Vec<T>,
    page_size: usize,
    shown: usize,
}

impl<T> HistoryPager<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self::with_page_size(items, HISTORY_PAGE_SIZE)
    }

    pub fn with_page_size(items: Vec<T>, page_size: usize) -> Self {
        let page_size = page_size.max(1);
        Self {
            shown: page_size.min(items.len()),
            items,
            page_size,
        }
    }

    pub fn visible(&self) -> &[T] {
        &self.items[..self.shown]
    }

    pub fn total(&self) -> usize {
        self.items.len()
    }

    pub fn has_more(&self) -> bool {
        self.shown < self.items.len()
    }

    /// Whether more than the first page is shown
    pub fn is_expanded(&self) -> bool {
        self.shown > self.page_size.min(self.items.len())
    }

    /// Show one more page; returns how many records became visible
    pub fn load_more(&mut self) -> usize {
        let before = self.shown;
        self.shown = (self.shown + self.page_size).min(self.items.len());
        self.shown - before
    }

    /// Back to the first page
    pub fn collapse(&mut self) {
        self.shown = self.page_size.min(self.items.len());
    }

    /// Swap in a refetched list, keeping how far the user had expanded
    pub fn replace(&mut self, items: Vec<T>) {
        let shown = self.shown.max(self.page_size);
        self.items = items;
        self.shown = shown.min(self.items.len());
    }
}

/// Service for posting comments on a task
pub struct CommentService {
    ctx: ServiceContext,
    contract: CommentContract,
}

impl CommentService {
    pub fn new(ctx: ServiceContext) -> Self {
        Self {
            ctx,
            contract: CommentContract,
        }
    }

    /// Post a comment; the task's detail entry goes stale on success
    pub async fn submit(&self, task_key: &str, content: &str) -> ServiceResult<NewRecord> {
        let record = NewRecord::new(task_key.trim(), self.ctx.admin_key.clone(), content.trim());
        if let Err(errors) = self.contract.validate(&record) {
            return ServiceResult::failure(errors);
        }

        if let Err(e) = self.ctx.api.create_comment(&record).await {
            warn!(task_key = %record.task_key, error = %e, "comment was not posted");
            return ServiceResult::failure_with_message(e.user_message());
        }

        self.ctx
            .cache
            .invalidate(&QueryKey::TaskDetail(record.task_key.clone()));
        info!(task_key = %record.task_key, "comment posted");
        ServiceResult::success(record)
    }
}
