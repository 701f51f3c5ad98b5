//! Task list view
//!
//! Pages from `GET /tasks` are kept as fetched and flattened on read. A task
//! key that appears on more than one page is shown once, at its first
//! position; keyless tasks are always shown. The status tabs filter the
//! flattened list locally, while the tab counts come from `GET /tasks/count`
//! because the loaded pages may cover only part of the list.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use parking_lot::Mutex;
use ps_core::config::ListConfig;
use ps_core::{Page, PageParams, PsError, PsResult};
use ps_models::{Task, TaskCounts, TaskProgress};
use tracing::{debug, info, warn};

use crate::base::ServiceContext;
use crate::cache::{Cached, QueryKey};

/// Status tab of the list view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StatusFilter {
    #[default]
    All,
    InProgress,
    Done,
}

impl StatusFilter {
    pub const ALL: [StatusFilter; 3] = [Self::All, Self::InProgress, Self::Done];

    pub fn label(&self) -> &'static str {
        match self {
            Self::All => "전체",
            Self::InProgress => "진행중",
            Self::Done => "완료",
        }
    }

    pub fn matches(&self, task: &Task) -> bool {
        match self {
            Self::All => true,
            Self::InProgress => task.task_progressing == TaskProgress::InProgress,
            Self::Done => task.task_progressing == TaskProgress::Done,
        }
    }

    /// Total for this tab from the aggregate counts
    pub fn count_in(&self, counts: &TaskCounts) -> u64 {
        match self {
            Self::All => counts.total,
            Self::InProgress => counts.in_progress,
            Self::Done => counts.done,
        }
    }
}

impl fmt::Display for StatusFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for StatusFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "전체" | "all" => Ok(Self::All),
            "진행중" | "in-progress" => Ok(Self::InProgress),
            "완료" | "done" => Ok(Self::Done),
            other => Err(format!("unknown status tab: {}", other)),
        }
    }
}

/// Flatten pages in order, keeping the first task seen for each key
pub fn flatten_unique(pages: &[Page<Task>]) -> Vec<Task> {
    let mut seen = HashSet::new();
    pages
        .iter()
        .flat_map(|page| page.data.iter())
        .filter(|task| match task.task_key.as_deref() {
            Some(key) if !key.is_empty() => seen.insert(key.to_string()),
            _ => true,
        })
        .cloned()
        .collect()
}

pub fn apply_filter(tasks: &[Task], filter: StatusFilter) -> Vec<Task> {
    tasks.iter().filter(|t| filter.matches(t)).cloned().collect()
}

#[derive(Default)]
struct ListState {
    pages: Vec<Page<Task>>,
    filter: StatusFilter,
    loading: bool,
    counts: Option<TaskCounts>,
    last_error: Option<PsError>,
}

impl ListState {
    fn next_params(&self, limit: u32) -> Option<PageParams> {
        match self.pages.last() {
            None => Some(PageParams::first(limit)),
            Some(page) => page.next_page().map(|n| PageParams::new(n, limit)),
        }
    }
}

/// Clears the loading flag however the fetch ends
struct LoadingGuard<'a>(&'a Mutex<ListState>);

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.lock().loading = false;
    }
}

/// Paged task list with a client-side status filter
pub struct TaskListView {
    ctx: ServiceContext,
    page_size: u32,
    prefetch_threshold: usize,
    state: Mutex<ListState>,
}

impl TaskListView {
    /// New view seeded with whatever the cache last held, stale or not
    pub fn new(ctx: ServiceContext, config: &ListConfig) -> Self {
        let state = ListState {
            pages: ctx.cache.task_pages().unwrap_or_default(),
            counts: ctx.cache.counts(),
            ..Default::default()
        };
        Self {
            ctx,
            page_size: config.page_size.max(1),
            prefetch_threshold: config.prefetch_threshold,
            state: Mutex::new(state),
        }
    }

    pub fn filter(&self) -> StatusFilter {
        self.state.lock().filter
    }

    pub fn set_filter(&self, filter: StatusFilter) {
        self.state.lock().filter = filter;
    }

    pub fn is_loading(&self) -> bool {
        self.state.lock().loading
    }

    /// Error of the last failed fetch, cleared by the next success
    pub fn last_error(&self) -> Option<PsError> {
        self.state.lock().last_error.clone()
    }

    pub fn pages_loaded(&self) -> usize {
        self.state.lock().pages.len()
    }

    pub fn has_next_page(&self) -> bool {
        self.state.lock().next_params(self.page_size).is_some()
    }

    /// Every loaded task, deduplicated
    pub fn tasks(&self) -> Vec<Task> {
        flatten_unique(&self.state.lock().pages)
    }

    /// Loaded tasks under the current tab
    pub fn visible(&self) -> Vec<Task> {
        let state = self.state.lock();
        apply_filter(&flatten_unique(&state.pages), state.filter)
    }

    /// Whether showing the visible task at `index` should pull the next page
    pub fn should_load_more(&self, index: usize) -> bool {
        let state = self.state.lock();
        if state.loading || state.next_params(self.page_size).is_none() {
            return false;
        }
        let visible = flatten_unique(&state.pages)
            .iter()
            .filter(|t| state.filter.matches(t))
            .count();
        index + self.prefetch_threshold >= visible
    }

    /// Reload from page 1, replacing the loaded pages on success
    pub async fn refresh(&self) -> PsResult<bool> {
        self.fetch(PageParams::first(self.page_size), true).await
    }

    /// Fetch the page after the last loaded one.
    ///
    /// Returns `false` without a request when a fetch is in flight or the
    /// backend reported no further page.
    pub async fn load_next(&self) -> PsResult<bool> {
        let params = self.state.lock().next_params(self.page_size);
        match params {
            Some(params) => self.fetch(params, params.page == 1).await,
            None => {
                debug!("no further task page");
                Ok(false)
            }
        }
    }

    /// Aggregate counts for the tabs; a fresh cache entry is reused
    pub async fn load_counts(&self) -> PsResult<TaskCounts> {
        if let Some(Cached::Counts(counts)) = self.ctx.cache.get_fresh(&QueryKey::TaskCount) {
            self.state.lock().counts = Some(counts);
            return Ok(counts);
        }
        let counts = self.ctx.api.task_counts().await?;
        self.ctx.cache.put(QueryKey::TaskCount, Cached::Counts(counts));
        self.state.lock().counts = Some(counts);
        Ok(counts)
    }

    /// Tab total; `None` until counts were loaded
    pub fn tab_count(&self, filter: StatusFilter) -> Option<u64> {
        self.state.lock().counts.map(|c| filter.count_in(&c))
    }

    fn begin_loading(&self) -> Option<LoadingGuard<'_>> {
        let mut state = self.state.lock();
        if state.loading {
            return None;
        }
        state.loading = true;
        Some(LoadingGuard(&self.state))
    }

    async fn fetch(&self, params: PageParams, replace: bool) -> PsResult<bool> {
        let Some(_loading) = self.begin_loading() else {
            debug!(page = params.page, "task page fetch already in flight");
            return Ok(false);
        };

        match self.ctx.api.list_tasks(params).await {
            Ok(page) => {
                let mut state = self.state.lock();
                if replace {
                    state.pages = vec![page];
                } else {
                    state.pages.push(page);
                }
                state.last_error = None;
                self.ctx
                    .cache
                    .put(QueryKey::TaskList, Cached::TaskPages(state.pages.clone()));
                info!(page = params.page, pages = state.pages.len(), "task page loaded");
                Ok(true)
            }
            Err(e) => {
                warn!(page = params.page, error = %e, "task page fetch failed");
                self.state.lock().last_error = Some(e.clone());
                Err(e)
            }
        }
    }
}
