//! Query cache
//!
//! The one shared resource between views. Entries are keyed by logical
//! resource (`task-list`, `task-count`, `task-detail:<key>`, `options`).
//! Invalidation keeps the value but marks it stale, so views keep showing
//! the last known data until they refetch. Every service that changes server
//! state invalidates the entries its change could have made stale.

use std::fmt;

use dashmap::DashMap;
use ps_core::Page;
use ps_models::{OptionCatalog, Task, TaskCounts};
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum QueryKey {
    TaskList,
    TaskCount,
    TaskDetail(String),
    Options,
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryKey::TaskList => f.write_str("task-list"),
            QueryKey::TaskCount => f.write_str("task-count"),
            QueryKey::TaskDetail(key) => write!(f, "task-detail:{}", key),
            QueryKey::Options => f.write_str("options"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Cached {
    TaskPages(Vec<Page<Task>>),
    Counts(TaskCounts),
    Task(Task),
    Options(OptionCatalog),
}

#[derive(Debug, Clone)]
struct Entry {
    value: Cached,
    stale: bool,
}

#[derive(Debug, Default)]
pub struct QueryCache {
    entries: DashMap<QueryKey, Entry>,
}

impl QueryCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, key: QueryKey, value: Cached) {
        debug!(key = %key, "cache entry stored");
        self.entries.insert(key, Entry { value, stale: false });
    }

    /// Value for a key, stale or not
    pub fn get(&self, key: &QueryKey) -> Option<Cached> {
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Value for a key only while it is fresh
    pub fn get_fresh(&self, key: &QueryKey) -> Option<Cached> {
        self.entries
            .get(key)
            .filter(|entry| !entry.stale)
            .map(|entry| entry.value.clone())
    }

    /// Missing entries count as stale
    pub fn is_stale(&self, key: &QueryKey) -> bool {
        self.entries.get(key).map_or(true, |entry| entry.stale)
    }

    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(mut entry) = self.entries.get_mut(key) {
            entry.stale = true;
            debug!(key = %key, "cache entry invalidated");
        }
    }

    pub fn remove(&self, key: &QueryKey) {
        self.entries.remove(key);
    }

    /// List and count entries, after a task was created or deleted
    pub fn invalidate_lists(&self) {
        self.invalidate(&QueryKey::TaskList);
        self.invalidate(&QueryKey::TaskCount);
    }

    /// Everything a change to one task can make stale
    pub fn invalidate_task(&self, task_key: &str) {
        self.invalidate_lists();
        self.invalidate(&QueryKey::TaskDetail(task_key.to_string()));
    }

    pub fn task(&self, task_key: &str) -> Option<Task> {
        match self.get(&QueryKey::TaskDetail(task_key.to_string())) {
            Some(Cached::Task(task)) => Some(task),
            _ => None,
        }
    }

    /// Store a task under its key; keyless tasks are not cached
    pub fn put_task(&self, task: &Task) {
        if let Some(key) = task.task_key.as_deref().filter(|k| !k.is_empty()) {
            self.put(QueryKey::TaskDetail(key.to_string()), Cached::Task(task.clone()));
        }
    }

    pub fn counts(&self) -> Option<TaskCounts> {
        match self.get(&QueryKey::TaskCount) {
            Some(Cached::Counts(counts)) => Some(counts),
            _ => None,
        }
    }

    pub fn options(&self) -> Option<OptionCatalog> {
        match self.get_fresh(&QueryKey::Options) {
            Some(Cached::Options(catalog)) => Some(catalog),
            _ => None,
        }
    }

    pub fn task_pages(&self) -> Option<Vec<Page<Task>>> {
        match self.get(&QueryKey::TaskList) {
            Some(Cached::TaskPages(pages)) => Some(pages),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
