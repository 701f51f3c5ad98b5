//! # ps-services
//!
//! Client-side services for Printshop RS.
//!
//! Services sit between a view and the backend: they validate through
//! contracts, call [`ps_client::TaskApi`], keep the [`QueryCache`] honest by
//! invalidating what a change made stale, and append history and push
//! notifications for committed changes.

pub mod base;
pub mod cache;
pub mod tasks;
pub mod history;
pub mod session;

pub use base::ServiceContext;
pub use cache::{Cached, QueryCache, QueryKey};
pub use history::{CommentService, HistoryPager, HISTORY_PAGE_SIZE};
pub use session::{
    FileSessionStorage, MemorySessionStorage, Session, SessionState, SessionStorage, STORAGE_KEY,
};
pub use tasks::{
    load_catalog, CreateTaskService, MutationCoordinator, MutationOutcome, MutationState,
    StatusFilter, TaskForm, TaskListView,
};
