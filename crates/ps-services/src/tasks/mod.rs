//! Task services
//!
//! - `coordinator`: optimistic edits of one task (detail view)
//! - `list`: paged, deduplicated, filtered task list
//! - `form`: task creation form and process assembly
//! - `create`: task creation submit

mod coordinator;
mod create;
mod form;
mod list;

pub use coordinator::{MutationCoordinator, MutationOutcome, MutationState};
pub use create::{load_catalog, CreateTaskService};
pub use form::{TaskForm, NO_POST_PROCESSING};
pub use list::{apply_filter, flatten_unique, StatusFilter, TaskListView};
