//! # ps-journals
//!
//! History log entries for tasks.
//!
//! Every committed change to a task appends exactly one line to its history
//! (`POST /logs`). A failed log write never undoes the change it describes,
//! so the service offers a best-effort path that only warns.

pub mod change;
pub mod journal_service;

pub use change::ChangeEntry;
pub use journal_service::{JournalError, JournalResult, JournalService};
