//! # ps-models
//!
//! Domain models for Printshop RS.
//!
//! This crate holds the typed records exchanged with the backend. Records are
//! validated once at the fetch boundary: loosely typed backend fields (status
//! strings, 0/1 flags, the stringified detail payload) are normalized here so
//! nothing downstream handles partial shapes.

pub use ps_core::traits::{Key, Keyed, SoftDeletable, Timestamped};

pub mod serde_helpers;
pub mod task;
pub mod task_detail;
pub mod process;
pub mod record;
pub mod options;
pub mod user;

pub use task::{CreateTask, Task, TaskCounts, TaskPriority, TaskProgress, UpdateTask};
pub use task_detail::{decode, encode, parse_detail, TaskDetail};
pub use process::{ProcessStatus, ProcessStep, PRINTING_CATEGORY};
pub use record::{Comment, LogEntry, NewRecord};
pub use options::{default_catalog, OptionCatalog, OptionGroup, VendorOption};
pub use user::{PushRecipient, PushSettings, User, UserPatch, UserRecord};
