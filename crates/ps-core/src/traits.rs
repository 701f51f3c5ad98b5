//! Core traits shared by the client-side records

use chrono::{DateTime, Utc};

/// Backend string key (`TASK_KEY`, `ADMIN_KEY`, ...)
pub type Key = String;

/// Records addressed by a backend key.
///
/// Records fetched from the backend may lack a key; such records are never
/// deduplicated or addressed individually.
pub trait Keyed {
    fn key(&self) -> Option<&str>;

    fn has_key(&self) -> bool {
        self.key().map_or(false, |k| !k.is_empty())
    }
}

/// Trait for records with timestamps
pub trait Timestamped {
    fn created_at(&self) -> Option<DateTime<Utc>>;
    fn updated_at(&self) -> Option<DateTime<Utc>>;
}

/// Trait for records that are flagged rather than removed
pub trait SoftDeletable {
    fn is_deleted(&self) -> bool;
}
