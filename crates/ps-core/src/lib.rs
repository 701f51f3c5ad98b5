//! # ps-core
//!
//! Core types, traits, and utilities for Printshop RS.
//!
//! This crate provides the foundational building blocks used across all other crates:
//! - Common error types
//! - Result type aliases and the service result pattern
//! - Core traits (Keyed, Timestamped, SoftDeletable)
//! - The backend's pagination envelope
//! - Client configuration
//! - Date display helpers

pub mod error;
pub mod result;
pub mod traits;
pub mod types;
pub mod pagination;
pub mod config;

pub use error::*;
pub use result::*;
pub use traits::*;
pub use types::*;
pub use pagination::*;
