//! # ps-contracts
//!
//! Contract validation for Printshop RS.
//!
//! Contracts validate input before a create/update call is attempted. A
//! failed contract is a blocking, user-facing message; no request is sent.

pub mod base;
pub mod tasks;
pub mod process;
pub mod comments;

pub use base::*;
pub use tasks::CreateTaskContract;
pub use process::ProcessStepContract;
pub use comments::CommentContract;
