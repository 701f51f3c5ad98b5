//! # ps-client
//!
//! The backend REST contract as an async trait, plus its reqwest
//! implementation. Services only see [`TaskApi`]; tests substitute mocks.

pub mod api;
pub mod http;

pub use api::{TaskApi, USERS_PUSH_QUERY};
pub use http::HttpTaskApi;

#[cfg(any(test, feature = "mock"))]
pub use api::MockTaskApi;
