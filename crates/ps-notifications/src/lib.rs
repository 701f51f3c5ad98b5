//! # ps-notifications
//!
//! Push notifications for task changes.
//!
//! Recipients are the users with push enabled (`GET /users?pushEnabled=1`).
//! Messages go to the Expo push endpoint in chunks of at most 100. Delivery
//! is best effort: failures are recorded on the service and never reach the
//! change that triggered them.

pub mod message;
pub mod gateway;
pub mod service;

pub use gateway::{ExpoPushGateway, PushError, PushGateway, PushResult};
pub use message::{PushMessage, PushPayload, TaskNotice, TASK_DETAIL_ROUTE};
pub use service::{Notifier, PushOutcome, PushService};

#[cfg(any(test, feature = "mock"))]
pub use gateway::MockPushGateway;
#[cfg(any(test, feature = "mock"))]
pub use service::MockNotifier;
