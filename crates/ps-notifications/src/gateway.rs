//! Push delivery gateway

use std::time::Duration;

use async_trait::async_trait;
use ps_core::PsError;
use thiserror::Error;
use tracing::debug;

use crate::message::PushMessage;

/// Push errors
#[derive(Debug, Error)]
pub enum PushError {
    #[error("Push delivery failed: {0}")]
    Delivery(String),
    #[error("Push endpoint rejected the batch with HTTP {status}")]
    Rejected { status: u16 },
    #[error("Could not load push recipients: {0}")]
    Recipients(PsError),
    #[error("Push client setup failed: {0}")]
    Setup(String),
}

pub type PushResult<T> = Result<T, PushError>;

impl From<PushError> for PsError {
    fn from(err: PushError) -> Self {
        match err {
            PushError::Recipients(inner) => inner,
            PushError::Rejected { status } => PsError::Http {
                status,
                message: "push endpoint rejected the batch".to_string(),
            },
            PushError::Delivery(message) => PsError::network(message),
            PushError::Setup(message) => PsError::Config(message),
        }
    }
}

/// Sends one batch of messages
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, messages: Vec<PushMessage>) -> PushResult<()>;
}

/// Expo push service over reqwest
#[derive(Clone, Debug)]
pub struct ExpoPushGateway {
    reqwest: reqwest::Client,
    endpoint: String,
}

impl ExpoPushGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> PushResult<Self> {
        let reqwest = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PushError::Setup(e.to_string()))?;
        Ok(Self {
            reqwest,
            endpoint: endpoint.into(),
        })
    }
}

#[async_trait]
impl PushGateway for ExpoPushGateway {
    async fn send(&self, messages: Vec<PushMessage>) -> PushResult<()> {
        debug!(count = messages.len(), "posting push batch");
        let response = self
            .reqwest
            .post(&self.endpoint)
            .json(&messages)
            .send()
            .await
            .map_err(|e| PushError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PushError::Rejected {
                status: response.status().as_u16(),
            });
        }
        Ok(())
    }
}
