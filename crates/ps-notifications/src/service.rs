//! Push Service
//!
//! Loads recipients, chunks messages and hands batches to a [`PushGateway`].
//! One broadcast runs at a time; a broadcast requested while another is
//! sending is dropped, not queued.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use ps_client::TaskApi;
use ps_core::config::{PushConfig, MAX_PUSH_CHUNK};
use ps_models::PushRecipient;
use tracing::{debug, info, warn};

use crate::gateway::{PushError, PushGateway, PushResult};
use crate::message::{PushPayload, TaskNotice};

/// What a broadcast did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PushOutcome {
    /// Push is switched off in configuration
    Disabled,
    /// Another broadcast was still sending
    Busy,
    NoRecipients,
    Sent { messages: usize, batches: usize },
    Failed(String),
}

impl PushOutcome {
    pub fn is_sent(&self) -> bool {
        matches!(self, PushOutcome::Sent { .. })
    }
}

/// Announces task changes to other users
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: TaskNotice) -> PushOutcome;
}

#[derive(Default)]
struct PushState {
    recipients: Vec<PushRecipient>,
    last_error: Option<String>,
}

/// Clears the sending flag however the broadcast ends
struct SendingGuard<'a>(&'a AtomicBool);

impl Drop for SendingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Push service
pub struct PushService {
    api: Arc<dyn TaskApi>,
    gateway: Arc<dyn PushGateway>,
    enabled: bool,
    chunk_size: usize,
    state: Mutex<PushState>,
    sending: AtomicBool,
}

impl PushService {
    pub fn new(api: Arc<dyn TaskApi>, gateway: Arc<dyn PushGateway>, config: &PushConfig) -> Self {
        Self {
            api,
            gateway,
            enabled: config.enabled,
            chunk_size: config.chunk_size.clamp(1, MAX_PUSH_CHUNK),
            state: Mutex::new(PushState::default()),
            sending: AtomicBool::new(false),
        }
    }

    pub fn is_sending(&self) -> bool {
        self.sending.load(Ordering::Acquire)
    }

    /// Error of the most recent broadcast, if it failed
    pub fn last_error(&self) -> Option<String> {
        self.state.lock().last_error.clone()
    }

    pub fn recipients(&self) -> Vec<PushRecipient> {
        self.state.lock().recipients.clone()
    }

    /// Refresh the recipient list; returns how many have a token
    pub async fn load_recipients(&self) -> PushResult<usize> {
        match self.api.list_push_recipients().await {
            Ok(recipients) => {
                let recipients: Vec<PushRecipient> =
                    recipients.into_iter().filter(|r| r.token().is_some()).collect();
                let count = recipients.len();
                let mut state = self.state.lock();
                state.recipients = recipients;
                state.last_error = None;
                debug!(count, "push recipients loaded");
                Ok(count)
            }
            Err(e) => {
                warn!(error = %e, "push recipients could not be loaded");
                self.state.lock().last_error = Some(format!("수신자 불러오기 실패: {}", e));
                Err(PushError::Recipients(e))
            }
        }
    }

    /// Send a payload to every recipient.
    ///
    /// Recipients are reloaded when `reload` is set or none are cached.
    /// Never fails; the outcome says what happened and a failure is kept in
    /// [`PushService::last_error`].
    pub async fn broadcast(&self, payload: &PushPayload, reload: bool) -> PushOutcome {
        if !self.enabled {
            return PushOutcome::Disabled;
        }
        if self
            .sending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(title = %payload.title, "push already sending, dropping broadcast");
            return PushOutcome::Busy;
        }
        let _sending = SendingGuard(&self.sending);

        self.state.lock().last_error = None;

        let needs_load = reload || self.state.lock().recipients.is_empty();
        if needs_load {
            if let Err(e) = self.load_recipients().await {
                return PushOutcome::Failed(e.to_string());
            }
        }

        let tokens: Vec<String> = self
            .state
            .lock()
            .recipients
            .iter()
            .filter_map(|r| r.token().map(str::to_string))
            .collect();
        if tokens.is_empty() {
            debug!("no push recipients");
            return PushOutcome::NoRecipients;
        }

        let mut batches = 0;
        for chunk in tokens.chunks(self.chunk_size) {
            let messages = chunk.iter().map(|token| payload.message_to(token)).collect();
            if let Err(e) = self.gateway.send(messages).await {
                warn!(error = %e, batch = batches, "push batch failed");
                let message = format!("푸시 전송 실패: {}", e);
                self.state.lock().last_error = Some(message.clone());
                return PushOutcome::Failed(message);
            }
            batches += 1;
        }

        info!(messages = tokens.len(), batches, title = %payload.title, "push broadcast sent");
        PushOutcome::Sent {
            messages: tokens.len(),
            batches,
        }
    }

    /// Broadcast a task notification that opens the task when tapped
    pub async fn send_notification(&self, notice: TaskNotice) -> PushOutcome {
        self.broadcast(&notice.into_payload(), false).await
    }
}

#[async_trait]
impl Notifier for PushService {
    async fn notify(&self, notice: TaskNotice) -> PushOutcome {
        self.send_notification(notice).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::MockPushGateway;
    use crate::message::PushMessage;
    use ps_client::MockTaskApi;
    use ps_core::PsError;
    use tokio::sync::Semaphore;

    fn config(chunk_size: usize) -> PushConfig {
        PushConfig {
            enabled: true,
            endpoint: "http://localhost/push".into(),
            chunk_size,
        }
    }

    fn recipients(count: usize) -> Vec<PushRecipient> {
        (0..count)
            .map(|i| PushRecipient {
                admin_key: Some(i.to_string()),
                name: None,
                push_token: Some(format!("ExponentPushToken[{}]", i)),
            })
            .collect()
    }

    fn api_with(count: usize, times: usize) -> MockTaskApi {
        let mut api = MockTaskApi::new();
        api.expect_list_push_recipients()
            .times(times)
            .returning(move || Ok(recipients(count)));
        api
    }

    #[tokio::test]
    async fn test_broadcast_chunks_by_configured_size() {
        let sizes = Arc::new(Mutex::new(Vec::new()));
        let seen = Arc::clone(&sizes);
        let mut gateway = MockPushGateway::new();
        gateway.expect_send().times(3).returning(move |messages| {
            seen.lock().push(messages.len());
            Ok(())
        });

        let service = PushService::new(Arc::new(api_with(250, 1)), Arc::new(gateway), &config(100));
        let outcome = service.broadcast(&PushPayload::new("t", "b"), false).await;

        assert_eq!(outcome, PushOutcome::Sent { messages: 250, batches: 3 });
        assert_eq!(*sizes.lock(), vec![100, 100, 50]);
        assert!(!service.is_sending());
    }

    #[tokio::test]
    async fn test_chunk_size_is_capped() {
        let mut gateway = MockPushGateway::new();
        gateway
            .expect_send()
            .withf(|messages: &Vec<PushMessage>| messages.len() <= MAX_PUSH_CHUNK)
            .times(2)
            .returning(|_| Ok(()));

        let service = PushService::new(Arc::new(api_with(150, 1)), Arc::new(gateway), &config(500));
        assert!(service.broadcast(&PushPayload::new("t", "b"), false).await.is_sent());
    }

    #[tokio::test]
    async fn test_no_tokens_sends_nothing() {
        let mut gateway = MockPushGateway::new();
        gateway.expect_send().times(0);

        let service = PushService::new(Arc::new(api_with(0, 1)), Arc::new(gateway), &config(100));
        let outcome = service.broadcast(&PushPayload::new("t", "b"), false).await;
        assert_eq!(outcome, PushOutcome::NoRecipients);
    }

    #[tokio::test]
    async fn test_cached_recipients_reused_unless_reload() {
        let mut gateway = MockPushGateway::new();
        gateway.expect_send().times(3).returning(|_| Ok(()));

        let service = PushService::new(Arc::new(api_with(2, 2)), Arc::new(gateway), &config(100));
        let payload = PushPayload::new("t", "b");
        service.broadcast(&payload, false).await;
        service.broadcast(&payload, false).await;
        service.broadcast(&payload, true).await;
        assert_eq!(service.recipients().len(), 2);
    }

    #[tokio::test]
    async fn test_failure_is_recorded_not_raised() {
        let mut gateway = MockPushGateway::new();
        gateway
            .expect_send()
            .times(1)
            .returning(|_| Err(PushError::Rejected { status: 500 }));

        let service = PushService::new(Arc::new(api_with(3, 1)), Arc::new(gateway), &config(100));
        let outcome = service.broadcast(&PushPayload::new("t", "b"), false).await;

        assert!(matches!(outcome, PushOutcome::Failed(_)));
        assert!(service.last_error().unwrap().starts_with("푸시 전송 실패"));
        assert!(!service.is_sending());
    }

    #[tokio::test]
    async fn test_recipient_load_failure_is_recorded() {
        let mut api = MockTaskApi::new();
        api.expect_list_push_recipients()
            .times(1)
            .returning(|| Err(PsError::network("offline")));
        let mut gateway = MockPushGateway::new();
        gateway.expect_send().times(0);

        let service = PushService::new(Arc::new(api), Arc::new(gateway), &config(100));
        let outcome = service.broadcast(&PushPayload::new("t", "b"), false).await;

        assert!(matches!(outcome, PushOutcome::Failed(_)));
        assert!(service.last_error().unwrap().starts_with("수신자 불러오기 실패"));
    }

    #[tokio::test]
    async fn test_disabled_sends_nothing() {
        let mut api = MockTaskApi::new();
        api.expect_list_push_recipients().times(0);
        let service = PushService::new(
            Arc::new(api),
            Arc::new(MockPushGateway::new()),
            &PushConfig {
                enabled: false,
                ..config(100)
            },
        );
        assert_eq!(
            service.broadcast(&PushPayload::new("t", "b"), true).await,
            PushOutcome::Disabled
        );
    }

    #[tokio::test]
    async fn test_send_notification_carries_task_route() {
        let mut gateway = MockPushGateway::new();
        gateway
            .expect_send()
            .withf(|messages: &Vec<PushMessage>| {
                messages[0].data["taskKey"] == "T1" && messages[0].data["route"] == "/(tabs)/taskDetail"
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = PushService::new(Arc::new(api_with(1, 1)), Arc::new(gateway), &config(100));
        let outcome = service
            .notify(TaskNotice::new("작업 삭제", "명함: 작업 삭제", Some("T1".into())))
            .await;
        assert!(outcome.is_sent());
    }

    /// Holds every batch until the test releases it
    struct GatedGateway {
        gate: Arc<Semaphore>,
    }

    #[async_trait]
    impl PushGateway for GatedGateway {
        async fn send(&self, _messages: Vec<PushMessage>) -> PushResult<()> {
            let _permit = self
                .gate
                .acquire()
                .await
                .map_err(|e| PushError::Delivery(e.to_string()))?;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_second_broadcast_while_sending_is_dropped() {
        let gate = Arc::new(Semaphore::new(0));
        let gateway = GatedGateway {
            gate: Arc::clone(&gate),
        };
        let service = PushService::new(Arc::new(api_with(1, 1)), Arc::new(gateway), &config(100));
        let payload = PushPayload::new("t", "b");

        let first = service.broadcast(&payload, false);
        futures::pin_mut!(first);
        assert!(futures::poll!(first.as_mut()).is_pending());
        assert!(service.is_sending());

        assert_eq!(service.broadcast(&payload, false).await, PushOutcome::Busy);

        gate.add_permits(1);
        assert!(first.await.is_sent());
        assert!(!service.is_sending());
    }
}
