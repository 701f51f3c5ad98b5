//! Signed-in Session
//!
//! Explicit session object handed to whatever needs the current user.
//! Lifecycle: hydrate on start, login, logout. The state is persisted under
//! [`STORAGE_KEY`] as `{"state": {isLoggedIn, user, token}, "version": 0}`.

mod storage;

use std::sync::Arc;

use parking_lot::RwLock;
use ps_client::TaskApi;
use ps_core::error::ValidationErrors;
use ps_core::{PsError, PsResult};
use ps_models::{PushSettings, User, UserPatch};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub use storage::{FileSessionStorage, MemorySessionStorage, SessionStorage};

pub const STORAGE_KEY: &str = "auth-storage";
pub const STORAGE_VERSION: u32 = 0;

pub const ID_REQUIRED: &str = "아이디를 입력해주세요.";
pub const PASSWORD_REQUIRED: &str = "비밀번호를 입력해주세요.";
pub const PUSH_TOKEN_REQUIRED: &str = "푸시 토큰이 없습니다.";

/// Persisted session state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionState {
    pub is_logged_in: bool,
    pub user: Option<User>,
    pub token: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct Persisted {
    state: SessionState,
    #[serde(default)]
    version: u32,
}

pub struct Session {
    storage: Arc<dyn SessionStorage>,
    state: RwLock<SessionState>,
}

impl Session {
    /// Logged-out session that has not read storage
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self {
            storage,
            state: RwLock::new(SessionState::default()),
        }
    }

    /// Restore the persisted session; anything unreadable is a logged-out
    /// session
    pub async fn hydrate(storage: Arc<dyn SessionStorage>) -> Self {
        let state = match storage.get(STORAGE_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Persisted>(&raw) {
                Ok(persisted) if persisted.state.is_logged_in && persisted.state.user.is_some() => {
                    persisted.state
                }
                Ok(_) => SessionState::default(),
                Err(e) => {
                    warn!(storage = storage.name(), error = %e, "persisted session unreadable");
                    SessionState::default()
                }
            },
            Ok(None) => SessionState::default(),
            Err(e) => {
                warn!(storage = storage.name(), error = %e, "session storage unreadable");
                SessionState::default()
            }
        };
        debug!(logged_in = state.is_logged_in, "session hydrated");

        Self {
            storage,
            state: RwLock::new(state),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.read().clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.read().is_logged_in
    }

    pub fn user(&self) -> Option<User> {
        self.state.read().user.clone()
    }

    /// Key stamped on logs, comments and created tasks
    pub fn admin_key(&self) -> Option<String> {
        self.state
            .read()
            .user
            .as_ref()
            .and_then(|u| u.admin_key.clone())
    }

    /// Sign in against `GET /users/:id`.
    ///
    /// Unknown ids and wrong passwords fail the same way.
    pub async fn login(&self, api: &dyn TaskApi, id: &str, password: &str) -> PsResult<User> {
        let id = id.trim();
        let mut errors = ValidationErrors::new();
        if id.is_empty() {
            errors.add("id", ID_REQUIRED);
        }
        if password.is_empty() {
            errors.add("password", PASSWORD_REQUIRED);
        }
        errors.into_result()?;

        let record = match api.get_user(id).await? {
            Some(record) if record.admin_id.is_some() => record,
            _ => {
                warn!(login_id = id, "login failed: unknown user");
                return Err(PsError::unauthorized());
            }
        };
        if !record.password_matches(password) {
            warn!(login_id = id, "login failed: password mismatch");
            return Err(PsError::unauthorized());
        }

        let user = record.into_user(id);
        let state = SessionState {
            is_logged_in: true,
            user: Some(user.clone()),
            token: Some(Uuid::new_v4().to_string()),
        };
        self.persist(&state).await?;
        *self.state.write() = state;

        info!(login_id = id, admin_key = ?user.admin_key, "signed in");
        Ok(user)
    }

    /// Merge a partial update into the signed-in user; no-op when logged out
    pub async fn update_user(&self, patch: UserPatch) -> PsResult<()> {
        let mut next = self.state();
        let Some(user) = next.user.as_mut() else {
            return Ok(());
        };
        user.apply(patch);
        self.persist(&next).await?;
        *self.state.write() = next;
        Ok(())
    }

    /// Clear persisted and in-memory state
    pub async fn logout(&self) -> PsResult<()> {
        *self.state.write() = SessionState::default();
        self.storage.remove(STORAGE_KEY).await?;
        info!("signed out");
        Ok(())
    }

    /// Sync the push setting with `PATCH /users/:adminKey`.
    ///
    /// Disabling sends a `null` token. The local user changes only after the
    /// backend accepted the update.
    pub async fn set_push_enabled(
        &self,
        api: &dyn TaskApi,
        enabled: bool,
        token: Option<String>,
    ) -> PsResult<()> {
        let admin_key = self.admin_key().ok_or_else(PsError::unauthorized)?;
        let token = token.filter(|t| !t.trim().is_empty());
        if enabled && token.is_none() {
            let mut errors = ValidationErrors::new();
            errors.add("pushToken", PUSH_TOKEN_REQUIRED);
            return Err(errors.into());
        }

        let settings = PushSettings {
            push_token: if enabled { token } else { None },
            push_enabled: enabled,
        };
        api.update_push_settings(&admin_key, &settings).await?;
        info!(admin_key = %admin_key, enabled, "push setting updated");

        self.update_user(UserPatch {
            push_token: Some(settings.push_token),
            push_enabled: Some(enabled),
            ..Default::default()
        })
        .await
    }

    async fn persist(&self, state: &SessionState) -> PsResult<()> {
        let persisted = Persisted {
            state: state.clone(),
            version: STORAGE_VERSION,
        };
        let raw = serde_json::to_string(&persisted).map_err(|e| PsError::Storage(e.to_string()))?;
        self.storage.set(STORAGE_KEY, raw).await
    }
}
