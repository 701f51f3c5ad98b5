//! User model
//!
//! `UserRecord` is the backend row (`GET /users/:id`), `User` is the signed-in
//! account kept in the session.

use serde::{Deserialize, Serialize};

use crate::serde_helpers;

/// Display name used when the backend has none
pub const DEFAULT_USER_NAME: &str = "사용자";

/// Backend user row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct UserRecord {
    #[serde(rename = "ADMIN_ID", alias = "adminId", default, deserialize_with = "serde_helpers::optional_string")]
    pub admin_id: Option<String>,

    #[serde(rename = "ADMIN_PW", alias = "adminPw", default, deserialize_with = "serde_helpers::optional_string")]
    pub admin_pw: Option<String>,

    #[serde(rename = "ADMIN_KEY", alias = "adminKey", default, deserialize_with = "serde_helpers::optional_string")]
    pub admin_key: Option<String>,

    #[serde(rename = "ADMIN_NAME", alias = "name", default)]
    pub admin_name: Option<String>,

    #[serde(rename = "PUSH_TOKEN", alias = "pushToken", default)]
    pub push_token: Option<String>,

    #[serde(rename = "PUSH_ENABLED", alias = "pushEnabled", default, deserialize_with = "serde_helpers::flag")]
    pub push_enabled: bool,
}

impl UserRecord {
    /// Password check against the stored value
    pub fn password_matches(&self, password: &str) -> bool {
        self.admin_pw.as_deref().unwrap_or("") == password
    }

    /// Signed-in account for a login id
    pub fn into_user(self, login_id: &str) -> User {
        User {
            id: self.admin_key.clone().unwrap_or_else(|| login_id.to_string()),
            email: self.admin_id.unwrap_or_else(|| login_id.to_string()),
            name: Some(self.admin_name.unwrap_or_else(|| DEFAULT_USER_NAME.to_string())),
            admin_key: self.admin_key,
            push_token: self.push_token,
            push_enabled: Some(self.push_enabled),
        }
    }
}

/// Signed-in account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub admin_key: Option<String>,
    #[serde(default)]
    pub push_token: Option<String>,
    #[serde(default)]
    pub push_enabled: Option<bool>,
}

impl User {
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(DEFAULT_USER_NAME)
    }

    /// Apply a partial update
    pub fn apply(&mut self, patch: UserPatch) {
        if let Some(name) = patch.name {
            self.name = Some(name);
        }
        if let Some(token) = patch.push_token {
            self.push_token = token;
        }
        if let Some(enabled) = patch.push_enabled {
            self.push_enabled = Some(enabled);
        }
    }
}

/// Partial user update; `push_token: Some(None)` clears the token
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserPatch {
    pub name: Option<String>,
    pub push_token: Option<Option<String>>,
    pub push_enabled: Option<bool>,
}

/// `PATCH /users/:key` body for the push setting
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushSettings {
    /// Sent as `null` when disabling
    pub push_token: Option<String>,
    pub push_enabled: bool,
}

/// One entry of `GET /users?pushEnabled=1`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PushRecipient {
    #[serde(rename = "ADMIN_KEY", alias = "adminKey", default, deserialize_with = "serde_helpers::optional_string")]
    pub admin_key: Option<String>,

    #[serde(rename = "ADMIN_NAME", alias = "name", default)]
    pub name: Option<String>,

    #[serde(rename = "PUSH_TOKEN", alias = "pushToken", default, deserialize_with = "serde_helpers::optional_string")]
    pub push_token: Option<String>,
}

impl PushRecipient {
    /// Recipients without a token cannot be addressed
    pub fn token(&self) -> Option<&str> {
        self.push_token.as_deref().filter(|t| !t.trim().is_empty())
    }
}
