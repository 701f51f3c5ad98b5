//! Core error types for Printshop RS
//!
//! Every asynchronous failure is caught at the call site and turned into a
//! user-visible message; `PsError::user_message` is that message.

use std::collections::BTreeMap;
use thiserror::Error;

/// Core error type for all client operations
#[derive(Error, Debug, Clone)]
pub enum PsError {
    #[error("Not found: {entity} with {field}={value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    /// Login failure. Unknown id and wrong password both land here.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    #[error("Network error: {message}")]
    Network { message: String },

    #[error("Request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Another change to task {key} is still in flight")]
    Busy { key: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Validation errors collection
#[derive(Error, Debug, Default, Clone, PartialEq, Eq)]
#[error("Validation errors: {errors:?}")]
pub struct ValidationErrors {
    /// Field-specific errors: field_name -> Vec<error_messages>
    pub errors: BTreeMap<String, Vec<String>>,
    /// Base errors not tied to a specific field
    pub base_errors: Vec<String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_base(&mut self, message: impl Into<String>) {
        self.base_errors.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty() && self.base_errors.is_empty()
    }

    /// Check if there are errors for a specific field
    pub fn has_error(&self, field: &str) -> bool {
        self.errors.contains_key(field)
    }

    /// Get errors for a specific field
    pub fn get(&self, field: &str) -> Option<&Vec<String>> {
        self.errors.get(field)
    }

    pub fn merge(&mut self, other: ValidationErrors) {
        for (field, messages) in other.errors {
            self.errors.entry(field).or_default().extend(messages);
        }
        self.base_errors.extend(other.base_errors);
    }

    /// Messages in display order: base errors first, then per field.
    /// Field messages are already phrased for the user, so the field name is
    /// not prefixed.
    pub fn full_messages(&self) -> Vec<String> {
        let mut messages = self.base_errors.clone();
        for field_messages in self.errors.values() {
            messages.extend(field_messages.iter().cloned());
        }
        messages
    }

    /// Convert into a `Result`, `Ok` when nothing was collected
    pub fn into_result(self) -> Result<(), ValidationErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl PsError {
    pub fn network(message: impl Into<String>) -> Self {
        PsError::Network {
            message: message.into(),
        }
    }

    pub fn unauthorized() -> Self {
        PsError::Unauthorized {
            message: "login failed".to_string(),
        }
    }

    pub fn not_found(entity: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        PsError::NotFound {
            entity,
            field,
            value: value.into(),
        }
    }

    /// Whether the failure came from the transport or the backend
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            PsError::Network { .. } | PsError::Timeout { .. } | PsError::Http { .. }
        )
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            PsError::NotFound { .. } => "not_found",
            PsError::Unauthorized { .. } => "unauthorized",
            PsError::Validation(_) => "validation_failed",
            PsError::Network { .. } => "network_error",
            PsError::Timeout { .. } => "timeout",
            PsError::Http { .. } => "http_error",
            PsError::Decode(_) => "decode_error",
            PsError::Storage(_) => "storage_error",
            PsError::Config(_) => "configuration_error",
            PsError::Busy { .. } => "busy",
            PsError::Internal(_) => "internal_error",
        }
    }

    /// Alert text shown to the user
    pub fn user_message(&self) -> String {
        match self {
            PsError::Validation(errors) => {
                let messages = errors.full_messages();
                if messages.is_empty() {
                    "입력값을 확인해주세요.".to_string()
                } else {
                    messages.join("\n")
                }
            }
            PsError::Unauthorized { .. } => {
                "로그인에 실패했습니다. 아이디와 비밀번호를 확인해주세요.".to_string()
            }
            PsError::NotFound { .. } => "요청한 항목을 찾을 수 없습니다.".to_string(),
            PsError::Network { .. } | PsError::Http { .. } | PsError::Decode(_) => {
                "서버와 통신 중 오류가 발생했습니다. 다시 시도해주세요.".to_string()
            }
            PsError::Timeout { .. } => "요청 시간이 초과되었습니다. 다시 시도해주세요.".to_string(),
            PsError::Busy { .. } => "이전 요청을 처리 중입니다.".to_string(),
            PsError::Storage(_) | PsError::Config(_) | PsError::Internal(_) => {
                "알 수 없는 오류가 발생했습니다.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_collect_and_merge() {
        let mut errors = ValidationErrors::new();
        assert!(errors.is_empty());

        errors.add("taskTitle", "작업명을 입력해주세요.");
        let mut other = ValidationErrors::new();
        other.add_base("폼을 확인해주세요.");
        other.add("taskCompany", "발주처를 입력해주세요.");
        errors.merge(other);

        assert!(errors.has_error("taskTitle"));
        assert!(errors.has_error("taskCompany"));
        assert_eq!(errors.full_messages()[0], "폼을 확인해주세요.");
        assert_eq!(errors.full_messages().len(), 3);
    }

    #[test]
    fn test_user_message_hides_login_failure_cause() {
        let err = PsError::unauthorized();
        assert_eq!(err.error_code(), "unauthorized");
        assert!(err.user_message().contains("로그인에 실패"));
    }

    #[test]
    fn test_network_classification() {
        assert!(PsError::network("reset").is_network());
        assert!(PsError::Timeout { seconds: 15 }.is_network());
        assert!(!PsError::Decode("bad".into()).is_network());
    }
}
