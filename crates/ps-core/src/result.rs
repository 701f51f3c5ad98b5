//! Result type aliases and service result pattern

use crate::error::{PsError, ValidationErrors};

/// Standard Result type for client operations
pub type PsResult<T> = Result<T, PsError>;

/// Outcome of a user-triggered service call.
///
/// Failures carry user-facing messages in `errors`; the caller shows them
/// and leaves its input untouched for a retry.
#[derive(Debug)]
pub struct ServiceResult<T> {
    /// Whether the operation succeeded
    pub success: bool,
    /// The result value (if successful)
    pub result: Option<T>,
    /// Errors (if failed)
    pub errors: ValidationErrors,
}

impl<T> ServiceResult<T> {
    /// Create a successful result
    pub fn success(result: T) -> Self {
        Self {
            success: true,
            result: Some(result),
            errors: ValidationErrors::new(),
        }
    }

    /// Create a failed result with errors
    pub fn failure(errors: ValidationErrors) -> Self {
        Self {
            success: false,
            result: None,
            errors,
        }
    }

    /// Create a failed result with a single error message
    pub fn failure_with_message(message: impl Into<String>) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add_base(message);
        Self::failure(errors)
    }

    pub fn is_success(&self) -> bool {
        self.success
    }

    pub fn is_failure(&self) -> bool {
        !self.success
    }

    /// Borrow the result value
    pub fn result(&self) -> Option<&T> {
        self.result.as_ref()
    }

    /// Borrow the errors
    pub fn errors(&self) -> &ValidationErrors {
        &self.errors
    }

    /// Map the result value
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ServiceResult<U> {
        ServiceResult {
            success: self.success,
            result: self.result.map(f),
            errors: self.errors,
        }
    }

    /// Convert to standard Result
    pub fn into_result(self) -> PsResult<T> {
        if self.success {
            self.result.ok_or_else(|| {
                PsError::Internal("ServiceResult success but no result value".into())
            })
        } else {
            Err(PsError::Validation(self.errors))
        }
    }
}

impl<T> From<PsResult<T>> for ServiceResult<T> {
    fn from(result: PsResult<T>) -> Self {
        match result {
            Ok(value) => ServiceResult::success(value),
            Err(PsError::Validation(errors)) => ServiceResult::failure(errors),
            Err(e) => ServiceResult::failure_with_message(e.user_message()),
        }
    }
}
