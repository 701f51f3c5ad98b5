//! Base contract system

use ps_core::error::ValidationErrors;

/// Result of contract validation
pub type ValidationResult = Result<(), ValidationErrors>;

/// Base contract trait
pub trait Contract<T>: Send + Sync {
    /// Validate the entity
    fn validate(&self, entity: &T) -> ValidationResult;
}

/// Record a "required" error when `value` is blank after trimming
pub fn require_present(errors: &mut ValidationErrors, field: &str, value: &str, message: &str) {
    if value.trim().is_empty() {
        errors.add(field, message);
    }
}

/// Copy `validator` derive errors into the shared collection
pub fn merge_validator_errors(errors: &mut ValidationErrors, source: validator::ValidationErrors) {
    for (field, field_errors) in source.field_errors() {
        for error in field_errors {
            let message = error
                .message
                .as_ref()
                .map(|m| m.to_string())
                .unwrap_or_else(|| format!("{} is invalid ({})", field, error.code));
            errors.add(field.to_string(), message);
        }
    }
}
