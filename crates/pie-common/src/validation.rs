//! Input validation utilities.
//!
//! Centralized validation helpers used by the admin tooling before anything is written.

use validator::Validate;

use crate::error::PieError;

/// Validate a request body, returning a PieError::Validation on failure.
pub fn validate_request<T: Validate>(body: &T) -> Result<(), PieError> {
    body.validate().map_err(|e| PieError::Validation {
        message: format_validation_errors(e),
    })
}

/// Format validation errors into a human-readable string.
fn format_validation_errors(errors: validator::ValidationErrors) -> String {
    let mut messages = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value for '{field}'"))
            })
        })
        .collect::<Vec<_>>();
    messages.sort();
    messages.join("; ")
}

/// Validate a storage key or module name: non-empty, no whitespace.
pub fn validate_key(kind: &str, key: &str) -> Result<(), PieError> {
    if key.is_empty() {
        return Err(PieError::Validation {
            message: format!("{kind} cannot be empty"),
        });
    }
    if key.chars().any(char::is_whitespace) {
        return Err(PieError::Validation {
            message: format!("{kind} cannot contain whitespace"),
        });
    }
    Ok(())
}
