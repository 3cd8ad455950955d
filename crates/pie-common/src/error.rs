//! Centralized error types for pie.
//!
//! Uses `thiserror` for ergonomic error definitions. Data-access functions return
//! `sqlx::Error` unchanged; this type wraps it where callers mix storage with
//! validation or configuration failures.

/// Core application error type used across pie crates.
#[derive(Debug, thiserror::Error)]
pub enum PieError {
    // === Resource errors ===
    #[error("{resource} not found")]
    NotFound { resource: String },

    #[error("{resource} already exists")]
    AlreadyExists { resource: String },

    // === Validation errors ===
    #[error("Validation failed: {message}")]
    Validation { message: String },

    // === Infrastructure errors ===
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl PieError {
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    pub fn already_exists(resource: impl Into<String>) -> Self {
        Self::AlreadyExists {
            resource: resource.into(),
        }
    }

    /// Error code string for programmatic handling (exit codes, logs).
    pub fn error_code(&self) -> &str {
        match self {
            Self::NotFound { .. } => "NOT_FOUND",
            Self::AlreadyExists { .. } => "ALREADY_EXISTS",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Convenience type alias for Results using PieError.
pub type PieResult<T> = Result<T, PieError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_resource() {
        let err = PieError::not_found("Repository 'fun'");
        assert_eq!(err.to_string(), "Repository 'fun' not found");
        assert_eq!(err.error_code(), "NOT_FOUND");

        let err = PieError::already_exists("Spam channel");
        assert_eq!(err.to_string(), "Spam channel already exists");
    }

    #[test]
    fn test_database_errors_convert() {
        let err: PieError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.error_code(), "DATABASE_ERROR");
    }
}
