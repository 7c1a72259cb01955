//! Error types for formsync.
//!
//! Provides structured error handling with:
//! - Machine-readable error codes (`ErrorCode`)
//! - Category-based exit codes (2=db, 3=not_found, 4=validation, etc.)
//! - Context-aware recovery hints
//! - Structured JSON output for piped / non-TTY consumers
//!
//! Sheet mirror failures have their own taxonomy in [`crate::sync::SheetsError`];
//! they only surface here when a command publishes explicitly (`sync push`).

use std::path::PathBuf;
use thiserror::Error;

use crate::sync::SheetsError;

/// Result type alias for formsync operations.
pub type Result<T> = std::result::Result<T, Error>;

// ── Error Code ────────────────────────────────────────────────

/// Machine-readable error codes grouped by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    // Database (exit 2)
    NotInitialized,
    AlreadyInitialized,
    DatabaseError,

    // Not Found (exit 3)
    FormNotFound,

    // Validation (exit 4)
    InvalidArgument,
    InvalidEmail,
    InvalidPhoneNumber,
    RequiredField,

    // Sync (exit 6)
    SheetsError,

    // Config (exit 7)
    ConfigError,

    // I/O (exit 8)
    IoError,
    JsonError,

    // Internal (exit 1)
    InternalError,
}

impl ErrorCode {
    /// Machine-readable SCREAMING_SNAKE code string.
    #[must_use]
    pub const fn as_str(&self) -> &str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::AlreadyInitialized => "ALREADY_INITIALIZED",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::FormNotFound => "FORM_NOT_FOUND",
            Self::InvalidArgument => "INVALID_ARGUMENT",
            Self::InvalidEmail => "INVALID_EMAIL",
            Self::InvalidPhoneNumber => "INVALID_PHONE_NUMBER",
            Self::RequiredField => "REQUIRED_FIELD",
            Self::SheetsError => "SHEETS_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
            Self::IoError => "IO_ERROR",
            Self::JsonError => "JSON_ERROR",
            Self::InternalError => "INTERNAL_ERROR",
        }
    }

    /// Category-based exit code.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::InternalError => 1,
            Self::NotInitialized | Self::AlreadyInitialized | Self::DatabaseError => 2,
            Self::FormNotFound => 3,
            Self::InvalidArgument
            | Self::InvalidEmail
            | Self::InvalidPhoneNumber
            | Self::RequiredField => 4,
            Self::SheetsError => 6,
            Self::ConfigError => 7,
            Self::IoError | Self::JsonError => 8,
        }
    }

    /// Whether the caller should retry with corrected input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::InvalidArgument
                | Self::InvalidEmail
                | Self::InvalidPhoneNumber
                | Self::RequiredField
                | Self::DatabaseError
        )
    }
}

// ── Error Enum ────────────────────────────────────────────────

/// Errors that can occur in formsync operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Not initialized: run `formsync init` first")]
    NotInitialized,

    #[error("Already initialized at {path}")]
    AlreadyInitialized { path: PathBuf },

    #[error("Form not found: {id}")]
    FormNotFound { id: i64 },

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Invalid phone number format")]
    InvalidPhoneNumber,

    #[error("Missing required field: {0}")]
    RequiredField(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Sheet sync error: {0}")]
    Sheets(#[from] SheetsError),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Map this error to its structured `ErrorCode`.
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::NotInitialized => ErrorCode::NotInitialized,
            Self::AlreadyInitialized { .. } => ErrorCode::AlreadyInitialized,
            Self::Database(_) => ErrorCode::DatabaseError,
            Self::FormNotFound { .. } => ErrorCode::FormNotFound,
            Self::InvalidEmail => ErrorCode::InvalidEmail,
            Self::InvalidPhoneNumber => ErrorCode::InvalidPhoneNumber,
            Self::RequiredField(_) => ErrorCode::RequiredField,
            Self::InvalidArgument(_) => ErrorCode::InvalidArgument,
            Self::Sheets(_) => ErrorCode::SheetsError,
            Self::Config(_) => ErrorCode::ConfigError,
            Self::Io(_) => ErrorCode::IoError,
            Self::Json(_) => ErrorCode::JsonError,
            Self::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Category-based exit code, delegating to the `ErrorCode`.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        self.error_code().exit_code()
    }

    /// Whether this is a client-side input problem (HTTP 400 territory).
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        self.error_code().exit_code() == 4
    }

    /// Context-aware recovery hint.
    ///
    /// Returns `None` if no actionable suggestion exists.
    #[must_use]
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::NotInitialized => {
                Some("Run `formsync init` to create the database".to_string())
            }
            Self::AlreadyInitialized { path } => Some(format!(
                "Database already exists at {}. Use `--force` to reinitialize.",
                path.display()
            )),
            Self::FormNotFound { id } => Some(format!(
                "No form with ID {id}. Use `formsync form list` to see stored forms."
            )),
            Self::InvalidEmail => Some("Expected something like name@example.com".to_string()),
            Self::InvalidPhoneNumber => Some(
                "Expected 9 to 15 digits, optionally prefixed with '+' (e.g. +14155550123)"
                    .to_string(),
            ),
            Self::Sheets(SheetsError::MissingSpreadsheetId) => {
                Some("Set GOOGLE_SHEET_ID to the target spreadsheet ID".to_string())
            }
            Self::Sheets(SheetsError::MissingCredentials) => Some(
                "Set GOOGLE_CREDENTIALS_JSON or GOOGLE_APPLICATION_CREDENTIALS".to_string(),
            ),
            Self::RequiredField(_)
            | Self::Database(_)
            | Self::Io(_)
            | Self::Json(_)
            | Self::Sheets(_)
            | Self::InvalidArgument(_)
            | Self::Config(_)
            | Self::Other(_) => None,
        }
    }

    /// Structured JSON representation for machine consumption.
    #[must_use]
    pub fn to_structured_json(&self) -> serde_json::Value {
        let code = self.error_code();
        let mut obj = serde_json::json!({
            "error": {
                "code": code.as_str(),
                "message": self.to_string(),
                "retryable": code.is_retryable(),
                "exit_code": code.exit_code(),
            }
        });

        if let Some(hint) = self.hint() {
            obj["error"]["hint"] = serde_json::Value::String(hint);
        }

        obj
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_by_category() {
        assert_eq!(Error::NotInitialized.exit_code(), 2);
        assert_eq!(Error::FormNotFound { id: 7 }.exit_code(), 3);
        assert_eq!(Error::InvalidEmail.exit_code(), 4);
        assert_eq!(Error::Sheets(SheetsError::MissingSpreadsheetId).exit_code(), 6);
        assert_eq!(Error::Config("x".into()).exit_code(), 7);
    }

    #[test]
    fn test_validation_errors_are_flagged() {
        assert!(Error::InvalidPhoneNumber.is_validation());
        assert!(Error::RequiredField("name").is_validation());
        assert!(!Error::FormNotFound { id: 1 }.is_validation());
    }

    #[test]
    fn test_structured_json_includes_hint() {
        let json = Error::FormNotFound { id: 42 }.to_structured_json();
        assert_eq!(json["error"]["code"], "FORM_NOT_FOUND");
        assert_eq!(json["error"]["exit_code"], 3);
        assert!(json["error"]["hint"].as_str().unwrap().contains("42"));
    }
}
