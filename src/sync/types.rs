//! Sync types: errors, publish reports and in-process counters.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Sheet mirror errors.
///
/// None of these ever reach an API caller; they are logged and counted.
#[derive(Debug, thiserror::Error)]
pub enum SheetsError {
    /// `GOOGLE_SHEET_ID` is not set.
    #[error("No spreadsheet configured")]
    MissingSpreadsheetId,

    /// Neither inline credentials nor a credential file are configured.
    #[error("No service-account credentials configured")]
    MissingCredentials,

    /// Credentials are present but unusable.
    #[error("Invalid service-account credentials: {0}")]
    InvalidCredentials(String),

    /// Token grant rejected or signing failed.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// The service answered with a non-success status.
    #[error("Sheets API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body, as returned.
        body: String,
    },

    /// Network failure, including timeouts.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A success response whose body could not be understood.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Reading the credential file failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetsError {
    /// Short machine-readable category, used as a log field.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MissingSpreadsheetId | Self::MissingCredentials | Self::InvalidCredentials(_) => {
                "config"
            }
            Self::Auth(_) => "auth",
            Self::Api { .. } => "service",
            Self::Transport(_) => "transport",
            Self::InvalidResponse(_) => "response",
            Self::Io(_) => "local",
        }
    }

    /// True when the external service itself rejected a request.
    #[must_use]
    pub const fn is_service_error(&self) -> bool {
        matches!(self, Self::Api { .. })
    }
}

impl From<reqwest::Error> for SheetsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Result type for sheet operations.
pub type SheetsResult<T> = std::result::Result<T, SheetsError>;

/// What a successful publish wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishReport {
    pub spreadsheet_id: String,
    pub tab: String,
    /// Rows written, header included.
    pub rows: usize,
    pub cells: usize,
    pub fingerprint: String,
}

/// Outcome of one sync attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Sync is turned off in configuration; nothing was attempted.
    Disabled,
    Published(PublishReport),
    /// The attempt failed; the message is what was logged.
    Failed(String),
}

impl SyncOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Published(_))
    }
}

#[derive(Debug, Clone)]
struct LastAttempt {
    at: DateTime<Utc>,
    ok: bool,
    fingerprint: Option<String>,
    error: Option<String>,
}

/// Counters for sync attempts made by this process.
#[derive(Debug, Default)]
pub struct SyncStats {
    attempts: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    last: Mutex<Option<LastAttempt>>,
}

impl SyncStats {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one attempt. `Disabled` is not counted.
    pub fn record(&self, outcome: &SyncOutcome) {
        let last = match outcome {
            SyncOutcome::Disabled => return,
            SyncOutcome::Published(report) => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                LastAttempt {
                    at: Utc::now(),
                    ok: true,
                    fingerprint: Some(report.fingerprint.clone()),
                    error: None,
                }
            }
            SyncOutcome::Failed(message) => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                LastAttempt {
                    at: Utc::now(),
                    ok: false,
                    fingerprint: None,
                    error: Some(message.clone()),
                }
            }
        };
        self.attempts.fetch_add(1, Ordering::Relaxed);

        // A poisoned lock only means another recorder panicked mid-write
        let mut guard = self.last.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Some(last);
    }

    #[must_use]
    pub fn snapshot(&self) -> SyncStatsSnapshot {
        let last = self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone();

        SyncStatsSnapshot {
            attempts: self.attempts.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            last_attempt_at: last.as_ref().map(|l| l.at.to_rfc3339()),
            last_ok: last.as_ref().map(|l| l.ok),
            last_fingerprint: last.as_ref().and_then(|l| l.fingerprint.clone()),
            last_error: last.and_then(|l| l.error),
        }
    }
}

/// Point-in-time copy of [`SyncStats`], as reported by `GET /health`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatsSnapshot {
    pub attempts: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub last_attempt_at: Option<String>,
    pub last_ok: Option<bool>,
    pub last_fingerprint: Option<String>,
    pub last_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> PublishReport {
        PublishReport {
            spreadsheet_id: "sheet".to_string(),
            tab: "Sheet1".to_string(),
            rows: 2,
            cells: 16,
            fingerprint: "abc".to_string(),
        }
    }

    #[test]
    fn test_stats_counting() {
        let stats = SyncStats::new();
        assert_eq!(stats.snapshot(), SyncStatsSnapshot::default());

        stats.record(&SyncOutcome::Published(report()));
        stats.record(&SyncOutcome::Failed("boom".to_string()));
        stats.record(&SyncOutcome::Disabled);

        let snap = stats.snapshot();
        assert_eq!(snap.attempts, 2);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.last_ok, Some(false));
        assert_eq!(snap.last_error.as_deref(), Some("boom"));
        assert_eq!(snap.last_fingerprint, None);
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(SheetsError::MissingSpreadsheetId.kind(), "config");
        assert_eq!(SheetsError::Auth("x".into()).kind(), "auth");
        let api = SheetsError::Api {
            status: 403,
            body: "forbidden".into(),
        };
        assert!(api.is_service_error());
        assert_eq!(api.to_string(), "Sheets API error (403): forbidden");
        assert!(!SheetsError::Transport("timeout".into()).is_service_error());
    }
}
