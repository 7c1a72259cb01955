//! Sheet sync client: pushes a [`Grid`] snapshot into a spreadsheet tab.
//!
//! A publish is clear-then-write:
//! 1. Resolve spreadsheet id and credentials from configuration
//! 2. Authenticate against the backend
//! 3. Pick the tab (discovered or fixed, see [`TabPolicy`])
//! 4. Clear columns A through H of that tab
//! 5. Write header and rows starting at A1
//!
//! There are no retries. Between steps 4 and 5 the tab is observably empty.
//! Steps 4 and 5 of concurrent publishes through one client never interleave,
//! so the tab always ends up holding one whole snapshot.
//!
//! [`TabPolicy`]: crate::config::TabPolicy

use std::future::Future;

use tokio::sync::Mutex;

use crate::config::SheetsConfig;
use crate::sync::credentials::{load_service_account, ServiceAccountKey};
use crate::sync::export::Grid;
use crate::sync::hash::short_hash;
use crate::sync::types::{PublishReport, SheetsError, SheetsResult};

/// A tabular store that can hand out authenticated sessions.
///
/// Implemented by [`GoogleSheets`](crate::sync::GoogleSheets) and by
/// in-memory doubles in tests.
pub trait SheetsBackend: Send + Sync {
    type Session: SheetsSession;

    /// Exchange service-account credentials for a session.
    fn authenticate(
        &self,
        key: &ServiceAccountKey,
    ) -> impl Future<Output = SheetsResult<Self::Session>> + Send;
}

/// An authenticated handle on the tabular store.
pub trait SheetsSession: Send + Sync {
    /// Titles of all tabs in the spreadsheet.
    fn list_tabs(&self, spreadsheet_id: &str)
    -> impl Future<Output = SheetsResult<Vec<String>>> + Send;

    /// Clear all values in an A1 range.
    fn clear_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> impl Future<Output = SheetsResult<()>> + Send;

    /// Write rows of values anchored at an A1 range.
    ///
    /// With `interpret_types` the service parses values as if typed by a
    /// user (numbers, dates); otherwise they are stored as raw strings.
    fn write_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<String>],
        interpret_types: bool,
    ) -> impl Future<Output = SheetsResult<()>> + Send;
}

/// Quote a tab name for A1 notation.
#[must_use]
pub fn quote_tab(tab: &str) -> String {
    format!("'{}'", tab.replace('\'', "''"))
}

/// Range cleared before each write: every exported column.
#[must_use]
pub fn clear_range(tab: &str) -> String {
    format!("{}!A:H", quote_tab(tab))
}

/// Anchor for the snapshot write.
#[must_use]
pub fn anchor_range(tab: &str) -> String {
    format!("{}!A1", quote_tab(tab))
}

/// Publishes grids to the configured spreadsheet through a backend.
pub struct SheetSyncClient<B> {
    backend: B,
    config: SheetsConfig,
    /// Held from clear through write.
    publishing: Mutex<()>,
}

impl<B: SheetsBackend> SheetSyncClient<B> {
    #[must_use]
    pub fn new(backend: B, config: SheetsConfig) -> Self {
        Self {
            backend,
            config,
            publishing: Mutex::new(()),
        }
    }

    #[must_use]
    pub const fn config(&self) -> &SheetsConfig {
        &self.config
    }

    /// Publish a grid, reporting only success or failure.
    ///
    /// Every failure is logged here and turned into `false`.
    pub async fn publish(&self, grid: &Grid) -> bool {
        match self.try_publish(grid).await {
            Ok(_) => true,
            Err(err) => {
                log_publish_error(&err, &grid.fingerprint());
                false
            }
        }
    }

    /// Publish a grid and return what was written.
    ///
    /// # Errors
    ///
    /// Returns the first failing step. A missing spreadsheet id fails before
    /// any backend call; a failed clear means the write is never attempted.
    pub async fn try_publish(&self, grid: &Grid) -> SheetsResult<PublishReport> {
        let spreadsheet_id = self
            .config
            .spreadsheet_id
            .as_deref()
            .ok_or(SheetsError::MissingSpreadsheetId)?;
        let source = self
            .config
            .credentials
            .as_ref()
            .ok_or(SheetsError::MissingCredentials)?;
        let key = load_service_account(source)?;

        let session = self.backend.authenticate(&key).await?;

        let policy = &self.config.tab_policy;
        let tab = if policy.needs_discovery() {
            let tabs = session.list_tabs(spreadsheet_id).await?;
            policy.choose(&tabs)
        } else {
            policy.choose(&[])
        };

        let fingerprint = grid.fingerprint();
        tracing::debug!(
            spreadsheet = spreadsheet_id,
            tab = %tab,
            rows = grid.row_count(),
            fingerprint = short_hash(&fingerprint),
            "Publishing snapshot"
        );

        // A shorter snapshot written over a longer one's rows would leave both
        // on the tab; the write overlays and never truncates.
        {
            let _publishing = self.publishing.lock().await;
            session
                .clear_range(spreadsheet_id, &clear_range(&tab))
                .await?;
            session
                .write_range(spreadsheet_id, &anchor_range(&tab), &grid.values(), true)
                .await?;
        }

        tracing::info!(
            tab = %tab,
            rows = grid.row_count(),
            fingerprint = short_hash(&fingerprint),
            "Sheet sync complete"
        );

        Ok(PublishReport {
            spreadsheet_id: spreadsheet_id.to_string(),
            tab,
            rows: grid.row_count(),
            cells: grid.cell_count(),
            fingerprint,
        })
    }
}

/// Log a failed publish, separating service rejections from everything else.
pub(crate) fn log_publish_error(err: &SheetsError, fingerprint: &str) {
    let fingerprint = short_hash(fingerprint);
    if err.is_service_error() {
        tracing::error!(kind = err.kind(), error = %err, fingerprint, "Sheets API rejected sync");
    } else if matches!(
        err,
        SheetsError::MissingSpreadsheetId | SheetsError::MissingCredentials
    ) {
        tracing::warn!(kind = err.kind(), fingerprint, "Sheet sync skipped: {err}");
    } else {
        tracing::error!(kind = err.kind(), error = %err, fingerprint, "Sheet sync failed");
    }
}
