//! Post-mutation sync trigger.
//!
//! After every create, update or delete the request layer calls
//! [`SyncTrigger::sync_all`], which spawns a full snapshot publish and returns
//! at once. The spawned task owns only `'static` data: the database path and
//! shared handles to the client and counters. It opens its own store
//! connection and never touches the request's.
//!
//! Attempts are not coalesced. Concurrent mutations each spawn a full publish
//! and the last write wins.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::Instrument;

use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use crate::sync::export::Grid;
use crate::sync::hash::short_hash;
use crate::sync::sheets::{log_publish_error, SheetSyncClient, SheetsBackend};
use crate::sync::types::{SyncOutcome, SyncStats, SyncStatsSnapshot};

/// Object-safe view of a trigger, held by the HTTP layer.
pub trait SyncHook: Send + Sync {
    /// Start a background sync. Never blocks, never fails.
    fn sync_all(&self);

    /// Counters for attempts made so far.
    fn stats(&self) -> SyncStatsSnapshot;
}

/// Runs full-snapshot syncs against one database file.
pub struct SyncTrigger<B> {
    db_path: PathBuf,
    client: Arc<SheetSyncClient<B>>,
    stats: Arc<SyncStats>,
}

impl<B> Clone for SyncTrigger<B> {
    fn clone(&self) -> Self {
        Self {
            db_path: self.db_path.clone(),
            client: Arc::clone(&self.client),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl<B: SheetsBackend + 'static> SyncTrigger<B> {
    #[must_use]
    pub fn new(db_path: impl Into<PathBuf>, client: SheetSyncClient<B>) -> Self {
        Self {
            db_path: db_path.into(),
            client: Arc::new(client),
            stats: Arc::new(SyncStats::new()),
        }
    }

    #[must_use]
    pub fn db_path(&self) -> &Path {
        &self.db_path
    }

    #[must_use]
    pub fn client(&self) -> &SheetSyncClient<B> {
        &self.client
    }

    /// Fire-and-forget sync.
    ///
    /// Spawns onto the current tokio runtime. Outside a runtime, or with sync
    /// disabled, this is a logged no-op.
    pub fn sync_all(&self) {
        if !self.client.config().enabled {
            tracing::debug!("Sheet sync disabled, skipping");
            return;
        }

        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            tracing::warn!("No async runtime available, sheet sync skipped");
            return;
        };

        let trigger = self.clone();
        let span = tracing::info_span!("sheet_sync", attempt = %uuid::Uuid::new_v4());
        handle.spawn(
            async move {
                trigger.sync_now().await;
            }
            .instrument(span),
        );
    }

    /// Run one sync attempt to completion.
    ///
    /// Failures are logged and counted, then returned as
    /// [`SyncOutcome::Failed`]; they never propagate.
    pub async fn sync_now(&self) -> SyncOutcome {
        if !self.client.config().enabled {
            return SyncOutcome::Disabled;
        }

        let outcome = match self.read_grid().await {
            Ok(grid) => match self.client.try_publish(&grid).await {
                Ok(report) => SyncOutcome::Published(report),
                Err(err) => {
                    log_publish_error(&err, &grid.fingerprint());
                    SyncOutcome::Failed(err.to_string())
                }
            },
            Err(err) => {
                tracing::error!(kind = "local", error = %err, "Sheet sync could not read forms");
                SyncOutcome::Failed(err.to_string())
            }
        };

        if let SyncOutcome::Published(report) = &outcome {
            tracing::debug!(
                rows = report.rows,
                fingerprint = short_hash(&report.fingerprint),
                "Sync attempt finished"
            );
        }

        self.stats.record(&outcome);
        outcome
    }

    /// Snapshot the form table on a dedicated read-only connection.
    ///
    /// A missing database fails the attempt rather than publishing an empty
    /// table over the sheet.
    async fn read_grid(&self) -> Result<Grid> {
        let path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let storage = SqliteStorage::open_readonly(&path)?;
            let forms = storage.list_all_forms()?;
            Ok(Grid::from_forms(&forms))
        })
        .await
        .map_err(|e| Error::Other(format!("sync read task failed: {e}")))?
    }
}

impl<B: SheetsBackend + 'static> SyncHook for SyncTrigger<B> {
    fn sync_all(&self) {
        Self::sync_all(self);
    }

    fn stats(&self) -> SyncStatsSnapshot {
        self.stats.snapshot()
    }
}
