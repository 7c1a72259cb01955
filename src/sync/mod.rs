//! Google Sheets mirror of the form table.
//!
//! The sheet is a best-effort, eventually-consistent copy of the store:
//!
//! - **Field access**: one accessor over typed records and loose JSON maps
//! - **Export**: forms → header-plus-rows [`Grid`], one row per form
//! - **Publish**: clear the tab, then write the whole grid from A1
//! - **Trigger**: every mutation spawns a background publish
//!
//! # Architecture
//!
//! The store is the source of truth. A sync attempt reads a full snapshot on
//! its own connection, renders it, and overwrites the sheet. Failures are
//! logged and counted, never surfaced to API callers, and never retried. The
//! next successful mutation heals the sheet.
//!
//! # Example
//!
//! ```ignore
//! use formsync::config::SheetsConfig;
//! use formsync::sync::{GoogleSheets, SheetSyncClient, SyncTrigger};
//!
//! let config = SheetsConfig::from_env();
//! let backend = GoogleSheets::new(config.timeout)?;
//! let trigger = SyncTrigger::new(db_path, SheetSyncClient::new(backend, config));
//!
//! // After a mutation
//! trigger.sync_all();
//! ```

mod credentials;
mod export;
mod field;
mod google;
mod hash;
#[cfg(test)]
pub(crate) mod memory;
mod sheets;
mod trigger;
mod types;

pub use credentials::{load_service_account, ServiceAccountKey};
pub use export::{Grid, Row, COLUMN_COUNT, HEADER};
pub use field::{field_value, format_datetime, FormField, FormSource, DATETIME_FORMAT};
pub use google::{GoogleSession, GoogleSheets, SHEETS_ENDPOINT};
pub use hash::{rows_hash, short_hash};
pub use sheets::{anchor_range, clear_range, quote_tab, SheetSyncClient, SheetsBackend, SheetsSession};
pub use trigger::{SyncHook, SyncTrigger};
pub use types::{
    PublishReport, SheetsError, SheetsResult, SyncOutcome, SyncStats, SyncStatsSnapshot,
};
