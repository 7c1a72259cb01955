//! Run the HTTP API.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::server::{self, AppState};
use crate::storage::SqliteStorage;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use super::sync::google_trigger;

/// Execute the serve command.
///
/// The database is created on first start if it doesn't exist yet, so a
/// fresh container can serve without a separate `init` step.
///
/// # Errors
///
/// Returns an error if the address is invalid, the database cannot be
/// opened, or the server fails to bind.
pub fn execute(db_path: Option<&PathBuf>, host: &str, port: u16) -> Result<()> {
    let ip: IpAddr = host
        .parse()
        .map_err(|e| Error::InvalidArgument(format!("invalid host '{host}': {e}")))?;
    let addr = SocketAddr::new(ip, port);

    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or_else(|| {
        Error::Config("Could not determine home directory for the database".to_string())
    })?;
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let forms = SqliteStorage::open(&db_path)?.count_forms()?;

    let trigger = google_trigger(&db_path)?;
    let sheet = trigger.client().config();
    if sheet.spreadsheet_id.is_none() && sheet.enabled {
        tracing::warn!("GOOGLE_SHEET_ID is not set; sheet sync will fail until it is");
    }
    tracing::info!(
        db = %db_path.display(),
        forms,
        sync_enabled = sheet.enabled,
        "Starting formsync API"
    );

    let state = AppState::new(db_path, Arc::new(trigger));

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    rt.block_on(server::serve(addr, state))
}
