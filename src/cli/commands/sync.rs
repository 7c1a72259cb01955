//! Sheet sync command implementations.
//!
//! `push` publishes immediately and fails loudly; the post-mutation sync run
//! by `form` commands uses [`sync_after_mutation`], which only logs.

use crate::cli::SyncCommands;
use crate::config::{CredentialsSource, SheetsConfig, TabPolicy};
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use crate::sync::{GoogleSheets, Grid, SheetSyncClient, SyncOutcome, SyncTrigger, HEADER};
use colored::Colorize;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

use super::existing_db_path;

/// Build a trigger against Google Sheets from the environment.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn google_trigger(db_path: &Path) -> Result<SyncTrigger<GoogleSheets>> {
    let config = SheetsConfig::from_env();
    let backend = GoogleSheets::new(config.timeout)?;
    Ok(SyncTrigger::new(db_path, SheetSyncClient::new(backend, config)))
}

/// Run one sync attempt after a CLI mutation and wait for it.
///
/// Never fails: problems are logged and the mutation's exit code stands.
pub fn sync_after_mutation(db_path: &Path) {
    let trigger = match google_trigger(db_path) {
        Ok(trigger) => trigger,
        Err(err) => {
            tracing::error!(error = %err, "Sheet sync unavailable");
            return;
        }
    };

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(err) => {
            tracing::error!(error = %err, "Failed to start async runtime for sheet sync");
            return;
        }
    };

    match rt.block_on(trigger.sync_now()) {
        SyncOutcome::Published(report) => {
            tracing::info!(rows = report.rows, tab = %report.tab, "Sheet updated");
        }
        SyncOutcome::Disabled => tracing::debug!("Sheet sync disabled"),
        SyncOutcome::Failed(_) => {}
    }
}

/// Execute sync commands.
pub fn execute(command: &SyncCommands, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    match command {
        SyncCommands::Push { input } => push(input.as_deref(), db_path, json),
        SyncCommands::Preview { input } => preview(input.as_deref(), db_path, json),
        SyncCommands::Config => show_config(json),
    }
}

/// Build the grid from a JSON file of form objects, or from the database.
fn load_grid(input: Option<&Path>, db_path: Option<&PathBuf>) -> Result<Grid> {
    if let Some(path) = input {
        let content = std::fs::read_to_string(path)?;
        let maps = parse_form_maps(&content)?;
        return Ok(Grid::from_maps(&maps));
    }

    let db_path = existing_db_path(db_path)?;
    let storage = SqliteStorage::open(&db_path)?;
    Ok(Grid::from_forms(&storage.list_all_forms()?))
}

/// Parse a JSON array whose elements are all objects.
fn parse_form_maps(content: &str) -> Result<Vec<Map<String, Value>>> {
    let Value::Array(items) = serde_json::from_str::<Value>(content)? else {
        return Err(Error::InvalidArgument(
            "input must be a JSON array of form objects".to_string(),
        ));
    };

    items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(map),
            _ => Err(Error::InvalidArgument(format!(
                "element {i} of input is not an object"
            ))),
        })
        .collect()
}

fn push(input: Option<&Path>, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let grid = load_grid(input, db_path)?;

    let config = SheetsConfig::from_env();
    let backend = GoogleSheets::new(config.timeout)?;
    let client = SheetSyncClient::new(backend, config);

    let rt = tokio::runtime::Runtime::new()
        .map_err(|e| Error::Other(format!("Failed to create async runtime: {e}")))?;
    let report = rt.block_on(client.try_publish(&grid))?;

    if json {
        println!("{}", serde_json::to_string(&report)?);
    } else {
        println!(
            "Published {} rows to '{}' ({} cells)",
            report.rows, report.tab, report.cells
        );
        println!("  Spreadsheet: {}", report.spreadsheet_id);
        println!("  Fingerprint: {}", crate::sync::short_hash(&report.fingerprint));
    }

    Ok(())
}

fn preview(input: Option<&Path>, db_path: Option<&PathBuf>, json: bool) -> Result<()> {
    let grid = load_grid(input, db_path)?;

    if crate::is_csv() {
        print!("{}", grid.to_csv());
    } else if json {
        let output = serde_json::json!({
            "header": HEADER,
            "rows": grid.rows(),
            "row_count": grid.row_count(),
            "fingerprint": grid.fingerprint(),
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        print_grid(&grid);
    }

    Ok(())
}

fn print_grid(grid: &Grid) {
    let mut widths = HEADER.map(str::len);
    for row in grid.rows() {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count().min(40));
        }
    }

    let header: Vec<String> = HEADER
        .iter()
        .zip(widths)
        .map(|(title, width)| format!("{title:<width$}"))
        .collect();
    println!("{}", header.join("  ").bold());

    for row in grid.rows() {
        let cells: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| {
                let shown: String = cell.chars().take(width).collect();
                format!("{shown:<width$}")
            })
            .collect();
        println!("{}", cells.join("  "));
    }

    println!();
    println!("{} rows (header included)", grid.row_count());
}

fn show_config(json: bool) -> Result<()> {
    let config = SheetsConfig::from_env();

    let credentials = match &config.credentials {
        Some(CredentialsSource::Inline(_)) => "inline (GOOGLE_CREDENTIALS_JSON)".to_string(),
        Some(CredentialsSource::File(path)) => path.display().to_string(),
        None => "not set".to_string(),
    };
    let tab = match &config.tab_policy {
        TabPolicy::Fixed(tab) => format!("{tab} (fixed)"),
        TabPolicy::Discover {
            preferred: Some(tab),
            fallback,
        } => format!("{tab} if present, else {fallback}"),
        TabPolicy::Discover {
            preferred: None,
            fallback,
        } => fallback.clone(),
    };

    if json {
        let output = serde_json::json!({
            "spreadsheet_id": config.spreadsheet_id,
            "credentials": credentials,
            "tab": tab,
            "timeout_secs": config.timeout.as_secs(),
            "enabled": config.enabled,
        });
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Spreadsheet: {}", config.spreadsheet_id.as_deref().unwrap_or("not set"));
        println!("Credentials: {credentials}");
        println!("Tab:         {tab}");
        println!("Timeout:     {}s", config.timeout.as_secs());
        println!(
            "Auto sync:   {}",
            if config.enabled { "enabled".green() } else { "disabled".yellow() }
        );
    }

    Ok(())
}
