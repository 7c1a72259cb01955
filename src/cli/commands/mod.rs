//! Command implementations.

pub mod form;
pub mod init;
pub mod serve;
pub mod sync;

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use std::path::PathBuf;

/// Resolve the database path and require that it has been initialized.
pub(crate) fn existing_db_path(db_path: Option<&PathBuf>) -> Result<PathBuf> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or(Error::NotInitialized)?;

    if !db_path.exists() {
        return Err(Error::NotInitialized);
    }
    Ok(db_path)
}
