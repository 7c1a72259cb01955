//! Create the forms database.
//!
//! The database lives at `~/.formsync/data/forms.db` unless `--db` /
//! `FORMSYNC_DB` points elsewhere. The schema is applied on creation.

use crate::config::resolve_db_path;
use crate::error::{Error, Result};
use crate::storage::SqliteStorage;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Serialize)]
struct InitOutput {
    database: PathBuf,
    forms: usize,
}

/// Execute the init command.
///
/// # Errors
///
/// Returns `AlreadyInitialized` if the database exists and `force` is not
/// set, or an error if the file or schema cannot be created.
pub fn execute(db_path: Option<&PathBuf>, force: bool, json: bool) -> Result<()> {
    let db_path = resolve_db_path(db_path.map(PathBuf::as_path)).ok_or_else(|| {
        Error::Config("Could not determine home directory for the database".to_string())
    })?;

    let forms = init_database(&db_path, force)?;

    if json {
        let output = InitOutput {
            database: db_path,
            forms,
        };
        println!("{}", serde_json::to_string(&output)?);
    } else {
        println!("Initialized formsync database");
        println!("  Database: {}", db_path.display());
        println!();
        println!("Next: set GOOGLE_SHEET_ID and credentials, then run 'formsync serve'.");
    }

    Ok(())
}

/// Create (or with `force`, recreate) the database and apply the schema.
///
/// Returns the number of forms in the new database.
fn init_database(db_path: &Path, force: bool) -> Result<usize> {
    if db_path.exists() {
        if !force {
            return Err(Error::AlreadyInitialized {
                path: db_path.to_path_buf(),
            });
        }
        fs::remove_file(db_path)?;
        // WAL side files belong to the old database
        for suffix in ["-wal", "-shm"] {
            let mut side = db_path.as_os_str().to_owned();
            side.push(suffix);
            let side = PathBuf::from(side);
            if side.exists() {
                fs::remove_file(side)?;
            }
        }
    }

    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let storage = SqliteStorage::open(db_path)?;
    tracing::info!(path = %db_path.display(), "Database initialized");
    storage.count_forms()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewForm;
    use tempfile::TempDir;

    #[test]
    fn test_init_creates_database_and_parents() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("nested/dir/forms.db");

        assert_eq!(init_database(&db, false).unwrap(), 0);
        assert!(db.exists());
    }

    #[test]
    fn test_init_fails_if_already_initialized() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("forms.db");

        init_database(&db, false).unwrap();
        let result = init_database(&db, false);
        assert!(matches!(result, Err(Error::AlreadyInitialized { .. })));
    }

    #[test]
    fn test_init_force_starts_fresh() {
        let temp = TempDir::new().unwrap();
        let db = temp.path().join("forms.db");
        init_database(&db, false).unwrap();

        {
            let mut storage = SqliteStorage::open(&db).unwrap();
            let form = NewForm {
                name: "A".to_string(),
                email: "a@x.com".to_string(),
                phone_number: "123456789".to_string(),
                message: None,
                company: "C".to_string(),
                service: "S".to_string(),
            };
            storage.create_form(&form, "test").unwrap();
        }

        assert_eq!(init_database(&db, true).unwrap(), 0);
    }
}
