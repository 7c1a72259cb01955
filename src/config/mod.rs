//! Configuration management.
//!
//! This module resolves the database location, the audit actor, and the
//! Google Sheets mirror settings.
//!
//! # Architecture
//!
//! - **Database**: a single SQLite file, by default `~/.formsync/data/forms.db`
//! - **Sheet mirror**: environment-provided only ([`SheetsConfig::from_env`]);
//!   no secrets are read from config files

mod sheets;

pub use sheets::{
    CredentialsSource, SheetsConfig, TabPolicy, DEFAULT_TAB, DEFAULT_TIMEOUT_SECS,
};

use std::path::{Path, PathBuf};

/// Get the global formsync directory location (`~/.formsync/`).
#[must_use]
pub fn global_formsync_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".formsync"))
}

/// Resolve the database path.
///
/// Priority:
/// 1. If `explicit_path` is provided (`--db` / `FORMSYNC_DB`), use it directly
/// 2. Global location: `~/.formsync/data/forms.db`
///
/// # Returns
///
/// Returns the path to the database file, or `None` if no home directory exists.
#[must_use]
pub fn resolve_db_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return Some(path.to_path_buf());
    }

    global_formsync_dir().map(|dir| dir.join("data").join("forms.db"))
}

/// Get the default actor name recorded in audit events for CLI mutations.
///
/// Priority:
/// 1. `FORMSYNC_ACTOR` environment variable
/// 2. `USER` / `USERNAME` environment variable, prefixed with `cli:`
/// 3. `cli`
#[must_use]
pub fn default_actor() -> String {
    if let Some(actor) = non_empty_env("FORMSYNC_ACTOR") {
        return actor;
    }

    non_empty_env("USER")
        .or_else(|| non_empty_env("USERNAME"))
        .map_or_else(|| "cli".to_string(), |user| format!("cli:{user}"))
}

/// Interpret an environment flag value.
///
/// Anything other than empty, `0`, `false`, `no` or `off` counts as set.
#[must_use]
pub fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    !value.is_empty() && !matches!(value.as_str(), "0" | "false" | "no" | "off")
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_db_path_wins() {
        let path = Path::new("/tmp/custom.db");
        assert_eq!(resolve_db_path(Some(path)), Some(path.to_path_buf()));
    }

    #[test]
    fn test_default_db_path_layout() {
        if let Some(path) = resolve_db_path(None) {
            assert!(path.ends_with(".formsync/data/forms.db"));
        }
    }

    #[test]
    fn test_is_truthy() {
        assert!(is_truthy("1"));
        assert!(is_truthy("true"));
        assert!(is_truthy("YES"));
        assert!(!is_truthy(""));
        assert!(!is_truthy("0"));
        assert!(!is_truthy("False"));
        assert!(!is_truthy("off"));
    }

    #[test]
    fn test_default_actor_not_empty() {
        assert!(!default_actor().is_empty());
    }
}
