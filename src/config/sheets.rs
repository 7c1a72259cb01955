//! Google Sheets mirror configuration.
//!
//! Everything comes from the environment:
//!
//! | Variable | Meaning |
//! |---|---|
//! | `GOOGLE_SHEET_ID` | target spreadsheet |
//! | `GOOGLE_CREDENTIALS_JSON` | inline service-account key (wins over the file) |
//! | `GOOGLE_APPLICATION_CREDENTIALS` | path to a service-account key file |
//! | `GOOGLE_SHEET_TAB` | preferred tab name |
//! | `GOOGLE_SHEET_TAB_FIXED` | skip tab discovery, always use the configured tab |
//! | `FORMSYNC_SHEETS_TIMEOUT_SECS` | per-request timeout (default 30) |
//! | `FORMSYNC_SYNC_DISABLED` | turn the post-mutation sync into a no-op |

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use super::is_truthy;

/// Tab used when nothing else is configured or discovered.
pub const DEFAULT_TAB: &str = "Sheet1";

/// Default timeout applied to every request against Google.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// How the target tab inside the spreadsheet is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TabPolicy {
    /// List the spreadsheet's tabs; use `preferred` if it exists, else `fallback`.
    Discover {
        preferred: Option<String>,
        fallback: String,
    },
    /// Always use this tab, no discovery request.
    Fixed(String),
}

impl TabPolicy {
    /// Pick a tab from the discovered tab names.
    ///
    /// For `Fixed` the discovered list is ignored.
    #[must_use]
    pub fn choose(&self, available: &[String]) -> String {
        match self {
            Self::Fixed(tab) => tab.clone(),
            Self::Discover {
                preferred,
                fallback,
            } => preferred
                .as_ref()
                .filter(|p| available.iter().any(|tab| tab == *p))
                .unwrap_or(fallback)
                .clone(),
        }
    }

    /// Whether choosing a tab needs a discovery request.
    #[must_use]
    pub const fn needs_discovery(&self) -> bool {
        matches!(self, Self::Discover { .. })
    }
}

impl Default for TabPolicy {
    fn default() -> Self {
        Self::Discover {
            preferred: None,
            fallback: DEFAULT_TAB.to_string(),
        }
    }
}

/// Where the service-account key comes from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialsSource {
    /// Inline JSON blob (deployment variant).
    Inline(String),
    /// Path to a JSON key file (standalone variant).
    File(PathBuf),
}

impl fmt::Debug for CredentialsSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inline(blob) => write!(f, "Inline(<{} bytes>)", blob.len()),
            Self::File(path) => f.debug_tuple("File").field(path).finish(),
        }
    }
}

/// Settings for the sheet mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetsConfig {
    pub spreadsheet_id: Option<String>,
    pub credentials: Option<CredentialsSource>,
    pub tab_policy: TabPolicy,
    pub timeout: Duration,
    /// When false the post-mutation sync is skipped entirely.
    pub enabled: bool,
}

impl Default for SheetsConfig {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            credentials: None,
            tab_policy: TabPolicy::default(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            enabled: true,
        }
    }
}

impl SheetsConfig {
    /// Load from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load through an arbitrary key lookup. Blank values count as unset.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let spreadsheet_id = get("GOOGLE_SHEET_ID").map(|v| v.trim().to_string());

        let credentials = get("GOOGLE_CREDENTIALS_JSON")
            .map(CredentialsSource::Inline)
            .or_else(|| {
                get("GOOGLE_APPLICATION_CREDENTIALS")
                    .map(|p| CredentialsSource::File(PathBuf::from(p.trim())))
            });

        let preferred = get("GOOGLE_SHEET_TAB").map(|v| v.trim().to_string());
        let tab_policy = if get("GOOGLE_SHEET_TAB_FIXED").is_some_and(|v| is_truthy(&v)) {
            TabPolicy::Fixed(preferred.unwrap_or_else(|| DEFAULT_TAB.to_string()))
        } else {
            TabPolicy::Discover {
                preferred,
                fallback: DEFAULT_TAB.to_string(),
            }
        };

        let timeout = get("FORMSYNC_SHEETS_TIMEOUT_SECS")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS), Duration::from_secs);

        let enabled = !get("FORMSYNC_SYNC_DISABLED").is_some_and(|v| is_truthy(&v));

        Self {
            spreadsheet_id,
            credentials,
            tab_policy,
            timeout,
            enabled,
        }
    }
}
