//! Connection settings and app-wide constants.
//!
//! Defaults point at the production backend and the published menu
//! spreadsheet; hosts and tests override via `AppConfig` fields or the
//! `POS_*` environment variables.

use std::path::PathBuf;
use std::time::Duration;

/// Production REST backend, including the `/api` prefix.
pub const DEFAULT_API_BASE_URL: &str = "https://Api-mini-pos.daltek.id/api";

/// Published menu spreadsheet. The `/gviz/tq?tqx=out:csv` export is served
/// with permissive CORS, unlike `/export?format=csv`.
const SHEET_ID: &str = "14y8xWyp0wfcoymTAgFdqOCcFK-ParHVrVH1oV6-cSUw";

/// Default timeout for API and spreadsheet requests (30 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Store branches a transaction can be booked under.
pub const BRANCH_OPTIONS: &[&str] = &["Pasar Segar", "Pondok Jagung"];

/// Branch preselected for a fresh session.
pub const DEFAULT_BRANCH: &str = "Pasar Segar";

const SESSION_FILE: &str = "session.json";
const APP_DIR: &str = "lele-krispy-pos";

/// Runtime configuration for the client core.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// REST backend base URL (no trailing slash).
    pub api_base_url: String,
    /// Public CSV export of the menu spreadsheet.
    pub sheet_csv_url: String,
    /// Per-request timeout applied to every outbound call.
    pub request_timeout: Duration,
    /// Where the session file lives.
    pub session_path: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            sheet_csv_url: format!(
                "https://docs.google.com/spreadsheets/d/{SHEET_ID}/gviz/tq?tqx=out:csv"
            ),
            request_timeout: DEFAULT_TIMEOUT,
            session_path: default_session_path(),
        }
    }
}

impl AppConfig {
    /// Default config with `POS_API_BASE_URL`, `POS_SHEET_CSV_URL` and
    /// `POS_SESSION_PATH` overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(url) = std::env::var("POS_API_BASE_URL") {
            if !url.trim().is_empty() {
                config.api_base_url = normalize_base_url(&url);
            }
        }
        if let Ok(url) = std::env::var("POS_SHEET_CSV_URL") {
            if !url.trim().is_empty() {
                config.sheet_csv_url = url.trim().to_string();
            }
        }
        if let Ok(path) = std::env::var("POS_SESSION_PATH") {
            if !path.trim().is_empty() {
                config.session_path = PathBuf::from(path.trim());
            }
        }
        config
    }
}

/// Strip trailing slashes so path joining stays predictable.
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    while url.ends_with('/') {
        url.pop();
    }
    url
}

fn default_session_path() -> PathBuf {
    dirs_next::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(SESSION_FILE)
}
