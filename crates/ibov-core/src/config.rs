use std::time::Duration;

use url::Url;

use crate::error::AppError;

/// Daily IBOVESPA composition page published by B3.
pub const DEFAULT_TARGET_URL: &str =
    "https://sistemaswebb3-listados.b3.com.br/indexPage/day/IBOV?language=pt-br";

/// Wait conditions and the one UI interaction used to render the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    /// Element whose presence signals the table has been built.
    pub table_selector: String,
    /// Pagination `<select>` controlling rows per page.
    pub page_size_selector: String,
    /// Option label that puts every row on one page.
    pub page_size_label: String,
    pub navigation_timeout: Duration,
    pub table_timeout: Duration,
    pub idle_timeout: Duration,
    /// How long no request may be in flight to count as network idle.
    pub quiet_window: Duration,
    /// Fixed pause after the final idle wait, for the post-selection re-render.
    pub settle_delay: Duration,
    pub headless: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            table_selector: "table.table".to_string(),
            page_size_selector: "#selectPage".to_string(),
            page_size_label: "120".to_string(),
            navigation_timeout: Duration::from_secs(60),
            table_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(30),
            quiet_window: Duration::from_millis(500),
            settle_delay: Duration::from_secs(1),
            headless: true,
        }
    }
}

/// Check that `raw` is an absolute http(s) URL.
pub fn validate_target_url(raw: &str) -> Result<Url, AppError> {
    let parsed = Url::parse(raw.trim())
        .map_err(|e| AppError::ConfigError(format!("Invalid target URL '{raw}': {e}")))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(AppError::ConfigError(format!(
            "URL scheme '{scheme}' is not allowed (only http/https)"
        ))),
    }
}

/// Read a required environment variable.
pub fn require_env(name: &str) -> Result<String, AppError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::ConfigError(format!("{name} not set"))),
    }
}

/// Read an optional positive integer from the environment.
pub fn env_u64(name: &str, default: u64) -> Result<u64, AppError> {
    match std::env::var(name) {
        Err(_) => Ok(default),
        Ok(raw) => {
            let parsed: u64 = raw.trim().parse().map_err(|_| {
                AppError::ConfigError(format!(
                    "Invalid {name} '{raw}': must be a positive integer"
                ))
            })?;
            if parsed == 0 {
                return Err(AppError::ConfigError(format!("{name} must be at least 1")));
            }
            Ok(parsed)
        }
    }
}
