use ibov_core::AppError;
use ibov_core::config::{env_u64, require_env};

pub const DEFAULT_CRAWLER_NAME: &str = "ibovespa-crawler";
pub const DEFAULT_JOB_NAME: &str = "ibovespa-glue-job";
pub const DEFAULT_PORT: u16 = 3000;

/// Trigger service configuration.
#[derive(Debug, Clone)]
pub struct TriggerConfig {
    pub crawler_name: String,
    pub job_name: String,
    pub port: u16,
    pub token: String,
}

impl TriggerConfig {
    /// Read configuration from environment variables.
    ///
    /// - `IBOV_TRIGGERS_TOKEN` (required)
    /// - `IBOV_CRAWLER_NAME` (optional, defaults to `ibovespa-crawler`)
    /// - `IBOV_GLUE_JOB_NAME` (optional, defaults to `ibovespa-glue-job`)
    /// - `IBOV_TRIGGERS_PORT` (optional, defaults to 3000)
    pub fn from_env() -> Result<Self, AppError> {
        let token = require_env("IBOV_TRIGGERS_TOKEN")?;
        let port = env_u64("IBOV_TRIGGERS_PORT", u64::from(DEFAULT_PORT))?;
        let port = u16::try_from(port).map_err(|_| {
            AppError::ConfigError(format!("Invalid IBOV_TRIGGERS_PORT '{port}': out of range"))
        })?;

        Ok(Self {
            crawler_name: env_or("IBOV_CRAWLER_NAME", DEFAULT_CRAWLER_NAME),
            job_name: env_or("IBOV_GLUE_JOB_NAME", DEFAULT_JOB_NAME),
            port,
            token,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}
