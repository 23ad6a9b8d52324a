use std::time::Duration;

use estrella_core::config::UploadConfig;
use estrella_core::error::CoreError;

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Origin of the admin web application (default: `http://localhost:3000`).
    pub api_url: String,
    /// Deadline for object-storage delete calls in seconds (default: `15`).
    pub delete_timeout_secs: u64,
    /// Deadline for uploads in seconds (default: none).
    pub upload_timeout_secs: Option<u64>,
    /// Upload size limits per asset class.
    pub uploads: UploadConfig,
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                     | Default                  |
    /// |-----------------------------|--------------------------|
    /// | `ESTRELLA_API_URL`          | `http://localhost:3000`  |
    /// | `DELETE_TIMEOUT_SECS`       | `15`                     |
    /// | `UPLOAD_TIMEOUT_SECS`       | unset (no deadline)      |
    /// | `NEXT_PUBLIC_MAX_UPLOAD_MB` | per asset class          |
    /// | `MAX_UPLOAD_MB`             | per asset class          |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = lookup("ESTRELLA_API_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| "http://localhost:3000".into());

        let delete_timeout_secs: u64 = match lookup("DELETE_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse().map_err(|_| {
                CoreError::Configuration(format!(
                    "DELETE_TIMEOUT_SECS must be a valid u64, got '{raw}'"
                ))
            })?,
            None => 15,
        };

        let upload_timeout_secs: Option<u64> = match lookup("UPLOAD_TIMEOUT_SECS") {
            Some(raw) => Some(raw.trim().parse().map_err(|_| {
                CoreError::Configuration(format!(
                    "UPLOAD_TIMEOUT_SECS must be a valid u64, got '{raw}'"
                ))
            })?),
            None => None,
        };

        let uploads = UploadConfig::from_lookup(&lookup)?;

        Ok(Self {
            api_url,
            delete_timeout_secs,
            upload_timeout_secs,
            uploads,
        })
    }

    pub fn delete_timeout(&self) -> Duration {
        Duration::from_secs(self.delete_timeout_secs)
    }

    pub fn upload_timeout(&self) -> Option<Duration> {
        self.upload_timeout_secs.map(Duration::from_secs)
    }
}
