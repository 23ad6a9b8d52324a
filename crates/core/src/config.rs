use crate::assets::policy::{AssetClass, UploadPolicy, BYTES_PER_MB};
use crate::error::CoreError;

/// Public (browser-exposed) upload limit variable, checked first.
pub const ENV_PUBLIC_MAX_UPLOAD_MB: &str = "NEXT_PUBLIC_MAX_UPLOAD_MB";

/// Server-side upload limit variable, used when the public one is unset.
pub const ENV_MAX_UPLOAD_MB: &str = "MAX_UPLOAD_MB";

/// Upload size configuration resolved once at the application boundary.
///
/// When neither variable is set each asset class keeps its own default
/// (20 MB for images, 100 MB for documents and media).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UploadConfig {
    /// Override applied to every asset class, in megabytes.
    pub max_upload_mb: Option<f64>,
}

impl UploadConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                     | Default                  |
    /// |-----------------------------|--------------------------|
    /// | `NEXT_PUBLIC_MAX_UPLOAD_MB` | unset                    |
    /// | `MAX_UPLOAD_MB`             | unset                    |
    pub fn from_env() -> Result<Self, CoreError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CoreError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let raw = [ENV_PUBLIC_MAX_UPLOAD_MB, ENV_MAX_UPLOAD_MB]
            .into_iter()
            .find_map(|key| {
                lookup(key)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
                    .map(|v| (key, v))
            });

        let max_upload_mb = match raw {
            None => None,
            Some((key, value)) => {
                let mb: f64 = value.parse().map_err(|_| {
                    CoreError::Configuration(format!("{key} must be a number, got '{value}'"))
                })?;
                if !mb.is_finite() || mb <= 0.0 {
                    return Err(CoreError::Configuration(format!(
                        "{key} must be a positive number of megabytes, got '{value}'"
                    )));
                }
                Some(mb)
            }
        };

        Ok(Self { max_upload_mb })
    }

    /// Byte limit for `class`.
    pub fn max_bytes(&self, class: AssetClass) -> u64 {
        match self.max_upload_mb {
            Some(mb) => (mb * BYTES_PER_MB as f64) as u64,
            None => class.default_max_mb() * BYTES_PER_MB,
        }
    }

    /// Full upload policy for `class`.
    pub fn policy(&self, class: AssetClass) -> UploadPolicy {
        UploadPolicy::for_class(class, self.max_bytes(class))
    }
}
