use std::path::PathBuf;

use ibov_core::AppError;

/// Where persisted datasets go, locally and remotely.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub bucket: String,
    /// Root of the local partitioned tree.
    pub data_dir: PathBuf,
    /// Custom S3 endpoint (MinIO, LocalStack); uses path-style addressing.
    pub endpoint: Option<String>,
}

impl StorageConfig {
    pub fn new(bucket: impl Into<String>) -> Result<Self, AppError> {
        let bucket = bucket.into();
        validate_bucket(&bucket)?;
        Ok(Self {
            bucket,
            data_dir: PathBuf::from("data"),
            endpoint: None,
        })
    }

    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }
}

/// S3 bucket naming rules: 3-63 chars of lowercase letters, digits, `.` and
/// `-`, starting and ending with a letter or digit.
fn validate_bucket(bucket: &str) -> Result<(), AppError> {
    let valid_chars = bucket
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '.' || c == '-');
    let valid_edges = bucket
        .chars()
        .next()
        .zip(bucket.chars().last())
        .is_some_and(|(first, last)| first.is_ascii_alphanumeric() && last.is_ascii_alphanumeric());

    if (3..=63).contains(&bucket.len()) && valid_chars && valid_edges {
        Ok(())
    } else {
        Err(AppError::ConfigError(format!(
            "Invalid bucket name '{bucket}': expected 3-63 lowercase letters, digits, '.' or '-'"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_defaults() {
        let config = StorageConfig::new("ibov-raw-data").unwrap();
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.endpoint.is_none());
    }

    #[test]
    fn test_builders() {
        let config = StorageConfig::new("ibov-raw-data")
            .unwrap()
            .with_data_dir("/var/lib/ibov")
            .with_endpoint("http://localhost:9000");
        assert_eq!(config.data_dir, PathBuf::from("/var/lib/ibov"));
        assert_eq!(config.endpoint.as_deref(), Some("http://localhost:9000"));
    }

    #[test]
    fn test_rejects_invalid_bucket_names() {
        let too_long = "a".repeat(64);
        for bad in [
            "",
            "ab",
            "Upper-Case",
            "under_score",
            "-leading",
            "trailing.",
            too_long.as_str(),
        ] {
            assert!(StorageConfig::new(bad).is_err(), "accepted {bad:?}");
        }
        assert!(StorageConfig::new("my.bucket-01").is_ok());
    }
}
