use std::path::{Path, PathBuf};

use ibov_core::error::{AppError, WriteFailure};
use ibov_core::models::{ConstituentDataset, PersistReceipt, StorageKey, compute_hash};
use ibov_core::traits::{DatasetSink, ObjectUploader};

use crate::config::StorageConfig;
use crate::parquet::write_parquet;

/// Writes a dataset to a local Parquet file, then uploads that file.
///
/// The local file is never removed: after a failed upload it stays on disk
/// for inspection, and after a successful one it doubles as a local copy.
#[derive(Clone)]
pub struct DatasetWriter<U: ObjectUploader> {
    uploader: U,
    data_dir: PathBuf,
    bucket: String,
}

impl<U: ObjectUploader> DatasetWriter<U> {
    pub fn new(uploader: U, data_dir: impl Into<PathBuf>, bucket: impl Into<String>) -> Self {
        Self {
            uploader,
            data_dir: data_dir.into(),
            bucket: bucket.into(),
        }
    }

    pub fn from_config(uploader: U, config: &StorageConfig) -> Self {
        Self::new(uploader, config.data_dir.clone(), config.bucket.clone())
    }

    /// Serialize `dataset` to `local_path`, then upload the file to
    /// `bucket`/`remote_key`.
    ///
    /// A serialization failure returns before any upload is attempted.
    pub async fn write_and_upload(
        &self,
        dataset: &ConstituentDataset,
        local_path: &Path,
        bucket: &str,
        remote_key: &str,
    ) -> Result<PersistReceipt, WriteFailure> {
        // 1. Local serialization
        let size = {
            let dataset = dataset.clone();
            let path = local_path.to_path_buf();
            tokio::task::spawn_blocking(move || write_parquet(&dataset, &path))
                .await
                .map_err(|e| {
                    WriteFailure::local(AppError::StorageError(format!(
                        "Serializer task failed: {e}"
                    )))
                })?
                .map_err(WriteFailure::local)?
        };
        tracing::info!(
            path = %local_path.display(),
            records = dataset.len(),
            bytes = size,
            "Raw data saved locally"
        );

        // 2. Remote upload
        let body = tokio::fs::read(local_path).await.map_err(|e| {
            WriteFailure::remote(AppError::StorageError(format!(
                "Failed to read {} for upload: {e}",
                local_path.display()
            )))
        })?;
        let digest = compute_hash(&body);

        if let Err(e) = self.uploader.upload(bucket, remote_key, body).await {
            tracing::error!(
                path = %local_path.display(),
                "Upload failed, local file kept for inspection"
            );
            return Err(WriteFailure::remote(e));
        }
        tracing::info!(%bucket, key = %remote_key, "Raw data uploaded");

        Ok(PersistReceipt {
            local_path: local_path.to_path_buf(),
            bucket: bucket.to_string(),
            object_key: remote_key.to_string(),
            bytes: size,
            digest,
        })
    }
}

impl<U: ObjectUploader> DatasetSink for DatasetWriter<U> {
    async fn persist(
        &self,
        dataset: &ConstituentDataset,
        key: &StorageKey,
    ) -> Result<PersistReceipt, WriteFailure> {
        let local_path = key.local_path(&self.data_dir);
        self.write_and_upload(dataset, &local_path, &self.bucket, &key.object_key())
            .await
    }
}
