use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use ibov_core::AppError;
use ibov_core::traits::ObjectUploader;

use crate::config::StorageConfig;

const PARQUET_CONTENT_TYPE: &str = "application/vnd.apache.parquet";

/// Object uploader backed by the AWS S3 SDK.
///
/// Credentials and region come from the SDK's default provider chain.
#[derive(Clone)]
pub struct S3Uploader {
    client: Client,
}

impl S3Uploader {
    /// Build a client from the environment, honouring `config.endpoint`.
    pub async fn from_config(config: &StorageConfig) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);

        if let Some(endpoint) = &config.endpoint {
            tracing::info!(%endpoint, "Using custom S3 endpoint");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Self {
            client: Client::from_conf(builder.build()),
        }
    }

    /// Wrap an existing client (useful for testing).
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }
}

impl ObjectUploader for S3Uploader {
    async fn upload(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), AppError> {
        let size = body.len();

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(PARQUET_CONTENT_TYPE)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| {
                AppError::UploadError(format!(
                    "PutObject s3://{bucket}/{key} failed: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        tracing::debug!(%bucket, %key, bytes = size, "Object uploaded");
        Ok(())
    }
}
