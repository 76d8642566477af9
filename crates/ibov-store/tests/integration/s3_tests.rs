use ibov_core::models::{ConstituentDataset, StorageKey};
use ibov_core::testutil::sample_records;
use ibov_core::traits::DatasetSink;
use ibov_store::{DatasetWriter, S3Uploader};
use tempfile::TempDir;

use crate::integration::common::{capture_date, setup_minio};

const BUCKET: &str = "ibov-raw";

#[tokio::test]
#[ignore = "requires Docker"]
async fn dataset_is_uploaded_to_s3_compatible_store() {
    let (client, _container) = setup_minio().await;
    client.create_bucket().bucket(BUCKET).send().await.unwrap();

    let dir = TempDir::new().unwrap();
    let writer = DatasetWriter::new(S3Uploader::from_client(client.clone()), dir.path(), BUCKET);
    let dataset = ConstituentDataset::new(capture_date(), sample_records(&["PETR4", "VALE3"]));
    let key = StorageKey::parquet(capture_date());

    let receipt = writer.persist(&dataset, &key).await.unwrap();

    let object = client
        .get_object()
        .bucket(BUCKET)
        .key(key.object_key())
        .send()
        .await
        .unwrap();
    let body = object.body.collect().await.unwrap().into_bytes();
    assert_eq!(body.as_ref(), std::fs::read(&receipt.local_path).unwrap().as_slice());
}

#[tokio::test]
#[ignore = "requires Docker"]
async fn missing_bucket_is_an_upload_error() {
    let (client, _container) = setup_minio().await;

    let uploader = S3Uploader::from_client(client);
    let err = ibov_core::traits::ObjectUploader::upload(
        &uploader,
        "no-such-bucket",
        "raw/x.parquet",
        b"PAR1".to_vec(),
    )
    .await
    .unwrap_err();

    assert!(matches!(err, ibov_core::AppError::UploadError(_)));
}
