use ibov_core::error::{AppError, WriteStage};
use ibov_core::models::{ConstituentDataset, StorageKey};
use ibov_core::testutil::{MockUploader, sample_records};
use ibov_core::traits::DatasetSink;
use ibov_store::{DatasetWriter, read_parquet};
use tempfile::TempDir;

use crate::integration::common::capture_date;

#[tokio::test]
async fn persisted_file_reads_back_identical() {
    let dir = TempDir::new().unwrap();
    let writer = DatasetWriter::new(MockUploader::new(), dir.path(), "ibov-raw");
    let dataset = ConstituentDataset::new(
        capture_date(),
        sample_records(&["WEGE3", "PETR4", "B3SA3", "VALE3"]),
    );

    let receipt = writer
        .persist(&dataset, &StorageKey::parquet(capture_date()))
        .await
        .unwrap();

    let read = read_parquet(&receipt.local_path).unwrap();
    assert_eq!(read, dataset);
    let codes: Vec<&str> = read.records.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["WEGE3", "PETR4", "B3SA3", "VALE3"]);
}

#[tokio::test]
async fn upload_failure_leaves_local_file_and_reports_remote_stage() {
    let dir = TempDir::new().unwrap();
    let writer = DatasetWriter::new(
        MockUploader::with_error(AppError::UploadError("connection reset".into())),
        dir.path(),
        "ibov-raw",
    );
    let dataset = ConstituentDataset::new(capture_date(), sample_records(&["PETR4"]));
    let key = StorageKey::parquet(capture_date());

    let err = writer.persist(&dataset, &key).await.unwrap_err();

    assert_eq!(err.stage, WriteStage::RemoteUpload);
    assert!(err.to_string().contains("connection reset"));
    let local = key.local_path(dir.path());
    assert!(local.exists());
    assert_eq!(read_parquet(&local).unwrap(), dataset);
}

#[tokio::test]
async fn rerun_on_same_day_overwrites_local_file() {
    let dir = TempDir::new().unwrap();
    let uploader = MockUploader::new();
    let writer = DatasetWriter::new(uploader.clone(), dir.path(), "ibov-raw");
    let key = StorageKey::parquet(capture_date());

    let first = ConstituentDataset::new(capture_date(), sample_records(&["PETR4", "VALE3"]));
    let second = ConstituentDataset::new(capture_date(), sample_records(&["ITUB4"]));
    writer.persist(&first, &key).await.unwrap();
    let receipt = writer.persist(&second, &key).await.unwrap();

    assert_eq!(read_parquet(&receipt.local_path).unwrap(), second);
    let uploads = uploader.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 2);
    assert_eq!(uploads[0].key, uploads[1].key);
}
