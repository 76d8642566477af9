use ibov_client::HtmlTableExtractor;
use ibov_core::error::{PipelineError, RenderFailure, RenderStage};
use ibov_core::pipeline::{PipelineOutcome, PipelineService, exit_code};
use ibov_core::testutil::{MockRenderer, MockUploader};
use ibov_store::{DatasetWriter, read_parquet};
use tempfile::TempDir;

use crate::integration::common::{IBOV_DAY_HTML, capture_date, header_only_html};

const TARGET: &str = "https://sistemaswebb3-listados.b3.com.br/indexPage/day/IBOV?language=pt-br";

fn pipeline(
    renderer: MockRenderer,
    uploader: MockUploader,
    dir: &TempDir,
) -> PipelineService<MockRenderer, HtmlTableExtractor, DatasetWriter<MockUploader>> {
    PipelineService::new(
        renderer,
        HtmlTableExtractor::new(),
        DatasetWriter::new(uploader, dir.path(), "ibov-raw"),
        TARGET.to_string(),
    )
}

fn count_files(dir: &std::path::Path) -> usize {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return 0;
    };
    entries
        .flatten()
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() { count_files(&path) } else { 1 }
        })
        .sum()
}

#[tokio::test]
async fn five_constituents_are_written_and_uploaded() {
    let dir = TempDir::new().unwrap();
    let uploader = MockUploader::new();
    let svc = pipeline(MockRenderer::new(IBOV_DAY_HTML), uploader.clone(), &dir);

    let result = svc.run(capture_date()).await;
    assert_eq!(exit_code(&result), 0);

    let receipt = match result.unwrap() {
        PipelineOutcome::Persisted(receipt) => receipt,
        PipelineOutcome::Empty => panic!("expected a persisted dataset"),
    };
    assert_eq!(receipt.object_key, "raw/date=2025-07-18/ibov_20250718.parquet");
    assert_eq!(
        receipt.local_path,
        dir.path().join("raw/date=2025-07-18/ibov_20250718.parquet")
    );
    assert_eq!(count_files(dir.path()), 1);

    let dataset = read_parquet(&receipt.local_path).unwrap();
    let codes: Vec<&str> = dataset.records.iter().map(|r| r.code.as_str()).collect();
    assert_eq!(codes, ["PETR4", "VALE3", "ITUB4", "BBDC4", "ABEV3"]);
    assert_eq!(dataset.records[0].name, "PETROBRAS");
    assert_eq!(dataset.records[1].participation_percent, "10,832");
    assert_eq!(dataset.records[4].name, "AMBEV S/A");

    let uploads = uploader.uploads.lock().unwrap();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].bucket, "ibov-raw");
    assert_eq!(uploads[0].key, "raw/date=2025-07-18/ibov_20250718.parquet");
}

#[tokio::test]
async fn zero_data_rows_exit_zero_without_writing() {
    let dir = TempDir::new().unwrap();
    let uploader = MockUploader::new();
    let svc = pipeline(MockRenderer::new(&header_only_html()), uploader.clone(), &dir);

    let result = svc.run(capture_date()).await;

    assert_eq!(exit_code(&result), 0);
    assert_eq!(result.unwrap(), PipelineOutcome::Empty);
    assert_eq!(count_files(dir.path()), 0);
    assert!(uploader.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn table_wait_timeout_exits_one_without_writing() {
    let dir = TempDir::new().unwrap();
    let uploader = MockUploader::new();
    let svc = pipeline(
        MockRenderer::with_error(RenderFailure::new(
            RenderStage::TableNotFound,
            "'table.table' not present after 30s",
        )),
        uploader.clone(),
        &dir,
    );

    let result = svc.run(capture_date()).await;

    assert_eq!(exit_code(&result), 1);
    assert!(matches!(
        result.unwrap_err(),
        PipelineError::Render(RenderFailure {
            stage: RenderStage::TableNotFound,
            ..
        })
    ));
    assert_eq!(count_files(dir.path()), 0);
    assert!(uploader.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn changed_page_layout_exits_one() {
    let dir = TempDir::new().unwrap();
    let uploader = MockUploader::new();
    let redesigned = IBOV_DAY_HTML.replace("table-responsive-md", "data-grid");
    let svc = pipeline(MockRenderer::new(&redesigned), uploader.clone(), &dir);

    let result = svc.run(capture_date()).await;

    assert_eq!(exit_code(&result), 1);
    assert!(matches!(result.unwrap_err(), PipelineError::Extract(_)));
    assert_eq!(count_files(dir.path()), 0);
}
