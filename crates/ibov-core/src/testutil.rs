//! Test utilities: mock implementations of all core traits.
//!
//! Handwritten mocks for dependency injection in unit tests.
//! All mocks use `Arc<Mutex<_>>` for interior mutability, allowing
//! test assertions on recorded calls. Enabled for other crates through the
//! `testutil` feature.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

use crate::config::RenderOptions;
use crate::error::{AppError, ExtractFailure, RenderFailure, WriteFailure};
use crate::models::{
    ConstituentDataset, ConstituentRecord, PersistReceipt, RenderedPage, StorageKey,
};
use crate::traits::{DatasetSink, JobOrchestrator, ObjectUploader, PageRenderer, TableExtractor};

/// Build one record per code with plausible values.
pub fn sample_records(codes: &[&str]) -> Vec<ConstituentRecord> {
    codes
        .iter()
        .enumerate()
        .map(|(i, code)| ConstituentRecord {
            code: code.to_string(),
            name: format!("COMPANY {code}"),
            asset_type: "ON NM".to_string(),
            theoretical_quantity: format!("{}.000.000", i + 1),
            participation_percent: format!("{},000", i + 1),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// MockRenderer
// ---------------------------------------------------------------------------

/// Mock renderer that returns a configurable page.
#[derive(Clone)]
pub struct MockRenderer {
    /// Queue of responses. Each call pops the first element.
    /// If empty, returns an empty HTML document.
    responses: Arc<Mutex<Vec<Result<String, RenderFailure>>>>,
    pub calls: Arc<Mutex<usize>>,
    pub requests: Arc<Mutex<Vec<(String, RenderOptions)>>>,
}

impl MockRenderer {
    pub fn new(html: &str) -> Self {
        Self::with_responses(vec![Ok(html.to_string())])
    }

    pub fn with_error(failure: RenderFailure) -> Self {
        Self::with_responses(vec![Err(failure)])
    }

    pub fn with_responses(responses: Vec<Result<String, RenderFailure>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            calls: Arc::new(Mutex::new(0)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl PageRenderer for MockRenderer {
    async fn render(
        &self,
        url: &str,
        options: &RenderOptions,
    ) -> Result<RenderedPage, RenderFailure> {
        *self.calls.lock().unwrap() += 1;
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), options.clone()));

        let mut responses = self.responses.lock().unwrap();
        let html = if responses.is_empty() {
            Ok("<html><body></body></html>".to_string())
        } else {
            responses.remove(0)
        }?;
        Ok(RenderedPage::new(url, html))
    }
}

// ---------------------------------------------------------------------------
// MockExtractor
// ---------------------------------------------------------------------------

/// Mock extractor that returns fixed records regardless of the page.
#[derive(Clone)]
pub struct MockExtractor {
    result: Arc<Mutex<Result<Vec<ConstituentRecord>, ExtractFailure>>>,
    pub calls: Arc<Mutex<usize>>,
}

impl MockExtractor {
    pub fn new(records: Vec<ConstituentRecord>) -> Self {
        Self {
            result: Arc::new(Mutex::new(Ok(records))),
            calls: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_error(failure: ExtractFailure) -> Self {
        Self {
            result: Arc::new(Mutex::new(Err(failure))),
            calls: Arc::new(Mutex::new(0)),
        }
    }
}

impl TableExtractor for MockExtractor {
    fn extract(
        &self,
        _page: &RenderedPage,
        capture_date: NaiveDate,
    ) -> Result<ConstituentDataset, ExtractFailure> {
        *self.calls.lock().unwrap() += 1;
        let records = self.result.lock().unwrap().clone()?;
        Ok(ConstituentDataset::new(capture_date, records))
    }
}

// ---------------------------------------------------------------------------
// MockSink
// ---------------------------------------------------------------------------

/// Mock sink that records persisted datasets and keys.
#[derive(Clone)]
pub struct MockSink {
    pub persisted: Arc<Mutex<Vec<(ConstituentDataset, StorageKey)>>>,
    pub calls: Arc<Mutex<usize>>,
    error: Arc<Mutex<Option<WriteFailure>>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self {
            persisted: Arc::new(Mutex::new(Vec::new())),
            calls: Arc::new(Mutex::new(0)),
            error: Arc::new(Mutex::new(None)),
        }
    }

    /// Sink whose first persist call fails.
    pub fn with_error(failure: WriteFailure) -> Self {
        let sink = Self::new();
        *sink.error.lock().unwrap() = Some(failure);
        sink
    }
}

impl Default for MockSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DatasetSink for MockSink {
    async fn persist(
        &self,
        dataset: &ConstituentDataset,
        key: &StorageKey,
    ) -> Result<PersistReceipt, WriteFailure> {
        *self.calls.lock().unwrap() += 1;
        if let Some(failure) = self.error.lock().unwrap().take() {
            return Err(failure);
        }

        self.persisted
            .lock()
            .unwrap()
            .push((dataset.clone(), key.clone()));

        Ok(PersistReceipt {
            local_path: PathBuf::from("data").join(key.object_key()),
            bucket: "mock-bucket".to_string(),
            object_key: key.object_key(),
            bytes: 0,
            digest: String::new(),
        })
    }
}

// ---------------------------------------------------------------------------
// MockUploader
// ---------------------------------------------------------------------------

/// A recorded upload: bucket, key, and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedUpload {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
}

/// Mock uploader that keeps uploaded objects in memory.
#[derive(Clone)]
pub struct MockUploader {
    pub uploads: Arc<Mutex<Vec<RecordedUpload>>>,
    error: Arc<Mutex<Option<AppError>>>,
}

impl MockUploader {
    pub fn new() -> Self {
        Self {
            uploads: Arc::new(Mutex::new(Vec::new())),
            error: Arc::new(Mutex::new(None)),
        }
    }

    /// Uploader whose first upload fails.
    pub fn with_error(error: AppError) -> Self {
        let uploader = Self::new();
        *uploader.error.lock().unwrap() = Some(error);
        uploader
    }
}

impl Default for MockUploader {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectUploader for MockUploader {
    async fn upload(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<(), AppError> {
        if let Some(e) = self.error.lock().unwrap().take() {
            return Err(e);
        }
        self.uploads.lock().unwrap().push(RecordedUpload {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body,
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// MockOrchestrator
// ---------------------------------------------------------------------------

/// Mock job service that records start calls.
#[derive(Clone)]
pub struct MockOrchestrator {
    pub crawlers_started: Arc<Mutex<Vec<String>>>,
    pub jobs_started: Arc<Mutex<Vec<String>>>,
    crawler_error: Arc<Mutex<Option<AppError>>>,
    job_error: Arc<Mutex<Option<AppError>>>,
}

impl MockOrchestrator {
    pub fn new() -> Self {
        Self {
            crawlers_started: Arc::new(Mutex::new(Vec::new())),
            jobs_started: Arc::new(Mutex::new(Vec::new())),
            crawler_error: Arc::new(Mutex::new(None)),
            job_error: Arc::new(Mutex::new(None)),
        }
    }

    pub fn with_crawler_error(error: AppError) -> Self {
        let orchestrator = Self::new();
        *orchestrator.crawler_error.lock().unwrap() = Some(error);
        orchestrator
    }

    pub fn with_job_error(error: AppError) -> Self {
        let orchestrator = Self::new();
        *orchestrator.job_error.lock().unwrap() = Some(error);
        orchestrator
    }
}

impl Default for MockOrchestrator {
    fn default() -> Self {
        Self::new()
    }
}

impl JobOrchestrator for MockOrchestrator {
    async fn start_crawler(&self, name: &str) -> Result<(), AppError> {
        if let Some(e) = self.crawler_error.lock().unwrap().take() {
            return Err(e);
        }
        self.crawlers_started.lock().unwrap().push(name.to_string());
        Ok(())
    }

    async fn start_job_run(&self, name: &str) -> Result<String, AppError> {
        if let Some(e) = self.job_error.lock().unwrap().take() {
            return Err(e);
        }
        let mut started = self.jobs_started.lock().unwrap();
        started.push(name.to_string());
        Ok(format!("jr_mock_{}", started.len()))
    }
}
