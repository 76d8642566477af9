use std::future::Future;

use chrono::NaiveDate;

use crate::config::RenderOptions;
use crate::error::{AppError, ExtractFailure, RenderFailure, WriteFailure};
use crate::models::{ConstituentDataset, PersistReceipt, RenderedPage, StorageKey};

/// Loads a dynamic page, waits for it to settle, and returns its final HTML.
///
/// Implementations own the whole browser session: it is opened inside
/// `render` and closed before `render` returns, whatever the outcome.
pub trait PageRenderer: Send + Sync + Clone {
    fn render(
        &self,
        url: &str,
        options: &RenderOptions,
    ) -> impl Future<Output = Result<RenderedPage, RenderFailure>> + Send;
}

/// Parses a rendered page into the day's constituent records.
pub trait TableExtractor: Send + Sync + Clone {
    fn extract(
        &self,
        page: &RenderedPage,
        capture_date: NaiveDate,
    ) -> Result<ConstituentDataset, ExtractFailure>;
}

/// Persists a dataset at the location described by a [`StorageKey`].
pub trait DatasetSink: Send + Sync + Clone {
    fn persist(
        &self,
        dataset: &ConstituentDataset,
        key: &StorageKey,
    ) -> impl Future<Output = Result<PersistReceipt, WriteFailure>> + Send;
}

/// Writes a single object to a remote bucket.
pub trait ObjectUploader: Send + Sync + Clone {
    fn upload(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
    ) -> impl Future<Output = Result<(), AppError>> + Send;
}

/// Starts runs on the managed catalog/ETL service.
///
/// Only the "start by name" calls are exposed; run lifecycle stays with the
/// service.
pub trait JobOrchestrator: Send + Sync + Clone {
    /// Start a catalog crawler. Returns [`AppError::AlreadyRunning`] if a
    /// crawl is already in progress.
    fn start_crawler(&self, name: &str) -> impl Future<Output = Result<(), AppError>> + Send;

    /// Start an ETL job run and return its run id.
    fn start_job_run(&self, name: &str)
    -> impl Future<Output = Result<String, AppError>> + Send;
}
