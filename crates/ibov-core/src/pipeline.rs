use std::fmt;

use chrono::NaiveDate;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::RenderOptions;
use crate::error::PipelineError;
use crate::models::{PersistReceipt, StorageKey};
use crate::traits::{DatasetSink, PageRenderer, TableExtractor};

/// Stages a run moves through, in order. A run ends at the first failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineStage {
    Rendering,
    Extracting,
    Deciding,
    Persisting,
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PipelineStage::Rendering => "rendering",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Deciding => "deciding",
            PipelineStage::Persisting => "persisting",
        };
        f.write_str(s)
    }
}

/// How a successful run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineOutcome {
    /// Records were written locally and uploaded.
    Persisted(PersistReceipt),
    /// The page had no data rows; nothing was written.
    Empty,
}

/// Process exit status for a finished run: 0 on success or empty, 1 on failure.
pub fn exit_code(result: &Result<PipelineOutcome, PipelineError>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(err) => err.exit_code(),
    }
}

/// Events emitted by the pipeline for monitoring/logging.
#[derive(Debug, Clone)]
pub enum PipelineEvent<'a> {
    Started {
        run_id: Uuid,
        url: &'a str,
        key: &'a StorageKey,
    },
    StageEntered {
        stage: PipelineStage,
    },
    Rendered {
        bytes: usize,
    },
    Extracted {
        records: usize,
    },
    EmptyDataset {
        capture_date: NaiveDate,
    },
    Persisted {
        receipt: &'a PersistReceipt,
    },
    Failed {
        error: &'a PipelineError,
    },
}

/// Trait for receiving pipeline events (decoupled logging).
pub trait PipelineReporter: Send + Sync {
    fn report(&self, event: PipelineEvent<'_>) {
        let _ = event;
    }
}

/// Reporter that uses the `tracing` crate.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingPipelineReporter;

impl PipelineReporter for TracingPipelineReporter {
    fn report(&self, event: PipelineEvent<'_>) {
        match event {
            PipelineEvent::Started { run_id, url, key } => {
                tracing::info!(%run_id, %url, object_key = %key.object_key(), "Pipeline started");
            }
            PipelineEvent::StageEntered { stage } => {
                tracing::info!(%stage, "Entering stage");
            }
            PipelineEvent::Rendered { bytes } => {
                tracing::info!(bytes, "Page rendered");
            }
            PipelineEvent::Extracted { records } => {
                tracing::info!(records, "Table extracted");
            }
            PipelineEvent::EmptyDataset { capture_date } => {
                tracing::warn!(%capture_date, "No constituent rows found, nothing to persist");
            }
            PipelineEvent::Persisted { receipt } => {
                tracing::info!(
                    local_path = %receipt.local_path.display(),
                    bucket = %receipt.bucket,
                    object_key = %receipt.object_key,
                    bytes = receipt.bytes,
                    digest = %&receipt.digest[..receipt.digest.len().min(8)],
                    "Dataset persisted"
                );
            }
            PipelineEvent::Failed { error } => {
                tracing::error!(stage = error.stage(), %error, "Pipeline failed");
            }
        }
    }
}

/// Orchestrates one run: render → extract → decide → persist.
///
/// Generic over all external dependencies via traits, so tests can swap the
/// browser for a static HTML fixture and the object store for an in-memory
/// recorder. Each stage is attempted exactly once; a failing stage ends the
/// run and the caller turns it into a non-zero exit status. Re-running is
/// the scheduler's job.
pub struct PipelineService<R, X, S, P = TracingPipelineReporter>
where
    R: PageRenderer,
    X: TableExtractor,
    S: DatasetSink,
    P: PipelineReporter,
{
    renderer: R,
    extractor: X,
    sink: S,
    reporter: P,
    target_url: String,
    options: RenderOptions,
}

impl<R, X, S> PipelineService<R, X, S, TracingPipelineReporter>
where
    R: PageRenderer,
    X: TableExtractor,
    S: DatasetSink,
{
    pub fn new(renderer: R, extractor: X, sink: S, target_url: String) -> Self {
        Self {
            renderer,
            extractor,
            sink,
            reporter: TracingPipelineReporter,
            target_url,
            options: RenderOptions::default(),
        }
    }
}

impl<R, X, S, P> PipelineService<R, X, S, P>
where
    R: PageRenderer,
    X: TableExtractor,
    S: DatasetSink,
    P: PipelineReporter,
{
    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_reporter<P2: PipelineReporter>(self, reporter: P2) -> PipelineService<R, X, S, P2> {
        PipelineService {
            renderer: self.renderer,
            extractor: self.extractor,
            sink: self.sink,
            reporter,
            target_url: self.target_url,
            options: self.options,
        }
    }

    /// Run the pipeline for the given capture date.
    ///
    /// The storage key is computed once here and reused for both the local
    /// path and the remote object key.
    pub async fn run(&self, capture_date: NaiveDate) -> Result<PipelineOutcome, PipelineError> {
        let run_id = Uuid::new_v4();
        let key = StorageKey::parquet(capture_date);
        let span = tracing::info_span!("pipeline", %run_id);

        async {
            self.reporter.report(PipelineEvent::Started {
                run_id,
                url: &self.target_url,
                key: &key,
            });

            let result = self.execute(capture_date, &key).await;
            if let Err(error) = &result {
                self.reporter.report(PipelineEvent::Failed { error });
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        capture_date: NaiveDate,
        key: &StorageKey,
    ) -> Result<PipelineOutcome, PipelineError> {
        // 1. Render
        self.enter(PipelineStage::Rendering);
        let page = self.renderer.render(&self.target_url, &self.options).await?;
        self.reporter.report(PipelineEvent::Rendered {
            bytes: page.html.len(),
        });

        // 2. Extract
        self.enter(PipelineStage::Extracting);
        let dataset = self.extractor.extract(&page, capture_date)?;
        drop(page);
        self.reporter.report(PipelineEvent::Extracted {
            records: dataset.len(),
        });

        // 3. Decide
        self.enter(PipelineStage::Deciding);
        if dataset.is_empty() {
            self.reporter
                .report(PipelineEvent::EmptyDataset { capture_date });
            return Ok(PipelineOutcome::Empty);
        }

        // 4. Persist
        self.enter(PipelineStage::Persisting);
        let receipt = self.sink.persist(&dataset, key).await?;
        self.reporter.report(PipelineEvent::Persisted { receipt: &receipt });

        Ok(PipelineOutcome::Persisted(receipt))
    }

    fn enter(&self, stage: PipelineStage) {
        self.reporter.report(PipelineEvent::StageEntered { stage });
    }
}
