pub mod config;
pub mod error;
pub mod models;
pub mod pipeline;
pub mod traits;
pub mod trigger;

#[cfg(any(test, feature = "testutil"))]
pub mod testutil;

pub use config::{DEFAULT_TARGET_URL, RenderOptions};
pub use error::{
    AppError, ExtractFailure, ExtractReason, PipelineError, RenderFailure, RenderStage,
    WriteFailure, WriteStage,
};
pub use models::{
    ConstituentDataset, ConstituentRecord, PersistReceipt, RenderedPage, StorageKey, compute_hash,
};
pub use pipeline::{PipelineOutcome, PipelineService, exit_code};
pub use traits::{DatasetSink, JobOrchestrator, ObjectUploader, PageRenderer, TableExtractor};
pub use trigger::{TriggerResponse, trigger_catalog_refresh, trigger_transform_job};
