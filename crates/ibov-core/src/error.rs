use std::fmt;

use thiserror::Error;

/// Application-wide error types for the IBOV pipeline.
///
/// Stage failures of the scrape-parse-persist chain have their own closed
/// taxonomy ([`RenderFailure`], [`ExtractFailure`], [`WriteFailure`]); this
/// enum covers everything around it: configuration, storage clients, and the
/// job-orchestration API used by the triggers.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid configuration.
    #[error("Config error: {0}")]
    ConfigError(String),

    /// Local filesystem or columnar encoding failed.
    #[error("Storage error: {0}")]
    StorageError(String),

    /// Object store rejected or failed an upload.
    #[error("Upload error: {0}")]
    UploadError(String),

    /// The managed job service refused to start a run because one is in progress.
    #[error("{0} is already running")]
    AlreadyRunning(String),

    /// Any other failure reported by the managed job service.
    #[error("Orchestration error: {0}")]
    OrchestrationError(String),
}

/// Where in the rendering sequence a [`RenderFailure`] happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStage {
    /// DNS, HTTP error, or navigation timeout.
    Navigation,
    /// The data table never appeared within the wait bound.
    TableNotFound,
    /// A browser-driver error after the table was found: network-idle
    /// timeout, missing page-size option, content capture.
    Driver,
    /// Anything not recognized as a browser-driver error (launch, config).
    Unexpected,
}

impl RenderStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStage::Navigation => "navigation",
            RenderStage::TableNotFound => "table-not-found",
            RenderStage::Driver => "driver",
            RenderStage::Unexpected => "unexpected",
        }
    }
}

impl fmt::Display for RenderStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The page could not be rendered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("render failed at {stage}: {cause}")]
pub struct RenderFailure {
    pub stage: RenderStage,
    pub cause: String,
}

impl RenderFailure {
    pub fn new(stage: RenderStage, cause: impl Into<String>) -> Self {
        Self {
            stage,
            cause: cause.into(),
        }
    }
}

/// Why the extractor gave up on a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractReason {
    /// No table matches the structural classes; the page layout changed.
    TableMissing,
}

impl ExtractReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtractReason::TableMissing => "table-missing",
        }
    }
}

impl fmt::Display for ExtractReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The rendered page could not be parsed. Never retryable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("extraction failed: {reason}")]
pub struct ExtractFailure {
    pub reason: ExtractReason,
}

impl ExtractFailure {
    pub fn table_missing() -> Self {
        Self {
            reason: ExtractReason::TableMissing,
        }
    }
}

/// Which half of a persist call failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStage {
    /// Encoding or writing the local columnar file. No upload was attempted.
    LocalSerialize,
    /// Sending the local file to the object store. The local file is kept.
    RemoteUpload,
}

impl WriteStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            WriteStage::LocalSerialize => "local-serialize",
            WriteStage::RemoteUpload => "remote-upload",
        }
    }
}

impl fmt::Display for WriteStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The dataset could not be persisted.
#[derive(Error, Debug)]
#[error("write failed at {stage}: {cause}")]
pub struct WriteFailure {
    pub stage: WriteStage,
    #[source]
    pub cause: AppError,
}

impl WriteFailure {
    pub fn local(cause: AppError) -> Self {
        Self {
            stage: WriteStage::LocalSerialize,
            cause,
        }
    }

    pub fn remote(cause: AppError) -> Self {
        Self {
            stage: WriteStage::RemoteUpload,
            cause,
        }
    }
}

/// Terminal failure of a pipeline run. Each variant maps to exit status 1.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Render(#[from] RenderFailure),

    #[error(transparent)]
    Extract(#[from] ExtractFailure),

    #[error(transparent)]
    Write(#[from] WriteFailure),
}

impl PipelineError {
    /// Short label of the stage that failed, for the final status line.
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Render(_) => "render",
            PipelineError::Extract(_) => "extract",
            PipelineError::Write(_) => "write",
        }
    }

    pub fn exit_code(&self) -> u8 {
        1
    }
}
