//! Start policy for the catalog-refresh and transform-job triggers.
//!
//! Both triggers make a single "start by name" call on the managed job
//! service and report an HTTP-style status/body pair. A crawler that is
//! already running counts as success: new objects landing while a crawl is in
//! progress are picked up by that crawl or the next one.

use serde::Serialize;

use crate::error::AppError;
use crate::traits::JobOrchestrator;

/// Outcome of a trigger invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TriggerResponse {
    pub status_code: u16,
    pub body: String,
    /// Run id of the started job, when the service returned one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl TriggerResponse {
    fn ok(body: impl Into<String>) -> Self {
        Self {
            status_code: 200,
            body: body.into(),
            run_id: None,
        }
    }

    fn failed(body: impl Into<String>) -> Self {
        Self {
            status_code: 500,
            body: body.into(),
            run_id: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }
}

/// Start the catalog crawler after new raw objects arrive.
pub async fn trigger_catalog_refresh<O: JobOrchestrator>(
    orchestrator: &O,
    crawler_name: &str,
) -> TriggerResponse {
    tracing::info!(crawler = %crawler_name, "Starting crawler");

    match orchestrator.start_crawler(crawler_name).await {
        Ok(()) => {
            tracing::info!(crawler = %crawler_name, "Crawler started");
            TriggerResponse::ok("Crawler started")
        }
        Err(AppError::AlreadyRunning(_)) => {
            tracing::info!(crawler = %crawler_name, "Crawler already running, request ignored");
            TriggerResponse::ok("Crawler already running, request ignored")
        }
        Err(e) => {
            tracing::error!(crawler = %crawler_name, error = %e, "Failed to start crawler");
            TriggerResponse::failed(format!("Failed to start crawler: {e}"))
        }
    }
}

/// Start the ETL job after the catalog has been refreshed.
pub async fn trigger_transform_job<O: JobOrchestrator>(
    orchestrator: &O,
    job_name: &str,
) -> TriggerResponse {
    tracing::info!(job = %job_name, "Starting ETL job");

    match orchestrator.start_job_run(job_name).await {
        Ok(run_id) => {
            tracing::info!(job = %job_name, %run_id, "ETL job started");
            TriggerResponse {
                run_id: Some(run_id),
                ..TriggerResponse::ok("ETL job started")
            }
        }
        Err(e) => {
            tracing::error!(job = %job_name, error = %e, "Failed to start ETL job");
            TriggerResponse::failed(format!("Failed to start ETL job: {e}"))
        }
    }
}
