use aws_config::BehaviorVersion;
use aws_sdk_glue::Client;
use aws_sdk_glue::error::DisplayErrorContext;

use ibov_core::AppError;
use ibov_core::traits::JobOrchestrator;

/// Job orchestrator backed by the AWS Glue SDK.
#[derive(Clone)]
pub struct GlueOrchestrator {
    client: Client,
}

impl GlueOrchestrator {
    /// Build a client from the SDK's default region and credential chain.
    pub async fn from_env() -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest()).load().await;
        Self {
            client: Client::new(&shared),
        }
    }
}

impl JobOrchestrator for GlueOrchestrator {
    async fn start_crawler(&self, name: &str) -> Result<(), AppError> {
        match self.client.start_crawler().name(name).send().await {
            Ok(_) => Ok(()),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_crawler_running_exception()) =>
            {
                Err(AppError::AlreadyRunning(name.to_string()))
            }
            Err(err) => Err(AppError::OrchestrationError(format!(
                "StartCrawler {name}: {}",
                DisplayErrorContext(&err)
            ))),
        }
    }

    async fn start_job_run(&self, name: &str) -> Result<String, AppError> {
        let output = self
            .client
            .start_job_run()
            .job_name(name)
            .send()
            .await
            .map_err(|e| {
                AppError::OrchestrationError(format!(
                    "StartJobRun {name}: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        output.job_run_id().map(str::to_string).ok_or_else(|| {
            AppError::OrchestrationError(format!("StartJobRun {name}: no JobRunId returned"))
        })
    }
}
