use serde::{Deserialize, Serialize};

use ibov_core::trigger::TriggerResponse;

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// S3 object-created notification. Only the object keys are read; every
/// other field is ignored.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct ObjectCreatedEvent {
    #[serde(default, rename = "Records")]
    pub records: Vec<S3EventRecord>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct S3EventRecord {
    pub s3: S3Entity,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct S3Entity {
    #[serde(default)]
    pub bucket: Option<S3Bucket>,
    pub object: S3Object,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct S3Bucket {
    pub name: String,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct S3Object {
    pub key: String,
}

impl ObjectCreatedEvent {
    pub fn object_keys(&self) -> Vec<&str> {
        self.records
            .iter()
            .map(|r| r.s3.object.key.as_str())
            .collect()
    }
}

/// EventBridge "Glue Crawler State Change" event.
#[derive(Debug, Default, Deserialize, utoipa::ToSchema)]
pub struct CatalogRefreshedEvent {
    #[serde(default, rename = "detail-type")]
    pub detail_type: Option<String>,
    #[serde(default)]
    pub detail: Option<CrawlerStateDetail>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CrawlerStateDetail {
    #[serde(default)]
    pub crawler_name: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct TriggerResult {
    pub message: String,
    /// Run id of the started ETL job.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

impl From<TriggerResponse> for TriggerResult {
    fn from(response: TriggerResponse) -> Self {
        Self {
            message: response.body,
            run_id: response.run_id,
        }
    }
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    pub crawler: String,
    pub job: String,
}

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
