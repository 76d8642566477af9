use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use http_body_util::BodyExt;
use tower::ServiceExt;

use ibov_core::testutil::MockOrchestrator;
use ibov_triggers::routes;
use ibov_triggers::state::AppState;

pub const TEST_TOKEN: &str = "test-trigger-token";
pub const CRAWLER: &str = "ibovespa-crawler";
pub const JOB: &str = "ibovespa-glue-job";

pub const S3_EVENT: &str = r#"{
  "Records": [{
    "eventSource": "aws:s3",
    "eventName": "ObjectCreated:Put",
    "s3": {
      "bucket": {"name": "ibov-raw"},
      "object": {"key": "raw/date=2025-07-18/ibov_20250718.parquet", "size": 4096}
    }
  }]
}"#;

pub const CRAWLER_EVENT: &str = r#"{
  "source": "aws.glue",
  "detail-type": "Glue Crawler State Change",
  "detail": {"crawlerName": "ibovespa-crawler", "state": "Succeeded"}
}"#;

/// Router wired to `orchestrator`, protected by [`TEST_TOKEN`].
pub fn setup_test_app(orchestrator: MockOrchestrator) -> Router {
    let state = Arc::new(AppState {
        orchestrator,
        crawler_name: CRAWLER.to_string(),
        job_name: JOB.to_string(),
        token: TEST_TOKEN.to_string(),
    });
    routes::router(state)
}

pub fn post_json(path: &str, body: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(path).header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn send(app: Router, request: Request<Body>) -> Response<Body> {
    app.oneshot(request).await.unwrap()
}

pub async fn json_body(response: Response<Body>) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}
