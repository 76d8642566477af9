use axum::body::Body;
use axum::http::{Request, StatusCode};

use ibov_core::AppError;
use ibov_core::testutil::MockOrchestrator;

use crate::integration::common::{
    CRAWLER, CRAWLER_EVENT, JOB, S3_EVENT, TEST_TOKEN, json_body, post_json, send,
    setup_test_app,
};

#[tokio::test]
async fn health_returns_200() {
    let app = setup_test_app(MockOrchestrator::new());

    let response = send(app, Request::get("/health").body(Body::empty()).unwrap()).await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["status"], "healthy");
    assert_eq!(json["crawler"], CRAWLER);
    assert_eq!(json["job"], JOB);
}

#[tokio::test]
async fn openapi_document_is_public() {
    let app = setup_test_app(MockOrchestrator::new());

    let response = send(
        app,
        Request::get("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert!(json["paths"]["/v1/events/object-created"].is_object());
    assert!(json["paths"]["/v1/events/catalog-refreshed"].is_object());
}

#[tokio::test]
async fn missing_token_returns_401() {
    let orchestrator = MockOrchestrator::new();
    let app = setup_test_app(orchestrator.clone());

    let response = send(
        app,
        post_json("/v1/events/object-created", S3_EVENT, None),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(orchestrator.crawlers_started.lock().unwrap().is_empty());
}

#[tokio::test]
async fn wrong_token_returns_401() {
    let orchestrator = MockOrchestrator::new();
    let app = setup_test_app(orchestrator.clone());

    let response = send(
        app,
        post_json("/v1/events/catalog-refreshed", CRAWLER_EVENT, Some("wrong")),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let json = json_body(response).await;
    assert_eq!(json["error"], "unauthorized");
    assert!(orchestrator.jobs_started.lock().unwrap().is_empty());
}

#[tokio::test]
async fn object_created_starts_crawler() {
    let orchestrator = MockOrchestrator::new();
    let app = setup_test_app(orchestrator.clone());

    let response = send(
        app,
        post_json("/v1/events/object-created", S3_EVENT, Some(TEST_TOKEN)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Crawler started");
    assert!(json.get("run_id").is_none());
    assert_eq!(*orchestrator.crawlers_started.lock().unwrap(), vec![CRAWLER]);
}

#[tokio::test]
async fn object_created_tolerates_running_crawler() {
    let orchestrator =
        MockOrchestrator::with_crawler_error(AppError::AlreadyRunning(CRAWLER.to_string()));
    let app = setup_test_app(orchestrator);

    let response = send(
        app,
        post_json("/v1/events/object-created", S3_EVENT, Some(TEST_TOKEN)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "Crawler already running, request ignored");
}

#[tokio::test]
async fn object_created_reports_crawler_failure() {
    let orchestrator = MockOrchestrator::with_crawler_error(AppError::OrchestrationError(
        "AccessDeniedException".to_string(),
    ));
    let app = setup_test_app(orchestrator);

    let response = send(
        app,
        post_json("/v1/events/object-created", S3_EVENT, Some(TEST_TOKEN)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert_eq!(json["error"], "orchestration_error");
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("AccessDeniedException")
    );
}

#[tokio::test]
async fn object_created_accepts_event_without_records() {
    let orchestrator = MockOrchestrator::new();
    let app = setup_test_app(orchestrator.clone());

    let response = send(
        app,
        post_json("/v1/events/object-created", "{}", Some(TEST_TOKEN)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(orchestrator.crawlers_started.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn catalog_refreshed_starts_job_and_returns_run_id() {
    let orchestrator = MockOrchestrator::new();
    let app = setup_test_app(orchestrator.clone());

    let response = send(
        app,
        post_json("/v1/events/catalog-refreshed", CRAWLER_EVENT, Some(TEST_TOKEN)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = json_body(response).await;
    assert_eq!(json["message"], "ETL job started");
    assert_eq!(json["run_id"], "jr_mock_1");
    assert_eq!(*orchestrator.jobs_started.lock().unwrap(), vec![JOB]);
}

#[tokio::test]
async fn catalog_refreshed_reports_job_failure() {
    let orchestrator = MockOrchestrator::with_job_error(AppError::OrchestrationError(
        "ConcurrentRunsExceededException".to_string(),
    ));
    let app = setup_test_app(orchestrator);

    let response = send(
        app,
        post_json("/v1/events/catalog-refreshed", CRAWLER_EVENT, Some(TEST_TOKEN)),
    )
    .await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = json_body(response).await;
    assert!(
        json["message"]
            .as_str()
            .unwrap()
            .contains("ConcurrentRunsExceededException")
    );
}
