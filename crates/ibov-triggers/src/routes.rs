use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use ibov_core::AppError;
use ibov_core::traits::JobOrchestrator;
use ibov_core::trigger::{TriggerResponse, trigger_catalog_refresh, trigger_transform_job};

use crate::auth::require_token;
use crate::dto::{CatalogRefreshedEvent, HealthResponse, ObjectCreatedEvent, TriggerResult};
use crate::error::ApiError;
use crate::openapi::ApiDoc;
use crate::state::AppState;

/// Build the full router with all routes and middleware.
pub fn router<O: JobOrchestrator + 'static>(state: Arc<AppState<O>>) -> Router {
    let events = Router::new()
        .route("/v1/events/object-created", post(object_created::<O>))
        .route("/v1/events/catalog-refreshed", post(catalog_refreshed::<O>))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            require_token::<O>,
        ));

    let public = Router::new()
        .route("/health", get(health::<O>))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()));

    public.merge(events).with_state(state)
}

fn into_result(response: TriggerResponse) -> Result<axum::Json<TriggerResult>, ApiError> {
    if response.is_success() {
        Ok(axum::Json(TriggerResult::from(response)))
    } else {
        Err(ApiError(AppError::OrchestrationError(response.body)))
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

#[utoipa::path(
    post,
    path = "/v1/events/object-created",
    request_body = ObjectCreatedEvent,
    responses(
        (status = 200, description = "Crawler started or already running", body = TriggerResult),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
        (status = 500, description = "Crawler could not be started", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "events"
)]
pub async fn object_created<O: JobOrchestrator>(
    State(state): State<Arc<AppState<O>>>,
    axum::Json(event): axum::Json<ObjectCreatedEvent>,
) -> Result<impl IntoResponse, ApiError> {
    let keys = event.object_keys();
    tracing::info!(objects = keys.len(), ?keys, "Received object-created event");

    into_result(trigger_catalog_refresh(&state.orchestrator, &state.crawler_name).await)
}

#[utoipa::path(
    post,
    path = "/v1/events/catalog-refreshed",
    request_body = CatalogRefreshedEvent,
    responses(
        (status = 200, description = "ETL job started", body = TriggerResult),
        (status = 401, description = "Unauthorized", body = crate::dto::ErrorResponse),
        (status = 500, description = "ETL job could not be started", body = crate::dto::ErrorResponse),
    ),
    security(("bearer" = [])),
    tag = "events"
)]
pub async fn catalog_refreshed<O: JobOrchestrator>(
    State(state): State<Arc<AppState<O>>>,
    axum::Json(event): axum::Json<CatalogRefreshedEvent>,
) -> Result<impl IntoResponse, ApiError> {
    let detail = event.detail.as_ref();
    tracing::info!(
        detail_type = event.detail_type.as_deref().unwrap_or("-"),
        crawler = detail.and_then(|d| d.crawler_name.as_deref()).unwrap_or("-"),
        state = detail.and_then(|d| d.state.as_deref()).unwrap_or("-"),
        "Received catalog-refreshed event"
    );

    into_result(trigger_transform_job(&state.orchestrator, &state.job_name).await)
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
    ),
    tag = "system"
)]
pub async fn health<O: JobOrchestrator>(State(state): State<Arc<AppState<O>>>) -> impl IntoResponse {
    axum::Json(HealthResponse {
        status: "healthy",
        crawler: state.crawler_name.clone(),
        job: state.job_name.clone(),
    })
}
