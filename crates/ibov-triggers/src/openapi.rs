use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "IBOV Triggers API",
        version = "0.1.0",
        description = "Starts the Glue crawler and ETL job as raw IBOVESPA data lands."
    ),
    paths(
        crate::routes::object_created,
        crate::routes::catalog_refreshed,
        crate::routes::health,
    ),
    components(schemas(
        crate::dto::ObjectCreatedEvent,
        crate::dto::S3EventRecord,
        crate::dto::S3Entity,
        crate::dto::S3Bucket,
        crate::dto::S3Object,
        crate::dto::CatalogRefreshedEvent,
        crate::dto::CrawlerStateDetail,
        crate::dto::TriggerResult,
        crate::dto::HealthResponse,
        crate::dto::ErrorResponse,
    )),
    tags(
        (name = "events", description = "Pipeline event triggers"),
        (name = "system", description = "Health and system status"),
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

/// Adds the Bearer token security scheme to the OpenAPI document.
struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                utoipa::openapi::security::SecurityScheme::Http(
                    utoipa::openapi::security::HttpBuilder::new()
                        .scheme(utoipa::openapi::security::HttpAuthScheme::Bearer)
                        .bearer_format("token")
                        .description(Some(
                            "Trigger token. Set via IBOV_TRIGGERS_TOKEN environment variable.",
                        ))
                        .build(),
                ),
            );
        }
    }
}
