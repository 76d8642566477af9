use ibov_core::traits::JobOrchestrator;

/// Shared application state, available to all route handlers via
/// `State<Arc<AppState<O>>>`.
pub struct AppState<O: JobOrchestrator> {
    pub orchestrator: O,
    /// Crawler started when new raw objects land.
    pub crawler_name: String,
    /// ETL job started once the catalog is refreshed.
    pub job_name: String,
    /// Bearer token required on the event routes.
    pub token: String,
}
