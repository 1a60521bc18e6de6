mod handlers;

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::db::Database;
use crate::extract::Extractor;
use crate::scoring::UrgencyScorer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub extractor: Extractor,
    pub scorer: Arc<UrgencyScorer>,
}

impl AppState {
    pub fn new(db: Database, extractor: Extractor) -> Self {
        let scorer = UrgencyScorer::from_rules(extractor.normalizer().rules());
        Self {
            db,
            extractor,
            scorer: Arc::new(scorer),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Tasks
        .route("/tasks", get(handlers::list_tasks).post(handlers::create_task))
        .route("/tasks/ranked", get(handlers::ranked_tasks))
        .route(
            "/tasks/{id}",
            get(handlers::get_task).put(handlers::update_task),
        )
        .route("/tasks/{id}/delegate", post(handlers::delegate_task))
        .route("/tasks/{id}/archive", post(handlers::archive_task))
        // Extraction
        .route("/extract", post(handlers::extract))
        // Reporting
        .route("/stats", get(handlers::get_stats))
        .route("/dashboard", get(handlers::dashboard))
        // Health
        .route("/health", get(handlers::health));

    Router::new()
        .nest("/api/v1", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
