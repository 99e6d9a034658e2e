use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Noise gate
        .route("/noise/check", post(handlers::run_noise_check))
        // Sample item to read or describe
        .route("/samples/next", get(handlers::next_sample))
        // Task screens
        .route(
            "/tasks/:task_type/sessions",
            post(handlers::create_session),
        )
        .route(
            "/sessions/:session_id",
            get(handlers::get_session).delete(handlers::dispose_session),
        )
        // Recording gestures
        .route("/sessions/:session_id/press", post(handlers::press))
        .route("/sessions/:session_id/release", post(handlers::release))
        .route("/sessions/:session_id/cancel", post(handlers::cancel))
        .route("/sessions/:session_id/reset", post(handlers::reset))
        .route(
            "/sessions/:session_id/permission",
            post(handlers::resolve_permission),
        )
        .route("/sessions/:session_id/audio", post(handlers::push_audio))
        .route("/sessions/:session_id/submit", post(handlers::submit))
        // Submitted tasks
        .route("/tasks", get(handlers::list_tasks))
        .route("/tasks/summary", get(handlers::task_summary))
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
