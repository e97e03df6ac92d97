use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{self, SharedState};

pub fn create_router(state: SharedState, max_upload_bytes: usize) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health_check))
        // Import pipeline
        .route(
            "/api/statement-import/parse",
            post(handlers::parse_statement_upload),
        )
        .route("/api/salary-import/parse", post(handlers::parse_salary_upload))
        // Statement format registry
        .route(
            "/api/statement-formats",
            get(handlers::list_formats).post(handlers::save_format),
        )
        .route(
            "/api/statement-formats/{bank}",
            get(handlers::get_format).delete(handlers::delete_format),
        )
        // Collaborator data for the review screens
        .route("/api/employees", get(handlers::list_employees))
        .with_state(state)
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
