pub mod health;

use axum::{
    routing::{get, post, put},
    Router,
};

use crate::feedback::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Feedback
        .route(
            "/api/v1/feedback",
            get(handlers::handle_list_feedback).post(handlers::handle_submit_feedback),
        )
        .route(
            "/api/v1/feedback/:id",
            get(handlers::handle_get_feedback).patch(handlers::handle_patch_feedback),
        )
        .route(
            "/api/v1/feedback/:id/status",
            put(handlers::handle_update_status),
        )
        .route("/api/v1/feedback/:id/upvote", post(handlers::handle_upvote))
        .route(
            "/api/v1/feedback/:id/response",
            post(handlers::handle_add_response),
        )
        // Aggregates
        .route("/api/v1/stats", get(handlers::handle_stats))
        .route("/api/v1/summary", get(handlers::handle_summary))
        // Identity
        .route("/api/v1/users", get(handlers::handle_list_users))
        .route(
            "/api/v1/session",
            get(handlers::handle_get_session).put(handlers::handle_switch_user),
        )
        .with_state(state)
}
