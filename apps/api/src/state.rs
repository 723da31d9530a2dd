use std::sync::Arc;

use crate::feedback::store::FeedbackStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<FeedbackStore>,
}
