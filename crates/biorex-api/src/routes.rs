//! API route definitions
//!
//! Author: hephaex@gmail.com

use crate::handlers::sessions;
use crate::state::AppState;
use axum::{
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

/// Create API v1 routes
pub fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/categories", get(sessions::list_categories))
        // Session lifecycle
        .route("/sessions", post(sessions::create_session))
        .route("/sessions/:id", delete(sessions::end_session))
        // Submissions and history
        .route("/sessions/:id/submissions", post(sessions::submit))
        .route("/sessions/:id/history", get(sessions::get_history))
        .route("/sessions/:id/records/:record_id", get(sessions::get_record))
        .route("/sessions/:id/events", get(sessions::session_events))
}
