//! BioREx API - HTTP server for relation extraction sessions
//!
//! Each client opens a session, submits passages with an optional entity
//! category selection and polls (or streams) the rendered history.
//!
//! Author: hephaex@gmail.com

pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

use axum::{http::HeaderValue, routing::get, Router};
use biorex_core::config::AppConfig;
use biorex_core::ExtractionGateway;
use biorex_extractor::DemoGateway;
use state::AppState;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// OpenAPI document for the session endpoints
#[derive(OpenApi)]
#[openapi(
    info(
        title = "BioREx API",
        description = "Biomedical relation extraction sessions"
    ),
    paths(
        handlers::health::health_check,
        handlers::health::readiness_check,
        handlers::health::metrics,
        handlers::sessions::list_categories,
        handlers::sessions::create_session,
        handlers::sessions::end_session,
        handlers::sessions::submit,
        handlers::sessions::get_history,
        handlers::sessions::get_record,
        handlers::sessions::session_events,
    ),
    components(schemas(
        error::ApiError,
        handlers::health::HealthResponse,
        handlers::health::ReadinessResponse,
        handlers::health::MetricsResponse,
        handlers::sessions::CategoriesResponse,
        handlers::sessions::CreateSessionResponse,
        handlers::sessions::SubmitRequest,
        handlers::sessions::SubmitResponse,
        handlers::sessions::HistoryResponse,
        handlers::sessions::HistoryEntry,
        handlers::sessions::RelationRowDto,
        handlers::sessions::RecordResponse,
        handlers::sessions::TripleDto,
    )),
    tags(
        (name = "health", description = "Liveness and readiness probes"),
        (name = "sessions", description = "Submission history and extraction")
    )
)]
pub struct ApiDoc;

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Build the full application router
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = state
        .config
        .server
        .cors_enabled
        .then(|| cors_layer(&state.config));

    let router = Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .nest("/api/v1", routes::api_routes())
        .with_state(state)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http());

    match cors {
        Some(cors) => router.layer(cors),
        None => router,
    }
}

/// Router backed by the given gateway and default configuration
pub fn create_router_with_gateway(gateway: Arc<dyn ExtractionGateway>) -> Router {
    create_router(Arc::new(AppState::new(AppConfig::default(), gateway)))
}

/// Router backed by an instant demo gateway
pub fn create_router_for_testing() -> Router {
    create_router_with_gateway(Arc::new(DemoGateway::instant()))
}
