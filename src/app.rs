use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{Method, header},
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowHeaders, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers::{
    api_info_handler, create_azure_transcription_handler, create_transcription_handler,
    get_transcription_handler, health_handler, list_transcriptions_handler,
    method_not_allowed_handler, metrics_handler, not_found_handler,
};
use crate::middleware::{rate_limit, request_id, security_headers};
use crate::state::AppState;

/// Largest JSON body accepted on any route.
pub const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::mirror_request())
        .expose_headers([header::RETRY_AFTER, header::HeaderName::from_static("x-request-id")])
        .max_age(Duration::from_secs(3600))
}

/// Builds the full route table.
///
/// Requests to `/api` pass the general limiter first; the two
/// transcription-creation routes then pass the stricter one before their
/// bodies are validated. The transcription limiter only wraps `POST`, so a
/// wrong method never spends one of its slots.
pub fn router(state: Arc<AppState>) -> Router {
    let transcription_gate =
        middleware::from_fn_with_state(Arc::clone(&state.transcription_limiter), rate_limit);

    let api = Router::new()
        .route("/info", get(api_info_handler))
        .route(
            "/transcription",
            post(create_transcription_handler)
                .route_layer(transcription_gate.clone())
                .fallback(method_not_allowed_handler),
        )
        .route(
            "/azure-transcription",
            post(create_azure_transcription_handler)
                .route_layer(transcription_gate)
                .fallback(method_not_allowed_handler),
        )
        .route("/transcriptions", get(list_transcriptions_handler))
        .route("/transcriptions/{id}", get(get_transcription_handler))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state.api_limiter),
            rate_limit,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .nest("/api", api)
        .fallback(not_found_handler)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(security_headers))
        .layer(cors())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
