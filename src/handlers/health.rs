use axum::{
    Json,
    extract::{OriginalUri, State},
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::sync::Arc;
use tracing::warn;

use crate::error::ErrorBody;
use crate::models::ApiResponse;
use crate::state::AppState;

fn base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|h| h.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|h| h.to_str().ok())
        .unwrap_or("http");
    format!("{scheme}://{host}")
}

// health handler - 503 while the store is unreachable
pub async fn health_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let connected = state.store.is_connected();
    let base = base_url(&headers);

    let message = if connected {
        "Server is healthy"
    } else {
        "Server is running but database is disconnected"
    };

    let body = ApiResponse::ok(
        message,
        json!({
            "status": "ok",
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "uptime": state.started_at.elapsed().as_secs_f64(),
            "database": { "connected": connected },
            "rateLimiter": {
                "apiEntries": state.api_limiter.len(),
                "transcriptionEntries": state.transcription_limiter.len(),
            },
            "api": {
                "health": format!("{base}/health"),
                "metrics": format!("{base}/metrics"),
                "transcription": format!("{base}/api/transcription"),
                "transcriptions": format!("{base}/api/transcriptions"),
                "azureTranscription": format!("{base}/api/azure-transcription"),
            },
        }),
    );

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body)).into_response()
}

pub async fn api_info_handler(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let base = base_url(&headers);

    Json(ApiResponse::ok(
        "API information retrieved successfully",
        json!({
            "name": env!("CARGO_PKG_NAME"),
            "version": env!("CARGO_PKG_VERSION"),
            "description": "Audio Transcription API Service",
            "endpoints": {
                "health": format!("{base}/health"),
                "transcription": {
                    "create": format!("{base}/api/transcription"),
                    "method": "POST",
                    "description": "Create a mock transcription",
                },
                "transcriptions": {
                    "list": format!("{base}/api/transcriptions"),
                    "method": "GET",
                    "description": format!("Get transcriptions from last {} days", state.recent_days),
                },
                "azureTranscription": {
                    "create": format!("{base}/api/azure-transcription"),
                    "method": "POST",
                    "description": "Create transcription using Azure Speech-to-Text",
                    "providerConfigured": state.transcriber.has_provider(),
                },
            },
            "rateLimits": {
                "api": {
                    "maxRequests": state.api_limiter.max_requests(),
                    "windowSeconds": state.api_limiter.window().as_secs(),
                },
                "transcription": {
                    "maxRequests": state.transcription_limiter.max_requests(),
                    "windowSeconds": state.transcription_limiter.window().as_secs(),
                },
            },
        }),
    ))
}

pub async fn not_found_handler(method: Method, uri: Uri) -> Response {
    warn!(%method, path = uri.path(), "Route not found");
    ErrorBody::new(
        StatusCode::NOT_FOUND,
        "Not Found",
        format!("Route {} {} not found", method, uri.path()),
    )
    .into_response_with(StatusCode::NOT_FOUND)
}

// Path exists, method doesn't
pub async fn method_not_allowed_handler(
    method: Method,
    OriginalUri(uri): OriginalUri,
) -> Response {
    warn!(%method, path = uri.path(), "Method not allowed");
    ErrorBody::new(
        StatusCode::METHOD_NOT_ALLOWED,
        "Method Not Allowed",
        format!("Method {} not allowed on {}", method, uri.path()),
    )
    .into_response_with(StatusCode::METHOD_NOT_ALLOWED)
}
