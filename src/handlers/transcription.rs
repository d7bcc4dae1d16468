use axum::{
    Extension, Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, TimeDelta, Utc};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::error::AppError;
use crate::metrics::TRANSCRIPTIONS_CREATED;
use crate::middleware::RequestId;
use crate::models::{ApiResponse, Source, Transcription, TranscriptionList};
use crate::state::AppState;
use crate::validation;

// Malformed JSON is reported like any other validation failure; an
// oversized body keeps its 413
fn body(payload: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    payload.map(|Json(value)| value).map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge(rejection.body_text())
        } else {
            AppError::Validation(rejection.body_text())
        }
    })
}

// Oldest creation time still listed. Saturates instead of overflowing.
fn recent_cutoff(now: DateTime<Utc>, days: i64) -> DateTime<Utc> {
    TimeDelta::try_days(days)
        .and_then(|window| now.checked_sub_signed(window))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}

async fn store_record(
    state: &AppState,
    audio_url: &str,
    text: &str,
    source: Source,
) -> Result<Transcription, AppError> {
    let saved = state
        .store
        .create(audio_url, text, source)
        .await
        .map_err(|e| AppError::database("Failed to create transcription", e))?;
    TRANSCRIPTIONS_CREATED.with_label_values(&[source.as_str()]).inc();
    Ok(saved)
}

// POST /api/transcription
pub async fn create_transcription_handler(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = validation::transcription_request(&body(payload)?)?;
    info!(%request_id, audio_url = %req.audio_url, "Creating transcription");

    let text = state.transcriber.transcribe_mock(&req.audio_url).await?;
    let saved = store_record(&state, &req.audio_url, &text, Source::Mock).await?;

    info!(%request_id, transcription_id = %saved.id, "Transcription created successfully");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Transcription created successfully", saved)),
    ))
}

// POST /api/azure-transcription
pub async fn create_azure_transcription_handler(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let req = validation::azure_transcription_request(&body(payload)?)?;
    info!(%request_id, audio_url = %req.audio_url, language = %req.language, "Creating Azure transcription");

    let text = state
        .transcriber
        .transcribe_with_provider(&req.audio_url, &req.language)
        .await?;
    let saved = store_record(&state, &req.audio_url, &text, Source::Azure).await?;

    info!(%request_id, transcription_id = %saved.id, language = %req.language, "Azure transcription created successfully");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok("Azure transcription created successfully", saved)),
    ))
}

// GET /api/transcriptions - last `recent_days` days, newest first
pub async fn list_transcriptions_handler(
    State(state): State<Arc<AppState>>,
    Extension(RequestId(request_id)): Extension<RequestId>,
) -> Result<impl IntoResponse, AppError> {
    let since = recent_cutoff(Utc::now(), state.recent_days);
    let transcriptions = state
        .store
        .recent(since)
        .await
        .map_err(|e| AppError::database("Failed to fetch transcriptions", e))?;

    info!(%request_id, count = transcriptions.len(), "Transcriptions fetched successfully");
    Ok(Json(ApiResponse::ok(
        "Transcriptions fetched successfully",
        TranscriptionList {
            count: transcriptions.len(),
            transcriptions,
        },
    )))
}

// GET /api/transcriptions/{id}
pub async fn get_transcription_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let found = state
        .store
        .get(&id)
        .await
        .map_err(|e| AppError::database("Failed to fetch transcription", e))?
        .ok_or_else(|| AppError::NotFound(format!("Transcription {id} not found")))?;

    Ok(Json(ApiResponse::ok("Transcription fetched successfully", found)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cutoff_subtracts_days() {
        let now = Utc::now();
        assert_eq!(recent_cutoff(now, 30), now - TimeDelta::days(30));
    }

    #[test]
    fn cutoff_saturates_on_huge_windows() {
        let now = Utc::now();
        assert_eq!(recent_cutoff(now, 200_000_000), DateTime::<Utc>::MIN_UTC);
        assert_eq!(recent_cutoff(now, i64::MAX), DateTime::<Utc>::MIN_UTC);
    }
}
