//! Request body checks for the transcription endpoints.
//!
//! Every problem in a body is collected and reported together, joined with
//! `", "`. Fields other than the ones read here are ignored.

use serde_json::{Map, Value};
use url::Url;

use crate::error::AppError;
use crate::models::{AzureTranscriptionRequest, TranscriptionRequest};

pub const DEFAULT_LANGUAGE: &str = "en-US";

pub fn transcription_request(body: &Value) -> Result<TranscriptionRequest, AppError> {
    let fields = as_object(body)?;
    let mut problems = Vec::new();

    let audio_url = audio_url(fields, &mut problems);

    match audio_url {
        Some(audio_url) if problems.is_empty() => Ok(TranscriptionRequest { audio_url }),
        _ => Err(AppError::Validation(problems.join(", "))),
    }
}

pub fn azure_transcription_request(body: &Value) -> Result<AzureTranscriptionRequest, AppError> {
    let fields = as_object(body)?;
    let mut problems = Vec::new();

    let audio_url = audio_url(fields, &mut problems);
    let language = language(fields, &mut problems);

    match (audio_url, language) {
        (Some(audio_url), Some(language)) if problems.is_empty() => {
            Ok(AzureTranscriptionRequest { audio_url, language })
        }
        _ => Err(AppError::Validation(problems.join(", "))),
    }
}

fn as_object(body: &Value) -> Result<&Map<String, Value>, AppError> {
    body.as_object()
        .ok_or_else(|| AppError::Validation("request body must be a JSON object".to_string()))
}

fn audio_url(fields: &Map<String, Value>, problems: &mut Vec<String>) -> Option<String> {
    let raw = match fields.get("audioUrl") {
        None | Some(Value::Null) => {
            problems.push("audioUrl is required".to_string());
            return None;
        }
        Some(Value::String(s)) => s.trim(),
        Some(_) => {
            problems.push("audioUrl must be a string".to_string());
            return None;
        }
    };

    if raw.is_empty() {
        problems.push("audioUrl cannot be empty".to_string());
        return None;
    }

    match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(raw.to_string()),
        Ok(_) => {
            problems.push("audioUrl must use http or https protocol".to_string());
            None
        }
        Err(_) => {
            problems.push("audioUrl must be a valid URL".to_string());
            None
        }
    }
}

fn language(fields: &Map<String, Value>, problems: &mut Vec<String>) -> Option<String> {
    match fields.get("language") {
        None | Some(Value::Null) => Some(DEFAULT_LANGUAGE.to_string()),
        Some(Value::String(s)) if is_language_code(s) => Some(s.clone()),
        Some(Value::String(_)) => {
            problems.push("language must be in format: xx-XX (e.g., en-US, fr-FR)".to_string());
            None
        }
        Some(_) => {
            problems.push("language must be a string".to_string());
            None
        }
    }
}

// xx-XX, e.g. en-US
fn is_language_code(code: &str) -> bool {
    let bytes = code.as_bytes();
    bytes.len() == 5
        && bytes[0].is_ascii_lowercase()
        && bytes[1].is_ascii_lowercase()
        && bytes[2] == b'-'
        && bytes[3].is_ascii_uppercase()
        && bytes[4].is_ascii_uppercase()
}
