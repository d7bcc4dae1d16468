use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// Where a transcription came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Mock,
    Azure,
}

impl Source {
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Mock => "mock",
            Source::Azure => "azure",
        }
    }
}

// Stored transcription record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transcription {
    pub id: String,
    pub audio_url: String,
    pub transcription: String,
    pub source: Source,
    pub created_at: DateTime<Utc>,
}

// Validated body of POST /api/transcription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionRequest {
    pub audio_url: String,
}

// Validated body of POST /api/azure-transcription
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AzureTranscriptionRequest {
    pub audio_url: String,
    pub language: String,
}

// Success envelope shared by every endpoint
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub message: String,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TranscriptionList {
    pub count: usize,
    pub transcriptions: Vec<Transcription>,
}
