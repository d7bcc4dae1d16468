use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

use crate::audio::{AudioError, AudioFetcher};
use crate::error::AppError;
use crate::metrics::TRANSCRIPTION_LATENCY;
use crate::retry::{RetryError, RetryPolicy, retry_with_backoff};
use crate::speech::{SpeechError, SpeechProvider};

pub const MOCK_TRANSCRIPTION: &str = "transcribed text";

#[derive(Debug, thiserror::Error)]
enum AttemptError {
    #[error(transparent)]
    Audio(#[from] RetryError<AudioError>),
    #[error(transparent)]
    Speech(#[from] SpeechError),
}

// Turns an audio URL into text, either mocked or through a speech provider
pub struct TranscriptionService {
    fetcher: Arc<dyn AudioFetcher>,
    provider: Option<Arc<dyn SpeechProvider>>,
    retry: RetryPolicy,
}

impl TranscriptionService {
    pub fn new(
        fetcher: Arc<dyn AudioFetcher>,
        provider: Option<Arc<dyn SpeechProvider>>,
        retry: RetryPolicy,
    ) -> Self {
        if provider.is_none() {
            warn!("Speech provider credentials not configured, provider path will return mock text");
        }
        Self {
            fetcher,
            provider,
            retry,
        }
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    async fn download(&self, audio_url: &str) -> Result<Vec<u8>, RetryError<AudioError>> {
        retry_with_backoff(&self.retry, "audio download", || self.fetcher.fetch(audio_url)).await
    }

    /// Downloads the audio and returns the fixed mock text.
    pub async fn transcribe_mock(&self, audio_url: &str) -> Result<String, AppError> {
        let start = Instant::now();

        self.download(audio_url)
            .await
            .map_err(|e| AppError::Database(format!("Failed to create transcription: {e}")))?;

        TRANSCRIPTION_LATENCY.observe(start.elapsed().as_secs_f64());
        Ok(MOCK_TRANSCRIPTION.to_string())
    }

    /// Runs download plus recognition under the retry policy.
    pub async fn transcribe_with_provider(
        &self,
        audio_url: &str,
        language: &str,
    ) -> Result<String, AppError> {
        let start = Instant::now();

        let Some(provider) = &self.provider else {
            self.download(audio_url).await.map_err(|e| AppError::ExternalService {
                service: "Audio download".to_string(),
                message: e.to_string(),
            })?;
            info!(audio_url, "Using mock transcription, no provider configured");
            TRANSCRIPTION_LATENCY.observe(start.elapsed().as_secs_f64());
            return Ok(format!("[Mock] Transcribed text from {audio_url}"));
        };

        let text = retry_with_backoff(&self.retry, provider.name(), || async {
            let audio = self.download(audio_url).await?;
            let text = provider.recognize(&audio, language).await?;
            Ok::<_, AttemptError>(text)
        })
        .await
        .map_err(|e| AppError::ExternalService {
            service: provider.name().to_string(),
            message: e.to_string(),
        })?;

        TRANSCRIPTION_LATENCY.observe(start.elapsed().as_secs_f64());
        Ok(text)
    }
}
