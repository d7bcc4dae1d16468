use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    #[error("Failed to download audio: {0}")]
    Download(String),
    #[error("Failed to download audio: server answered {0}")]
    Status(u16),
    #[error("Failed to download audio: larger than {0} bytes")]
    TooLarge(usize),
}

impl From<reqwest::Error> for AudioError {
    fn from(err: reqwest::Error) -> Self {
        AudioError::Download(err.to_string())
    }
}

// Source of audio bytes for a URL
#[async_trait]
pub trait AudioFetcher: Send + Sync {
    async fn fetch(&self, audio_url: &str) -> Result<Vec<u8>, AudioError>;
}

pub const MOCK_AUDIO: &[u8] = b"mock-audio-data";

// Pretends to download: waits `delay` and hands back fixed bytes
pub struct MockAudioFetcher {
    delay: Duration,
}

impl MockAudioFetcher {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl AudioFetcher for MockAudioFetcher {
    async fn fetch(&self, audio_url: &str) -> Result<Vec<u8>, AudioError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        debug!(audio_url, "Mock audio download finished");
        Ok(MOCK_AUDIO.to_vec())
    }
}

/// Default download cap, matching Azure's short-audio upload limit.
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

pub struct HttpAudioFetcher {
    client: reqwest::Client,
    timeout: Duration,
    max_bytes: usize,
}

impl HttpAudioFetcher {
    pub fn new(client: reqwest::Client, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            max_bytes: MAX_AUDIO_BYTES,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }
}

#[async_trait]
impl AudioFetcher for HttpAudioFetcher {
    async fn fetch(&self, audio_url: &str) -> Result<Vec<u8>, AudioError> {
        let mut res = self
            .client
            .get(audio_url)
            .timeout(self.timeout)
            .send()
            .await?;

        if !res.status().is_success() {
            return Err(AudioError::Status(res.status().as_u16()));
        }

        // refuse early when the server announces the size, cap the stream otherwise
        if res.content_length().is_some_and(|len| len > self.max_bytes as u64) {
            return Err(AudioError::TooLarge(self.max_bytes));
        }

        let mut audio = Vec::new();
        while let Some(chunk) = res.chunk().await? {
            if audio.len() + chunk.len() > self.max_bytes {
                return Err(AudioError::TooLarge(self.max_bytes));
            }
            audio.extend_from_slice(&chunk);
        }

        debug!(audio_url, size = audio.len(), "Audio downloaded");
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, http::StatusCode, routing::get};

    // Serves `app` on an ephemeral local port and returns its base url
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    fn audio_server() -> Router {
        Router::new()
            .route("/clip.wav", get(|| async { b"RIFF-fake-wave".to_vec() }))
            .route("/missing.wav", get(|| async { StatusCode::NOT_FOUND }))
            .route("/huge.wav", get(|| async { vec![0u8; 4096] }))
    }

    fn http_fetcher() -> HttpAudioFetcher {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        HttpAudioFetcher::new(client, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn http_fetch_returns_body() {
        let base = serve(audio_server()).await;
        let audio = http_fetcher().fetch(&format!("{base}/clip.wav")).await.unwrap();
        assert_eq!(audio, b"RIFF-fake-wave");
    }

    #[tokio::test]
    async fn http_fetch_maps_error_status() {
        let base = serve(audio_server()).await;
        let err = http_fetcher().fetch(&format!("{base}/missing.wav")).await.unwrap_err();
        assert!(matches!(err, AudioError::Status(404)));
        assert_eq!(err.to_string(), "Failed to download audio: server answered 404");
    }

    #[tokio::test]
    async fn http_fetch_refuses_oversized_audio() {
        let base = serve(audio_server()).await;
        let fetcher = http_fetcher().with_max_bytes(1024);

        let err = fetcher.fetch(&format!("{base}/huge.wav")).await.unwrap_err();
        assert!(matches!(err, AudioError::TooLarge(1024)));

        // small files still pass under the same cap
        assert!(fetcher.fetch(&format!("{base}/clip.wav")).await.is_ok());
    }

    #[tokio::test]
    async fn http_fetch_unreachable_host_is_download_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = http_fetcher().fetch(&format!("http://{addr}/clip.wav")).await.unwrap_err();
        assert!(matches!(err, AudioError::Download(_)));
    }

    #[tokio::test]
    async fn mock_returns_fixed_bytes() {
        let fetcher = MockAudioFetcher::new(Duration::ZERO);
        let audio = fetcher.fetch("https://example.com/a.mp3").await.unwrap();
        assert_eq!(audio, MOCK_AUDIO);
    }
}
