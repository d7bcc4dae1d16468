//! Speech-to-text providers.
//!
//! Only Azure's short-audio REST endpoint is wired up. The recognizer is
//! treated as an opaque remote call; retries live in the caller.

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("No speech could be recognized")]
    NoMatch,
    #[error("Recognition failed: {0}")]
    Recognition(String),
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[async_trait]
pub trait SpeechProvider: Send + Sync {
    // Display name used in error messages
    fn name(&self) -> &'static str;

    async fn recognize(&self, audio: &[u8], language: &str) -> Result<String, SpeechError>;
}

// Azure REST response (short audio)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct RecognitionResponse {
    recognition_status: String,
    #[serde(default)]
    display_text: Option<String>,
}

pub struct AzureSpeechClient {
    client: reqwest::Client,
    key: String,
    endpoint: String,
    timeout: Duration,
}

impl AzureSpeechClient {
    pub fn new(client: reqwest::Client, key: String, region: &str) -> Self {
        Self::with_endpoint(
            client,
            key,
            format!(
                "https://{}.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1",
                region.trim()
            ),
        )
    }

    pub fn with_endpoint(client: reqwest::Client, key: String, endpoint: String) -> Self {
        Self {
            client,
            key,
            endpoint,
            timeout: Duration::from_secs(30),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl SpeechProvider for AzureSpeechClient {
    fn name(&self) -> &'static str {
        "Azure Speech-to-Text"
    }

    async fn recognize(&self, audio: &[u8], language: &str) -> Result<String, SpeechError> {
        let res = self
            .client
            .post(format!("{}?language={}", self.endpoint, language))
            .header("Ocp-Apim-Subscription-Key", &self.key)
            .header("Content-Type", "audio/wav; codecs=audio/pcm; samplerate=16000")
            .header("Accept", "application/json")
            .timeout(self.timeout)
            .body(audio.to_vec())
            .send()
            .await?;

        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(SpeechError::Recognition(format!("{status}: {body}")));
        }

        let body: RecognitionResponse = res.json().await?;
        debug!(status = %body.recognition_status, language, "Azure recognition finished");
        interpret(body)
    }
}

fn interpret(body: RecognitionResponse) -> Result<String, SpeechError> {
    match body.recognition_status.as_str() {
        "Success" => Ok(body.display_text.unwrap_or_default()),
        "NoMatch" | "InitialSilenceTimeout" => Err(SpeechError::NoMatch),
        other => Err(SpeechError::Recognition(format!("Error: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        Json, Router,
        extract::Query,
        http::{HeaderMap, StatusCode},
        routing::post,
    };
    use serde_json::{Value, json};
    use std::collections::HashMap;

    // Stand-in for the Azure endpoint on an ephemeral local port
    async fn serve(app: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });
        format!("http://{addr}")
    }

    async fn recognize_ok(
        headers: HeaderMap,
        Query(query): Query<HashMap<String, String>>,
    ) -> Result<Json<Value>, StatusCode> {
        let key = headers.get("ocp-apim-subscription-key").map(|v| v.as_bytes());
        if key != Some(&b"secret"[..]) {
            return Err(StatusCode::UNAUTHORIZED);
        }
        let language = query.get("language").cloned().unwrap_or_default();
        Ok(Json(json!({
            "RecognitionStatus": "Success",
            "DisplayText": format!("Hello from {language}."),
            "Offset": 0,
        })))
    }

    fn azure_server() -> Router {
        Router::new()
            .route("/ok", post(recognize_ok))
            .route(
                "/quota",
                post(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") }),
            )
            .route(
                "/silence",
                post(|| async { Json(json!({ "RecognitionStatus": "InitialSilenceTimeout" })) }),
            )
    }

    fn client_for(endpoint: String) -> AzureSpeechClient {
        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        AzureSpeechClient::with_endpoint(http, "secret".into(), endpoint)
    }

    fn parse(json: &str) -> RecognitionResponse {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn success_yields_display_text() {
        let body = parse(r#"{"RecognitionStatus":"Success","DisplayText":"Hello world.","Offset":0}"#);
        assert_eq!(interpret(body).unwrap(), "Hello world.");
    }

    #[test]
    fn no_match_is_its_own_error() {
        let body = parse(r#"{"RecognitionStatus":"NoMatch"}"#);
        assert!(matches!(interpret(body), Err(SpeechError::NoMatch)));
    }

    #[test]
    fn other_status_is_recognition_error() {
        let body = parse(r#"{"RecognitionStatus":"BabbleTimeout"}"#);
        let err = interpret(body).unwrap_err();
        assert_eq!(err.to_string(), "Recognition failed: Error: BabbleTimeout");
    }

    #[test]
    fn endpoint_built_from_region() {
        let client = AzureSpeechClient::new(reqwest::Client::new(), "k".into(), "westeurope");
        assert_eq!(
            client.endpoint(),
            "https://westeurope.stt.speech.microsoft.com/speech/recognition/conversation/cognitiveservices/v1"
        );
    }

    #[tokio::test]
    async fn recognize_sends_key_and_language() {
        let base = serve(azure_server()).await;
        let text = client_for(format!("{base}/ok"))
            .recognize(b"RIFF", "fr-FR")
            .await
            .unwrap();
        assert_eq!(text, "Hello from fr-FR.");
    }

    #[tokio::test]
    async fn non_success_status_is_recognition_error() {
        let base = serve(azure_server()).await;
        let err = client_for(format!("{base}/quota"))
            .recognize(b"RIFF", "en-US")
            .await
            .unwrap_err();

        match err {
            SpeechError::Recognition(message) => {
                assert!(message.starts_with("429"));
                assert!(message.ends_with("quota exceeded"));
            }
            other => panic!("expected a recognition error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn silence_reply_is_no_match() {
        let base = serve(azure_server()).await;
        let err = client_for(format!("{base}/silence"))
            .recognize(b"RIFF", "en-US")
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::NoMatch));
    }
}
