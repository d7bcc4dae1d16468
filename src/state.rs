use std::sync::Arc;
use std::time::Instant;

use crate::rate_limit::RateLimiter;
use crate::store::TranscriptionStore;
use crate::transcription::TranscriptionService;

// app's shared state
pub struct AppState {
    pub store: Arc<dyn TranscriptionStore>,
    pub transcriber: TranscriptionService,
    pub api_limiter: Arc<RateLimiter>,           // everything under /api
    pub transcription_limiter: Arc<RateLimiter>, // transcription-creation routes only
    pub recent_days: i64,
    pub started_at: Instant,
}
