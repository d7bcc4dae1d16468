//! Audio transcription API with per-client rate limiting.
//!
//! Accepts an audio URL, produces a transcription (mocked, or through a
//! speech-to-text provider under retry) and stores the record. Two
//! independent fixed-window limiters guard the API: a general one for
//! everything under `/api` and a stricter one for transcription creation.

pub mod app;
pub mod audio;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod models;
pub mod rate_limit;
pub mod retry;
pub mod speech;
pub mod state;
pub mod store;
pub mod transcription;
pub mod validation;

pub use app::router;
pub use config::Args;
pub use error::AppError;
pub use rate_limit::{Admission, RateLimiter};
pub use state::AppState;
