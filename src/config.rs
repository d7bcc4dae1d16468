use clap::Parser;
use std::time::Duration;

use crate::retry::RetryPolicy;

// CLI argument structure, every flag can also come from the environment
#[derive(Parser, Debug, Clone)]
#[command(name = "transcription-gateway")]
#[command(about = "Audio transcription API with per-client rate limiting")]
pub struct Args {
    // Port to run the server on
    #[arg(short, long, env = "PORT", default_value_t = 7070)]
    pub port: u16,

    // Rate limit window in seconds, shared by both limiters
    #[arg(long, env = "RATE_WINDOW", default_value_t = 60)]
    pub rate_window: u64,

    // Max requests per window for everything under /api
    #[arg(long, env = "API_RATE_LIMIT", default_value_t = 100)]
    pub api_rate_limit: u32,

    // Max requests per window for the transcription-creation routes
    #[arg(long, env = "TRANSCRIPTION_RATE_LIMIT", default_value_t = 10)]
    pub transcription_rate_limit: u32,

    // How often expired rate limit entries are swept, in seconds
    #[arg(long, env = "SWEEP_INTERVAL", default_value_t = 60)]
    pub sweep_interval: u64,

    #[arg(long, env = "MAX_RETRY_ATTEMPTS", default_value_t = 3)]
    pub max_retry_attempts: u32,

    // Delay before the first retry, doubled on each further one
    #[arg(long, env = "RETRY_DELAY_MS", default_value_t = 1000)]
    pub retry_delay_ms: u64,

    // Simulated download time of the mock audio fetcher
    #[arg(long, env = "AUDIO_DOWNLOAD_DELAY_MS", default_value_t = 100)]
    pub audio_download_delay_ms: u64,

    // Really download audio over HTTP instead of mocking it
    #[arg(long, env = "FETCH_AUDIO", default_value_t = false)]
    pub fetch_audio: bool,

    #[arg(long, env = "AZURE_SPEECH_KEY", hide_env_values = true)]
    pub azure_speech_key: Option<String>,

    #[arg(long, env = "AZURE_SPEECH_REGION")]
    pub azure_speech_region: Option<String>,

    // How far back GET /api/transcriptions looks, in days
    #[arg(
        long,
        env = "RECENT_DAYS",
        default_value_t = 30,
        value_parser = clap::value_parser!(i64).range(1..=36500)
    )]
    pub recent_days: i64,

    // Emit logs as JSON lines
    #[arg(long, env = "LOG_JSON", default_value_t = false)]
    pub log_json: bool,
}

impl Args {
    pub fn rate_window(&self) -> Duration {
        Duration::from_secs(self.rate_window)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval.max(1))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retry_attempts, Duration::from_millis(self.retry_delay_ms))
    }

    pub fn audio_download_delay(&self) -> Duration {
        Duration::from_millis(self.audio_download_delay_ms)
    }

    // Key and region, only when both are set and non-blank
    pub fn azure_credentials(&self) -> Option<(String, String)> {
        let key = self.azure_speech_key.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let region = self.azure_speech_region.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        Some((key.to_string(), region.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let args = Args::parse_from(["transcription-gateway"]);
        assert_eq!(args.api_rate_limit, 100);
        assert_eq!(args.transcription_rate_limit, 10);
        assert_eq!(args.rate_window(), Duration::from_secs(60));
        assert_eq!(args.retry_policy(), RetryPolicy::default());
        assert_eq!(args.recent_days, 30);
    }

    #[test]
    fn recent_days_must_be_in_range() {
        for bad in ["0", "-5", "36501", "200000000"] {
            assert!(Args::try_parse_from(["gw", "--recent-days", bad]).is_err(), "{bad}");
        }
        let args = Args::try_parse_from(["gw", "--recent-days", "36500"]).unwrap();
        assert_eq!(args.recent_days, 36500);
    }

    #[test]
    fn azure_needs_both_values() {
        let args = Args::parse_from(["gw", "--azure-speech-key", "secret"]);
        assert!(args.azure_credentials().is_none());

        let args = Args::parse_from([
            "gw",
            "--azure-speech-key",
            "secret",
            "--azure-speech-region",
            " westeurope ",
        ]);
        assert_eq!(
            args.azure_credentials(),
            Some(("secret".to_string(), "westeurope".to_string()))
        );
    }
}
