use clap::Parser; // for cli
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use transcription_gateway::audio::{AudioFetcher, HttpAudioFetcher, MockAudioFetcher};
use transcription_gateway::config::Args;
use transcription_gateway::rate_limit::{RateLimiter, sweeper};
use transcription_gateway::speech::{AzureSpeechClient, SpeechProvider};
use transcription_gateway::state::AppState;
use transcription_gateway::store::InMemoryTranscriptionStore;
use transcription_gateway::transcription::TranscriptionService;

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("SIGINT received, shutting down gracefully..."),
        _ = terminate => info!("SIGTERM received, shutting down gracefully..."),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // parse cli arguments
    let args = Args::parse();
    init_tracing(args.log_json);

    let client = reqwest::Client::new();

    let fetcher: Arc<dyn AudioFetcher> = if args.fetch_audio {
        Arc::new(HttpAudioFetcher::new(client.clone(), Duration::from_secs(30)))
    } else {
        Arc::new(MockAudioFetcher::new(args.audio_download_delay()))
    };

    let provider: Option<Arc<dyn SpeechProvider>> = args.azure_credentials().map(|(key, region)| {
        Arc::new(AzureSpeechClient::new(client.clone(), key, &region)) as Arc<dyn SpeechProvider>
    });

    let api_limiter = Arc::new(RateLimiter::new("api", args.rate_window(), args.api_rate_limit));
    let transcription_limiter = Arc::new(RateLimiter::new(
        "transcription",
        args.rate_window(),
        args.transcription_rate_limit,
    ));

    // creating shared state
    let state = Arc::new(AppState {
        store: Arc::new(InMemoryTranscriptionStore::new()),
        transcriber: TranscriptionService::new(fetcher, provider, args.retry_policy()),
        api_limiter: Arc::clone(&api_limiter),
        transcription_limiter: Arc::clone(&transcription_limiter),
        recent_days: args.recent_days,
        started_at: Instant::now(),
    });

    // spawn the background sweeper
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let sweeper_handle = tokio::spawn(sweeper(
        vec![api_limiter, transcription_limiter],
        args.sweep_interval(),
        shutdown_rx,
    ));

    let app = transcription_gateway::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!(port = args.port, "Server running on http://localhost:{}", args.port);
    info!(
        api_rate_limit = args.api_rate_limit,
        transcription_rate_limit = args.transcription_rate_limit,
        rate_window = args.rate_window,
        "Rate limits configured"
    );
    info!(
        max_attempts = args.max_retry_attempts,
        retry_delay_ms = args.retry_delay_ms,
        fetch_audio = args.fetch_audio,
        "Transcription retries configured"
    );

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let _ = shutdown_tx.send(true);
    if let Err(e) = sweeper_handle.await {
        warn!(error = %e, "Sweeper task ended abnormally");
    }

    info!("Server stopped");
    Ok(())
}
