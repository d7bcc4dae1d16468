use lazy_static::lazy_static;
use prometheus::{
    Counter, CounterVec, GaugeVec, Histogram, register_counter, register_counter_vec,
    register_gauge_vec, register_histogram,
};

lazy_static! {
    pub static ref REQUEST_TOTAL: Counter =
        register_counter!("transcription_gateway_requests_total", "Total number of requests").unwrap();
    pub static ref RATE_LIMITED_TOTAL: CounterVec = register_counter_vec!(
        "transcription_gateway_rate_limited_total",
        "Requests rejected by a rate limiter",
        &["limiter"]
    )
    .unwrap();
    pub static ref RATE_LIMIT_ENTRIES: GaugeVec = register_gauge_vec!(
        "transcription_gateway_rate_limit_entries",
        "Keys currently tracked by a rate limiter",
        &["limiter"]
    )
    .unwrap();
    pub static ref TRANSCRIPTIONS_CREATED: CounterVec = register_counter_vec!(
        "transcription_gateway_transcriptions_created_total",
        "Transcriptions stored, by source",
        &["source"]
    )
    .unwrap();
    pub static ref TRANSCRIPTION_LATENCY: Histogram = register_histogram!(
        "transcription_gateway_transcription_latency_seconds",
        "Time spent producing a transcription in seconds"
    )
    .unwrap();
}
