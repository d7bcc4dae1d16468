mod health;
mod metrics;
mod transcription;

pub use health::{api_info_handler, health_handler, method_not_allowed_handler, not_found_handler};
pub use metrics::metrics_handler;
pub use transcription::{
    create_azure_transcription_handler, create_transcription_handler, get_transcription_handler,
    list_transcriptions_handler,
};
