//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Strategy error: {0}")]
    Hedge(#[from] strands_hedge::HedgeError),

    #[error("Venue error: {0}")]
    Venue(#[from] strands_venue::VenueError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] strands_telemetry::TelemetryError),

    /// A scenario step left the strategy in an unexpected state.
    #[error("Scenario check failed: {0}")]
    Check(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
