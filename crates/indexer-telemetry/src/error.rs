use thiserror::Error;

#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to initialize logging: {0}")]
    LoggingInit(String),

    #[error("failed to register metric: {0}")]
    MetricsInit(String),
}
