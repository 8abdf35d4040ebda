use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::publishing::{GatewayError, PublishError};
use crate::workflows::scrutin::{ChartError, ScrutinError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Record(ScrutinError),
    Chart(ChartError),
    Gateway(GatewayError),
    Publish(PublishError),
    /// Some records of a batch failed; each failure was already logged.
    Batch { failed: usize, total: usize },
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Record(err) => write!(f, "record error: {}", err),
            AppError::Chart(err) => write!(f, "chart error: {}", err),
            AppError::Gateway(err) => write!(f, "publishing client error: {}", err),
            AppError::Publish(err) => write!(f, "publish error: {}", err),
            AppError::Batch { failed, total } => {
                write!(f, "{} of {} vote records failed", failed, total)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Record(err) => Some(err),
            AppError::Chart(err) => Some(err),
            AppError::Gateway(err) => Some(err),
            AppError::Publish(err) => Some(err),
            AppError::Batch { .. } => None,
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<ScrutinError> for AppError {
    fn from(value: ScrutinError) -> Self {
        Self::Record(value)
    }
}

impl From<ChartError> for AppError {
    fn from(value: ChartError) -> Self {
        Self::Chart(value)
    }
}

impl From<GatewayError> for AppError {
    fn from(value: GatewayError) -> Self {
        Self::Gateway(value)
    }
}

impl From<PublishError> for AppError {
    fn from(value: PublishError) -> Self {
        Self::Publish(value)
    }
}
