use crate::config::ConfigError;
use crate::telemetry::TelemetryError;
use crate::workflows::opportunity::SchemaError;
use crate::workflows::review::{ApiError, SchemaLookupError, SubmitError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Api(ApiError),
    Submit(SubmitError),
    ReviewType(SchemaLookupError),
    Schema(SchemaError),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Api(err) => write!(f, "review service error: {}", err),
            AppError::Submit(err) => write!(f, "submission error: {}", err),
            AppError::ReviewType(err) => write!(f, "review type error: {}", err),
            AppError::Schema(err) => write!(f, "form schema error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Api(err) => Some(err),
            AppError::Submit(err) => Some(err),
            AppError::ReviewType(err) => Some(err),
            AppError::Schema(err) => Some(err),
        }
    }
}

impl AppError {
    /// Whether the failure came from the user's input rather than the environment.
    pub fn is_user_error(&self) -> bool {
        matches!(self, AppError::Submit(_) | AppError::Schema(_))
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

impl From<ApiError> for AppError {
    fn from(value: ApiError) -> Self {
        Self::Api(value)
    }
}

impl From<SubmitError> for AppError {
    fn from(value: SubmitError) -> Self {
        Self::Submit(value)
    }
}

impl From<SchemaLookupError> for AppError {
    fn from(value: SchemaLookupError) -> Self {
        Self::ReviewType(value)
    }
}

impl From<SchemaError> for AppError {
    fn from(value: SchemaError) -> Self {
        Self::Schema(value)
    }
}
