pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

use config::AppConfig;
use error::AppError;

/// Load configuration from the environment and install the tracing subscriber.
pub fn init_from_env() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    tracing::info!(environment = ?config.environment, "configuration loaded");
    Ok(config)
}
