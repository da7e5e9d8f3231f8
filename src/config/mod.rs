use std::env;
use std::fmt;

use url::Url;

/// Deployment stage the reviewer tooling is running against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Preview,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "preview" | "staging" => Self::Preview,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the review client.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub api: ApiConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let raw_url = env::var("REVIEW_API_URL").map_err(|_| ConfigError::MissingApiUrl)?;
        let api = ApiConfig::new(&raw_url)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            api,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Location of the remote application/review service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: Url,
}

impl ApiConfig {
    pub fn new(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::MissingApiUrl);
        }

        let mut base_url = Url::parse(trimmed).map_err(|source| ConfigError::InvalidApiUrl {
            value: trimmed.to_string(),
            source,
        })?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedScheme(base_url.scheme().to_string()));
        }

        // Url::join drops the last path segment unless the base ends with a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        Ok(Self { base_url })
    }

    /// Resolve an endpoint path (with or without a leading slash) against the base.
    pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|source| ConfigError::InvalidApiUrl {
                value: path.to_string(),
                source,
            })
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

#[derive(Debug)]
pub enum ConfigError {
    MissingApiUrl,
    InvalidApiUrl {
        value: String,
        source: url::ParseError,
    },
    UnsupportedScheme(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingApiUrl => write!(f, "REVIEW_API_URL must be set"),
            ConfigError::InvalidApiUrl { value, .. } => {
                write!(f, "'{}' is not a valid review service URL", value)
            }
            ConfigError::UnsupportedScheme(scheme) => {
                write!(f, "review service URL must use http or https, found '{}'", scheme)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::MissingApiUrl | ConfigError::UnsupportedScheme(_) => None,
            ConfigError::InvalidApiUrl { source, .. } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("REVIEW_API_URL");
        env::remove_var("APP_LOG_LEVEL");
    }

    #[test]
    fn load_uses_defaults_when_optional_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("REVIEW_API_URL", "https://api.example.org");
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.api.base_url.as_str(), "https://api.example.org/");
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn load_requires_api_url() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        match AppConfig::load() {
            Err(ConfigError::MissingApiUrl) => {}
            other => panic!("expected missing api url, got {other:?}"),
        }
    }

    #[test]
    fn recognizes_preview_environment() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("REVIEW_API_URL", "http://localhost:8000");
        env::set_var("APP_ENV", "Preview");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.environment, AppEnvironment::Preview);
    }

    #[test]
    fn endpoint_keeps_base_path_prefix() {
        let api = ApiConfig::new("https://api.example.org/v1").expect("valid url");
        let url = api
            .endpoint("/review_tool/update_review/7")
            .expect("endpoint resolves");
        assert_eq!(
            url.as_str(),
            "https://api.example.org/v1/review_tool/update_review/7"
        );
    }

    #[test]
    fn rejects_non_http_schemes() {
        match ApiConfig::new("ftp://files.example.org") {
            Err(ConfigError::UnsupportedScheme(scheme)) => assert_eq!(scheme, "ftp"),
            other => panic!("expected unsupported scheme, got {other:?}"),
        }
    }
}
