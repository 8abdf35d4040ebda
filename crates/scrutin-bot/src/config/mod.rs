use std::env;
use std::fmt;
use std::path::PathBuf;

pub const DEFAULT_API_BASE: &str = "https://api.twitter.com";
pub const DEFAULT_UPLOAD_BASE: &str = "https://upload.twitter.com";

/// Distinguishes runtime behavior for different stages of the bot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub media: MediaConfig,
    pub publishing: PublishingConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with(PublishingConfig::from_env)
    }

    /// Same as [`AppConfig::load`] but never reads credentials; posts go to
    /// the console sink.
    pub fn load_console() -> Result<Self, ConfigError> {
        Self::load_with(|| Ok(PublishingConfig::Console))
    }

    fn load_with(
        publishing: impl FnOnce() -> Result<PublishingConfig, ConfigError>,
    ) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let media_root = env::var("SCRUTIN_MEDIA_ROOT")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| "medias".to_string());

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            media: MediaConfig {
                root: PathBuf::from(media_root),
            },
            publishing: publishing()?,
            telemetry: TelemetryConfig { log_level },
        })
    }
}

/// Where rendered charts are written.
#[derive(Debug, Clone)]
pub struct MediaConfig {
    pub root: PathBuf,
}

/// Which sink receives status updates.
#[derive(Debug, Clone)]
pub enum PublishingConfig {
    /// Log posts locally instead of calling the network.
    Console,
    Twitter(TwitterSettings),
}

impl PublishingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        // Any non-empty DEBUG value counts, including "0" and "false".
        let debug = env::var("DEBUG")
            .map(|value| !value.is_empty())
            .unwrap_or(false);
        if debug {
            return Ok(Self::Console);
        }

        let credentials = TwitterCredentials {
            consumer_key: required("TWITTER_API_KEY")?,
            consumer_secret: Secret::new(required("TWITTER_API_KEY_SECRET")?),
            access_token: required("TWITTER_ACCESS_TOKEN")?,
            access_token_secret: Secret::new(required("TWITTER_ACCESS_TOKEN_SECRET")?),
        };

        Ok(Self::Twitter(TwitterSettings {
            credentials,
            api_base: base_url("TWITTER_API_BASE", DEFAULT_API_BASE),
            upload_base: base_url("TWITTER_UPLOAD_BASE", DEFAULT_UPLOAD_BASE),
        }))
    }

    pub fn is_console(&self) -> bool {
        matches!(self, Self::Console)
    }
}

#[derive(Debug, Clone)]
pub struct TwitterSettings {
    pub credentials: TwitterCredentials,
    pub api_base: String,
    pub upload_base: String,
}

/// OAuth 1.0a user-context credentials.
#[derive(Debug, Clone)]
pub struct TwitterCredentials {
    pub consumer_key: String,
    pub consumer_secret: Secret,
    pub access_token: String,
    pub access_token_secret: Secret,
}

/// A string that never shows up in `Debug` or `Display` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl fmt::Display for Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or(ConfigError::MissingVariable(name))
}

fn base_url(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
        .trim_end_matches('/')
        .to_string()
}

#[derive(Debug)]
pub enum ConfigError {
    MissingVariable(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingVariable(name) => {
                write!(f, "{name} must be set unless DEBUG is enabled")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

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
        for name in [
            "APP_ENV",
            "APP_LOG_LEVEL",
            "SCRUTIN_MEDIA_ROOT",
            "DEBUG",
            "TWITTER_API_KEY",
            "TWITTER_API_KEY_SECRET",
            "TWITTER_ACCESS_TOKEN",
            "TWITTER_ACCESS_TOKEN_SECRET",
            "TWITTER_API_BASE",
            "TWITTER_UPLOAD_BASE",
        ] {
            env::remove_var(name);
        }
    }

    fn set_credentials() {
        env::set_var("TWITTER_API_KEY", "consumer-key");
        env::set_var("TWITTER_API_KEY_SECRET", "consumer-secret");
        env::set_var("TWITTER_ACCESS_TOKEN", "access-token");
        env::set_var("TWITTER_ACCESS_TOKEN_SECRET", "access-secret");
    }

    #[test]
    fn debug_flag_selects_console_without_credentials() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DEBUG", "1");
        let config = AppConfig::load().expect("config loads in debug mode");
        assert!(config.publishing.is_console());
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.media.root, PathBuf::from("medias"));
        assert_eq!(config.telemetry.log_level, "info");
    }

    #[test]
    fn console_load_ignores_missing_credentials() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("SCRUTIN_MEDIA_ROOT", "/tmp/scrutins");
        let config = AppConfig::load_console().expect("console config loads");
        assert!(config.publishing.is_console());
        assert_eq!(config.media.root, PathBuf::from("/tmp/scrutins"));
    }

    #[test]
    fn missing_credential_is_reported_by_name() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_credentials();
        env::remove_var("TWITTER_ACCESS_TOKEN_SECRET");
        let err = AppConfig::load().expect_err("credentials are required");
        assert!(matches!(
            err,
            ConfigError::MissingVariable("TWITTER_ACCESS_TOKEN_SECRET")
        ));
    }

    #[test]
    fn twitter_settings_use_defaults_and_trim_slashes() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        set_credentials();
        env::set_var("TWITTER_API_BASE", "http://127.0.0.1:8080/");
        let config = AppConfig::load().expect("config loads");
        match config.publishing {
            PublishingConfig::Twitter(settings) => {
                assert_eq!(settings.api_base, "http://127.0.0.1:8080");
                assert_eq!(settings.upload_base, DEFAULT_UPLOAD_BASE);
                assert_eq!(settings.credentials.consumer_secret.expose(), "consumer-secret");
                assert!(!format!("{:?}", settings.credentials).contains("access-secret"));
            }
            PublishingConfig::Console => panic!("expected twitter settings"),
        }
    }
}
