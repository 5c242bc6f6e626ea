use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

use crate::prompt::{ImperfectionLevel, Mood, Style, TransformConfig};

/// Distinguishes runtime behavior for different stages of the service.
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

/// Top-level configuration for the server, CLI and MCP surfaces.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub prompt: PromptDefaults,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            prompt: PromptDefaults::from_env()?,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Transform options applied when a caller leaves them out.
///
/// Unrecognized style, mood or level names resolve to the built-in defaults,
/// matching how request options behave. Only the seed is strictly validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PromptDefaults {
    pub style: Style,
    pub mood: Mood,
    pub imperfection: ImperfectionLevel,
    pub seed: Option<u64>,
}

impl PromptDefaults {
    fn from_env() -> Result<Self, ConfigError> {
        let style = env::var("APP_PROMPT_STYLE").ok();
        let mood = env::var("APP_PROMPT_MOOD").ok();
        let imperfection = env::var("APP_PROMPT_IMPERFECTION").ok();
        let base = TransformConfig::from_options(
            style.as_deref(),
            mood.as_deref(),
            imperfection.as_deref(),
            false,
        );

        let seed = match env::var("APP_PROMPT_SEED") {
            Ok(raw) if !raw.trim().is_empty() => Some(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidSeed { value: raw.clone() })?,
            ),
            _ => None,
        };

        Ok(Self {
            style: base.style,
            mood: base.mood,
            imperfection: base.imperfection,
            seed,
        })
    }

    /// Overlays caller-supplied option names on top of these defaults.
    pub fn resolve(
        &self,
        style: Option<&str>,
        mood: Option<&str>,
        imperfection: Option<&str>,
        preserve_original: bool,
    ) -> TransformConfig {
        let requested = TransformConfig::from_options(style, mood, imperfection, preserve_original);
        TransformConfig {
            style: style.map_or(self.style, |_| requested.style),
            mood: mood.map_or(self.mood, |_| requested.mood),
            imperfection: imperfection.map_or(self.imperfection, |_| requested.imperfection),
            preserve_original,
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidSeed { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidSeed { value } => {
                write!(f, "APP_PROMPT_SEED must be an unsigned integer, got '{value}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidSeed { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
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
        for key in [
            "APP_ENV",
            "APP_HOST",
            "APP_PORT",
            "APP_LOG_LEVEL",
            "APP_PROMPT_STYLE",
            "APP_PROMPT_MOOD",
            "APP_PROMPT_IMPERFECTION",
            "APP_PROMPT_SEED",
        ] {
            env::remove_var(key);
        }
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.prompt, PromptDefaults::default());
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
        reset_env();
    }

    #[test]
    fn prompt_defaults_read_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PROMPT_STYLE", "digital");
        env::set_var("APP_PROMPT_MOOD", "sparkly");
        env::set_var("APP_PROMPT_IMPERFECTION", "HIGH");
        env::set_var("APP_PROMPT_SEED", "42");
        let config = AppConfig::load().expect("config loads");
        reset_env();

        assert_eq!(config.prompt.style, Style::Digital);
        assert_eq!(config.prompt.mood, Mood::Natural);
        assert_eq!(config.prompt.imperfection, ImperfectionLevel::High);
        assert_eq!(config.prompt.seed, Some(42));
    }

    #[test]
    fn rejects_non_numeric_seed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PROMPT_SEED", "lucky");
        let err = AppConfig::load().expect_err("seed rejected");
        reset_env();

        assert!(matches!(err, ConfigError::InvalidSeed { ref value } if value == "lucky"));
    }

    #[test]
    fn rejects_out_of_range_port() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_PORT", "70000");
        let err = AppConfig::load().expect_err("port rejected");
        reset_env();

        assert!(matches!(err, ConfigError::InvalidPort));
    }

    #[test]
    fn request_options_override_defaults() {
        let defaults = PromptDefaults {
            style: Style::Phone,
            mood: Mood::Harsh,
            imperfection: ImperfectionLevel::Low,
            seed: None,
        };

        let untouched = defaults.resolve(None, None, None, false);
        assert_eq!(untouched.style, Style::Phone);
        assert_eq!(untouched.mood, Mood::Harsh);

        let overridden = defaults.resolve(Some("film"), None, Some("bogus"), true);
        assert_eq!(overridden.style, Style::Film);
        assert_eq!(overridden.mood, Mood::Harsh);
        assert_eq!(overridden.imperfection, ImperfectionLevel::Medium);
        assert!(overridden.preserve_original);
    }
}
