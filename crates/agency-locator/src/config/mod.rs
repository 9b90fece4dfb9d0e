use crate::workflows::addresses::ConsolidationStrategy;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Minimum link score a cluster membership needs before it is trusted.
pub const DEFAULT_LINK_SCORE_THRESHOLD: f64 = 0.34;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub pipeline: PipelineConfig,
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
            pipeline: PipelineConfig::from_env()?,
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

/// Tunables for linkage, address consolidation, and allocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PipelineConfig {
    /// Link rows scoring below this are ignored (`LINK_SCORE_THRESHOLD`).
    pub link_score_threshold: f64,
    /// How matched address variants collapse (`ADDRESS_CONSOLIDATION`).
    pub consolidation: ConsolidationStrategy,
    /// Deduplicate address groups on the rayon pool (`DEDUP_PARALLEL`).
    pub parallel_groups: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            link_score_threshold: DEFAULT_LINK_SCORE_THRESHOLD,
            consolidation: ConsolidationStrategy::UnionFind,
            parallel_groups: false,
        }
    }
}

impl PipelineConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let link_score_threshold = match env::var("LINK_SCORE_THRESHOLD") {
            Ok(raw) => parse_threshold(&raw)?,
            Err(_) => defaults.link_score_threshold,
        };

        let consolidation = match env::var("ADDRESS_CONSOLIDATION") {
            Ok(raw) => raw
                .parse::<ConsolidationStrategy>()
                .map_err(|_| ConfigError::InvalidConsolidation { value: raw })?,
            Err(_) => defaults.consolidation,
        };

        let parallel_groups = match env::var("DEDUP_PARALLEL") {
            Ok(raw) => parse_flag("DEDUP_PARALLEL", &raw)?,
            Err(_) => defaults.parallel_groups,
        };

        Ok(Self {
            link_score_threshold,
            consolidation,
            parallel_groups,
        })
    }
}

/// Parses a link score threshold; NaN and infinities are rejected.
pub fn parse_threshold(raw: &str) -> Result<f64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ConfigError::InvalidThreshold {
            value: raw.to_string(),
        }),
    }
}

fn parse_flag(name: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: raw.to_string(),
        }),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidThreshold { value: String },
    InvalidConsolidation { value: String },
    InvalidFlag { name: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidThreshold { value } => write!(
                f,
                "LINK_SCORE_THRESHOLD must be a finite number, got '{}'",
                value
            ),
            ConfigError::InvalidConsolidation { value } => write!(
                f,
                "ADDRESS_CONSOLIDATION must be 'union-find' or 'pairwise', got '{}'",
                value
            ),
            ConfigError::InvalidFlag { name, value } => {
                write!(f, "{} must be a boolean flag, got '{}'", name, value)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidThreshold { .. }
            | ConfigError::InvalidConsolidation { .. }
            | ConfigError::InvalidFlag { .. } => None,
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
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("LINK_SCORE_THRESHOLD");
        env::remove_var("ADDRESS_CONSOLIDATION");
        env::remove_var("DEDUP_PARALLEL");
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
        assert_eq!(config.pipeline, PipelineConfig::default());
        assert_eq!(config.pipeline.link_score_threshold, 0.34);
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
    fn pipeline_overrides_come_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LINK_SCORE_THRESHOLD", "0.5");
        env::set_var("ADDRESS_CONSOLIDATION", "pairwise");
        env::set_var("DEDUP_PARALLEL", "yes");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.pipeline.link_score_threshold, 0.5);
        assert_eq!(
            config.pipeline.consolidation,
            ConsolidationStrategy::Pairwise
        );
        assert!(config.pipeline.parallel_groups);
        reset_env();
    }

    #[test]
    fn rejects_invalid_pipeline_values() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("LINK_SCORE_THRESHOLD", "high");
        let error = AppConfig::load().expect_err("threshold rejected");
        assert!(matches!(error, ConfigError::InvalidThreshold { .. }));

        reset_env();
        env::set_var("ADDRESS_CONSOLIDATION", "transitive");
        let error = AppConfig::load().expect_err("strategy rejected");
        assert!(matches!(error, ConfigError::InvalidConsolidation { .. }));
        reset_env();
    }

    #[test]
    fn threshold_parser_rejects_non_finite_values() {
        assert!(parse_threshold("NaN").is_err());
        assert!(parse_threshold("inf").is_err());
        assert_eq!(parse_threshold(" 0.2 ").expect("parses"), 0.2);
    }
}
