use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

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
    pub pricing: PricingConfig,
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
            pricing: PricingConfig::from_env()?,
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

/// Constants the pricing engine is driven by.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingConfig {
    /// Rate applied when no rate row matches or the table cannot be read.
    pub default_rate_percent: f64,
    /// Monthly income multiplier used to seed the first rate lookup.
    pub seed_income_multiplier: f64,
    /// Relative divergence between seed and preliminary loan that triggers the refinement pass.
    pub refinement_threshold: f64,
    /// Agreement value substituted when upstream leaves the property value unset.
    pub unset_property_value: f64,
    /// Upper bound on a single data-store round trip made from the HTTP boundary.
    pub store_timeout: Duration,
    /// Optional CSV export to load the rate table from.
    pub rate_table_path: Option<PathBuf>,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            default_rate_percent: 8.8,
            seed_income_multiplier: 60.0,
            refinement_threshold: 0.20,
            unset_property_value: 999_999_999.0,
            store_timeout: Duration::from_millis(2_000),
            rate_table_path: None,
        }
    }
}

impl PricingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let store_timeout_ms = match env::var("PRICING_STORE_TIMEOUT_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidNumber {
                    variable: "PRICING_STORE_TIMEOUT_MS",
                    value: raw,
                })?,
            Err(_) => defaults.store_timeout.as_millis() as u64,
        };

        Ok(Self {
            default_rate_percent: env_f64("PRICING_DEFAULT_RATE", defaults.default_rate_percent)?,
            seed_income_multiplier: env_f64(
                "PRICING_SEED_MULTIPLIER",
                defaults.seed_income_multiplier,
            )?,
            refinement_threshold: env_f64(
                "PRICING_REFINE_THRESHOLD",
                defaults.refinement_threshold,
            )?,
            unset_property_value: env_f64(
                "PRICING_UNSET_PROPERTY_VALUE",
                defaults.unset_property_value,
            )?,
            store_timeout: Duration::from_millis(store_timeout_ms),
            rate_table_path: env::var("PRICING_RATE_TABLE")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map(PathBuf::from),
        })
    }
}

fn env_f64(variable: &'static str, default: f64) -> Result<f64, ConfigError> {
    match env::var(variable) {
        Ok(raw) => match raw.trim().parse::<f64>() {
            Ok(value) if value.is_finite() && value >= 0.0 => Ok(value),
            _ => Err(ConfigError::InvalidNumber {
                variable,
                value: raw,
            }),
        },
        Err(_) => Ok(default),
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a non-negative number (got '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
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
            "PRICING_DEFAULT_RATE",
            "PRICING_SEED_MULTIPLIER",
            "PRICING_REFINE_THRESHOLD",
            "PRICING_UNSET_PROPERTY_VALUE",
            "PRICING_STORE_TIMEOUT_MS",
            "PRICING_RATE_TABLE",
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
        assert_eq!(config.pricing, PricingConfig::default());
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
    fn pricing_overrides_are_parsed() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PRICING_DEFAULT_RATE", "9.25");
        env::set_var("PRICING_STORE_TIMEOUT_MS", "750");
        env::set_var("PRICING_RATE_TABLE", "/etc/pricing/rates.csv");
        let config = AppConfig::load().expect("config loads");
        assert_eq!(config.pricing.default_rate_percent, 9.25);
        assert_eq!(config.pricing.store_timeout, Duration::from_millis(750));
        assert_eq!(
            config.pricing.rate_table_path,
            Some(PathBuf::from("/etc/pricing/rates.csv"))
        );
        reset_env();
    }

    #[test]
    fn rejects_negative_threshold() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("PRICING_REFINE_THRESHOLD", "-0.1");
        match AppConfig::load() {
            Err(ConfigError::InvalidNumber { variable, .. }) => {
                assert_eq!(variable, "PRICING_REFINE_THRESHOLD")
            }
            other => panic!("expected invalid number, got {other:?}"),
        }
        reset_env();
    }
}
