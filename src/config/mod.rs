use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

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
    pub ups: UpsConfig,
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
            ups: UpsConfig::load()?,
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

/// Connection settings for the UPS address validation service.
///
/// Credentials arrive through the environment from the deployment's secret
/// store; the service only carries them into the per-call security header
/// and never persists or logs them.
#[derive(Debug, Clone)]
pub struct UpsConfig {
    /// Routes calls to the vendor's Customer Integration Environment instead
    /// of the billing production endpoint.
    pub test_mode: bool,
    pub username: String,
    pub password: String,
    pub license_number: String,
    /// Location of the vendor-supplied XAV interface definition.
    pub wsdl_path: PathBuf,
    /// Fixed target for tests and staging proxies; unset in production.
    pub endpoint_override: Option<String>,
}

impl UpsConfig {
    fn load() -> Result<Self, ConfigError> {
        let test_mode = match env::var("UPS_TEST_MODE") {
            Ok(raw) => parse_bool(&raw).ok_or(ConfigError::InvalidTestMode { raw })?,
            Err(_) => true,
        };

        Ok(Self {
            test_mode,
            username: env::var("UPS_USERNAME").unwrap_or_default(),
            password: env::var("UPS_PASSWORD").unwrap_or_default(),
            license_number: env::var("UPS_LICENSE_NUMBER").unwrap_or_default(),
            wsdl_path: env::var("UPS_WSDL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("wsdl/XAV.wsdl")),
            endpoint_override: env::var("UPS_ENDPOINT").ok(),
        })
    }

    pub fn has_credentials(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty() && !self.license_number.is_empty()
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTestMode { raw: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTestMode { raw } => {
                write!(f, "UPS_TEST_MODE must be a boolean, got '{raw}'")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidTestMode { .. } => None,
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
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("UPS_TEST_MODE");
        env::remove_var("UPS_USERNAME");
        env::remove_var("UPS_PASSWORD");
        env::remove_var("UPS_LICENSE_NUMBER");
        env::remove_var("UPS_WSDL_PATH");
        env::remove_var("UPS_ENDPOINT");
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
        assert!(config.ups.test_mode);
        assert!(!config.ups.has_credentials());
        assert_eq!(config.ups.wsdl_path, PathBuf::from("wsdl/XAV.wsdl"));
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn reads_vendor_settings_from_env() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("UPS_TEST_MODE", "false");
        env::set_var("UPS_USERNAME", "shipper");
        env::set_var("UPS_PASSWORD", "hunter2");
        env::set_var("UPS_LICENSE_NUMBER", "ABC123");
        env::set_var("UPS_WSDL_PATH", "/srv/wsdl/XAV.wsdl");

        let config = AppConfig::load().expect("config loads");
        assert!(!config.ups.test_mode);
        assert!(config.ups.has_credentials());
        assert_eq!(config.ups.wsdl_path, PathBuf::from("/srv/wsdl/XAV.wsdl"));
        reset_env();
    }

    #[test]
    fn rejects_malformed_test_mode_flag() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("UPS_TEST_MODE", "maybe");

        let err = AppConfig::load().expect_err("malformed flag rejected");
        assert!(matches!(err, ConfigError::InvalidTestMode { .. }));
        reset_env();
    }
}
