use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

use crate::accessibility::AccessibilityConfig;

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

pub const DEFAULT_MODEL_PATH: &str = "models/xgb_car_ownership_model.onnx";
pub const DEFAULT_DEPARTURE_SECONDS: u32 = 8 * 3600;

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub routing: RoutingConfig,
    pub model: ModelConfig,
    pub data: DataConfig,
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

        let departure_seconds_since_midnight = match optional_var("DEPARTURE_SECONDS_SINCE_MIDNIGHT")
        {
            Some(raw) => raw
                .parse::<u32>()
                .ok()
                .filter(|seconds| *seconds < 24 * 3600)
                .ok_or(ConfigError::InvalidDepartureTime { value: raw })?,
            None => DEFAULT_DEPARTURE_SECONDS,
        };

        let routing = RoutingConfig {
            service_url: optional_var("ROUTING_SERVICE_URL"),
            transit_scenario: optional_var("TRANSIT_SCENARIO_ID"),
            simple_modes_scenario: optional_var("SIMPLE_MODES_SCENARIO_ID"),
            departure_seconds_since_midnight,
        };

        let model = ModelConfig {
            inference_url: optional_var("INFERENCE_SERVICE_URL"),
            model_path: optional_var("CAR_OWNERSHIP_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
        };

        let data = DataConfig {
            zones_geojson: optional_var("ZONES_GEOJSON_PATH").map(PathBuf::from),
            vehicle_cost_table: optional_var("VEHICLE_COST_TABLE_PATH").map(PathBuf::from),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                include_targets: environment != AppEnvironment::Production,
            },
            routing,
            model,
            data,
        })
    }
}

fn optional_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
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
    pub include_targets: bool,
}

/// Routing service location and the scenarios used for accessibility requests.
#[derive(Debug, Clone)]
pub struct RoutingConfig {
    pub service_url: Option<String>,
    pub transit_scenario: Option<String>,
    pub simple_modes_scenario: Option<String>,
    pub departure_seconds_since_midnight: u32,
}

impl RoutingConfig {
    pub fn accessibility(&self) -> AccessibilityConfig {
        AccessibilityConfig {
            transit_scenario: self.transit_scenario.clone(),
            simple_modes_scenario: self.simple_modes_scenario.clone(),
            departure_seconds_since_midnight: self.departure_seconds_since_midnight,
            departure_date: None,
        }
    }
}

/// Vehicle ownership model location.
#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub inference_url: Option<String>,
    pub model_path: PathBuf,
}

impl ModelConfig {
    /// Name under which the model is served: the file stem of `model_path`.
    pub fn model_name(&self) -> String {
        self.model_path
            .file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.model_path.display().to_string())
    }
}

/// Local data files backing the zone lookup and the cost table.
#[derive(Debug, Clone)]
pub struct DataConfig {
    pub zones_geojson: Option<PathBuf>,
    pub vehicle_cost_table: Option<PathBuf>,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidDepartureTime { value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidDepartureTime { value } => write!(
                f,
                "DEPARTURE_SECONDS_SINCE_MIDNIGHT must be between 0 and 86399, got '{value}'"
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidDepartureTime { .. } => None,
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
            "ROUTING_SERVICE_URL",
            "TRANSIT_SCENARIO_ID",
            "SIMPLE_MODES_SCENARIO_ID",
            "DEPARTURE_SECONDS_SINCE_MIDNIGHT",
            "INFERENCE_SERVICE_URL",
            "CAR_OWNERSHIP_MODEL_PATH",
            "ZONES_GEOJSON_PATH",
            "VEHICLE_COST_TABLE_PATH",
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
        assert!(config.routing.transit_scenario.is_none());
        assert_eq!(config.routing.departure_seconds_since_midnight, 28_800);
        assert_eq!(config.model.model_path, PathBuf::from(DEFAULT_MODEL_PATH));
        assert_eq!(config.model.model_name(), "xgb_car_ownership_model");
        assert!(config.data.zones_geojson.is_none());
    }

    #[test]
    fn blank_scenarios_are_treated_as_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("TRANSIT_SCENARIO_ID", "  ");
        env::set_var("SIMPLE_MODES_SCENARIO_ID", "empty-scenario");
        let config = AppConfig::load().expect("config loads");
        let accessibility = config.routing.accessibility();
        assert!(accessibility.transit_scenario.is_none());
        assert_eq!(
            accessibility.simple_modes_scenario.as_deref(),
            Some("empty-scenario")
        );
        reset_env();
    }

    #[test]
    fn rejects_departure_past_midnight() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("DEPARTURE_SECONDS_SINCE_MIDNIGHT", "90000");
        match AppConfig::load() {
            Err(ConfigError::InvalidDepartureTime { value }) => assert_eq!(value, "90000"),
            other => panic!("expected departure error, got {other:?}"),
        }
        reset_env();
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
}
