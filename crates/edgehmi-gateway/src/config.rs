use std::{collections::HashMap, net::SocketAddr, time::Duration};

use serde::{Deserialize, Serialize};

use edgehmi_core::{SERVICE_PLACEHOLDER, ServiceRegistry};

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), String> {
        // Server validations
        if self.server.port == 0 {
            return Err("server.port must be > 0".into());
        }
        if self.server.body_limit_bytes == 0 {
            return Err("server.body_limit_bytes must be > 0".into());
        }
        // Upstream validations
        if self.upstream.connect_timeout_ms == 0
            || self.upstream.request_timeout_ms == 0
            || self.upstream.discovery_timeout_ms == 0
        {
            return Err("upstream timeouts must be > 0".into());
        }
        // Logging validation
        let lvl = self.logging.level.to_ascii_lowercase();
        let valid_levels = ["trace", "debug", "info", "warn", "error", "off"];
        if !valid_levels.contains(&lvl.as_str()) {
            return Err(format!("logging.level must be one of {valid_levels:?}"));
        }
        // Registry validation: template shape, service name syntax, duplicates
        self.registry().map_err(|e| e.to_string())?;
        Ok(())
    }

    /// Builds the immutable service registry from the gateway and upstream
    /// sections. Order of `gateway.services` is preserved.
    pub fn registry(&self) -> edgehmi_core::Result<ServiceRegistry> {
        ServiceRegistry::from_template(
            &self.gateway.services,
            &self.upstream.base_url_template,
            &self.upstream.overrides,
        )
    }

    pub fn addr(&self) -> SocketAddr {
        use std::net::{IpAddr, Ipv4Addr};
        let host: IpAddr = self
            .server
            .host
            .parse()
            .unwrap_or(IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)));
        SocketAddr::from((host, self.server.port))
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream.connect_timeout_ms)
    }
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream.request_timeout_ms)
    }
    pub fn discovery_timeout(&self) -> Duration {
        Duration::from_millis(self.upstream.discovery_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_body_limit")]
    pub body_limit_bytes: usize,
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    8000
}
fn default_body_limit() -> usize {
    1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            body_limit_bytes: default_body_limit(),
        }
    }
}

/// The table services this gateway fronts, in aggregation precedence order.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GatewayConfig {
    #[serde(default)]
    pub services: Vec<String>,
}

/// Where and how to reach the table service backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Base URL template; `{service}` is replaced with the service name.
    /// Matches the docker-compose convention of one container per table.
    #[serde(default = "default_base_url_template")]
    pub base_url_template: String,

    /// Per-service base URL overrides, keyed by service name.
    #[serde(default)]
    pub overrides: HashMap<String, String>,

    /// TCP connect timeout for all backend calls.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// End-to-end deadline for a proxied request.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// End-to-end deadline for one OpenAPI discovery fetch.
    #[serde(default = "default_discovery_timeout_ms")]
    pub discovery_timeout_ms: u64,
}

fn default_base_url_template() -> String {
    format!("http://{SERVICE_PLACEHOLDER}:8000")
}
fn default_connect_timeout_ms() -> u64 {
    2_000
}
fn default_request_timeout_ms() -> u64 {
    30_000
}
fn default_discovery_timeout_ms() -> u64 {
    3_000
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url_template: default_base_url_template(),
            overrides: HashMap::new(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            discovery_timeout_ms: default_discovery_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".into()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

pub mod loader {
    use super::AppConfig;
    use config::{Config, Environment, File};
    use std::path::PathBuf;

    pub fn load_config(path: Option<&str>) -> Result<AppConfig, String> {
        let mut builder = Config::builder();
        match path {
            Some(p) => {
                let pathbuf = PathBuf::from(p);
                if pathbuf.exists() {
                    builder = builder.add_source(File::from(pathbuf));
                }
            }
            None => {
                // Try default root-level file
                let default_path = PathBuf::from("edgehmi.toml");
                if default_path.exists() {
                    builder = builder.add_source(File::from(default_path));
                }
            }
        }
        // Environment variable overrides, e.g., EDGEHMI__SERVER__PORT=9090
        builder = builder.add_source(
            Environment::with_prefix("EDGEHMI")
                .try_parsing(true)
                .separator("__"),
        );
        let cfg = builder
            .build()
            .map_err(|e| format!("config build error: {e}"))?;
        let merged: AppConfig = cfg
            .try_deserialize()
            .map_err(|e| format!("config deserialize error: {e}"))?;
        // Validate
        merged.validate()?;
        Ok(merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let cfg = AppConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.server.port, 8000);
        assert_eq!(cfg.upstream.base_url_template, "http://{service}:8000");
        assert!(cfg.gateway.services.is_empty());
    }

    #[test]
    fn test_port_zero_rejected() {
        let mut cfg = AppConfig::default();
        cfg.server.port = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("server.port"));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut cfg = AppConfig::default();
        cfg.upstream.request_timeout_ms = 0;
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("timeouts"));
    }

    #[test]
    fn test_unknown_log_level_rejected() {
        let mut cfg = AppConfig::default();
        cfg.logging.level = "loud".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_duplicate_service_rejected() {
        let mut cfg = AppConfig::default();
        cfg.gateway.services = vec!["line_mst".into(), "line_mst".into()];
        let err = cfg.validate().unwrap_err();
        assert!(err.contains("Duplicate service name"));
    }

    #[test]
    fn test_template_without_placeholder_rejected() {
        let mut cfg = AppConfig::default();
        cfg.gateway.services = vec!["line_mst".into()];
        cfg.upstream.base_url_template = "http://backend:8000".into();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_registry_resolves_overrides() {
        let mut cfg = AppConfig::default();
        cfg.gateway.services = vec!["work_order".into(), "parts_mst".into()];
        cfg.upstream
            .overrides
            .insert("parts_mst".into(), "http://127.0.0.1:9100".into());

        let registry = cfg.registry().unwrap();
        assert_eq!(
            registry.upstream_base("work_order"),
            Some("http://work_order:8000")
        );
        assert_eq!(
            registry.upstream_base("parts_mst"),
            Some("http://127.0.0.1:9100")
        );
    }
}
