//! Server configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Prefix for environment overrides, e.g. `BIKE_DEMAND_PORT=9000`
pub const ENV_PREFIX: &str = "BIKE_DEMAND";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,

    /// HTTP port
    pub port: u16,

    /// Postcard model artifact written by `bike-demand train`
    pub model_path: PathBuf,

    /// Schema file (JSON array or processed CSV); defaults to the schema
    /// stored in the model artifact
    pub schema_path: Option<PathBuf>,

    /// Scaler fitted by `bike-demand prepare`, applied to encoded records
    pub scaler_path: Option<PathBuf>,

    /// Serve random mock predictions when the model file is missing
    pub allow_mock: bool,

    /// Tracing filter directive, overridden by `RUST_LOG`
    pub log_level: String,

    /// Enable permissive CORS
    pub cors: bool,

    /// Install the Prometheus recorder and serve `/metrics`
    pub enable_metrics: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            model_path: PathBuf::from("models/model.bin"),
            schema_path: None,
            scaler_path: None,
            allow_mock: false,
            log_level: "info".to_string(),
            cors: true,
            enable_metrics: true,
        }
    }
}

impl ServerConfig {
    /// Load `config/server.{toml,yaml,json}` if present, then `BIKE_DEMAND_*`
    /// environment variables, over the defaults
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from("config/server")
    }

    /// Load from an explicit config file stem
    pub fn load_from(file_stem: &str) -> anyhow::Result<Self> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_stem).required(false))
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to read config: {}", e))?;

        cfg.try_deserialize()
            .map_err(|e| anyhow::anyhow!("Failed to deserialize config: {}", e))
    }

    /// One-line description for the startup log
    pub fn summary(&self) -> String {
        format!(
            "listening on {}, model {}, scaler {}, mock {}",
            self.bind_addr(),
            self.model_path.display(),
            self.scaler_path
                .as_ref()
                .map_or_else(|| "none".to_string(), |p| p.display().to_string()),
            if self.allow_mock { "allowed" } else { "disabled" }
        )
    }

    /// `host:port`
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_config_default() {
        let config = ServerConfig::default();

        assert_eq!(config.bind_addr(), "0.0.0.0:5000");
        assert_eq!(config.model_path, PathBuf::from("models/model.bin"));
        assert!(config.schema_path.is_none());
        assert!(config.scaler_path.is_none());
        assert!(!config.allow_mock);
        assert!(config.cors);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let stem = dir.path().join("server");
        std::fs::write(
            stem.with_extension("toml"),
            "port = 8081\nallow_mock = true\nscaler_path = \"models/scaler.json\"\n",
        )
        .unwrap();

        let config = ServerConfig::load_from(stem.to_str().unwrap()).unwrap();
        assert_eq!(config.port, 8081);
        assert!(config.allow_mock);
        assert_eq!(config.scaler_path, Some(PathBuf::from("models/scaler.json")));
        // untouched keys keep their defaults
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_summary() {
        let config = ServerConfig {
            scaler_path: Some(PathBuf::from("models/scaler.json")),
            ..Default::default()
        };
        assert_eq!(
            config.summary(),
            "listening on 0.0.0.0:5000, model models/model.bin, scaler models/scaler.json, mock disabled"
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let config = ServerConfig::load_from("/nonexistent/server").unwrap();
        assert_eq!(config.port, ServerConfig::default().port);
    }
}
