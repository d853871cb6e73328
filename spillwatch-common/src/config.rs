//! Configuration loading and resolution
//!
//! Settings resolve in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! The AIS credential is never held as process-global state; callers obtain
//! an explicit [`AisConfig`] and pass it into the aggregator call boundary.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::{Error, Result};

/// Default upstream AIS feed endpoint
pub const DEFAULT_UPSTREAM_URL: &str = "wss://stream.aisstream.io/v0/stream";

/// Full service settings, loaded from TOML with environment overrides
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub ais: AisSettings,
    #[serde(default)]
    pub collaborators: CollaboratorSettings,
}

/// HTTP server settings
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Origin allowed by the CORS layer (the dashboard dev server)
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5760
}

fn default_cors_origin() -> String {
    "http://localhost:3000".to_string()
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
        }
    }
}

/// Upstream AIS feed settings
#[derive(Debug, Clone, Deserialize)]
pub struct AisSettings {
    /// aisstream.io API key
    pub api_key: Option<String>,
    #[serde(default = "default_upstream_url")]
    pub upstream_url: String,
}

fn default_upstream_url() -> String {
    DEFAULT_UPSTREAM_URL.to_string()
}

impl Default for AisSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            upstream_url: default_upstream_url(),
        }
    }
}

/// Endpoints of the external collaborators the front-end proxies to
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CollaboratorSettings {
    /// Image-classification predictor service
    pub predictor_url: Option<String>,
    /// Alert email dispatch service
    pub alert_url: Option<String>,
}

/// Explicit configuration handed to the feed aggregator per invocation
#[derive(Debug, Clone)]
pub struct AisConfig {
    pub api_key: String,
    pub upstream_url: String,
}

impl Settings {
    /// Load settings following the 4-tier priority order.
    ///
    /// A config path supplied on the command line must exist; the
    /// environment/default paths are used only when present on disk.
    pub fn load(cli_path: Option<&Path>) -> Result<Settings> {
        let mut settings = match resolve_config_path(cli_path)? {
            Some(path) => {
                let contents = std::fs::read_to_string(&path)?;
                toml::from_str(&contents).map_err(|e| {
                    Error::Config(format!("failed to parse {}: {}", path.display(), e))
                })?
            }
            None => Settings::default(),
        };
        settings.apply_env_overrides();
        Ok(settings)
    }

    /// Environment variables take priority over file values
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("SPILLWATCH_AIS_API_KEY") {
            self.ais.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("SPILLWATCH_AIS_UPSTREAM_URL") {
            self.ais.upstream_url = url;
        }
        if let Ok(url) = std::env::var("SPILLWATCH_PREDICTOR_URL") {
            self.collaborators.predictor_url = Some(url);
        }
        if let Ok(url) = std::env::var("SPILLWATCH_ALERT_URL") {
            self.collaborators.alert_url = Some(url);
        }
    }

    /// Explicit AIS feed configuration for one aggregation call.
    ///
    /// Errors when no API key is configured.
    pub fn ais_config(&self) -> Result<AisConfig> {
        let api_key = self
            .ais
            .api_key
            .clone()
            .filter(|key| !key.is_empty())
            .ok_or_else(|| Error::Config("AIS API key not configured".to_string()))?;
        Ok(AisConfig {
            api_key,
            upstream_url: self.ais.upstream_url.clone(),
        })
    }
}

/// Resolve the config file path: CLI arg, then SPILLWATCH_CONFIG, then the
/// platform config directory.
fn resolve_config_path(cli_path: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = cli_path {
        if !path.exists() {
            return Err(Error::Config(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Some(path.to_path_buf()));
    }

    if let Ok(path) = std::env::var("SPILLWATCH_CONFIG") {
        let path = PathBuf::from(path);
        if path.exists() {
            return Ok(Some(path));
        }
        return Err(Error::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    let default_path = dirs::config_dir().map(|d| d.join("spillwatch").join("config.toml"));
    match default_path {
        Some(path) if path.exists() => Ok(Some(path)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.server.host, "127.0.0.1");
        assert_eq!(settings.server.port, 5760);
        assert_eq!(settings.server.cors_origin, "http://localhost:3000");
        assert_eq!(settings.ais.upstream_url, DEFAULT_UPSTREAM_URL);
        assert!(settings.ais.api_key.is_none());
        assert!(settings.collaborators.predictor_url.is_none());
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
            [server]
            host = "0.0.0.0"
            port = 8080
            cors_origin = "https://dashboard.example"

            [ais]
            api_key = "abc123"
            upstream_url = "ws://localhost:9999/stream"

            [collaborators]
            predictor_url = "http://localhost:8500/predict"
            alert_url = "http://localhost:8501/alerts"
        "#;
        let settings: Settings = toml::from_str(toml).unwrap();
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.ais.api_key.as_deref(), Some("abc123"));
        assert_eq!(settings.ais.upstream_url, "ws://localhost:9999/stream");
        assert_eq!(
            settings.collaborators.predictor_url.as_deref(),
            Some("http://localhost:8500/predict")
        );
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let settings: Settings = toml::from_str("[ais]\napi_key = \"k\"\n").unwrap();
        assert_eq!(settings.server.port, 5760);
        assert_eq!(settings.ais.upstream_url, DEFAULT_UPSTREAM_URL);
    }

    #[test]
    fn test_ais_config_requires_api_key() {
        let settings = Settings::default();
        assert!(settings.ais_config().is_err());

        let mut settings = Settings::default();
        settings.ais.api_key = Some(String::new());
        assert!(settings.ais_config().is_err());

        settings.ais.api_key = Some("k".to_string());
        let config = settings.ais_config().unwrap();
        assert_eq!(config.api_key, "k");
        assert_eq!(config.upstream_url, DEFAULT_UPSTREAM_URL);
    }
}
