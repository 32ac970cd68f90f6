//! Triage configuration loading
//!
//! Loads configuration from `~/.config/triage/triage.toml` (or the
//! `TRIAGE_CONFIG` env var). A missing file means defaults.
//! `TRIAGE_MODEL_DISABLED` switches the local model off regardless of the
//! file, leaving only the keyword classifier.

use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::Result;
use crate::error::TriageError;

/// Root configuration
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
pub struct TriageConfig {
    /// Local model runner settings
    #[serde(default)]
    pub model: ModelConfig,

    /// Web server settings
    #[serde(default)]
    pub server: ServerConfig,
}

/// Local model runner settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ModelConfig {
    /// Master switch for model use; off means keyword-only classification
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Runner executable
    #[serde(default = "default_binary")]
    pub binary: String,

    /// Model name passed to `<binary> run`
    #[serde(default = "default_model")]
    pub model: String,

    /// Per-attempt timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_enabled() -> bool {
    true
}

fn default_binary() -> String {
    "ollama".to_string()
}

fn default_model() -> String {
    "llama2".to_string()
}

fn default_timeout_secs() -> u64 {
    90
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            binary: default_binary(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl ModelConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Web server settings
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ServerConfig {
    /// Listen address
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Where uploaded files are stored
    #[serde(default = "default_upload_dir")]
    pub upload_dir: PathBuf,

    /// Show the invocation diagnostics on the result page
    #[serde(default = "default_show_debug")]
    pub show_debug: bool,
}

fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_upload_dir() -> PathBuf {
    PathBuf::from("uploads")
}

fn default_show_debug() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            upload_dir: default_upload_dir(),
            show_debug: default_show_debug(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.bind.parse().map_err(|e| {
            TriageError::config_with_source(format!("invalid bind address {:?}", self.bind), e)
        })
    }
}

impl TriageConfig {
    /// Environment variable for config path override
    pub const ENV_CONFIG_PATH: &'static str = "TRIAGE_CONFIG";

    /// Environment variable that disables the local model
    pub const ENV_MODEL_DISABLED: &'static str = "TRIAGE_MODEL_DISABLED";

    /// Default config filename
    pub const DEFAULT_CONFIG_FILENAME: &'static str = "triage.toml";

    /// Load configuration from file, then apply environment overrides.
    ///
    /// Resolution order:
    /// 1. `TRIAGE_CONFIG` environment variable
    /// 2. `~/.config/triage/triage.toml`
    pub fn load() -> Result<Self> {
        let path = Self::resolve_config_path();

        let mut cfg = if path.exists() {
            Self::load_from_path(&path)?
        } else {
            tracing::info!(
                path = %path.display(),
                "triage config not found, using defaults"
            );
            Self::default()
        };

        cfg.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(cfg)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            TriageError::config_with_source(
                format!("failed to read config at {}", path.display()),
                e,
            )
        })?;

        Self::parse(&contents)
    }

    /// Parse configuration from TOML string
    pub fn parse(contents: &str) -> Result<Self> {
        let cfg: TriageConfig = toml::from_str(contents)
            .map_err(|e| TriageError::config_with_source("failed to parse config", e))?;

        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply overrides read through `lookup` (normally the process env).
    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(Self::ENV_MODEL_DISABLED)
            && is_truthy(&value)
        {
            tracing::info!("{} set, model invocation disabled", Self::ENV_MODEL_DISABLED);
            self.model.enabled = false;
        }
    }

    fn resolve_config_path() -> PathBuf {
        if let Ok(path) = std::env::var(Self::ENV_CONFIG_PATH) {
            return PathBuf::from(path);
        }

        dirs::home_dir()
            .map(|h| {
                h.join(".config")
                    .join("triage")
                    .join(Self::DEFAULT_CONFIG_FILENAME)
            })
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_CONFIG_FILENAME))
    }

    fn validate(&self) -> Result<()> {
        if self.model.timeout_secs == 0 {
            return Err(TriageError::config("model.timeout_secs must be positive"));
        }
        if self.model.binary.trim().is_empty() {
            return Err(TriageError::config("model.binary must not be empty"));
        }
        if self.model.model.trim().is_empty() {
            return Err(TriageError::config("model.model must not be empty"));
        }
        self.server.bind_addr()?;
        Ok(())
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_config() {
        let cfg = TriageConfig::default();
        assert!(cfg.model.enabled);
        assert_eq!(cfg.model.binary, "ollama");
        assert_eq!(cfg.model.model, "llama2");
        assert_eq!(cfg.model.timeout(), Duration::from_secs(90));
        assert_eq!(cfg.server.bind, "127.0.0.1:5000");
        assert_eq!(cfg.server.upload_dir, PathBuf::from("uploads"));
    }

    #[test]
    fn test_parse_empty_config_is_default() {
        let cfg = TriageConfig::parse("").expect("should parse");
        assert_eq!(cfg, TriageConfig::default());
    }

    #[test]
    fn test_parse_full_config() {
        let toml = r#"
            [model]
            enabled = false
            binary = "/opt/ollama/bin/ollama"
            model = "mistral"
            timeout_secs = 30

            [server]
            bind = "0.0.0.0:8080"
            upload_dir = "/var/lib/triage/uploads"
            show_debug = false
        "#;

        let cfg = TriageConfig::parse(toml).expect("should parse");
        assert!(!cfg.model.enabled);
        assert_eq!(cfg.model.binary, "/opt/ollama/bin/ollama");
        assert_eq!(cfg.model.model, "mistral");
        assert_eq!(cfg.model.timeout_secs, 30);
        assert_eq!(cfg.server.bind_addr().expect("addr").port(), 8080);
        assert!(!cfg.server.show_debug);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = TriageConfig::parse("[model]\ntimeout_secs = 0").unwrap_err();
        assert!(err.to_string().contains("timeout_secs"), "{err}");
    }

    #[test]
    fn test_empty_binary_rejected() {
        assert!(TriageConfig::parse("[model]\nbinary = \"  \"").is_err());
    }

    #[test]
    fn test_bad_bind_rejected() {
        assert!(TriageConfig::parse("[server]\nbind = \"localhost\"").is_err());
    }

    #[test]
    fn test_malformed_toml_rejected() {
        let err = TriageConfig::parse("[model\nenabled = ").unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn test_env_override_disables_model() {
        for value in ["1", "true", "YES", " on "] {
            let mut cfg = TriageConfig::default();
            cfg.apply_env_overrides(|key| {
                (key == TriageConfig::ENV_MODEL_DISABLED).then(|| value.to_string())
            });
            assert!(!cfg.model.enabled, "value {value:?} should disable");
        }
    }

    #[test]
    fn test_env_override_ignores_falsy_values() {
        let mut cfg = TriageConfig::default();
        cfg.apply_env_overrides(|_| Some("0".to_string()));
        assert!(cfg.model.enabled);

        cfg.apply_env_overrides(|_| None);
        assert!(cfg.model.enabled);
    }

    #[test]
    fn test_load_from_path() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("triage.toml");
        std::fs::write(&path, "[model]\nmodel = \"phi3\"\n").expect("write");

        let cfg = TriageConfig::load_from_path(&path).expect("should load");
        assert_eq!(cfg.model.model, "phi3");
        assert!(TriageConfig::load_from_path(&dir.path().join("missing.toml")).is_err());
    }
}
