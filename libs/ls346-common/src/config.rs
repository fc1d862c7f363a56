//! Configuration Loading
//!
//! Layered configuration for the LakeShore 346 tools.
//!
//! Priority (highest to lowest):
//! 1. Environment variables prefixed with `LS346_` (`__` separates nesting
//!    levels, e.g. `LS346_TRANSFER__BATCH_SIZE=20`)
//! 2. Configuration file (YAML, TOML or JSON, chosen by extension)
//! 3. Built-in defaults

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use ls346_link::LinkConfig;
use ls346_protocol::MAX_CURVE_POINTS;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Environment variable prefix
pub const ENV_PREFIX: &str = "LS346_";

/// File looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "ls346.yaml";

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Instrument link
    pub link: LinkConfig,
    /// Curve transfer defaults
    pub transfer: TransferConfig,
    /// Logging
    pub logging: LoggingConfig,
}

/// Curve transfer defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Points per command line
    pub batch_size: usize,
    /// Points fetched by a curve read when no count is given
    pub read_points: usize,
    /// Name of the observable that receives transfer progress
    pub progress_name: String,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            batch_size: 10,
            read_points: MAX_CURVE_POINTS,
            progress_name: "curve:progress".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is not set
    pub level: String,
    /// Emit JSON lines instead of the bracketed text format
    pub json: bool,
    /// Directory for daily log files; console only when unset
    pub dir: Option<PathBuf>,
    /// Log file name prefix
    pub file_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
            dir: None,
            file_prefix: "ls346".to_string(),
        }
    }
}

impl AppConfig {
    /// Validate all sections
    pub fn validate(&self) -> Result<()> {
        self.link
            .validate()
            .map_err(|e| Error::Config(format!("link: {e}")))?;

        if self.transfer.batch_size == 0 {
            return Err(Error::Config(
                "transfer.batch_size must be greater than zero".to_string(),
            ));
        }

        if !(1..=MAX_CURVE_POINTS).contains(&self.transfer.read_points) {
            return Err(Error::Config(format!(
                "transfer.read_points must be between 1 and {MAX_CURVE_POINTS}, got {}",
                self.transfer.read_points
            )));
        }

        if self.transfer.progress_name.is_empty() {
            return Err(Error::Config(
                "transfer.progress_name cannot be empty".to_string(),
            ));
        }

        if self.logging.file_prefix.is_empty() {
            return Err(Error::Config(
                "logging.file_prefix cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Provider for a config file, picked by extension
fn file_provider(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::Config("Config file must have an extension".to_string()))?;

    match extension {
        "toml" => Ok(figment.merge(Toml::file(path))),
        "yaml" | "yml" => Ok(figment.merge(Yaml::file(path))),
        "json" => Ok(figment.merge(Json::file(path))),
        _ => Err(Error::Config(format!(
            "Unsupported config file format: {extension}"
        ))),
    }
}

fn build_figment(path: Option<&Path>, env_prefix: &str) -> Result<Figment> {
    let figment = Figment::from(Serialized::defaults(AppConfig::default()));

    let figment = match path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            file_provider(figment, path)?
        },
        // Optional: a missing default file is not an error
        None => figment.merge(Yaml::file(DEFAULT_CONFIG_FILE)),
    };

    Ok(figment.merge(Env::prefixed(env_prefix).split("__")))
}

/// Load configuration from defaults, an optional file and the environment
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    load_config_with_prefix(path, ENV_PREFIX)
}

fn load_config_with_prefix(path: Option<&Path>, env_prefix: &str) -> Result<AppConfig> {
    let config: AppConfig = build_figment(path, env_prefix)?.extract()?;
    config.validate()?;
    Ok(config)
}

/// Load configuration from a specific file, without environment overrides
pub fn load_config_from_file<P>(path: P) -> Result<AppConfig>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let figment = file_provider(Figment::from(Serialized::defaults(AppConfig::default())), path)?;
    let config: AppConfig = figment
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load {}: {e}", path.display())))?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::disallowed_methods)] // Test code - unwrap is acceptable
mod tests {
    use super::*;
    use ls346_link::LinkKind;
    use tempfile::TempDir;

    fn write_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.transfer.batch_size, 10);
        assert_eq!(config.transfer.read_points, 200);
        assert_eq!(config.transfer.progress_name, "curve:progress");
        assert_eq!(config.link.kind, LinkKind::Serial);
    }

    #[test]
    fn test_load_yaml_file_keeps_unset_defaults() {
        let dir = TempDir::new().unwrap();
        let path = write_file(
            &dir,
            "ls346.yaml",
            r#"
link:
  kind: tcp
  tcp:
    address: "10.0.0.5:4001"
transfer:
  batch_size: 5
"#,
        );

        let config = load_config_from_file(&path).unwrap();
        assert_eq!(config.link.kind, LinkKind::Tcp);
        assert_eq!(config.link.tcp.address, "10.0.0.5:4001");
        assert_eq!(config.link.tcp.connect_timeout_ms, 3000);
        assert_eq!(config.transfer.batch_size, 5);
        assert_eq!(config.transfer.read_points, 200);
    }

    #[test]
    fn test_load_toml_and_json() {
        let dir = TempDir::new().unwrap();
        let toml = write_file(
            &dir,
            "ls346.toml",
            "[link.serial]\nport = \"/dev/ttyS1\"\n\n[logging]\njson = true\n",
        );
        let config = load_config_from_file(&toml).unwrap();
        assert_eq!(config.link.serial.port, "/dev/ttyS1");
        assert_eq!(config.link.serial.baud_rate, 9600);
        assert!(config.logging.json);

        let json = write_file(&dir, "ls346.json", r#"{"transfer": {"read_points": 50}}"#);
        let config = load_config_from_file(&json).unwrap();
        assert_eq!(config.transfer.read_points, 50);
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "ls346.ini", "batch_size=5");
        assert!(matches!(
            load_config_from_file(&path),
            Err(Error::Config(msg)) if msg.contains("Unsupported")
        ));
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "bad.yaml", "transfer:\n  batch_size: 0\n");
        let err = load_config_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("transfer.batch_size"));

        let path = write_file(&dir, "bad_link.yaml", "link:\n  serial:\n    parity: Mark\n");
        let err = load_config_from_file(&path).unwrap_err();
        assert!(err.to_string().contains("link:"));

        let path = write_file(&dir, "bad_points.yaml", "transfer:\n  read_points: 201\n");
        assert!(load_config_from_file(&path).is_err());
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("missing.yaml");
        assert!(matches!(
            load_config(Some(&missing)),
            Err(Error::Config(msg)) if msg.contains("not found")
        ));
    }

    #[test]
    fn test_environment_overrides_file() {
        let dir = TempDir::new().unwrap();
        let path = write_file(&dir, "ls346.yaml", "transfer:\n  batch_size: 5\n");

        // Unique prefix keeps this test independent of the real environment
        std::env::set_var("LS346CFGTEST_TRANSFER__BATCH_SIZE", "25");
        std::env::set_var("LS346CFGTEST_LINK__KIND", "tcp");
        let config = load_config_with_prefix(Some(&path), "LS346CFGTEST_").unwrap();
        std::env::remove_var("LS346CFGTEST_TRANSFER__BATCH_SIZE");
        std::env::remove_var("LS346CFGTEST_LINK__KIND");

        assert_eq!(config.transfer.batch_size, 25);
        assert_eq!(config.link.kind, LinkKind::Tcp);
    }
}
