//! Configuration management
//!
//! This module handles loading and saving the dt configuration file.
//! The configuration file is stored in TOML format at ~/.config/dt/config.toml,
//! or in the directory named by `DT_CONFIG_DIR`.
//!
//! Files written for another schema_version are rejected.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Environment variable overriding the configuration directory
pub const CONFIG_DIR_ENV: &str = "DT_CONFIG_DIR";

/// Default output format
const DEFAULT_OUTPUT: &str = "human";

/// Main configuration structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Schema version for migration support
    pub schema_version: u32,

    /// Default settings
    #[serde(default)]
    pub defaults: Defaults,

    /// Object store connection
    #[serde(default)]
    pub store: StoreConfig,
}

/// Default settings for CLI behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Defaults {
    /// Output format: "human" or "json"
    #[serde(default = "default_output")]
    pub output: String,

    /// Emit colored output
    #[serde(default = "default_true")]
    pub color: bool,
}

fn default_output() -> String {
    DEFAULT_OUTPUT.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: true,
        }
    }
}

/// Connection settings for the object store
///
/// Without static credentials the AWS default provider chain is used, which
/// reads `AWS_ACCESS_KEY_ID` and `AWS_SECRET_ACCESS_KEY` among others.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Custom endpoint URL for S3-compatible stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// AWS region
    #[serde(default = "default_region")]
    pub region: String,

    /// Access key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Secret access key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,

    /// Bucket lookup style: "auto", "path", or "dns"
    #[serde(default = "default_bucket_lookup")]
    pub bucket_lookup: String,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_bucket_lookup() -> String {
    "auto".to_string()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            region: default_region(),
            access_key: None,
            secret_key: None,
            bucket_lookup: default_bucket_lookup(),
        }
    }
}

// Keeps the secret out of debug logs
impl std::fmt::Debug for StoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreConfig")
            .field("endpoint", &self.endpoint)
            .field("region", &self.region)
            .field("access_key", &self.access_key)
            .field("secret_key", &self.secret_key.as_ref().map(|_| "***"))
            .field("bucket_lookup", &self.bucket_lookup)
            .finish()
    }
}

impl StoreConfig {
    /// Check endpoint, bucket lookup style and credential pairing
    pub fn validate(&self) -> Result<()> {
        if let Some(endpoint) = &self.endpoint {
            let url = url::Url::parse(endpoint)?;
            if url.scheme() != "http" && url.scheme() != "https" {
                return Err(Error::Config(format!(
                    "endpoint must be an http(s) URL: {endpoint}"
                )));
            }
        }

        if !matches!(self.bucket_lookup.as_str(), "auto" | "path" | "dns") {
            return Err(Error::Config(format!(
                "bucket_lookup must be auto, path or dns, got '{}'",
                self.bucket_lookup
            )));
        }

        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(Error::Config(
                "access_key and secret_key must be set together".into(),
            ));
        }

        Ok(())
    }

    /// Static key pair, if both halves are configured
    pub fn static_credentials(&self) -> Option<(&str, &str)> {
        match (&self.access_key, &self.secret_key) {
            (Some(access), Some(secret)) => Some((access.as_str(), secret.as_str())),
            _ => None,
        }
    }

    /// Whether requests should use path-style addressing
    pub fn force_path_style(&self) -> bool {
        // Custom endpoints rarely have wildcard DNS for bucket subdomains
        match self.bucket_lookup.as_str() {
            "path" => true,
            "dns" => false,
            _ => self.endpoint.is_some(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            defaults: Defaults::default(),
            store: StoreConfig::default(),
        }
    }
}

/// Configuration manager handles loading and saving config
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => PathBuf::from(dir),
            None => dirs::config_dir()
                .ok_or_else(|| Error::Config("Could not determine config directory".into()))?
                .join("dt"),
        };
        Ok(Self {
            config_path: config_dir.join("config.toml"),
        })
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// If the configuration file doesn't exist, returns a default configuration.
    /// Any schema version other than the current one is rejected.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            tracing::debug!(
                "No configuration at {}, using defaults",
                self.config_path.display()
            );
            return Ok(Config::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: Config = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade dt.",
                config.schema_version, SCHEMA_VERSION
            )));
        } else if config.schema_version < SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is not supported, expected {}",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        config.store.validate()?;
        Ok(config)
    }

    /// Save configuration to disk
    ///
    /// Creates parent directories if they don't exist.
    /// Sets file permissions to 600 (owner read/write only).
    pub fn save(&self, config: &Config) -> Result<()> {
        config.store.validate()?;

        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        std::fs::write(&self.config_path, content)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let permissions = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&self.config_path, permissions)?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_config_manager() -> (ConfigManager, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let manager = ConfigManager::with_path(config_path);
        (manager, temp_dir)
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.defaults.output, "human");
        assert!(config.defaults.color);
        assert!(config.store.endpoint.is_none());
        assert_eq!(config.store.region, "us-east-1");
        assert!(config.store.static_credentials().is_none());
    }

    #[test]
    fn test_load_nonexistent_returns_default() {
        let (manager, _temp_dir) = temp_config_manager();
        let config = manager.load().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_save_and_load() {
        let (manager, _temp_dir) = temp_config_manager();

        let mut config = Config::default();
        config.store.endpoint = Some("http://localhost:9000".to_string());
        config.store.access_key = Some("minioadmin".to_string());
        config.store.secret_key = Some("minioadmin".to_string());
        config.store.bucket_lookup = "path".to_string();

        manager.save(&config).unwrap();
        let loaded = manager.load().unwrap();

        assert_eq!(loaded, config);
        assert_eq!(
            loaded.store.static_credentials(),
            Some(("minioadmin", "minioadmin"))
        );
    }

    #[test]
    fn test_partial_store_section_uses_defaults() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(
            manager.config_path(),
            "schema_version = 1\n[store]\nendpoint = \"https://s3.example.org\"\n",
        )
        .unwrap();

        let config = manager.load().unwrap();
        assert_eq!(config.store.endpoint.as_deref(), Some("https://s3.example.org"));
        assert_eq!(config.store.bucket_lookup, "auto");
        assert!(config.store.force_path_style());
    }

    #[test]
    fn test_schema_version_too_new() {
        let (manager, _temp_dir) = temp_config_manager();

        let content = format!("schema_version = {}\n", SCHEMA_VERSION + 1);
        std::fs::write(manager.config_path(), content).unwrap();

        let result = manager.load();
        assert!(result.is_err());
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("newer than supported")
        );
    }

    #[test]
    fn test_schema_version_too_old() {
        let (manager, _temp_dir) = temp_config_manager();
        std::fs::write(manager.config_path(), "schema_version = 0\n").unwrap();

        let err = manager.load().unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("not supported"));
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let store = StoreConfig {
            endpoint: Some("ftp://example.org".to_string()),
            ..Default::default()
        };
        assert!(matches!(store.validate(), Err(Error::Config(_))));

        let store = StoreConfig {
            endpoint: Some("not a url".to_string()),
            ..Default::default()
        };
        assert!(matches!(store.validate(), Err(Error::InvalidUrl(_))));

        let store = StoreConfig {
            access_key: Some("only-half".to_string()),
            ..Default::default()
        };
        assert!(store.validate().is_err());

        let store = StoreConfig {
            bucket_lookup: "virtual".to_string(),
            ..Default::default()
        };
        assert!(store.validate().is_err());
    }

    #[test]
    fn test_debug_hides_secret() {
        let store = StoreConfig {
            access_key: Some("AKIA".to_string()),
            secret_key: Some("hunter2".to_string()),
            ..Default::default()
        };
        let debug = format!("{store:?}");
        assert!(debug.contains("AKIA"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_force_path_style() {
        let mut store = StoreConfig::default();
        assert!(!store.force_path_style());
        store.bucket_lookup = "path".to_string();
        assert!(store.force_path_style());
        store.endpoint = Some("http://localhost:9000".to_string());
        store.bucket_lookup = "dns".to_string();
        assert!(!store.force_path_style());
    }
}
