// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Catalog configuration
//!
//! Loaded from YAML (`griddle-config.yaml`) with the discovery order
//! documented on [`CatalogConfig::discover_config`], then overridden from the
//! environment so container deployments can inject connection settings.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::repository::{PostgresConfig, StorageBackend};

/// Bucket used when the S3 backend is selected purely from the environment
pub const DEFAULT_BUCKET: &str = "griddle-assets";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// Relational store; absent means in-memory repositories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<DatabaseConfig>,

    #[serde(default)]
    pub object_store: ObjectStoreBackend,

    /// Directory for staged uploads and downloaded scratch files
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scratch_dir: Option<PathBuf>,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string
    pub url: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

/// Object store backend selection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ObjectStoreBackend {
    /// Blobs as files under `base_path`
    Local { base_path: PathBuf },

    /// S3-compatible bucket
    S3 {
        bucket: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        endpoint: Option<String>,
        #[serde(default = "default_region")]
        region: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        access_key_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        secret_access_key: Option<String>,
    },

    /// Process-local map, lost on restart
    Memory,
}

impl Default for ObjectStoreBackend {
    fn default() -> Self {
        ObjectStoreBackend::Local {
            base_path: PathBuf::from("./griddle-data/objects"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (e.g. "info", "griddle_catalog_core=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default)]
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    #[serde(alias = "text")]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Install the Prometheus exporter at startup
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

fn default_max_connections() -> u32 {
    5
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_metrics_port() -> u16 {
    9091
}

impl CatalogConfig {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Parse configuration from YAML string
    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. GRIDDLE_CONFIG_PATH environment variable
    /// 2. ./griddle-config.yaml (working directory)
    /// 3. ~/.griddle/config.yaml (user home)
    /// 4. /etc/griddle/config.yaml (system, Unix) or C:\ProgramData\Griddle\config.yaml (Windows)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("GRIDDLE_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./griddle-config.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".griddle").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        let system_config = PathBuf::from("/etc/griddle/config.yaml");
        #[cfg(windows)]
        let system_config = PathBuf::from("C:\\ProgramData\\Griddle\\config.yaml");

        if system_config.exists() {
            return Some(system_config);
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(explicit_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // .env is optional; a missing file is not an error
        let _ = dotenvy::dotenv();
        Self::load_with(explicit_path, |name| std::env::var(name).ok())
    }

    fn load_with(
        explicit_path: Option<PathBuf>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> anyhow::Result<Self> {
        let mut config = if let Some(path) = explicit_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            Self::from_yaml_file(&path).map_err(|e| {
                anyhow::anyhow!("Failed to load config at {:?}: {}", path, e)
            })?
        } else if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            Self::from_yaml_file(config_path)?
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            Self::default()
        };

        config.apply_overrides_from(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|name| std::env::var(name).ok());
    }

    fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DATABASE_URL") {
            tracing::info!("Environment override: DATABASE_URL");
            match self.database.as_mut() {
                Some(db) => db.url = url,
                None => {
                    self.database = Some(DatabaseConfig {
                        url,
                        max_connections: default_max_connections(),
                    })
                }
            }
        }

        if let Some(url) = lookup("AWS_ENDPOINT_URL") {
            tracing::info!("Environment override: AWS_ENDPOINT_URL={}", url);
            match &mut self.object_store {
                ObjectStoreBackend::S3 { endpoint, .. } => *endpoint = Some(url),
                _ => {
                    self.object_store = ObjectStoreBackend::S3 {
                        bucket: DEFAULT_BUCKET.to_string(),
                        endpoint: Some(url),
                        region: default_region(),
                        access_key_id: None,
                        secret_access_key: None,
                    }
                }
            }
        }

        if let ObjectStoreBackend::S3 {
            access_key_id,
            secret_access_key,
            ..
        } = &mut self.object_store
        {
            if let Some(val) = lookup("AWS_ACCESS_KEY_ID") {
                tracing::info!("Environment override: AWS_ACCESS_KEY_ID");
                *access_key_id = Some(val);
            }
            if let Some(val) = lookup("AWS_SECRET_ACCESS_KEY") {
                tracing::info!("Environment override: AWS_SECRET_ACCESS_KEY");
                *secret_access_key = Some(val);
            }
        }

        if let Some(dir) = lookup("GRIDDLE_SCRATCH_DIR") {
            tracing::info!("Environment override: GRIDDLE_SCRATCH_DIR={}", dir);
            self.scratch_dir = Some(PathBuf::from(dir));
        }

        if let Some(level) = lookup("GRIDDLE_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if let Some(db) = &self.database {
            if db.url.trim().is_empty() {
                anyhow::bail!("database.url cannot be empty");
            }
            if db.max_connections == 0 {
                anyhow::bail!("database.max_connections must be at least 1");
            }
        }

        match &self.object_store {
            ObjectStoreBackend::S3 { bucket, .. } if bucket.trim().is_empty() => {
                anyhow::bail!("object_store.bucket cannot be empty");
            }
            ObjectStoreBackend::Local { base_path } if base_path.as_os_str().is_empty() => {
                anyhow::bail!("object_store.base_path cannot be empty");
            }
            _ => {}
        }

        Ok(())
    }

    /// Effective scratch directory
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("griddle-scratch"))
    }

    /// Repository backend implied by the database section
    pub fn storage_backend(&self) -> StorageBackend {
        match &self.database {
            Some(db) => StorageBackend::PostgreSQL(PostgresConfig {
                connection_string: db.url.clone(),
                max_connections: db.max_connections,
            }),
            None => StorageBackend::InMemory,
        }
    }
}
