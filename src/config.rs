//! Harness configuration
//!
//! Settings come from `docbench.toml` (every key optional), then a `.env`
//! file next to it, then environment variables, then command-line flags.
//!
//! ## Environment Variables
//!
//! - `DOCBENCH_ENDPOINT` - Account endpoint URL
//! - `DOCBENCH_KEY` - Base64 master key
//! - `DOCBENCH_DATABASE` - Target database
//! - `DOCBENCH_CONTAINER` - Target container
//! - `DOCBENCH_CONCURRENCY` - Ingest concurrency limit

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::document::GeneratorConfig;
use crate::error::{BenchError, BenchResult};
use crate::ingest::IngestOptions;
use crate::report::RetryPolicy;

/// Configuration file name
pub const CONFIG_FILE_NAME: &str = "docbench.toml";

/// Environment variable names
pub const ENV_ENDPOINT: &str = "DOCBENCH_ENDPOINT";
pub const ENV_KEY: &str = "DOCBENCH_KEY";
pub const ENV_DATABASE: &str = "DOCBENCH_DATABASE";
pub const ENV_CONTAINER: &str = "DOCBENCH_CONTAINER";
pub const ENV_CONCURRENCY: &str = "DOCBENCH_CONCURRENCY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BenchConfig {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub report: ReportConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Account endpoint, e.g. `https://myaccount.documents.azure.com:443`
    pub endpoint: String,
    /// Base64 master key
    pub master_key: String,
    pub database: String,
    pub container: String,
    /// JSON path of the partition key inside each document
    pub partition_key_path: String,
    pub api_version: String,
    pub request_timeout_secs: u64,
    /// Needed for the local emulator's self-signed certificate
    pub accept_invalid_certs: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            master_key: String::new(),
            database: "FunctionTestDatabase".to_string(),
            container: "DocRefContainer".to_string(),
            partition_key_path: "/id".to_string(),
            api_version: "2018-12-31".to_string(),
            request_timeout_secs: 60,
            accept_invalid_certs: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub concurrency_limit: usize,
    pub cooldown_ms: u64,
    pub max_generations: u32,
    pub max_retry_delay_ms: u64,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            concurrency_limit: 5000,
            cooldown_ms: 2000,
            max_generations: 5,
            max_retry_delay_ms: 30_000,
        }
    }
}

impl IngestConfig {
    pub fn options(&self) -> IngestOptions {
        IngestOptions {
            cooldown: Duration::from_millis(self.cooldown_ms),
            max_generations: self.max_generations,
            max_retry_delay: Duration::from_millis(self.max_retry_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub directory: PathBuf,
    pub insert_file: String,
    pub read_file: String,
    pub query_file: String,
    /// Automatic attempts before asking the contention handler
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("."),
            insert_file: "Cosmos_Insert_Test".to_string(),
            read_file: "Cosmos_Read_By_Id_Test".to_string(),
            query_file: "Cosmos_Query_Test".to_string(),
            retry_attempts: 5,
            retry_backoff_ms: 500,
        }
    }
}

impl ReportConfig {
    /// `<directory>/<name>.csv`
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.directory.join(format!("{}.csv", name))
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            attempts: self.retry_attempts,
            backoff: Duration::from_millis(self.retry_backoff_ms),
        }
    }
}

impl BenchConfig {
    /// Load configuration.
    ///
    /// An explicit path must exist; without one, `docbench.toml` in the
    /// working directory is used when present and defaults otherwise.
    pub fn load(path: Option<&Path>) -> BenchResult<Self> {
        let (config_path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (PathBuf::from(CONFIG_FILE_NAME), false),
        };

        let config_dir = config_path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let env_path = config_dir.join(".env");
        if env_path.exists() {
            let _ = dotenvy::from_path(&env_path);
        }

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_toml_str(&content)?
        } else if required {
            return Err(BenchError::Config(format!(
                "Configuration file not found: {}",
                config_path.display()
            )));
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(content: &str) -> BenchResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply environment variable overrides to the configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(endpoint) = std::env::var(ENV_ENDPOINT) {
            if !endpoint.is_empty() {
                self.connection.endpoint = endpoint;
            }
        }

        if let Ok(key) = std::env::var(ENV_KEY) {
            if !key.is_empty() {
                self.connection.master_key = key;
            }
        }

        if let Ok(database) = std::env::var(ENV_DATABASE) {
            if !database.is_empty() {
                self.connection.database = database;
            }
        }

        if let Ok(container) = std::env::var(ENV_CONTAINER) {
            if !container.is_empty() {
                self.connection.container = container;
            }
        }

        if let Ok(limit) = std::env::var(ENV_CONCURRENCY) {
            if let Ok(limit) = limit.parse::<usize>() {
                self.ingest.concurrency_limit = limit;
            }
        }
    }

    pub fn validate(&self) -> BenchResult<()> {
        if self.ingest.concurrency_limit == 0 {
            return Err(BenchError::Config(
                "ingest.concurrency_limit must be at least 1".to_string(),
            ));
        }
        if self.ingest.max_generations == 0 {
            return Err(BenchError::Config(
                "ingest.max_generations must be at least 1".to_string(),
            ));
        }
        if !self.connection.partition_key_path.starts_with('/') {
            return Err(BenchError::Config(format!(
                "partition_key_path '{}' must start with '/'",
                self.connection.partition_key_path
            )));
        }
        self.generator.validate()
    }

    /// Connection settings are only needed once a store is contacted.
    pub fn require_connection(&self) -> BenchResult<()> {
        if self.connection.endpoint.is_empty() {
            return Err(BenchError::Config(format!(
                "No endpoint configured (set connection.endpoint or {})",
                ENV_ENDPOINT
            )));
        }
        if self.connection.master_key.is_empty() {
            return Err(BenchError::Config(format!(
                "No master key configured (set connection.master_key or {})",
                ENV_KEY
            )));
        }
        Ok(())
    }
}
