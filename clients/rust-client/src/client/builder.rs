use std::time::Duration;

use super::{DocumentClient, MasterKey};
use crate::protocol::ClientError;

const DEFAULT_API_VERSION: &str = "2018-12-31";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const DEFAULT_POOL_SIZE: usize = 64;

pub struct DocumentClientBuilder {
    endpoint: String,
    master_key: Option<String>,
    database: Option<String>,
    container: Option<String>,
    api_version: String,
    timeout: Duration,
    pool_size: usize,
    accept_invalid_certs: bool,
}

impl DocumentClientBuilder {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            master_key: None,
            database: None,
            container: None,
            api_version: DEFAULT_API_VERSION.to_string(),
            timeout: DEFAULT_TIMEOUT,
            pool_size: DEFAULT_POOL_SIZE,
            accept_invalid_certs: false,
        }
    }

    pub fn master_key(mut self, key: &str) -> Self {
        self.master_key = Some(key.to_string());
        self
    }

    pub fn database(mut self, database: &str) -> Self {
        self.database = Some(database.to_string());
        self
    }

    pub fn container(mut self, container: &str) -> Self {
        self.container = Some(container.to_string());
        self
    }

    pub fn api_version(mut self, version: &str) -> Self {
        self.api_version = version.to_string();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Idle connections kept per host; size it near the ingest concurrency limit
    pub fn pool_size(mut self, size: usize) -> Self {
        self.pool_size = size;
        self
    }

    /// The local emulator ships a self-signed certificate
    pub fn accept_invalid_certs(mut self, accept: bool) -> Self {
        self.accept_invalid_certs = accept;
        self
    }

    pub fn build(self) -> Result<DocumentClient, ClientError> {
        let key = self
            .master_key
            .as_deref()
            .ok_or_else(|| ClientError::AuthError("No master key configured".to_string()))
            .and_then(MasterKey::from_base64)?;
        let database = self
            .database
            .ok_or_else(|| ClientError::ProtocolError("No database specified".to_string()))?;
        let container = self
            .container
            .ok_or_else(|| ClientError::ProtocolError("No container specified".to_string()))?;

        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(self.pool_size)
            .danger_accept_invalid_certs(self.accept_invalid_certs)
            .build()
            .map_err(|e| {
                ClientError::ConnectionError(format!("Failed to build HTTP client: {}", e))
            })?;

        Ok(DocumentClient {
            endpoint: self.endpoint,
            database,
            container,
            key,
            api_version: self.api_version,
            pool_size: self.pool_size,
            client,
        })
    }
}
