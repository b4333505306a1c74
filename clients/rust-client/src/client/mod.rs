mod auth;
mod builder;
mod document;
mod procedure;
mod query;

pub use auth::{http_date, MasterKey};
pub use builder::DocumentClientBuilder;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::protocol::{
    parse_activity_id, parse_continuation, parse_request_charge, ClientError, DbResponse,
    PartitionKey, ResourceType,
};

pub(crate) const HEADER_DATE: &str = "x-ms-date";
pub(crate) const HEADER_VERSION: &str = "x-ms-version";
pub(crate) const HEADER_PARTITION_KEY: &str = "x-ms-documentdb-partitionkey";

/// Client bound to a single database/container pair
#[derive(Debug, Clone)]
pub struct DocumentClient {
    endpoint: String,
    database: String,
    container: String,
    key: MasterKey,
    api_version: String,
    pool_size: usize,
    client: reqwest::Client,
}

impl DocumentClient {
    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    /// Idle connections kept per host
    pub fn pool_size(&self) -> usize {
        self.pool_size
    }

    /// `dbs/{db}/colls/{container}`, the link documents are created and queried under
    pub fn container_link(&self) -> String {
        format!("dbs/{}/colls/{}", self.database, self.container)
    }

    pub(crate) fn document_link(&self, id: &str) -> String {
        format!("{}/docs/{}", self.container_link(), id)
    }

    pub(crate) fn procedure_link(&self, id: &str) -> String {
        format!("{}/sprocs/{}", self.container_link(), id)
    }

    fn signed_headers(
        &self,
        verb: &Method,
        resource_type: ResourceType,
        resource_link: &str,
    ) -> Result<HeaderMap, ClientError> {
        let date = http_date(chrono::Utc::now());
        let token = self
            .key
            .sign(verb.as_str(), resource_type.as_str(), resource_link, &date)?;

        let mut headers = HeaderMap::new();
        headers.insert(reqwest::header::AUTHORIZATION, header_value(&token)?);
        headers.insert(HeaderName::from_static(HEADER_DATE), header_value(&date)?);
        headers.insert(
            HeaderName::from_static(HEADER_VERSION),
            header_value(&self.api_version)?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Send a signed request. `path` is the URL path below the endpoint,
    /// `resource_link` the link that goes into the signature.
    #[allow(clippy::too_many_arguments)]
    pub(crate) async fn send<T>(
        &self,
        method: Method,
        resource_type: ResourceType,
        resource_link: &str,
        path: &str,
        partition_key: Option<&PartitionKey>,
        extra_headers: HeaderMap,
        body: Option<String>,
    ) -> Result<DbResponse<T>, ClientError>
    where
        T: DeserializeOwned,
    {
        let url = format!("{}/{}", self.endpoint, path);
        let mut headers = self.signed_headers(&method, resource_type, resource_link)?;
        if let Some(pk) = partition_key {
            headers.insert(
                HeaderName::from_static(HEADER_PARTITION_KEY),
                header_value(&pk.header_value())?,
            );
        }
        headers.extend(extra_headers);

        let mut request = self.client.request(method.clone(), &url).headers(headers);
        if let Some(b) = body {
            request = request.body(b);
        }

        let response = request.send().await?;
        let status = response.status();
        let request_charge = parse_request_charge(response.headers());
        let continuation = parse_continuation(response.headers());
        let activity_id = parse_activity_id(response.headers());

        debug!(
            "{} {} -> {} ({} RU)",
            method,
            path,
            status.as_u16(),
            request_charge
        );

        let text = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::Status {
                status: status.as_u16(),
                request_charge,
                message: error_message(&text),
            });
        }

        let body = if text.is_empty() {
            serde_json::from_str("null")
        } else {
            serde_json::from_str(&text)
        }
        .map_err(|e| ClientError::ProtocolError(format!("Failed to parse response: {}", e)))?;

        Ok(DbResponse {
            body,
            status: status.as_u16(),
            request_charge,
            continuation,
            activity_id,
        })
    }
}

fn header_value(value: &str) -> Result<HeaderValue, ClientError> {
    HeaderValue::from_str(value)
        .map_err(|e| ClientError::ProtocolError(format!("Invalid header value: {}", e)))
}

/// Store errors come back as `{"code": ..., "message": ...}`; fall back to the raw text.
fn error_message(text: &str) -> String {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(|s| s.to_string()))
        .unwrap_or_else(|| {
            if text.is_empty() {
                "Unknown error".to_string()
            } else {
                text.to_string()
            }
        })
}
