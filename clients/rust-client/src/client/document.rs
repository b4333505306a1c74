use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;

use super::DocumentClient;
use crate::protocol::{ClientError, DbResponse, PartitionKey, ResourceType};

impl DocumentClient {
    /// Create a document; the store rejects duplicate ids with 409.
    pub async fn create_document(
        &self,
        document: &Value,
        partition_key: &PartitionKey,
    ) -> Result<DbResponse<Value>, ClientError> {
        let link = self.container_link();
        let body = serde_json::to_string(document)
            .map_err(|e| ClientError::ProtocolError(format!("Failed to encode document: {}", e)))?;

        self.send(
            Method::POST,
            ResourceType::Documents,
            &link,
            &format!("{}/docs", link),
            Some(partition_key),
            HeaderMap::new(),
            Some(body),
        )
        .await
    }

    /// Point read by id. A missing document surfaces as `ClientError::Status { status: 404, .. }`.
    pub async fn read_document(
        &self,
        id: &str,
        partition_key: &PartitionKey,
    ) -> Result<DbResponse<Value>, ClientError> {
        let link = self.document_link(id);
        self.send(
            Method::GET,
            ResourceType::Documents,
            &link,
            &link,
            Some(partition_key),
            HeaderMap::new(),
            None,
        )
        .await
    }
}
