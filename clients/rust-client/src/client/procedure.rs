use reqwest::header::HeaderMap;
use reqwest::Method;
use serde_json::Value;

use super::DocumentClient;
use crate::protocol::{ClientError, DbResponse, PartitionKey, ResourceType};

impl DocumentClient {
    /// Execute a registered stored procedure. `params` is sent as the JSON
    /// argument array; the procedure runs inside the given partition.
    pub async fn execute_procedure(
        &self,
        procedure_id: &str,
        partition_key: &PartitionKey,
        params: &[Value],
    ) -> Result<DbResponse<Value>, ClientError> {
        let link = self.procedure_link(procedure_id);
        let body = serde_json::to_string(params)
            .map_err(|e| ClientError::ProtocolError(format!("Failed to encode params: {}", e)))?;

        self.send(
            Method::POST,
            ResourceType::StoredProcedures,
            &link,
            &link,
            Some(partition_key),
            HeaderMap::new(),
            Some(body),
        )
        .await
    }
}
