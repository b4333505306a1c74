use docbench_client::{ClientError, DocumentClient, PartitionKey, QueryRequest};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, warn};

use super::{
    DocumentStore, Failure, FailureKind, OperationOutcome, ProcedureOutcome, QueryResult,
    COUNT_UNAVAILABLE,
};
use crate::document::Document;

/// [`DocumentStore`] over the REST client
pub struct RestGateway {
    client: DocumentClient,
    partition_key_path: String,
    page_size: Option<u32>,
}

impl RestGateway {
    pub fn new(client: DocumentClient, partition_key_path: &str) -> Self {
        Self {
            client,
            partition_key_path: partition_key_path.to_string(),
            page_size: None,
        }
    }

    /// Cap rows per query page (store default otherwise)
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }

    pub fn client(&self) -> &DocumentClient {
        &self.client
    }

    /// Id lookups for containers not partitioned by id: a cross-partition
    /// query for the single matching row.
    async fn read_by_query(&self, id: &str, started: Instant) -> OperationOutcome {
        let request = QueryRequest::new("SELECT * FROM c WHERE c.id = @id")
            .with_parameter("@id", Value::String(id.to_string()));

        let mut continuation: Option<String> = None;
        let mut charge = 0.0;
        loop {
            match self
                .client
                .query_page(&request, continuation.as_deref(), self.page_size)
                .await
            {
                Ok(page) => {
                    charge += page.request_charge;
                    if let Some(row) = page.body.documents.into_iter().next() {
                        return decode_document(row, charge, elapsed_ms(started));
                    }
                    match page.continuation {
                        Some(token) => continuation = Some(token),
                        None => break,
                    }
                }
                Err(e) => {
                    return OperationOutcome::failed(
                        to_failure(&e),
                        charge + e.request_charge(),
                        elapsed_ms(started),
                    )
                }
            }
        }

        OperationOutcome::failed(
            Failure::new(FailureKind::NotFound, format!("Document '{}' not found", id)),
            charge,
            elapsed_ms(started),
        )
    }
}

#[async_trait::async_trait]
impl DocumentStore for RestGateway {
    async fn create_one(&self, document: Document) -> OperationOutcome {
        let started = Instant::now();
        let pk = match document.partition_key_value(&self.partition_key_path) {
            Some(value) => PartitionKey::from(value),
            None => {
                return OperationOutcome::failed(
                    Failure::new(
                        FailureKind::Rejected(400),
                        format!(
                            "Document {} has no value at partition key path {}",
                            document.id, self.partition_key_path
                        ),
                    ),
                    0.0,
                    elapsed_ms(started),
                )
            }
        };

        match self.client.create_document(&document.to_value(), &pk).await {
            Ok(response) => {
                let echoed = serde_json::from_value(response.body).unwrap_or(document);
                OperationOutcome::success(echoed, response.request_charge, elapsed_ms(started))
            }
            Err(e) => {
                debug!("create {} failed: {}", document.id, e);
                OperationOutcome::failed(to_failure(&e), e.request_charge(), elapsed_ms(started))
            }
        }
    }

    async fn read_one(&self, id: &str) -> OperationOutcome {
        let started = Instant::now();
        if self.partition_key_path != "/id" {
            return self.read_by_query(id, started).await;
        }

        match self
            .client
            .read_document(id, &PartitionKey::from(id))
            .await
        {
            Ok(response) => {
                decode_document(response.body, response.request_charge, elapsed_ms(started))
            }
            Err(e) => {
                debug!("read {} failed: {}", id, e);
                OperationOutcome::failed(to_failure(&e), e.request_charge(), elapsed_ms(started))
            }
        }
    }

    async fn query(&self, query_text: &str) -> QueryResult {
        let started = Instant::now();
        let request = QueryRequest::new(query_text);
        let mut documents = Vec::new();
        let mut page_charges = Vec::new();
        let mut continuation: Option<String> = None;
        let mut failure = None;

        loop {
            match self
                .client
                .query_page(&request, continuation.as_deref(), self.page_size)
                .await
            {
                Ok(page) => {
                    debug!(
                        "query page {}: {} rows, {} RU",
                        page_charges.len() + 1,
                        page.body.documents.len(),
                        page.request_charge
                    );
                    page_charges.push(page.request_charge);
                    documents.extend(page.body.documents);
                    match page.continuation {
                        Some(token) => continuation = Some(token),
                        None => break,
                    }
                }
                Err(e) => {
                    warn!("Query failed after {} pages: {}", page_charges.len(), e);
                    if e.request_charge() > 0.0 {
                        page_charges.push(e.request_charge());
                    }
                    failure = Some(to_failure(&e));
                    break;
                }
            }
        }

        let elapsed = elapsed_ms(started);
        let document_count = self.count().await;

        QueryResult {
            documents,
            request_charge: page_charges.iter().sum(),
            page_charges,
            elapsed_ms: elapsed,
            document_count,
            failure,
        }
    }

    async fn count(&self) -> i64 {
        match self.client.count_documents().await {
            Ok(response) => response.body,
            Err(e) => {
                warn!("Document count failed: {}", e);
                COUNT_UNAVAILABLE
            }
        }
    }

    async fn execute_procedure(
        &self,
        procedure_id: &str,
        partition_key: &str,
        params: Vec<Value>,
    ) -> ProcedureOutcome {
        let started = Instant::now();
        match self
            .client
            .execute_procedure(procedure_id, &PartitionKey::from(partition_key), &params)
            .await
        {
            Ok(response) => ProcedureOutcome {
                body: Some(response.body),
                request_charge: response.request_charge,
                elapsed_ms: elapsed_ms(started),
                failure: None,
            },
            Err(e) => {
                warn!("Stored procedure {} failed: {}", procedure_id, e);
                ProcedureOutcome {
                    body: None,
                    request_charge: e.request_charge(),
                    elapsed_ms: elapsed_ms(started),
                    failure: Some(to_failure(&e)),
                }
            }
        }
    }
}

fn decode_document(body: Value, charge: f64, elapsed: u64) -> OperationOutcome {
    match serde_json::from_value::<Document>(body) {
        Ok(doc) => OperationOutcome::success(doc, charge, elapsed),
        Err(e) => OperationOutcome::failed(
            Failure::new(
                FailureKind::Transport,
                format!("Unexpected document shape: {}", e),
            ),
            charge,
            elapsed,
        ),
    }
}

fn to_failure(err: &ClientError) -> Failure {
    let kind = match err.status() {
        Some(404) => FailureKind::NotFound,
        Some(429) => FailureKind::Throttled,
        Some(409) => FailureKind::Conflict,
        Some(status) => FailureKind::Rejected(status),
        None => FailureKind::Transport,
    };
    Failure::new(kind, err.to_string())
}

fn elapsed_ms(started: Instant) -> u64 {
    started.elapsed().as_millis() as u64
}
