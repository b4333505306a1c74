//! Database gateway
//!
//! The only boundary between the harness and the remote store. Every call
//! returns a typed outcome; transport and backend errors are folded into
//! [`Failure`] here and never reach callers as errors.

mod rest;

pub use rest::RestGateway;

use serde_json::Value;
use std::fmt;

use crate::document::Document;

/// Sentinel returned by [`DocumentStore::count`] when the count could not be fetched
pub const COUNT_UNAVAILABLE: i64 = -1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    NotFound,
    Throttled,
    Conflict,
    /// Any other non-success status from the store
    Rejected(u16),
    /// Connection, timeout or decoding problem
    Transport,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::NotFound => write!(f, "not found"),
            FailureKind::Throttled => write!(f, "throttled"),
            FailureKind::Conflict => write!(f, "conflict"),
            FailureKind::Rejected(status) => write!(f, "rejected ({})", status),
            FailureKind::Transport => write!(f, "transport"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Result of a single create or point read
#[derive(Debug, Clone, PartialEq)]
pub struct OperationOutcome {
    /// Echoed document on success
    pub document: Option<Document>,
    /// Units charged by the store; rejected calls can carry a charge too
    pub request_charge: f64,
    pub elapsed_ms: u64,
    pub failure: Option<Failure>,
}

impl OperationOutcome {
    pub fn success(document: Document, request_charge: f64, elapsed_ms: u64) -> Self {
        Self {
            document: Some(document),
            request_charge,
            elapsed_ms,
            failure: None,
        }
    }

    pub fn failed(failure: Failure, request_charge: f64, elapsed_ms: u64) -> Self {
        Self {
            document: None,
            request_charge,
            elapsed_ms,
            failure: Some(failure),
        }
    }

    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn is_not_found(&self) -> bool {
        matches!(&self.failure, Some(f) if f.kind == FailureKind::NotFound)
    }
}

/// Fully drained query result
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    /// Rows in page order
    pub documents: Vec<Value>,
    /// Sum of every page's charge
    pub request_charge: f64,
    pub page_charges: Vec<f64>,
    /// Covers the whole drain, not just the first page
    pub elapsed_ms: u64,
    /// Container count fetched after the query
    pub document_count: i64,
    /// Set if draining stopped early; rows fetched before the failure are kept
    pub failure: Option<Failure>,
}

impl QueryResult {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn pages(&self) -> usize {
        self.page_charges.len()
    }
}

/// Result of a stored-procedure execution
#[derive(Debug, Clone, PartialEq)]
pub struct ProcedureOutcome {
    pub body: Option<Value>,
    pub request_charge: f64,
    pub elapsed_ms: u64,
    pub failure: Option<Failure>,
}

impl ProcedureOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Request/response contract against the remote document store.
///
/// Implementations must not panic or return errors; every problem becomes a
/// failure outcome (or [`COUNT_UNAVAILABLE`] for counts).
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one document, routed by its partition-key value
    async fn create_one(&self, document: Document) -> OperationOutcome;

    /// Point read by id; a missing document fails with [`FailureKind::NotFound`]
    async fn read_one(&self, id: &str) -> OperationOutcome;

    /// Run a query and drain every page
    async fn query(&self, query_text: &str) -> QueryResult;

    /// Total document count, or [`COUNT_UNAVAILABLE`]
    async fn count(&self) -> i64;

    async fn execute_procedure(
        &self,
        procedure_id: &str,
        partition_key: &str,
        params: Vec<Value>,
    ) -> ProcedureOutcome;
}

#[async_trait::async_trait]
impl<S: DocumentStore + ?Sized> DocumentStore for std::sync::Arc<S> {
    async fn create_one(&self, document: Document) -> OperationOutcome {
        (**self).create_one(document).await
    }

    async fn read_one(&self, id: &str) -> OperationOutcome {
        (**self).read_one(id).await
    }

    async fn query(&self, query_text: &str) -> QueryResult {
        (**self).query(query_text).await
    }

    async fn count(&self) -> i64 {
        (**self).count().await
    }

    async fn execute_procedure(
        &self,
        procedure_id: &str,
        partition_key: &str,
        params: Vec<Value>,
    ) -> ProcedureOutcome {
        (**self)
            .execute_procedure(procedure_id, partition_key, params)
            .await
    }
}
