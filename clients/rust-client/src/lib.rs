//! docbench REST client
//!
//! Thin async transport for a Cosmos-style document API: master-key request
//! signing, partition-key routing, request-charge accounting and
//! continuation-token paging.
//!
//! # Example
//!
//! ```no_run
//! use docbench_client::{DocumentClientBuilder, PartitionKey};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), docbench_client::ClientError> {
//!     let client = DocumentClientBuilder::new("https://localhost:8081")
//!         .master_key("C2y6yDjf5/R+ob0N8A7Cgv30VRDJIWEHLM+4QDU5DE2nQ9nDuVTqobD4b8mGGyPMbIZnqyMsEcaGQy67XIw/Jw==")
//!         .database("FunctionTestDatabase")
//!         .container("DocRefContainer")
//!         .build()?;
//!
//!     let doc = serde_json::json!({"id": "doc-1", "spUrl": "https://example"});
//!     let created = client
//!         .create_document(&doc, &PartitionKey::from("doc-1"))
//!         .await?;
//!     println!("charge: {} RU", created.request_charge);
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod protocol;

pub use client::{DocumentClient, DocumentClientBuilder, MasterKey};
pub use protocol::{
    ClientError, DbResponse, PartitionKey, QueryPage, QueryRequest, ResourceType,
    COUNT_QUERY,
};
