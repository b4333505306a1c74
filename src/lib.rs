//! docbench: load-testing harness for Cosmos-style document databases.
//!
//! Generates synthetic documents, inserts them in bounded concurrent
//! batches, runs point-read and query trials, and appends each trial's
//! elapsed time and request charge to CSV reports.

pub mod cli;
pub mod config;
pub mod document;
pub mod error;
pub mod gateway;
pub mod harness;
pub mod ingest;
pub mod metrics;
pub mod report;

pub use config::BenchConfig;
pub use document::{Document, DocumentGenerator, GeneratorConfig, TimeWindow};
pub use error::{BenchError, BenchResult};
pub use gateway::{
    DocumentStore, Failure, FailureKind, OperationOutcome, ProcedureOutcome, QueryResult,
    RestGateway, COUNT_UNAVAILABLE,
};
pub use harness::Harness;
pub use ingest::{IngestEngine, IngestOptions};
pub use metrics::{BatchResult, BatchSummary, RunResult};
pub use report::{ReportSink, RetryPolicy, TrialMetrics};
