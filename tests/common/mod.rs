//! Common test utilities
//!
//! Provides an in-memory `DocumentStore` with scripted create failures, and
//! helpers that wire engines and harnesses around it.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use docbench::config::ReportConfig;
use docbench::{
    Document, DocumentGenerator, DocumentStore, Failure, FailureKind, GeneratorConfig, Harness,
    IngestEngine, IngestOptions, OperationOutcome, ProcedureOutcome, QueryResult, ReportSink,
    RetryPolicy, COUNT_UNAVAILABLE,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde_json::{json, Value};

pub const CREATE_CHARGE: f64 = 5.0;
pub const READ_CHARGE: f64 = 1.0;
pub const PAGE_CHARGE: f64 = 2.5;

/// Which creates fail
#[derive(Debug, Clone, Copy)]
pub enum Script {
    AcceptAll,
    /// The first n create calls fail, later ones succeed
    FailFirst(usize),
    FailAlways,
    /// Every n-th create call (1-based) fails
    FailEvery(usize),
}

pub struct MemoryStore {
    script: Script,
    docs: Mutex<BTreeMap<String, Document>>,
    create_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    count_calls: AtomicUsize,
    count_unavailable: bool,
}

impl MemoryStore {
    pub fn new(script: Script) -> Arc<Self> {
        Arc::new(Self::build(script, false))
    }

    pub fn without_count(script: Script) -> Arc<Self> {
        Arc::new(Self::build(script, true))
    }

    fn build(script: Script, count_unavailable: bool) -> Self {
        Self {
            script,
            docs: Mutex::new(BTreeMap::new()),
            create_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            count_calls: AtomicUsize::new(0),
            count_unavailable,
        }
    }

    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn count_calls(&self) -> usize {
        self.count_calls.load(Ordering::SeqCst)
    }

    pub fn stored(&self) -> usize {
        self.docs.lock().unwrap().len()
    }

    pub fn ids(&self) -> Vec<String> {
        self.docs.lock().unwrap().keys().cloned().collect()
    }

    fn should_fail(&self, call: usize) -> bool {
        match self.script {
            Script::AcceptAll => false,
            Script::FailFirst(n) => call < n,
            Script::FailAlways => true,
            Script::FailEvery(n) => (call + 1) % n == 0,
        }
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryStore {
    async fn create_one(&self, document: Document) -> OperationOutcome {
        let call = self.create_calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        // Let every other create in the batch start before this one settles
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.should_fail(call) {
            return OperationOutcome::failed(
                Failure::new(FailureKind::Throttled, "Request rate is large"),
                0.0,
                1,
            );
        }

        let mut docs = self.docs.lock().unwrap();
        if docs.contains_key(&document.id) {
            return OperationOutcome::failed(
                Failure::new(FailureKind::Conflict, "Entity already exists"),
                1.0,
                1,
            );
        }
        docs.insert(document.id.clone(), document.clone());
        OperationOutcome::success(document, CREATE_CHARGE, 1)
    }

    async fn read_one(&self, id: &str) -> OperationOutcome {
        match self.docs.lock().unwrap().get(id) {
            Some(doc) => OperationOutcome::success(doc.clone(), READ_CHARGE, 2),
            None => OperationOutcome::failed(
                Failure::new(FailureKind::NotFound, "Resource Not Found"),
                READ_CHARGE,
                2,
            ),
        }
    }

    async fn query(&self, _query_text: &str) -> QueryResult {
        let documents: Vec<Value> = self
            .docs
            .lock()
            .unwrap()
            .values()
            .map(Document::to_value)
            .collect();
        let pages = documents.len().div_ceil(2).max(1);
        QueryResult {
            documents,
            request_charge: PAGE_CHARGE * pages as f64,
            page_charges: vec![PAGE_CHARGE; pages],
            elapsed_ms: 3,
            document_count: self.count().await,
            failure: None,
        }
    }

    async fn count(&self) -> i64 {
        self.count_calls.fetch_add(1, Ordering::SeqCst);
        if self.count_unavailable {
            COUNT_UNAVAILABLE
        } else {
            self.stored() as i64
        }
    }

    async fn execute_procedure(
        &self,
        procedure_id: &str,
        partition_key: &str,
        params: Vec<Value>,
    ) -> ProcedureOutcome {
        ProcedureOutcome {
            body: Some(json!({
                "procedure": procedure_id,
                "partitionKey": partition_key,
                "params": params,
            })),
            request_charge: 3.0,
            elapsed_ms: 4,
            failure: None,
        }
    }
}

pub fn seeded_generator(seed: u64) -> DocumentGenerator {
    DocumentGenerator::new(GeneratorConfig::default(), StdRng::seed_from_u64(seed))
}

pub fn create_engine(
    store: Arc<MemoryStore>,
    max_generations: u32,
) -> IngestEngine<Arc<MemoryStore>> {
    IngestEngine::new(
        store,
        seeded_generator(17),
        IngestOptions::without_cooldown(max_generations),
    )
}

pub fn report_config(dir: &Path) -> ReportConfig {
    ReportConfig {
        directory: dir.to_path_buf(),
        retry_attempts: 2,
        retry_backoff_ms: 1,
        ..ReportConfig::default()
    }
}

pub fn create_harness(
    store: Arc<MemoryStore>,
    concurrency_limit: usize,
    dir: &Path,
) -> Harness<Arc<MemoryStore>> {
    let reports = report_config(dir);
    Harness::new(
        create_engine(store, 5),
        concurrency_limit,
        ReportSink::new(RetryPolicy {
            attempts: reports.retry_attempts,
            backoff: std::time::Duration::from_millis(reports.retry_backoff_ms),
        }),
        reports,
    )
}
