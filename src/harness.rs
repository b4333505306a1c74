//! Trial harness: runs ingestion, point-read, query and stored-procedure
//! trials and records each one in its report.

use rand::rngs::StdRng;
use rand::Rng;
use serde_json::Value;
use std::time::Duration;
use tracing::info;

use docbench_client::DocumentClientBuilder;

use crate::config::{BenchConfig, ReportConfig};
use crate::document::DocumentGenerator;
use crate::error::{BenchError, BenchResult};
use crate::gateway::{DocumentStore, OperationOutcome, ProcedureOutcome, QueryResult, RestGateway};
use crate::ingest::IngestEngine;
use crate::metrics::RunResult;
use crate::report::{FileDestination, ReportSink, TrialMetrics};

pub struct Harness<S, R = StdRng> {
    engine: IngestEngine<S, R>,
    concurrency_limit: usize,
    sink: ReportSink,
    reports: ReportConfig,
}

impl Harness<RestGateway> {
    /// Harness against the configured account, using the REST gateway
    pub fn connect(config: &BenchConfig) -> BenchResult<Self> {
        config.require_connection()?;
        let connection = &config.connection;

        let client = DocumentClientBuilder::new(&connection.endpoint)
            .master_key(&connection.master_key)
            .database(&connection.database)
            .container(&connection.container)
            .api_version(&connection.api_version)
            .timeout(Duration::from_secs(connection.request_timeout_secs))
            .pool_size(config.ingest.concurrency_limit)
            .accept_invalid_certs(connection.accept_invalid_certs)
            .build()?;

        info!(
            "Connected to {} ({}/{})",
            connection.endpoint, connection.database, connection.container
        );

        let gateway = RestGateway::new(client, &connection.partition_key_path);
        let engine = IngestEngine::new(
            gateway,
            DocumentGenerator::from_config(config.generator.clone()),
            config.ingest.options(),
        );

        Ok(Self::new(
            engine,
            config.ingest.concurrency_limit,
            ReportSink::new(config.report.retry_policy()),
            config.report.clone(),
        ))
    }
}

impl<S: DocumentStore, R: Rng> Harness<S, R> {
    pub fn new(
        engine: IngestEngine<S, R>,
        concurrency_limit: usize,
        sink: ReportSink,
        reports: ReportConfig,
    ) -> Self {
        Self {
            engine,
            concurrency_limit,
            sink,
            reports,
        }
    }

    pub fn store(&self) -> &S {
        self.engine.store()
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    pub fn set_concurrency_limit(&mut self, limit: usize) {
        self.concurrency_limit = limit;
    }

    pub fn engine_mut(&mut self) -> &mut IngestEngine<S, R> {
        &mut self.engine
    }

    pub fn sink_mut(&mut self) -> &mut ReportSink {
        &mut self.sink
    }

    pub fn reports(&self) -> &ReportConfig {
        &self.reports
    }

    pub async fn document_count(&self) -> i64 {
        self.store().count().await
    }

    /// Insert `count` documents; the row holds the count after the run.
    pub async fn insert(&mut self, count: usize) -> BenchResult<RunResult> {
        let run = self.engine.insert(count, self.concurrency_limit).await?;
        if count == 0 {
            return Ok(run);
        }

        let trial = TrialMetrics {
            document_count: self.document_count().await,
            elapsed_ms: run.elapsed_ms,
            request_charge: run.request_charge,
        };
        self.record(&self.reports.insert_file, &[trial]).await?;
        Ok(run)
    }

    /// Read each id in turn, one trial per id in a single row.
    pub async fn point_reads(&self, ids: &[String]) -> BenchResult<Vec<OperationOutcome>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut outcomes = Vec::with_capacity(ids.len());
        for id in ids {
            let outcome = self.store().read_one(id).await;
            match &outcome.failure {
                None => info!(
                    "Read {} in {}ms, {} RU",
                    id, outcome.elapsed_ms, outcome.request_charge
                ),
                Some(failure) => info!("Read {} failed: {}", id, failure),
            }
            outcomes.push(outcome);
        }

        let document_count = self.document_count().await;
        let trials: Vec<TrialMetrics> = outcomes
            .iter()
            .map(|o| TrialMetrics {
                document_count,
                elapsed_ms: o.elapsed_ms,
                request_charge: o.request_charge,
            })
            .collect();
        self.record(&self.reports.read_file, &trials).await?;
        Ok(outcomes)
    }

    pub async fn query(&self, query_text: &str) -> BenchResult<QueryResult> {
        let query_text = query_text.trim();
        if query_text.is_empty() {
            return Err(BenchError::InvalidArgument("query text is empty".to_string()));
        }

        let result = self.store().query(query_text).await;
        info!(
            "Query returned {} rows over {} pages in {}ms, {:.2} RU",
            result.documents.len(),
            result.pages(),
            result.elapsed_ms,
            result.request_charge
        );

        let trial = TrialMetrics {
            document_count: result.document_count,
            elapsed_ms: result.elapsed_ms,
            request_charge: result.request_charge,
        };
        self.record(&self.reports.query_file, &[trial]).await?;
        Ok(result)
    }

    /// `params_json` is either a JSON array of parameters or one value.
    pub async fn execute_procedure(
        &self,
        procedure_id: &str,
        partition_key: &str,
        params_json: &str,
    ) -> BenchResult<ProcedureOutcome> {
        if procedure_id.trim().is_empty() {
            return Err(BenchError::InvalidArgument(
                "stored procedure id is empty".to_string(),
            ));
        }
        let params = parse_params(params_json)?;
        Ok(self
            .store()
            .execute_procedure(procedure_id.trim(), partition_key, params)
            .await)
    }

    async fn record(&self, report_name: &str, trials: &[TrialMetrics]) -> BenchResult<()> {
        let destination = FileDestination::new(self.reports.path_for(report_name));
        self.sink.append(trials, &destination).await
    }
}

fn parse_params(params_json: &str) -> BenchResult<Vec<Value>> {
    let params_json = params_json.trim();
    if params_json.is_empty() {
        return Ok(Vec::new());
    }
    match serde_json::from_str(params_json)? {
        Value::Array(values) => Ok(values),
        value => Ok(vec![value]),
    }
}
