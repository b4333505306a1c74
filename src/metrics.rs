//! Batch and run aggregation. Pure functions, no I/O.

use crate::document::Document;
use crate::gateway::OperationOutcome;

/// Outcome of one concurrent batch
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BatchResult {
    /// Retry generation the batch belonged to (0 for the first pass)
    pub generation: u32,
    pub batch_size: usize,
    pub successes: usize,
    /// Sum over successful operations only
    pub request_charge: f64,
    /// Wall-clock time of the whole concurrent group
    pub elapsed_ms: u64,
    /// Documents the store accepted; only counted, never replayed
    pub inserted: Vec<Document>,
}

impl BatchResult {
    pub fn failures(&self) -> usize {
        self.batch_size.saturating_sub(self.successes)
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary {
            generation: self.generation,
            batch_size: self.batch_size,
            successes: self.successes,
            request_charge: self.request_charge,
            elapsed_ms: self.elapsed_ms,
        }
    }
}

/// [`BatchResult`] without the inserted documents, kept per run
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BatchSummary {
    pub generation: u32,
    pub batch_size: usize,
    pub successes: usize,
    pub request_charge: f64,
    pub elapsed_ms: u64,
}

impl BatchSummary {
    pub fn failures(&self) -> usize {
        self.batch_size.saturating_sub(self.successes)
    }
}

/// Aggregate over every batch and retry generation of one ingestion request
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RunResult {
    pub requested: usize,
    pub successes: usize,
    pub request_charge: f64,
    /// Sum of batch times; cooldowns are excluded
    pub elapsed_ms: u64,
    pub generations: u32,
    pub batches: Vec<BatchSummary>,
}

impl RunResult {
    pub fn new(requested: usize) -> Self {
        Self {
            requested,
            ..Self::default()
        }
    }

    pub fn record(&mut self, batch: BatchSummary) {
        self.successes += batch.successes;
        self.request_charge += batch.request_charge;
        self.elapsed_ms += batch.elapsed_ms;
        self.generations = self.generations.max(batch.generation + 1);
        self.batches.push(batch);
    }

    pub fn shortfall(&self) -> usize {
        self.requested.saturating_sub(self.successes)
    }

    pub fn is_complete(&self) -> bool {
        self.shortfall() == 0
    }

    pub fn attempted(&self) -> usize {
        self.batches.iter().map(|b| b.batch_size).sum()
    }

    /// Inserted documents per second of batch time
    pub fn throughput(&self) -> f64 {
        per_second(self.successes as f64, self.elapsed_ms)
    }

    pub fn charge_per_second(&self) -> f64 {
        per_second(self.request_charge, self.elapsed_ms)
    }

    pub fn charge_per_document(&self) -> f64 {
        if self.successes == 0 {
            0.0
        } else {
            self.request_charge / self.successes as f64
        }
    }
}

fn per_second(amount: f64, elapsed_ms: u64) -> f64 {
    if elapsed_ms == 0 {
        0.0
    } else {
        amount / (elapsed_ms as f64 / 1000.0)
    }
}

/// Fold one batch's outcomes. `elapsed_ms` is the batch wall-clock time,
/// measured by the caller around the whole concurrent group.
pub fn aggregate_batch(
    generation: u32,
    outcomes: Vec<OperationOutcome>,
    elapsed_ms: u64,
) -> BatchResult {
    let batch_size = outcomes.len();
    let mut request_charge = 0.0;
    let mut inserted = Vec::new();

    for outcome in outcomes {
        if !outcome.is_success() {
            continue;
        }
        request_charge += outcome.request_charge;
        if let Some(doc) = outcome.document {
            inserted.push(doc);
        }
    }

    BatchResult {
        generation,
        batch_size,
        successes: inserted.len(),
        request_charge,
        elapsed_ms,
        inserted,
    }
}

/// Fold batches from any number of generations into a run total
pub fn aggregate_run(requested: usize, batches: &[BatchSummary]) -> RunResult {
    let mut run = RunResult::new(requested);
    for batch in batches {
        run.record(*batch);
    }
    run
}
