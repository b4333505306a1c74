use futures::future::join_all;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::Rng;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use super::{plan_batches, IngestOptions};
use crate::document::{Document, DocumentGenerator};
use crate::error::{BenchError, BenchResult};
use crate::gateway::DocumentStore;
use crate::metrics::{aggregate_batch, BatchResult, RunResult};

/// Drives batched concurrent inserts against a [`DocumentStore`].
///
/// In-flight creates never exceed the concurrency limit: a batch is fully
/// settled before the next one is dispatched, and generations run one after
/// another.
pub struct IngestEngine<S, R = StdRng> {
    store: S,
    generator: DocumentGenerator<R>,
    options: IngestOptions,
    progress: ProgressBar,
}

impl<S: DocumentStore, R: Rng> IngestEngine<S, R> {
    pub fn new(store: S, generator: DocumentGenerator<R>, options: IngestOptions) -> Self {
        Self {
            store,
            generator,
            options,
            progress: ProgressBar::hidden(),
        }
    }

    /// Report inserted documents on `progress`
    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.set_progress(progress);
        self
    }

    pub fn set_progress(&mut self, progress: ProgressBar) {
        self.progress = progress;
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    /// Insert `total` freshly generated documents.
    ///
    /// Returns once `total` documents were accepted or `max_generations`
    /// passes ran; a remaining shortfall is reported in the result, not as
    /// an error.
    pub async fn insert(
        &mut self,
        total: usize,
        concurrency_limit: usize,
    ) -> BenchResult<RunResult> {
        if concurrency_limit == 0 {
            return Err(BenchError::InvalidArgument(
                "concurrency limit must be at least 1".to_string(),
            ));
        }

        let mut run = RunResult::new(total);
        if total == 0 {
            return Ok(run);
        }

        self.progress.reset();
        self.progress.set_length(total as u64);

        let max_generations = self.options.max_generations.max(1);
        let mut remaining = total;
        let mut generation = 0;

        while remaining > 0 && generation < max_generations {
            if generation > 0 {
                let delay = self.options.retry_delay(generation);
                info!(
                    "Retrying shortfall of {} documents (generation {} of {}) after {:?}",
                    remaining,
                    generation + 1,
                    max_generations,
                    delay
                );
                pause(delay).await;
            }

            let inserted = self
                .run_generation(generation, remaining, concurrency_limit, &mut run)
                .await;
            remaining -= inserted;
            generation += 1;
        }

        self.progress.finish();

        if remaining > 0 {
            warn!(
                "Gave up after {} generations: {} of {} documents inserted, {} attempted, {} short",
                run.generations,
                run.successes,
                total,
                run.attempted(),
                remaining
            );
        }

        info!(
            "Inserted {} of {} documents in {}ms, {:.2} RU ({:.1} docs/s, {:.1} RU/s)",
            run.successes,
            total,
            run.elapsed_ms,
            run.request_charge,
            run.throughput(),
            run.charge_per_second()
        );

        Ok(run)
    }

    /// One pass over `count` new documents; returns how many were accepted.
    async fn run_generation(
        &mut self,
        generation: u32,
        count: usize,
        concurrency_limit: usize,
        run: &mut RunResult,
    ) -> usize {
        let mut documents = self.generator.generate_batch(count).into_iter();
        let mut inserted = 0;

        for (index, size) in plan_batches(count, concurrency_limit).into_iter().enumerate() {
            if index > 0 {
                pause(self.options.cooldown).await;
            }

            let batch: Vec<Document> = documents.by_ref().take(size).collect();
            let result = self.run_batch(generation, batch).await;

            info!(
                "{} documents added, took {}ms, {:.2} RU",
                result.successes, result.elapsed_ms, result.request_charge
            );

            self.progress.inc(result.successes as u64);
            inserted += result.successes;
            run.record(result.summary());
        }

        inserted
    }

    /// Dispatch every create at once and wait for all of them to settle.
    async fn run_batch(&self, generation: u32, batch: Vec<Document>) -> BatchResult {
        let started = Instant::now();
        let outcomes = join_all(batch.into_iter().map(|doc| self.store.create_one(doc))).await;
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        if failed > 0 {
            let sample = outcomes
                .iter()
                .find_map(|o| o.failure.as_ref())
                .map(|f| f.to_string())
                .unwrap_or_default();
            warn!(
                "{} of {} creates failed in batch (first: {})",
                failed,
                outcomes.len(),
                sample
            );
        }

        aggregate_batch(generation, outcomes, elapsed_ms)
    }
}

async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}
