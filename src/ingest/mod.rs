//! Bulk ingestion
//!
//! Inserts a requested number of synthetic documents in sequential batches
//! of at most `concurrency_limit` concurrent creates. Whatever falls short
//! is retried with freshly generated documents for a bounded number of
//! generations.

mod engine;

pub use engine::IngestEngine;

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IngestOptions {
    /// Pause between batches, not counted in batch time
    pub cooldown: Duration,
    /// First pass plus retries; at least 1
    pub max_generations: u32,
    /// Ceiling for the pause before a retry generation
    pub max_retry_delay: Duration,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_secs(2),
            max_generations: 5,
            max_retry_delay: Duration::from_secs(30),
        }
    }
}

impl IngestOptions {
    /// No pauses at all; for tests and local emulators
    pub fn without_cooldown(max_generations: u32) -> Self {
        Self {
            cooldown: Duration::ZERO,
            max_generations,
            max_retry_delay: Duration::ZERO,
        }
    }

    /// Pause before retry generation `generation` (1-based): the cooldown
    /// doubled once per generation, capped at `max_retry_delay`.
    pub fn retry_delay(&self, generation: u32) -> Duration {
        let factor = 1u32 << generation.min(16);
        self.cooldown
            .saturating_mul(factor)
            .min(self.max_retry_delay)
    }
}

/// Sizes of the sequential batches for `total` documents
pub fn plan_batches(total: usize, concurrency_limit: usize) -> Vec<usize> {
    let limit = concurrency_limit.max(1);
    let mut sizes = Vec::with_capacity(total.div_ceil(limit));
    let mut left = total;
    while left > 0 {
        let size = left.min(limit);
        sizes.push(size);
        left -= size;
    }
    sizes
}
