//! Report sink
//!
//! Appends trial rows to a tabular report. A new destination gets a two-line
//! header first:
//!
//! ```text
//! ,Time Taken(ms),,,Request Charge (RU)
//! Total Documents,1,2,3,1,2,3
//! 1500,812,790,845,5.71,5.71,5.9
//! ```
//!
//! Writes that fail are retried with exponential backoff. Once the automatic
//! attempts run out a [`ContentionHandler`] decides whether to keep trying.

mod destination;

pub use destination::{FileDestination, ReportDestination};

use std::io;
use std::time::Duration;
use tracing::{debug, warn};

use crate::error::{BenchError, BenchResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Automatic attempts per round before the handler is asked
    pub attempts: u32,
    /// Initial delay between attempts, doubled after each one
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 5,
            backoff: Duration::from_millis(500),
        }
    }
}

/// One trial of a report row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrialMetrics {
    pub document_count: i64,
    pub elapsed_ms: u64,
    pub request_charge: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentionAction {
    Retry,
    GiveUp,
}

/// Consulted when a destination stays unwritable after the automatic retries
pub trait ContentionHandler: Send + Sync {
    fn on_contention(&self, destination: &str, error: &io::Error) -> ContentionAction;
}

/// Non-interactive default: stop and hand the row back in the error
#[derive(Debug, Default, Clone, Copy)]
pub struct GiveUpHandler;

impl ContentionHandler for GiveUpHandler {
    fn on_contention(&self, _destination: &str, _error: &io::Error) -> ContentionAction {
        ContentionAction::GiveUp
    }
}

pub struct ReportSink {
    policy: RetryPolicy,
    handler: Box<dyn ContentionHandler>,
}

impl ReportSink {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            handler: Box::new(GiveUpHandler),
        }
    }

    pub fn with_handler(mut self, handler: impl ContentionHandler + 'static) -> Self {
        self.set_handler(handler);
        self
    }

    pub fn set_handler(&mut self, handler: impl ContentionHandler + 'static) {
        self.handler = Box::new(handler);
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Append one row holding every trial in `trials`.
    ///
    /// The leading column is the first trial's document count. The header
    /// is sized by the number of trials in the row that creates the
    /// destination.
    pub async fn append(
        &self,
        trials: &[TrialMetrics],
        destination: &dyn ReportDestination,
    ) -> BenchResult<()> {
        let first = trials.first().ok_or_else(|| {
            BenchError::InvalidArgument("a report row needs at least one trial".to_string())
        })?;

        let row = encode(&[data_record(first.document_count, trials)])?;
        let header = encode(&header_records(trials.len()))?;

        let mut attempts = 0u32;
        let mut round = 0u32;
        let mut delay = self.policy.backoff;

        loop {
            attempts += 1;
            round += 1;

            let result = if destination.exists() {
                destination.append(&row)
            } else {
                let mut bytes = header.clone();
                bytes.extend_from_slice(&row);
                destination.append(&bytes)
            };

            let error = match result {
                Ok(()) => {
                    debug!("Appended {} trials to {}", trials.len(), destination.describe());
                    return Ok(());
                }
                Err(e) => e,
            };

            warn!(
                "Report {} is unavailable (attempt {}): {}",
                destination.describe(),
                attempts,
                error
            );

            if round < self.policy.attempts {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                delay = delay.saturating_mul(2);
                continue;
            }

            match self.handler.on_contention(&destination.describe(), &error) {
                ContentionAction::Retry => {
                    round = 0;
                    delay = self.policy.backoff;
                }
                ContentionAction::GiveUp => {
                    return Err(BenchError::ReportContended {
                        destination: destination.describe(),
                        attempts,
                        row: String::from_utf8_lossy(&row).trim_end().to_string(),
                    });
                }
            }
        }
    }
}

/// The two header lines for `trials` trial columns
pub fn header_records(trials: usize) -> Vec<Vec<String>> {
    let mut first = vec![String::new(), "Time Taken(ms)".to_string()];
    first.resize(1 + trials.max(1), String::new());
    first.push("Request Charge (RU)".to_string());

    let mut second = vec!["Total Documents".to_string()];
    for _ in 0..2 {
        second.extend((1..=trials).map(|n| n.to_string()));
    }

    vec![first, second]
}

/// `count,elapsed1..elapsedN,charge1..chargeN`
pub fn data_record(document_count: i64, trials: &[TrialMetrics]) -> Vec<String> {
    let mut record = Vec::with_capacity(1 + trials.len() * 2);
    record.push(document_count.to_string());
    record.extend(trials.iter().map(|t| t.elapsed_ms.to_string()));
    record.extend(trials.iter().map(|t| t.request_charge.to_string()));
    record
}

fn encode(records: &[Vec<String>]) -> BenchResult<Vec<u8>> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .flexible(true)
        .terminator(csv::Terminator::CRLF)
        .from_writer(Vec::new());
    for record in records {
        writer.write_record(record)?;
    }
    writer
        .into_inner()
        .map_err(|e| BenchError::IoError(io::Error::new(e.error().kind(), e.error().to_string())))
}
