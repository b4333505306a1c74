use chrono::{Days, NaiveDate, NaiveTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{Document, DocumentMetadata, MetadataValue};
use crate::error::{BenchError, BenchResult};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Days from `start` over which timestamps are spread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: NaiveDate,
    pub span_days: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub window_start: NaiveDate,
    pub span_days: u32,
    pub storage_location: String,
    pub document_class: String,
    pub customer_prefix: String,
    pub customer_min: u64,
    pub customer_max: u64,
    pub policy_min: u64,
    pub policy_max: u64,
    pub mime_type: String,
    pub extension_key: String,
    pub extension_value: String,
    /// Fixed seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            window_start: NaiveDate::from_ymd_opt(2010, 1, 1).unwrap_or_default(),
            span_days: 3650,
            storage_location: "https://contoso.sharepoint.com/sites/policydocs/Shared%20Documents"
                .to_string(),
            document_class: "PolicySchedule".to_string(),
            customer_prefix: "CUS".to_string(),
            customer_min: 100_000,
            customer_max: 999_999,
            policy_min: 10_000_000,
            policy_max: 99_999_999,
            mime_type: "application/pdf".to_string(),
            extension_key: "notes".to_string(),
            extension_value: "synthetic load-test document".to_string(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.window_start,
            span_days: self.span_days,
        }
    }

    pub fn validate(&self) -> BenchResult<()> {
        if self.customer_min > self.customer_max {
            return Err(BenchError::Config(format!(
                "generator customer range is empty ({} > {})",
                self.customer_min, self.customer_max
            )));
        }
        if self.policy_min > self.policy_max {
            return Err(BenchError::Config(format!(
                "generator policy range is empty ({} > {})",
                self.policy_min, self.policy_max
            )));
        }
        Ok(())
    }
}

/// Produces synthetic documents from an injected random source.
pub struct DocumentGenerator<R = StdRng> {
    config: GeneratorConfig,
    rng: R,
}

impl DocumentGenerator<StdRng> {
    /// Seeded from `config.seed` when set, from OS entropy otherwise.
    pub fn from_config(config: GeneratorConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::new(config, rng)
    }
}

impl<R: Rng> DocumentGenerator<R> {
    pub fn new(config: GeneratorConfig, rng: R) -> Self {
        Self { config, rng }
    }

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate `count` documents over the configured window.
    pub fn generate_batch(&mut self, count: usize) -> Vec<Document> {
        let window = self.config.window();
        self.generate(count, &window)
    }

    /// Generate exactly `count` documents with timestamps inside `window`.
    pub fn generate(&mut self, count: usize, window: &TimeWindow) -> Vec<Document> {
        (0..count).map(|_| self.next_document(window)).collect()
    }

    fn next_document(&mut self, window: &TimeWindow) -> Document {
        let id = uuid::Builder::from_random_bytes(self.rng.gen())
            .into_uuid()
            .to_string();
        let time_stamp = self.random_timestamp(window);

        let customer = self
            .rng
            .gen_range(self.config.customer_min..=self.config.customer_max);
        let policy = self
            .rng
            .gen_range(self.config.policy_min..=self.config.policy_max);

        let mut extra = BTreeMap::new();
        if !self.config.extension_key.is_empty() {
            extra.insert(
                self.config.extension_key.clone(),
                MetadataValue::Text(self.config.extension_value.clone()),
            );
        }

        Document {
            id,
            sp_url: self.config.storage_location.clone(),
            time_stamp,
            metadata: DocumentMetadata {
                document_class: self.config.document_class.clone(),
                customer_ref: format!("{}{}", self.config.customer_prefix, customer),
                policy_ref: policy.to_string(),
                mime_type: self.config.mime_type.clone(),
                extra,
            },
        }
    }

    /// A random day in the window plus independent hour/minute/second/millisecond
    /// offsets. Not exactly uniform over the whole range.
    fn random_timestamp(&mut self, window: &TimeWindow) -> String {
        let offset = self.rng.gen_range(0..=window.span_days);
        let day = window
            .start
            .checked_add_days(Days::new(u64::from(offset)))
            .unwrap_or(window.start);

        let hour = self.rng.gen_range(0..24);
        let minute = self.rng.gen_range(0..60);
        let second = self.rng.gen_range(0..60);
        let milli = self.rng.gen_range(0..1000);
        let time = NaiveTime::from_hms_milli_opt(hour, minute, second, milli)
            .unwrap_or(NaiveTime::MIN);

        day.and_time(time).format(TIMESTAMP_FORMAT).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;
    use std::collections::HashSet;

    fn seeded(seed: u64) -> DocumentGenerator<StdRng> {
        DocumentGenerator::new(GeneratorConfig::default(), StdRng::seed_from_u64(seed))
    }

    #[test]
    fn test_generates_exact_count() {
        let mut gen = seeded(1);
        assert_eq!(gen.generate_batch(0).len(), 0);
        assert_eq!(gen.generate_batch(17).len(), 17);
    }

    #[test]
    fn test_ids_unique_across_100k() {
        let mut gen = DocumentGenerator::from_config(GeneratorConfig::default());
        let docs = gen.generate_batch(100_000);
        let ids: HashSet<&str> = docs.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), 100_000);
    }

    #[test]
    fn test_ids_unique_across_calls() {
        let mut gen = seeded(7);
        let first = gen.generate_batch(500);
        let second = gen.generate_batch(500);
        let ids: HashSet<&str> = first.iter().chain(&second).map(|d| d.id.as_str()).collect();
        assert_eq!(ids.len(), 1000);
    }

    #[test]
    fn test_same_seed_same_documents() {
        let a = seeded(42).generate_batch(20);
        let b = seeded(42).generate_batch(20);
        assert_eq!(a, b);
        assert_ne!(a, seeded(43).generate_batch(20));
    }

    #[test]
    fn test_timestamps_inside_window() {
        let window = TimeWindow {
            start: NaiveDate::from_ymd_opt(2020, 2, 1).unwrap(),
            span_days: 10,
        };
        let lower = window.start.and_time(NaiveTime::MIN);
        let upper = NaiveDate::from_ymd_opt(2020, 2, 12)
            .unwrap()
            .and_time(NaiveTime::MIN);

        let mut gen = seeded(3);
        for doc in gen.generate(2_000, &window) {
            assert!(doc.time_stamp.ends_with('Z'));
            assert_eq!(doc.time_stamp.len(), "2020-02-01T00:00:00.000Z".len());
            let parsed = NaiveDateTime::parse_from_str(&doc.time_stamp, TIMESTAMP_FORMAT).unwrap();
            assert!(parsed >= lower && parsed < upper, "{} out of window", parsed);
        }
    }

    #[test]
    fn test_zero_span_stays_on_start_day() {
        let window = TimeWindow {
            start: NaiveDate::from_ymd_opt(2018, 6, 30).unwrap(),
            span_days: 0,
        };
        let mut gen = seeded(9);
        for doc in gen.generate(200, &window) {
            assert!(doc.time_stamp.starts_with("2018-06-30T"));
        }
    }

    #[test]
    fn test_metadata_ranges() {
        let config = GeneratorConfig {
            customer_prefix: "C-".to_string(),
            customer_min: 5,
            customer_max: 9,
            policy_min: 100,
            policy_max: 100,
            ..GeneratorConfig::default()
        };
        let mut gen = DocumentGenerator::new(config, StdRng::seed_from_u64(11));
        for doc in gen.generate_batch(300) {
            let n: u64 = doc.metadata.customer_ref.strip_prefix("C-").unwrap().parse().unwrap();
            assert!((5..=9).contains(&n));
            assert_eq!(doc.metadata.policy_ref, "100");
            assert_eq!(doc.metadata.mime_type, "application/pdf");
            assert_eq!(
                doc.metadata.extra.get("notes"),
                Some(&MetadataValue::from("synthetic load-test document"))
            );
        }
    }

    #[test]
    fn test_validate_rejects_inverted_range() {
        let config = GeneratorConfig {
            policy_min: 10,
            policy_max: 1,
            ..GeneratorConfig::default()
        };
        assert!(config.validate().is_err());
    }
}
