mod generator;

pub use generator::{DocumentGenerator, GeneratorConfig, TimeWindow, TIMESTAMP_FORMAT};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Synthetic document inserted by the harness
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Globally unique reference
    pub id: String,

    /// Storage-location hint
    #[serde(rename = "spUrl", default)]
    pub sp_url: String,

    /// ISO-8601, millisecond precision, UTC
    #[serde(rename = "timeStamp", default)]
    pub time_stamp: String,

    #[serde(default)]
    pub metadata: DocumentMetadata,
}

/// Named fields default to empty so documents written by other tools
/// (stored procedures, older runs) still read back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentMetadata {
    pub document_class: String,
    pub customer_ref: String,
    pub policy_ref: String,
    pub mime_type: String,

    #[serde(flatten)]
    pub extra: BTreeMap<String, MetadataValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
    /// Arrays and nested objects
    Json(Value),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl Document {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Resolve the partition-key value at a JSON pointer path such as `/id`
    /// or `/metadata/customerRef`.
    pub fn partition_key_value(&self, path: &str) -> Option<Value> {
        match path {
            "/id" => Some(Value::String(self.id.clone())),
            _ => self.to_value().pointer(path).cloned(),
        }
    }
}
