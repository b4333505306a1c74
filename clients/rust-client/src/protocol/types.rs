use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Aggregate count over a whole container. Cross-partition feeds return one
/// partial count per page, so callers sum them.
pub const COUNT_QUERY: &str = "SELECT VALUE COUNT(1) FROM docs";

/// Resource segment used both in URLs and in the signed payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Documents,
    StoredProcedures,
}

impl ResourceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceType::Documents => "docs",
            ResourceType::StoredProcedures => "sprocs",
        }
    }
}

/// Value of the partition-key header, serialized as a one-element JSON array
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionKey(pub Value);

impl PartitionKey {
    pub fn header_value(&self) -> String {
        serde_json::to_string(&[&self.0]).unwrap_or_else(|_| "[]".to_string())
    }
}

impl From<&str> for PartitionKey {
    fn from(value: &str) -> Self {
        PartitionKey(Value::String(value.to_string()))
    }
}

impl From<String> for PartitionKey {
    fn from(value: String) -> Self {
        PartitionKey(Value::String(value))
    }
}

impl From<Value> for PartitionKey {
    fn from(value: Value) -> Self {
        PartitionKey(value)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryParameter {
    pub name: String,
    pub value: Value,
}

/// Body of a `application/query+json` request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub parameters: Vec<QueryParameter>,
}

impl QueryRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            parameters: Vec::new(),
        }
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: Value) -> Self {
        self.parameters.push(QueryParameter {
            name: name.into(),
            value,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_partition_key_header() {
        assert_eq!(PartitionKey::from("abc").header_value(), r#"["abc"]"#);
        assert_eq!(PartitionKey::from(json!(42)).header_value(), "[42]");
    }

    #[test]
    fn test_query_request_serialization() {
        let req = QueryRequest::new("SELECT * FROM c WHERE c.id = @id")
            .with_parameter("@id", json!("doc-1"));
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["query"], "SELECT * FROM c WHERE c.id = @id");
        assert_eq!(value["parameters"][0]["name"], "@id");
        assert_eq!(value["parameters"][0]["value"], "doc-1");
    }
}
