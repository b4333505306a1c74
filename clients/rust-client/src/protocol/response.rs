use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const HEADER_REQUEST_CHARGE: &str = "x-ms-request-charge";
pub const HEADER_CONTINUATION: &str = "x-ms-continuation";
pub const HEADER_ACTIVITY_ID: &str = "x-ms-activity-id";

/// Successful store response with the accounting headers lifted out
#[derive(Debug, Clone)]
pub struct DbResponse<T> {
    pub body: T,
    pub status: u16,
    /// Request units charged for this call
    pub request_charge: f64,
    /// Present when a query has more pages
    pub continuation: Option<String>,
    pub activity_id: Option<String>,
}

impl<T> DbResponse<T> {
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> DbResponse<U> {
        DbResponse {
            body: f(self.body),
            status: self.status,
            request_charge: self.request_charge,
            continuation: self.continuation,
            activity_id: self.activity_id,
        }
    }

    pub fn has_more_results(&self) -> bool {
        self.continuation.is_some()
    }
}

/// One page of a query feed
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryPage {
    #[serde(rename = "Documents", default)]
    pub documents: Vec<Value>,

    #[serde(rename = "_count", default)]
    pub count: usize,
}

/// Missing or malformed charge headers count as zero.
pub fn parse_request_charge(headers: &HeaderMap) -> f64 {
    headers
        .get(HEADER_REQUEST_CHARGE)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|c| c.is_finite() && *c >= 0.0)
        .unwrap_or(0.0)
}

pub fn parse_continuation(headers: &HeaderMap) -> Option<String> {
    headers
        .get(HEADER_CONTINUATION)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}

pub fn parse_activity_id(headers: &HeaderMap) -> Option<String> {
    headers
        .get(HEADER_ACTIVITY_ID)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
