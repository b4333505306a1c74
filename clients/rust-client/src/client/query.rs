use reqwest::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use reqwest::Method;
use tracing::debug;

use super::DocumentClient;
use crate::protocol::{
    ClientError, DbResponse, QueryPage, QueryRequest, ResourceType, COUNT_QUERY,
    HEADER_CONTINUATION,
};

const HEADER_IS_QUERY: &str = "x-ms-documentdb-isquery";
const HEADER_CROSS_PARTITION: &str = "x-ms-documentdb-query-enablecrosspartition";
const HEADER_MAX_ITEM_COUNT: &str = "x-ms-max-item-count";

impl DocumentClient {
    /// Fetch a single page of a cross-partition query.
    ///
    /// Pass the continuation token from the previous page to advance; `None`
    /// starts from the beginning.
    pub async fn query_page(
        &self,
        request: &QueryRequest,
        continuation: Option<&str>,
        max_item_count: Option<u32>,
    ) -> Result<DbResponse<QueryPage>, ClientError> {
        let link = self.container_link();
        let body = serde_json::to_string(request)
            .map_err(|e| ClientError::ProtocolError(format!("Failed to encode query: {}", e)))?;

        let mut headers = HeaderMap::new();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("application/query+json"),
        );
        headers.insert(
            HeaderName::from_static(HEADER_IS_QUERY),
            HeaderValue::from_static("True"),
        );
        headers.insert(
            HeaderName::from_static(HEADER_CROSS_PARTITION),
            HeaderValue::from_static("True"),
        );
        if let Some(max) = max_item_count {
            headers.insert(HeaderName::from_static(HEADER_MAX_ITEM_COUNT), max.into());
        }
        if let Some(token) = continuation {
            let value = HeaderValue::from_str(token).map_err(|e| {
                ClientError::ProtocolError(format!("Invalid continuation token: {}", e))
            })?;
            headers.insert(HeaderName::from_static(HEADER_CONTINUATION), value);
        }

        self.send(
            Method::POST,
            ResourceType::Documents,
            &link,
            &format!("{}/docs", link),
            None,
            headers,
            Some(body),
        )
        .await
    }

    /// Total number of documents in the container.
    ///
    /// Drains every page of the count query and sums the partial counts;
    /// the returned charge is the sum over all pages.
    pub async fn count_documents(&self) -> Result<DbResponse<i64>, ClientError> {
        let request = QueryRequest::new(COUNT_QUERY);
        let mut continuation: Option<String> = None;
        let mut total: i64 = 0;
        let mut charge = 0.0;
        let mut last_status: u16;
        let mut activity_id: Option<String>;

        loop {
            let page = self
                .query_page(&request, continuation.as_deref(), None)
                .await?;
            charge += page.request_charge;
            last_status = page.status;
            activity_id = page.activity_id;

            for value in &page.body.documents {
                total += value.as_i64().ok_or_else(|| {
                    ClientError::ProtocolError(format!("Count query returned {}", value))
                })?;
            }

            debug!("count page: running total {}", total);
            match page.continuation {
                Some(token) => continuation = Some(token),
                None => break,
            }
        }

        Ok(DbResponse {
            body: total,
            status: last_status,
            request_charge: charge,
            continuation: None,
            activity_id,
        })
    }
}
