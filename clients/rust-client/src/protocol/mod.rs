mod error;
mod response;
mod types;

pub use error::ClientError;
pub use response::{
    parse_activity_id, parse_continuation, parse_request_charge, DbResponse, QueryPage,
    HEADER_ACTIVITY_ID, HEADER_CONTINUATION, HEADER_REQUEST_CHARGE,
};
pub use types::{PartitionKey, QueryParameter, QueryRequest, ResourceType, COUNT_QUERY};
