use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status}: {message}")]
    Status {
        status: u16,
        request_charge: f64,
        message: String,
    },

    #[error("Protocol error: {0}")]
    ProtocolError(String),

    #[error("Auth error: {0}")]
    AuthError(String),
}

impl ClientError {
    /// HTTP status returned by the store, if the request got that far
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Charge reported on an error response (rejections still cost units)
    pub fn request_charge(&self) -> f64 {
        match self {
            ClientError::Status { request_charge, .. } => *request_charge,
            _ => 0.0,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    pub fn is_throttled(&self) -> bool {
        self.status() == Some(429)
    }

    pub fn is_conflict(&self) -> bool {
        self.status() == Some(409)
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ClientError::Timeout(err.to_string())
        } else if err.is_decode() {
            ClientError::ProtocolError(err.to_string())
        } else {
            ClientError::ConnectionError(err.to_string())
        }
    }
}
