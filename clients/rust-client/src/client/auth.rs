//! Master-key request signing.
//!
//! Every request carries an `authorization` header holding an HMAC-SHA256
//! over the verb, resource type, resource link and request date, keyed by
//! the base64-decoded account key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::protocol::ClientError;

type HmacSha256 = Hmac<Sha256>;

#[derive(Clone)]
pub struct MasterKey {
    key: Vec<u8>,
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("MasterKey(..)")
    }
}

impl MasterKey {
    pub fn from_base64(encoded: &str) -> Result<Self, ClientError> {
        let key = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ClientError::AuthError(format!("Master key is not valid base64: {}", e)))?;
        if key.is_empty() {
            return Err(ClientError::AuthError("Master key is empty".to_string()));
        }
        Ok(Self { key })
    }

    /// Build the URL-encoded `authorization` header value.
    ///
    /// `date` must be the exact string sent in `x-ms-date`.
    pub fn sign(
        &self,
        verb: &str,
        resource_type: &str,
        resource_link: &str,
        date: &str,
    ) -> Result<String, ClientError> {
        let payload = format!(
            "{}\n{}\n{}\n{}\n\n",
            verb.to_lowercase(),
            resource_type.to_lowercase(),
            resource_link,
            date.to_lowercase()
        );

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| ClientError::AuthError(format!("HMAC init failed: {}", e)))?;
        mac.update(payload.as_bytes());
        let signature = STANDARD.encode(mac.finalize().into_bytes());

        let token = format!("type=master&ver=1.0&sig={}", signature);
        Ok(url::form_urlencoded::byte_serialize(token.as_bytes()).collect())
    }
}

/// RFC 1123 date as expected by `x-ms-date`
pub fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
