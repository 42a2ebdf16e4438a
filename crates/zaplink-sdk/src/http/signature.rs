/*
[INPUT]:  Request parameters, API credentials, and a signing provider
[OUTPUT]: Signed request headers (X-API-Signature et al.)
[POS]:    HTTP layer - request signing for authenticated endpoints
[UPDATE]: When changing the signing composition or header format
*/

use std::fmt;

use reqwest::header::{HeaderMap, HeaderValue, CACHE_CONTROL};

use crate::crypto::{HmacSha256Signer, SigningProvider};
use crate::http::{Result, ZaplinkError};

/// Signs request bodies for HMAC-authenticated endpoints
///
/// The server recomputes the same composition from the raw request and
/// rejects mismatches, stale timestamps, and replayed nonces; replay-window
/// enforcement is entirely the server's responsibility.
pub struct RequestSigner {
    api_key: String,
    secret_key: String,
    provider: Box<dyn SigningProvider>,
}

impl RequestSigner {
    /// Create a signer with the default HMAC-SHA256 provider
    pub fn new(api_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self::with_provider(api_key, secret_key, Box::new(HmacSha256Signer))
    }

    /// Create a signer with an injected signing provider
    pub fn with_provider(
        api_key: impl Into<String>,
        secret_key: impl Into<String>,
        provider: Box<dyn SigningProvider>,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            secret_key: secret_key.into(),
            provider,
        }
    }

    /// Sign the callback-validation payload
    ///
    /// Payload format: "{api_key}|{callback_token}|{timestamp}", fields in
    /// exactly this order.
    pub async fn callback_signature(&self, callback_token: &str, timestamp: i64) -> Result<String> {
        let payload = format!("{}|{}|{}", self.api_key, callback_token, timestamp);
        self.provider.sign(&payload, &self.secret_key).await
    }

    /// Build the signed header set for an authenticated POST
    ///
    /// Composition: "METHOD\nPATH\nTIMESTAMP\nNONCE\nBODY" where METHOD is
    /// always POST, PATH drops the leading slash, TIMESTAMP is whole seconds
    /// since epoch, and BODY is the exact serialized request body.
    pub async fn signed_headers(
        &self,
        endpoint: &str,
        body: &str,
        timestamp: i64,
        nonce: &str,
    ) -> Result<HeaderMap> {
        let path = endpoint.strip_prefix('/').unwrap_or(endpoint);
        let message = format!("POST\n{path}\n{timestamp}\n{nonce}\n{body}");
        let signature = self.provider.sign(&message, &self.secret_key).await?;

        let mut headers = HeaderMap::new();
        headers.insert("X-API-Key", header_value(&self.api_key)?);
        headers.insert("X-API-Signature", header_value(&signature)?);
        headers.insert("X-API-Timestamp", header_value(&timestamp.to_string())?);
        headers.insert("X-API-Nonce", header_value(nonce)?);
        headers.insert("X-Requested-With", HeaderValue::from_static("XMLHttpRequest"));
        headers.insert(
            CACHE_CONTROL,
            HeaderValue::from_static("no-cache, no-store, must-revalidate"),
        );
        Ok(headers)
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner")
            .field("api_key", &self.api_key)
            .field("secret_key", &"<redacted>")
            .finish_non_exhaustive()
    }
}

fn header_value(value: &str) -> Result<HeaderValue> {
    HeaderValue::from_str(value)
        .map_err(|_| ZaplinkError::Config("header value contains invalid characters".to_string()))
}
