/*
[INPUT]:  HTTP configuration (base URL, timeouts)
[OUTPUT]: Configured reqwest client ready for API calls
[POS]:    HTTP layer - core client implementation
[UPDATE]: When adding connection options or changing client behavior
*/

use reqwest::{Client, Method, RequestBuilder, Url};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::http::{Result, ZaplinkError};

/// HTTP client configuration
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

/// Low-level HTTP client for the Zaplink API
#[derive(Debug)]
pub struct HttpClient {
    http_client: Client,
    base_url: Url,
}

impl HttpClient {
    /// Create a client against a base URL with the given configuration
    pub fn new(base_url: &str, config: ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()?;

        Ok(Self {
            http_client,
            base_url: Url::parse(base_url)?,
        })
    }

    /// Build a request builder for an endpoint path
    pub(crate) fn request(&self, method: Method, endpoint: &str) -> Result<RequestBuilder> {
        let url = self.endpoint_url(endpoint)?;
        Ok(self.http_client.request(method, url))
    }

    /// Append an endpoint to the base URL, keeping any base path component
    ///
    /// `Url::join` resolves a leading-slash endpoint against the host root,
    /// which would drop the `/base` in `https://host/base`; plain
    /// concatenation keeps it.
    fn endpoint_url(&self, endpoint: &str) -> Result<Url> {
        let base = self.base_url.as_str().trim_end_matches('/');
        let path = endpoint.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Send a request and decode a JSON body
    ///
    /// Non-2xx statuses become `Api` errors carrying the server's `error`
    /// or `message` field when the body provides one.
    pub(crate) async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
    ) -> Result<T> {
        let response = builder.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = extract_error_message(&body).unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .unwrap_or("request failed")
                    .to_string()
            });
            return Err(ZaplinkError::api_error(status, message));
        }

        Ok(response.json().await?)
    }
}

fn extract_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")
        .or_else(|| value.get("message"))?
        .as_str()
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(r#"{"error":"bad key"}"#).as_deref(),
            Some("bad key")
        );
        assert_eq!(
            extract_error_message(r#"{"message":"nope"}"#).as_deref(),
            Some("nope")
        );
        assert!(extract_error_message("not json").is_none());
    }

    #[test]
    fn test_request_keeps_base_path_component() {
        let client =
            HttpClient::new("https://host.example.com/base", ClientConfig::default()).unwrap();
        let request = client
            .request(Method::GET, "/api/thing")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://host.example.com/base/api/thing"
        );
    }

    #[test]
    fn test_request_preserves_query_string() {
        let client =
            HttpClient::new("https://host.example.com", ClientConfig::default()).unwrap();
        let request = client
            .request(Method::GET, "/api/user/transactions?status=completed&page=1")
            .unwrap()
            .build()
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://host.example.com/api/user/transactions?status=completed&page=1"
        );
    }

    #[tokio::test]
    async fn test_send_json_maps_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/thing"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_json(serde_json::json!({ "error": "invalid api key" })),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri(), ClientConfig::default()).unwrap();
        let builder = client.request(Method::GET, "/api/thing").unwrap();
        let err = client.send_json::<serde_json::Value>(builder).await.unwrap_err();

        match err {
            ZaplinkError::Api { code, message } => {
                assert_eq!(code, 401);
                assert_eq!(message, "invalid api key");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_json_decodes_success_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/thing"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "ok": true })),
            )
            .mount(&server)
            .await;

        let client = HttpClient::new(&server.uri(), ClientConfig::default()).unwrap();
        let builder = client.request(Method::GET, "/api/thing").unwrap();
        let value: serde_json::Value = client.send_json(builder).await.unwrap();
        assert_eq!(value["ok"], true);
    }
}
