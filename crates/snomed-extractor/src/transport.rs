//! reqwest-backed HTTP transport

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use snomed_core::{
    ExtractionError, GeminiConfig, Result, Transport, TransportRequest, TransportResponse,
};

/// HTTP transport reusing one connection pool across calls
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with reqwest defaults (no request timeout)
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    /// Create a transport with a request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Transport(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { client })
    }

    /// Create from config
    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        match config.timeout_secs {
            Some(secs) => Self::with_timeout(Duration::from_secs(secs)),
            None => Ok(Self::new()),
        }
    }
}

/// Describe a reqwest error without echoing the URL, which carries the key
fn describe(err: reqwest::Error) -> String {
    if err.is_timeout() {
        return "request timed out".to_string();
    }
    if err.is_connect() {
        return format!("connection failed: {}", err.without_url());
    }
    err.without_url().to_string()
}

#[async_trait]
impl Transport for HttpTransport {
    async fn post_json(&self, request: TransportRequest) -> Result<TransportResponse> {
        let response = self
            .client
            .post(&request.endpoint)
            .query(&request.query)
            .json(&request.body)
            .send()
            .await
            .map_err(|e| ExtractionError::Transport(format!("Request failed: {}", describe(e))))?;

        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| {
            ExtractionError::Transport(format!("Failed to read response body: {}", describe(e)))
        })?;

        Ok(TransportResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_without_timeout() {
        let config = GeminiConfig::default();
        assert!(HttpTransport::from_config(&config).is_ok());
    }

    #[test]
    fn test_from_config_with_timeout() {
        let config = GeminiConfig {
            timeout_secs: Some(5),
            ..Default::default()
        };
        assert!(HttpTransport::from_config(&config).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_transport_error() {
        let transport = HttpTransport::with_timeout(Duration::from_secs(2)).unwrap();
        let request = TransportRequest::new("http://127.0.0.1:9/v1beta/models/m:generateContent", serde_json::json!({}))
            .with_query("key", "secret-key");

        let err = transport.post_json(request).await.unwrap_err();
        assert_eq!(err.kind(), snomed_core::ErrorKind::Transport);
        assert!(!err.to_string().contains("secret-key"));
    }
}
