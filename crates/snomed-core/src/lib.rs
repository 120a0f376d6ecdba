//! SNOMED Core - Clinical entity model, errors and shared traits
//!
//! This crate defines the abstractions shared by the extraction client,
//! the backend proxy and the CLI:
//! - The extracted clinical entity record and its value sets
//! - Error types with stable kinds and localized messages
//! - The HTTP transport seam used by the extraction client
//! - Configuration management

pub mod config;
pub mod entity;

pub use config::{AppConfig, ConfigError, GeminiConfig, Locale, LoggingConfig, ServerConfig};
pub use entity::{
    ConfidenceScore, EntityContext, ExtractedEntity, Laterality, SemanticCategory, Severity,
    UnknownVariant,
};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Distinguishable failure classes of an extraction call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    EnvelopeShape,
    PayloadDecode,
    Config,
    Unknown,
}

/// Errors surfaced by the extraction client
#[derive(Error, Debug)]
pub enum ExtractionError {
    /// Network failure or non-success HTTP status
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response parsed but lacks the candidate/content/part structure
    #[error("Unexpected response structure: {0}")]
    EnvelopeShape(String),

    /// Inner JSON payload does not decode into entity records
    #[error("Failed to decode entity payload: {0}")]
    PayloadDecode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unexpected error: {0}")]
    Unknown(String),
}

impl ExtractionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport(_) => ErrorKind::Transport,
            Self::EnvelopeShape(_) => ErrorKind::EnvelopeShape,
            Self::PayloadDecode(_) => ErrorKind::PayloadDecode,
            Self::Config(_) => ErrorKind::Config,
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self.kind() {
            ErrorKind::Transport => "TRANSPORT_ERROR",
            ErrorKind::EnvelopeShape => "ENVELOPE_SHAPE_ERROR",
            ErrorKind::PayloadDecode => "PAYLOAD_DECODE_ERROR",
            ErrorKind::Config => "CONFIGURATION_ERROR",
            ErrorKind::Unknown => "UNKNOWN_ERROR",
        }
    }

    /// Underlying detail message, without the kind prefix
    pub fn detail(&self) -> &str {
        match self {
            Self::Transport(msg)
            | Self::EnvelopeShape(msg)
            | Self::PayloadDecode(msg)
            | Self::Config(msg)
            | Self::Unknown(msg) => msg,
        }
    }

    /// Human-readable message in the given locale
    pub fn localized(&self, locale: Locale) -> String {
        match locale {
            Locale::En => self.to_string(),
            Locale::Id => {
                let prefix = match self.kind() {
                    ErrorKind::Transport => "Gagal terhubung ke Gemini API",
                    ErrorKind::EnvelopeShape => "Struktur respons Gemini API tidak terduga",
                    ErrorKind::PayloadDecode => "Gagal mendekode JSON dari Gemini API",
                    ErrorKind::Config => "Kesalahan konfigurasi",
                    ErrorKind::Unknown => "Kesalahan saat memproses respons Gemini API",
                };
                format!("{prefix}: {}", self.detail())
            }
        }
    }
}

impl From<ConfigError> for ExtractionError {
    fn from(err: ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ExtractionError>;

// ============================================================================
// Transport
// ============================================================================

/// Outbound JSON POST request
#[derive(Clone)]
pub struct TransportRequest {
    /// URL without query string
    pub endpoint: String,

    /// Query parameters appended to the endpoint
    pub query: Vec<(String, String)>,

    /// JSON request body
    pub body: serde_json::Value,
}

impl TransportRequest {
    pub fn new(endpoint: impl Into<String>, body: serde_json::Value) -> Self {
        Self {
            endpoint: endpoint.into(),
            query: Vec::new(),
            body,
        }
    }

    pub fn with_query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }
}

impl std::fmt::Debug for TransportRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let query: Vec<(&str, &str)> = self
            .query
            .iter()
            .map(|(name, value)| {
                if name == "key" {
                    (name.as_str(), "<redacted>")
                } else {
                    (name.as_str(), value.as_str())
                }
            })
            .collect();

        f.debug_struct("TransportRequest")
            .field("endpoint", &self.endpoint)
            .field("query", &query)
            .field("body", &self.body)
            .finish()
    }
}

/// Raw HTTP response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check for a 2xx status
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Trait for "send request, get response" HTTP transports
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// POST a JSON body and return the raw response.
    ///
    /// Only network-level failures are errors; any HTTP status is returned
    /// as a response.
    async fn post_json(&self, request: TransportRequest) -> Result<TransportResponse>;
}

/// Trait for clinical entity extractors
#[async_trait::async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Extract clinical entities from a narrative, in the order reported
    async fn extract(&self, clinical_text: &str) -> Result<Vec<ExtractedEntity>>;

    /// Get extractor name for logging
    fn name(&self) -> &str;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_and_codes() {
        let err = ExtractionError::Transport("connection refused".to_string());
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.code(), "TRANSPORT_ERROR");
        assert_eq!(err.detail(), "connection refused");

        let err = ExtractionError::PayloadDecode("expected value".to_string());
        assert_eq!(err.kind(), ErrorKind::PayloadDecode);
        assert_eq!(err.code(), "PAYLOAD_DECODE_ERROR");
    }

    #[test]
    fn test_localized_messages() {
        let err = ExtractionError::Transport("HTTP 500".to_string());
        assert_eq!(err.localized(Locale::En), "Transport error: HTTP 500");
        assert_eq!(
            err.localized(Locale::Id),
            "Gagal terhubung ke Gemini API: HTTP 500"
        );

        let err = ExtractionError::Unknown("boom".to_string());
        assert_eq!(
            err.localized(Locale::Id),
            "Kesalahan saat memproses respons Gemini API: boom"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: ExtractionError = ConfigError::InvalidValue {
            key: "GEMINI_TIMEOUT_SECS".to_string(),
            value: "soon".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::Config);
        assert!(err.detail().contains("GEMINI_TIMEOUT_SECS"));
    }

    #[test]
    fn test_transport_request_redacts_key() {
        let request = TransportRequest::new(
            "https://example.test/v1beta/models/m:generateContent",
            serde_json::json!({}),
        )
        .with_query("key", "secret-key")
        .with_query("alt", "json");

        let debug = format!("{request:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("alt"));
    }

    #[test]
    fn test_transport_response_success_range() {
        assert!(TransportResponse::new(200, "").is_success());
        assert!(TransportResponse::new(204, "").is_success());
        assert!(!TransportResponse::new(302, "").is_success());
        assert!(!TransportResponse::new(500, "").is_success());
    }
}
