//! Gemini entity extraction client
//!
//! Sends one schema-constrained `generateContent` request per narrative and
//! decodes the structured reply into clinical entities.
//!
//! Author: hephaex@gmail.com

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use snomed_core::{
    EntityExtractor, ExtractedEntity, ExtractionError, GeminiConfig, Result, Transport,
    TransportRequest,
};
use tracing::{debug, info, warn};

use crate::request::build_request;
use crate::response::{decode_entities, decode_envelope, first_part_text};
use crate::transport::HttpTransport;
use crate::wire::GenerateContentRequest;

/// Longest slice of an error response body kept in error messages
const MAX_ERROR_BODY_CHARS: usize = 500;

/// Gemini API client for clinical entity extraction
pub struct GeminiExtractor {
    transport: Arc<dyn Transport>,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f64,
    narrative_language: String,
}

impl GeminiExtractor {
    /// Create a new client with default model settings
    pub fn new(transport: Arc<dyn Transport>, api_key: impl Into<String>) -> Self {
        let defaults = GeminiConfig::default();
        Self {
            transport,
            api_key: api_key.into(),
            base_url: defaults.base_url,
            model: defaults.model,
            temperature: defaults.temperature,
            narrative_language: defaults.narrative_language,
        }
    }

    /// Create from config with the reqwest transport
    pub fn from_config(config: &GeminiConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(config)?;
        Self::from_config_with_transport(config, Arc::new(transport))
    }

    /// Create from config with an injected transport
    pub fn from_config_with_transport(
        config: &GeminiConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let api_key = config
            .api_key
            .as_ref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ExtractionError::Config("Gemini API key required".to_string()))?;

        Ok(Self {
            transport,
            api_key: api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
            narrative_language: config.narrative_language.clone(),
        })
    }

    /// Set custom base URL (for proxies or compatible APIs)
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_narrative_language(mut self, language: impl Into<String>) -> Self {
        self.narrative_language = language.into();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// `generateContent` endpoint, without the credential
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }

    /// Build the request body for a narrative
    pub fn build_request(&self, clinical_text: &str) -> GenerateContentRequest {
        build_request(&self.narrative_language, self.temperature, clinical_text)
    }

    /// Build the full transport request, credential included
    pub fn transport_request(&self, clinical_text: &str) -> Result<TransportRequest> {
        let body = serde_json::to_value(self.build_request(clinical_text))
            .map_err(|e| ExtractionError::Unknown(format!("Failed to encode request: {e}")))?;

        Ok(TransportRequest::new(self.endpoint(), body).with_query("key", self.api_key.as_str()))
    }

    /// Extract clinical entities from a narrative.
    ///
    /// Returns the entities in the order the model reported them. An empty
    /// list means the model found no concepts; every failure is an error.
    pub async fn extract_entities(&self, clinical_text: &str) -> Result<Vec<ExtractedEntity>> {
        let start = Instant::now();
        info!(
            model = %self.model,
            chars = clinical_text.chars().count(),
            "Requesting clinical entity extraction"
        );

        match self.request_entities(clinical_text).await {
            Ok(entities) => {
                info!(
                    entities = entities.len(),
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Entity extraction completed"
                );
                Ok(entities)
            }
            Err(e) => {
                warn!(code = e.code(), error = %e, "Entity extraction failed");
                Err(e)
            }
        }
    }

    async fn request_entities(&self, clinical_text: &str) -> Result<Vec<ExtractedEntity>> {
        let request = self.transport_request(clinical_text)?;
        let response = self.transport.post_json(request).await?;

        if !response.is_success() {
            return Err(ExtractionError::Transport(format!(
                "Gemini API returned HTTP {}: {}",
                response.status,
                truncate(response.body.trim(), MAX_ERROR_BODY_CHARS)
            )));
        }

        let envelope = decode_envelope(&response.body)?;

        if let Some(usage) = &envelope.usage_metadata {
            debug!(
                prompt_tokens = usage.prompt_token_count,
                candidate_tokens = usage.candidates_token_count,
                total_tokens = usage.total_token_count,
                "Gemini token usage"
            );
        }
        if let Some(reason) = envelope
            .candidates
            .as_deref()
            .and_then(|c| c.first())
            .and_then(|c| c.finish_reason.as_deref())
        {
            debug!(finish_reason = reason, "Gemini candidate finished");
        }

        decode_entities(first_part_text(&envelope)?)
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[async_trait]
impl EntityExtractor for GeminiExtractor {
    async fn extract(&self, clinical_text: &str) -> Result<Vec<ExtractedEntity>> {
        self.extract_entities(clinical_text).await
    }

    fn name(&self) -> &str {
        "gemini"
    }
}

// ============================================================================
// Tests
// ============================================================================
