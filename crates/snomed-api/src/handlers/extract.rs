//! Entity extraction handler
//!
//! Author: hephaex@gmail.com

use crate::error::AppError;
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use snomed_core::{ExtractedEntity, ExtractionError};
use snomed_extractor::filter_coded_unique;
use std::sync::Arc;
use std::time::Instant;
use uuid::Uuid;

/// Extraction request body
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractRequest {
    /// Clinical narrative to analyse
    pub text: String,
    /// Keep only coded entities, first occurrence per surface text
    #[serde(default)]
    pub coded_only: bool,
}

/// Extraction response body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractResponse {
    pub request_id: Uuid,
    pub entities: Vec<ExtractedEntity>,
    pub count: usize,
    pub processing_time_ms: u64,
}

/// Handle extraction requests
pub async fn extract_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ExtractRequest>, JsonRejection>,
) -> Result<Json<ExtractResponse>, AppError> {
    state.increment_requests();
    let Json(request) = payload?;
    let start = Instant::now();
    let request_id = Uuid::new_v4();

    if request.text.trim().is_empty() {
        return Err(AppError::BadRequest(
            "Clinical text cannot be empty".to_string(),
        ));
    }

    let max_chars = state.config.server.max_text_chars;
    let chars = request.text.chars().count();
    if chars > max_chars {
        return Err(AppError::BadRequest(format!(
            "Clinical text is {chars} characters, limit is {max_chars}"
        )));
    }

    let locale = state.config.gemini.locale;
    let Some(extractor) = state.extractor.as_ref() else {
        state.increment_failures();
        return Err(AppError::extraction(
            ExtractionError::Config("Gemini API key is not configured".to_string()),
            locale,
        ));
    };

    tracing::info!(%request_id, chars, extractor = extractor.name(), "Extraction request");

    let entities = match extractor.extract(&request.text).await {
        Ok(entities) => entities,
        Err(e) => {
            state.increment_failures();
            tracing::warn!(%request_id, kind = ?e.kind(), error = %e, "Extraction failed");
            return Err(AppError::extraction(e, locale));
        }
    };

    let entities = if request.coded_only {
        filter_coded_unique(entities)
    } else {
        entities
    };

    let processing_time_ms = start.elapsed().as_millis() as u64;
    tracing::info!(
        %request_id,
        count = entities.len(),
        processing_time_ms,
        "Extraction completed"
    );

    Ok(Json(ExtractResponse {
        request_id,
        count: entities.len(),
        entities,
        processing_time_ms,
    }))
}
