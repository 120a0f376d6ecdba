//! Response decoding
//!
//! The model output arrives as JSON text nested inside the JSON response
//! envelope, so decoding runs in two stages with distinct error kinds:
//! 1. envelope: candidates -> content -> parts -> text (`EnvelopeShape`)
//! 2. payload: the part text as an array of entities (`PayloadDecode`)

use serde_json::{Map, Value};
use snomed_core::{ExtractedEntity, ExtractionError, Result};

use crate::wire::GenerateContentResponse;

/// Stage 1: decode the outer response envelope
pub fn decode_envelope(body: &str) -> Result<GenerateContentResponse> {
    serde_json::from_str(body).map_err(|e| {
        ExtractionError::EnvelopeShape(format!("response is not a valid envelope: {e}"))
    })
}

/// Text of the first part of the first candidate
pub fn first_part_text(envelope: &GenerateContentResponse) -> Result<&str> {
    let candidate = match envelope.candidates.as_deref() {
        Some([first, ..]) => first,
        Some([]) | None => {
            let reason = envelope
                .prompt_feedback
                .as_ref()
                .and_then(|f| f.block_reason.as_deref());
            return Err(ExtractionError::EnvelopeShape(match reason {
                Some(reason) => format!("no candidates returned (prompt blocked: {reason})"),
                None => "no candidates returned".to_string(),
            }));
        }
    };

    let parts = candidate
        .content
        .as_ref()
        .and_then(|c| c.parts.as_deref())
        .ok_or_else(|| ExtractionError::EnvelopeShape("candidate has no content parts".into()))?;

    parts
        .first()
        .ok_or_else(|| ExtractionError::EnvelopeShape("candidate content has no parts".into()))?
        .text
        .as_deref()
        .ok_or_else(|| ExtractionError::EnvelopeShape("first part has no text".into()))
}

/// Stage 2: decode the model output as an ordered list of entities.
///
/// Field names are matched case-insensitively, ignoring `_` and `-`, so
/// `SNOMEDCODE` and `snomed_code` both land in `snomedCode`. Unknown fields
/// are ignored.
pub fn decode_entities(payload: &str) -> Result<Vec<ExtractedEntity>> {
    let value: Value = serde_json::from_str(payload)
        .map_err(|e| ExtractionError::PayloadDecode(format!("invalid JSON: {e}")))?;

    let items = match value {
        Value::Array(items) => items,
        other => {
            return Err(ExtractionError::PayloadDecode(format!(
                "expected an array of entities, found {}",
                json_type(&other)
            )))
        }
    };

    items
        .into_iter()
        .enumerate()
        .map(|(index, item)| decode_entity(index, item))
        .collect()
}

/// Decode a full response body into entities
pub fn parse_response(body: &str) -> Result<Vec<ExtractedEntity>> {
    let envelope = decode_envelope(body)?;
    decode_entities(first_part_text(&envelope)?)
}

fn decode_entity(index: usize, item: Value) -> Result<ExtractedEntity> {
    let object = match item {
        Value::Object(object) => object,
        other => {
            return Err(ExtractionError::PayloadDecode(format!(
                "entity #{index}: expected an object, found {}",
                json_type(&other)
            )))
        }
    };

    let object = canonicalize_keys(index, object)?;
    let entity: ExtractedEntity = serde_json::from_value(Value::Object(object))
        .map_err(|e| ExtractionError::PayloadDecode(format!("entity #{index}: {e}")))?;

    if entity.text.trim().is_empty() {
        return Err(ExtractionError::PayloadDecode(format!(
            "entity #{index}: text must not be empty"
        )));
    }

    Ok(entity)
}

fn canonical_field(key: &str) -> Option<&'static str> {
    let folded: String = key
        .chars()
        .filter(|c| *c != '_' && *c != '-')
        .collect();

    ExtractedEntity::FIELD_NAMES
        .iter()
        .copied()
        .find(|name| name.eq_ignore_ascii_case(&folded))
}

/// Rename known fields to their wire names; two keys folding to one field
/// are ambiguous and rejected
fn canonicalize_keys(index: usize, object: Map<String, Value>) -> Result<Map<String, Value>> {
    let mut canonical = Map::new();

    for (key, value) in object {
        let Some(name) = canonical_field(&key) else {
            continue;
        };
        if canonical.insert(name.to_string(), value).is_some() {
            return Err(ExtractionError::PayloadDecode(format!(
                "entity #{index}: field `{name}` given more than once (as `{key}`)"
            )));
        }
    }

    Ok(canonical)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
