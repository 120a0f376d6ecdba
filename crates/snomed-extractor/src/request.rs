//! Request construction
//!
//! Builds the extraction prompt and the response schema that constrains the
//! model to an array of clinical entity objects.

use serde_json::{json, Map, Value};
use snomed_core::{
    ConfidenceScore, EntityContext, ExtractedEntity, Laterality, SemanticCategory, Severity,
};

use crate::wire::{Content, GenerateContentRequest, GenerationConfig};

/// Instruction prompt with `{language}` and `{clinical_text}` placeholders
pub const PROMPT_TEMPLATE: &str = include_str!("prompts/clinical_extraction.txt");

pub const JSON_MIME_TYPE: &str = "application/json";

/// Render the extraction prompt for a narrative.
///
/// The narrative is embedded as a JSON string literal, so quotes and line
/// breaks inside it are escaped and cannot end the quoted region.
pub fn build_prompt(narrative_language: &str, clinical_text: &str) -> String {
    let quoted = Value::String(clinical_text.to_string()).to_string();

    PROMPT_TEMPLATE
        .replace("{language}", narrative_language)
        .replace("{clinical_text}", &quoted)
}

fn string_property(description: &str) -> Value {
    json!({ "type": "STRING", "description": description })
}

fn enum_property(values: Vec<&'static str>, description: &str) -> Value {
    json!({ "type": "STRING", "enum": values, "description": description })
}

/// Response schema: an array of entity objects with the nine entity fields
pub fn response_schema() -> Value {
    let mut properties = Map::new();
    properties.insert(
        "text".into(),
        string_property("The exact clinical term extracted from the text."),
    );
    properties.insert(
        "snomedCode".into(),
        string_property(
            "The most appropriate SNOMED CT code (SCTID) for the concept. Leave empty if unsure.",
        ),
    );
    properties.insert(
        "preferredTerm".into(),
        string_property("The SNOMED CT Preferred Term for the concept. Leave empty if unsure."),
    );
    properties.insert(
        "semanticCategory".into(),
        enum_property(
            SemanticCategory::wire_values(),
            "The semantic category of the concept (e.g., disorder, finding, procedure, observable entity, medicinal product).",
        ),
    );
    properties.insert(
        "confidenceScore".into(),
        enum_property(
            ConfidenceScore::wire_values(),
            "Confidence in the accuracy of the extracted concept and its SNOMED mapping (High, Medium, or Low).",
        ),
    );
    properties.insert(
        "context".into(),
        enum_property(
            EntityContext::wire_values(),
            "The context of the term (present, absent, or unknown).",
        ),
    );
    properties.insert(
        "laterality".into(),
        enum_property(
            Laterality::wire_values(),
            "Laterality of the concept, if applicable (left, right, bilateral, or N/A).",
        ),
    );
    properties.insert(
        "severity".into(),
        enum_property(
            Severity::wire_values(),
            "Severity of the concept, if applicable (mild, moderate, severe, or N/A).",
        ),
    );
    properties.insert(
        "singularForm".into(),
        string_property("The singular form of the extracted term, if applicable."),
    );

    json!({
        "type": "ARRAY",
        "items": {
            "type": "OBJECT",
            "properties": properties,
            "required": ExtractedEntity::REQUIRED_FIELDS,
            "propertyOrdering": ExtractedEntity::FIELD_NAMES,
        }
    })
}

/// Build the full `generateContent` request for a narrative
pub fn build_request(
    narrative_language: &str,
    temperature: f64,
    clinical_text: &str,
) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![Content::user_text(build_prompt(
            narrative_language,
            clinical_text,
        ))],
        generation_config: GenerationConfig {
            response_mime_type: JSON_MIME_TYPE.to_string(),
            response_schema: response_schema(),
            temperature,
        },
    }
}
