//! Clinical entity model
//!
//! The record returned for every clinical concept recognised in a narrative,
//! plus the closed value sets used by the response schema. Each value set
//! keeps its exact wire spelling (`"observable entity"`, `"High"`, `"N/A"`)
//! and parses case-insensitively.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Error returned when a wire value does not belong to a value set
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind} value: {value:?}")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal $(| $alias:literal)*
            ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every allowed value, in schema order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Get the wire representation
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire,)+
                }
            }

            /// Wire values of every allowed value, in schema order
            pub fn wire_values() -> Vec<&'static str> {
                Self::ALL.iter().map(|v| v.as_str()).collect()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let normalized = s.trim().to_lowercase();
                $(
                    if normalized == $wire.to_lowercase() $(|| normalized == $alias)* {
                        return Ok(Self::$variant);
                    }
                )+
                Err(UnknownVariant {
                    kind: stringify!($name),
                    value: s.to_string(),
                })
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

wire_enum! {
    /// Coarse clinical classification of a concept
    pub enum SemanticCategory {
        Disorder => "disorder",
        Finding => "finding",
        Procedure => "procedure",
        ObservableEntity => "observable entity",
        MedicinalProduct => "medicinal product",
    }
}

wire_enum! {
    /// Model confidence in the extracted concept and its code
    pub enum ConfidenceScore {
        High => "High",
        Medium => "Medium",
        Low => "Low",
    }
}

wire_enum! {
    /// Whether the concept is asserted, negated or uncertain in the narrative
    pub enum EntityContext {
        Present => "present",
        Absent => "absent",
        Unknown => "unknown",
    }
}

wire_enum! {
    /// Anatomical side qualifier
    pub enum Laterality {
        Left => "left",
        Right => "right",
        Bilateral => "bilateral",
        NotApplicable => "N/A" | "na" | "",
    }
}

wire_enum! {
    /// Severity qualifier
    pub enum Severity {
        Mild => "mild",
        Moderate => "moderate",
        Severe => "severe",
        NotApplicable => "N/A" | "na" | "",
    }
}

impl Default for Laterality {
    fn default() -> Self {
        Self::NotApplicable
    }
}

impl Default for Severity {
    fn default() -> Self {
        Self::NotApplicable
    }
}

/// Treat an explicit JSON `null` like an absent field
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// One clinical concept recognised in a narrative
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractedEntity {
    /// Span of the input narrative that mentions the concept
    pub text: String,

    /// SNOMED CT identifier (SCTID), empty when the model was unsure
    #[serde(default, deserialize_with = "null_as_default")]
    pub snomed_code: String,

    /// SNOMED CT preferred term, empty when the model was unsure
    #[serde(default, deserialize_with = "null_as_default")]
    pub preferred_term: String,

    pub semantic_category: SemanticCategory,

    pub confidence_score: ConfidenceScore,

    pub context: EntityContext,

    #[serde(default, deserialize_with = "null_as_default")]
    pub laterality: Laterality,

    #[serde(default, deserialize_with = "null_as_default")]
    pub severity: Severity,

    /// Singular form of `text`, if the model supplied one
    #[serde(default, deserialize_with = "null_as_default")]
    pub singular_form: String,
}

impl ExtractedEntity {
    /// Wire field names, in schema order
    pub const FIELD_NAMES: [&'static str; 9] = [
        "text",
        "snomedCode",
        "preferredTerm",
        "semanticCategory",
        "confidenceScore",
        "context",
        "laterality",
        "severity",
        "singularForm",
    ];

    /// Fields the model must always supply
    pub const REQUIRED_FIELDS: [&'static str; 4] =
        ["text", "semanticCategory", "confidenceScore", "context"];

    /// Create an entity with the required fields; qualifiers default to N/A
    pub fn new(
        text: impl Into<String>,
        semantic_category: SemanticCategory,
        confidence_score: ConfidenceScore,
        context: EntityContext,
    ) -> Self {
        Self {
            text: text.into(),
            snomed_code: String::new(),
            preferred_term: String::new(),
            semantic_category,
            confidence_score,
            context,
            laterality: Laterality::NotApplicable,
            severity: Severity::NotApplicable,
            singular_form: String::new(),
        }
    }

    /// Set the SNOMED CT code and preferred term
    pub fn with_code(mut self, code: impl Into<String>, preferred_term: impl Into<String>) -> Self {
        self.snomed_code = code.into();
        self.preferred_term = preferred_term.into();
        self
    }

    pub fn with_laterality(mut self, laterality: Laterality) -> Self {
        self.laterality = laterality;
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn with_singular_form(mut self, singular_form: impl Into<String>) -> Self {
        self.singular_form = singular_form.into();
        self
    }

    /// Check whether a non-blank SNOMED CT code is present
    pub fn has_code(&self) -> bool {
        !self.snomed_code.trim().is_empty()
    }
}
