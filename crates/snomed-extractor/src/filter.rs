//! Entity post-processing

use std::collections::HashSet;

use snomed_core::ExtractedEntity;

/// Keep only coded entities, dropping repeated mentions of the same text.
///
/// The first occurrence of each `text` wins and order is preserved.
pub fn filter_coded_unique(entities: Vec<ExtractedEntity>) -> Vec<ExtractedEntity> {
    let mut seen_texts: HashSet<String> = HashSet::new();

    entities
        .into_iter()
        .filter(|entity| entity.has_code() && seen_texts.insert(entity.text.clone()))
        .collect()
}
