//! Human-readable rendering of extraction results

use snomed_core::{ExtractedEntity, Locale};
use std::fmt::Write;

/// Narrative used when the user gives no input
pub const DEFAULT_NARRATIVE: &str = "Pasien perempuan 73 tahun dibawa keluarga dengan keluhan \
mendadak lemah pada separuh tubuh kanan sejak 2 jam yang lalu. Pasien juga mengalami kesulitan \
berbicara. Riwayat hipertensi dan fibrilasi atrial.";

/// Shown when no credential is configured
pub const MISSING_KEY_HELP: &str = "Create a .env file in the working directory with:\n  \
GEMINI_API_KEY=YOUR_GEMINI_API_KEY_HERE\n\
or set GEMINI_API_KEY in your environment.";

/// User-facing strings for one locale
pub struct Labels {
    pub prompt: &'static str,
    pub using_default: &'static str,
    pub processing: &'static str,
    pub analyzing: &'static str,
    pub heading: &'static str,
    pub entity: &'static str,
    pub text: &'static str,
    pub preferred_term: &'static str,
    pub category: &'static str,
    pub confidence: &'static str,
    pub context: &'static str,
    pub laterality: &'static str,
    pub severity: &'static str,
    pub code: &'static str,
    pub none_found: &'static str,
    pub summary: &'static str,
    pub elapsed: &'static str,
}

static EN: Labels = Labels {
    prompt: "Enter a clinical narrative (or press Enter for the default Indonesian example):",
    using_default: "Using default text:",
    processing: "Processing the given text:",
    analyzing: "Status: analysing the clinical narrative with Gemini...",
    heading: "--- Extraction and Mapping Results ---",
    entity: "Entity",
    text: "Original text",
    preferred_term: "Preferred term",
    category: "Semantic category",
    confidence: "Confidence",
    context: "Context",
    laterality: "Laterality",
    severity: "Severity",
    code: "SNOMED CT code",
    none_found: "No entities were extracted or mapped.",
    summary: "Processing complete. Clinical entities found:",
    elapsed: "Total processing time:",
};

static ID: Labels = Labels {
    prompt: "Masukkan narasi klinis (atau tekan Enter untuk contoh default berbahasa Indonesia):",
    using_default: "Menggunakan teks default:",
    processing: "Memproses teks yang diberikan:",
    analyzing: "Status: Menganalisis narasi klinis dengan Gemini AI...",
    heading: "--- Hasil Ekstraksi dan Pemetaan ---",
    entity: "Entitas",
    text: "Teks Asli",
    preferred_term: "Istilah Pilihan",
    category: "Kategori Semantik",
    confidence: "Skor Kepercayaan",
    context: "Konteks",
    laterality: "Lateralitas",
    severity: "Tingkat Keparahan",
    code: "Kode SNOMED CT",
    none_found: "Tidak ada entitas yang diekstrak atau dipetakan dengan sukses.",
    summary: "Pemrosesan selesai. Entitas klinis ditemukan:",
    elapsed: "Waktu proses total:",
};

impl Labels {
    pub fn for_locale(locale: Locale) -> &'static Labels {
        match locale {
            Locale::En => &EN,
            Locale::Id => &ID,
        }
    }
}

/// Pick the narrative to analyse; blank input falls back to the example.
///
/// Non-blank input is sent exactly as given.
pub fn resolve_text(input: Option<&str>) -> (String, bool) {
    match input {
        Some(text) if !text.trim().is_empty() => (text.to_string(), false),
        _ => (DEFAULT_NARRATIVE.to_string(), true),
    }
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() {
        "N/A"
    } else {
        value
    }
}

/// Numbered listing of entities
pub fn render_entities(entities: &[ExtractedEntity], labels: &Labels) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", labels.heading);

    if entities.is_empty() {
        let _ = writeln!(out, "{}", labels.none_found);
        return out;
    }

    let rows = |e: &ExtractedEntity| {
        [
            (labels.text, e.text.clone()),
            (labels.preferred_term, or_na(&e.preferred_term).to_string()),
            (labels.category, e.semantic_category.to_string()),
            (labels.confidence, e.confidence_score.to_string()),
            (labels.context, e.context.to_string()),
            (labels.laterality, e.laterality.to_string()),
            (labels.severity, e.severity.to_string()),
            (labels.code, or_na(&e.snomed_code).to_string()),
        ]
    };
    let width = rows(&entities[0])
        .iter()
        .map(|(label, _)| label.chars().count())
        .max()
        .unwrap_or(0)
        + 1;

    for (i, entity) in entities.iter().enumerate() {
        let _ = writeln!(out, "\n{} {}:", labels.entity, i + 1);
        for (label, value) in rows(entity) {
            let _ = writeln!(out, "  {:<width$} {}", format!("{label}:"), value);
        }
    }

    out
}

/// Closing lines with the entity count and elapsed time
pub fn render_summary(count: usize, elapsed_ms: f64, labels: &Labels) -> String {
    format!(
        "\n--- {} {} ---\n{} {:.2} ms",
        labels.summary, count, labels.elapsed, elapsed_ms
    )
}
