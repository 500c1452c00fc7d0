use serde::Serialize;

/// Column order of the `midi_files` table, shared by the CSV reader, the
/// API payload, and the generated INSERT statements.
pub const TABLE_COLUMNS: [&str; 8] = [
    "file_id",
    "significant_prediction",
    "predicted_music_style",
    "style_change_timestamps",
    "num_tokens",
    "confidence_scores",
    "prediction",
    "human_agree",
];

/// One normalized row of classification output.
///
/// `None` is the "unknown" sentinel for the two optional fields: it
/// serializes to JSON `null` on the API path and renders as the literal
/// `NULL` on the SQL path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Record {
    pub file_id: String,
    pub significant_prediction: String,
    pub predicted_music_style: String,
    pub style_change_timestamps: String,
    pub num_tokens: Option<i64>,
    pub confidence_scores: String,
    pub prediction: String,
    pub human_agree: Option<bool>,
}

impl Record {
    /// Whether this row may be persisted. An empty `file_id` marks a blank
    /// row; a `file_id` equal to the literal column name means a header row
    /// leaked through as data. Both are dropped, never errored.
    pub fn is_valid(&self) -> bool {
        !self.file_id.is_empty() && self.file_id != TABLE_COLUMNS[0]
    }
}

/// Coerce the integer-like `num_tokens` column. Only non-empty, all-ASCII-
/// digit input counts; anything else (absent, signed, decimal, garbage, or
/// out of `i64` range) degrades to the unknown sentinel instead of erroring.
pub fn coerce_num_tokens(raw: Option<&str>) -> Option<i64> {
    let s = raw?;
    if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Coerce the tri-state `human_agree` column: case-insensitive `true` or
/// `false`, everything else is unknown.
pub fn coerce_human_agree(raw: Option<&str>) -> Option<bool> {
    match raw?.to_ascii_lowercase().as_str() {
        "true" => Some(true),
        "false" => Some(false),
        _ => None,
    }
}
