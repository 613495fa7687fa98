use serde::Serialize;

/// Maximum number of characters of raw model output kept in an [`ExtractionError`].
pub const SNIPPET_CHARS: usize = 200;

/// Client input is incomplete or out of range. Never triggers a fallback.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Invalid value for {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

/// The model output could not be turned into structured data.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Serialize)]
#[error("{reason}: {raw_text_snippet}")]
pub struct ExtractionError {
    pub reason: String,
    pub raw_text_snippet: String,
}

impl ExtractionError {
    pub fn unparsable(raw: &str) -> Self {
        Self {
            reason: "unparsable".to_string(),
            raw_text_snippet: snippet(raw),
        }
    }
}

fn snippet(raw: &str) -> String {
    let trimmed = raw.trim();
    match trimmed.char_indices().nth(SNIPPET_CHARS) {
        Some((end, _)) => format!("{}...", &trimmed[..end]),
        None => trimmed.to_string(),
    }
}
