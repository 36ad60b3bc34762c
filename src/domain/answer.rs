use serde::Serialize;

use super::QueryMatch;

const EXCERPT_MAX_CHARS: usize = 200;
const ELLIPSIS: &str = "...";

pub const NO_RELEVANT_INFORMATION: &str =
    "I don't have relevant information to answer your question.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnswerResult {
    pub answer: String,
    pub confidence: f32,
    pub sources: Vec<SourceExcerpt>,
}

impl AnswerResult {
    pub fn no_relevant_information() -> Self {
        Self {
            answer: NO_RELEVANT_INFORMATION.to_string(),
            confidence: 0.0,
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceExcerpt {
    pub excerpt: String,
    pub similarity: f32,
}

impl SourceExcerpt {
    pub fn from_match(hit: &QueryMatch) -> Self {
        Self {
            excerpt: truncate_excerpt(&hit.text),
            similarity: hit.similarity,
        }
    }
}

/// Cuts text to 200 characters followed by `...`; shorter text is returned as is.
pub fn truncate_excerpt(text: &str) -> String {
    match text.char_indices().nth(EXCERPT_MAX_CHARS) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}

/// Highest similarity among the hits, or 0.0 when there are none.
pub fn confidence_of(hits: &[QueryMatch]) -> f32 {
    hits.iter()
        .map(|h| h.similarity)
        .fold(None, |best: Option<f32>, s| match best {
            Some(b) if b >= s => Some(b),
            _ => Some(s),
        })
        .unwrap_or(0.0)
}
