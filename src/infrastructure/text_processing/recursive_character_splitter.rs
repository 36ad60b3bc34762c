use async_trait::async_trait;

use crate::application::ports::{TextSplitter, TextSplitterError};
use crate::domain::{Chunk, DocumentId};

/// Tried in order when looking for a place to cut inside a window.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// Fixed-size character windows that prefer to end on a paragraph, line,
/// sentence or word boundary found in the second half of the window.
pub struct RecursiveCharacterSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl RecursiveCharacterSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
            chunk_overlap,
        }
    }

    fn effective_overlap(&self) -> usize {
        if self.chunk_overlap < self.chunk_size {
            self.chunk_overlap
        } else {
            0
        }
    }

    fn break_point(window: &[char]) -> Option<usize> {
        let floor = window.len() / 2;
        SEPARATORS.iter().find_map(|separator| {
            let separator: Vec<char> = separator.chars().collect();
            window
                .windows(separator.len())
                .rposition(|candidate| candidate == separator.as_slice())
                .map(|at| at + separator.len())
                .filter(|&end| end > floor)
        })
    }
}

#[async_trait]
impl TextSplitter for RecursiveCharacterSplitter {
    async fn split(
        &self,
        text: &str,
        source_id: &str,
        document_id: DocumentId,
    ) -> Result<Vec<Chunk>, TextSplitterError> {
        let chars: Vec<char> = text.chars().collect();
        let total = chars.len();
        let overlap = self.effective_overlap();

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let hard_end = (start + self.chunk_size).min(total);
            let end = if hard_end == total {
                total
            } else {
                Self::break_point(&chars[start..hard_end]).map_or(hard_end, |cut| start + cut)
            };

            let piece: String = chars[start..end].iter().collect();
            let piece = piece.trim();
            if !piece.is_empty() {
                chunks.push(Chunk::new(
                    piece.to_string(),
                    source_id.to_string(),
                    document_id,
                    chunks.len(),
                ));
            }

            if end == total {
                break;
            }
            let next = end.saturating_sub(overlap);
            start = if next > start { next } else { end };
        }

        Ok(chunks)
    }
}
