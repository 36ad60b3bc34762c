use async_trait::async_trait;
use tiktoken_rs::CoreBPE;
use unicode_segmentation::UnicodeSegmentation;

use crate::application::ports::{TextSplitter, TextSplitterError};
use crate::domain::{Chunk, DocumentId};

/// Packs word-boundary segments into chunks of at most `chunk_size` cl100k
/// tokens, repeating the trailing `chunk_overlap` tokens of each chunk at the
/// start of the next.
pub struct TokenTextSplitter {
    bpe: CoreBPE,
    chunk_size: usize,
    chunk_overlap: usize,
}

struct Piece<'a> {
    text: &'a str,
    tokens: usize,
}

impl TokenTextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, TextSplitterError> {
        if chunk_size == 0 {
            return Err(TextSplitterError::InvalidConfiguration(
                "chunk size must be at least one token".to_string(),
            ));
        }
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| {
            TextSplitterError::TokenizerUnavailable(format!("cl100k_base: {e}"))
        })?;

        Ok(Self {
            bpe,
            chunk_size,
            chunk_overlap: if chunk_overlap < chunk_size {
                chunk_overlap
            } else {
                0
            },
        })
    }

    pub fn count_tokens(&self, text: &str) -> usize {
        self.bpe.encode_ordinary(text).len()
    }

    /// Word-boundary segments, with any segment over budget broken further
    /// into single grapheme clusters.
    fn pieces<'a>(&self, text: &'a str) -> Vec<Piece<'a>> {
        let mut pieces = Vec::new();
        for segment in text.split_word_bounds() {
            let tokens = self.count_tokens(segment);
            if tokens <= self.chunk_size {
                pieces.push(Piece {
                    text: segment,
                    tokens,
                });
                continue;
            }
            for grapheme in segment.graphemes(true) {
                pieces.push(Piece {
                    text: grapheme,
                    tokens: self.count_tokens(grapheme).clamp(1, self.chunk_size),
                });
            }
        }
        pieces
    }

    /// First index of the tail of `pieces[start..end]` that fits in the overlap.
    fn overlap_start(&self, pieces: &[Piece<'_>], start: usize, end: usize) -> usize {
        let mut budget = self.chunk_overlap;
        let mut at = end;
        while at > start + 1 && pieces[at - 1].tokens <= budget {
            budget -= pieces[at - 1].tokens;
            at -= 1;
        }
        at
    }
}

#[async_trait]
impl TextSplitter for TokenTextSplitter {
    async fn split(
        &self,
        text: &str,
        source_id: &str,
        document_id: DocumentId,
    ) -> Result<Vec<Chunk>, TextSplitterError> {
        let pieces = self.pieces(text);
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < pieces.len() {
            let mut end = start;
            let mut tokens = 0;
            while end < pieces.len() && tokens + pieces[end].tokens <= self.chunk_size {
                tokens += pieces[end].tokens;
                end += 1;
            }
            // Always take at least one piece.
            end = end.max(start + 1);

            let body: String = pieces[start..end].iter().map(|p| p.text).collect();
            let body = body.trim();
            if !body.is_empty() {
                chunks.push(Chunk::new(
                    body.to_string(),
                    source_id.to_string(),
                    document_id,
                    chunks.len(),
                ));
            }

            if end == pieces.len() {
                break;
            }
            start = self.overlap_start(&pieces, start, end);
        }

        tracing::debug!(chunk_count = chunks.len(), source = %source_id, "Token split complete");
        Ok(chunks)
    }
}
