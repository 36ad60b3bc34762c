use std::sync::Arc;

use crate::application::ports::{TextSplitter, TextSplitterError};
use crate::presentation::config::{ChunkingSettings, ChunkingStrategy};

use super::{RecursiveCharacterSplitter, TokenTextSplitter};

pub struct TextSplitterFactory;

impl TextSplitterFactory {
    pub fn create(settings: &ChunkingSettings) -> Result<Arc<dyn TextSplitter>, TextSplitterError> {
        let splitter: Arc<dyn TextSplitter> = match settings.strategy {
            ChunkingStrategy::Token => Arc::new(TokenTextSplitter::new(
                settings.chunk_size,
                settings.chunk_overlap,
            )?),
            ChunkingStrategy::Character => Arc::new(RecursiveCharacterSplitter::new(
                settings.chunk_size,
                settings.chunk_overlap,
            )),
        };
        Ok(splitter)
    }
}
