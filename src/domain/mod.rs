mod answer;
mod chunk;
mod document;
mod embedding;
mod record;

pub use answer::{
    AnswerResult, NO_RELEVANT_INFORMATION, SourceExcerpt, confidence_of, truncate_excerpt,
};
pub use chunk::{Chunk, DocumentId, RecordId};
pub use document::{ContentType, Document};
pub use embedding::Embedding;
pub use record::{IndexedRecord, Metadata, QueryMatch};
