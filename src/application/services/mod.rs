mod answer_workflow;
mod document_chunker;
mod prompt_builder;
mod rag_service;

pub use answer_workflow::{
    AnswerWorkflow, RejectReason, Validation, WorkflowError, WorkflowEvent, WorkflowOutcome,
    WorkflowPolicy, WorkflowState, WorkflowStep, apology, transition, validate,
};
pub use document_chunker::DocumentChunker;
pub use prompt_builder::{DEFAULT_SYSTEM_PROMPT, build_prompt};
pub use rag_service::{AnswerRequest, AnswerStream, IngestionError, RagService, RetrievalError};
