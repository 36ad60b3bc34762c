use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::application::services::RagService;
use crate::domain::{AnswerResult, SourceExcerpt};

/// Nodes of the answer graph.
///
/// `Analyze → Generate → Validate → End`, with `Validate → Regenerate →
/// Generate` for weak answers and `Generate → Error → End` on failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStep {
    Analyze,
    Generate,
    Validate,
    Regenerate,
    Error,
    End,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowEvent {
    Analyzed,
    Generated,
    GenerationFailed,
    Accepted,
    Rejected,
    RetriesExhausted,
    Retried,
    ErrorHandled,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Analyze => "analyze",
            Self::Generate => "generate",
            Self::Validate => "validate",
            Self::Regenerate => "regenerate",
            Self::Error => "error",
            Self::End => "end",
        };
        f.write_str(name)
    }
}

/// The transition table. Anything not listed is a bug in the driver.
pub fn transition(
    step: WorkflowStep,
    event: WorkflowEvent,
) -> Result<WorkflowStep, WorkflowError> {
    use WorkflowEvent as E;
    use WorkflowStep as S;

    match (step, event) {
        (S::Analyze, E::Analyzed) => Ok(S::Generate),
        (S::Generate, E::Generated) => Ok(S::Validate),
        (S::Generate, E::GenerationFailed) => Ok(S::Error),
        (S::Validate, E::Accepted) => Ok(S::End),
        (S::Validate, E::Rejected) => Ok(S::Regenerate),
        (S::Validate, E::RetriesExhausted) => Ok(S::End),
        (S::Regenerate, E::Retried) => Ok(S::Generate),
        (S::Error, E::ErrorHandled) => Ok(S::End),
        (step, event) => Err(WorkflowError::InvalidTransition { step, event }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkflowPolicy {
    pub min_answer_chars: usize,
    pub min_confidence: f32,
    pub max_retries: u32,
}

impl Default for WorkflowPolicy {
    fn default() -> Self {
        Self {
            min_answer_chars: 10,
            min_confidence: 0.3,
            max_retries: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Validation {
    Passed,
    Rejected { reason: RejectReason },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    AnswerTooShort { chars: usize },
    LowConfidence { confidence: f32 },
}

pub fn validate(answer: &str, confidence: f32, policy: &WorkflowPolicy) -> Validation {
    let chars = answer.chars().count();
    if chars < policy.min_answer_chars {
        return Validation::Rejected {
            reason: RejectReason::AnswerTooShort { chars },
        };
    }
    if confidence < policy.min_confidence {
        return Validation::Rejected {
            reason: RejectReason::LowConfidence { confidence },
        };
    }
    Validation::Passed
}

/// Per-request state threaded through the graph; never shared between requests.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub query: String,
    /// Excerpts of the passages the current answer was grounded on.
    pub context: Vec<String>,
    pub answer: String,
    pub confidence: f32,
    pub sources: Vec<SourceExcerpt>,
    pub step: WorkflowStep,
    pub error: Option<String>,
    pub retry_count: u32,
}

impl WorkflowState {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            context: Vec::new(),
            answer: String::new(),
            confidence: 0.0,
            sources: Vec::new(),
            step: WorkflowStep::Analyze,
            error: None,
            retry_count: 0,
        }
    }

    fn advance(&mut self, event: WorkflowEvent) -> Result<(), WorkflowError> {
        let next = transition(self.step, event)?;
        tracing::debug!(from = %self.step, to = %next, ?event, "Workflow transition");
        self.step = next;
        Ok(())
    }

    fn apply(&mut self, result: AnswerResult) {
        self.context = result.sources.iter().map(|s| s.excerpt.clone()).collect();
        self.answer = result.answer;
        self.confidence = result.confidence;
        self.sources = result.sources;
    }

    fn snapshot(&self) -> AnswerResult {
        AnswerResult {
            answer: self.answer.clone(),
            confidence: self.confidence,
            sources: self.sources.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkflowOutcome {
    pub query: String,
    pub answer: String,
    pub confidence: f32,
    pub sources: Vec<SourceExcerpt>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<WorkflowState> for WorkflowOutcome {
    fn from(state: WorkflowState) -> Self {
        Self {
            query: state.query,
            answer: state.answer,
            confidence: state.confidence,
            sources: state.sources,
            error: state.error,
        }
    }
}

/// Orders attempts by (long enough, confidence, length). Ties keep the earlier
/// attempt.
fn outranks(candidate: &AnswerResult, incumbent: &AnswerResult, policy: &WorkflowPolicy) -> bool {
    let key = |result: &AnswerResult| {
        let chars = result.answer.chars().count();
        (chars >= policy.min_answer_chars, result.confidence, chars)
    };
    let (long_a, confidence_a, chars_a) = key(candidate);
    let (long_b, confidence_b, chars_b) = key(incumbent);

    long_a
        .cmp(&long_b)
        .then(confidence_a.total_cmp(&confidence_b))
        .then(chars_a.cmp(&chars_b))
        .is_gt()
}

pub fn apology(error: &str) -> String {
    format!("I apologize, but I encountered an error: {error}")
}

/// Drives a question through analyze/generate/validate with a bounded number
/// of regenerations. At the cap the strongest attempt wins, not the last one.
/// Failures come back as an apology answer, never as `Err`.
pub struct AnswerWorkflow {
    rag_service: Arc<RagService>,
    policy: WorkflowPolicy,
}

impl AnswerWorkflow {
    pub fn new(rag_service: Arc<RagService>, policy: WorkflowPolicy) -> Self {
        Self {
            rag_service,
            policy,
        }
    }

    pub fn policy(&self) -> &WorkflowPolicy {
        &self.policy
    }

    pub async fn run(&self, query: &str) -> WorkflowOutcome {
        match self.drive(WorkflowState::new(query), None).await {
            Ok(outcome) => outcome,
            Err(e) => self.failed(query, &e),
        }
    }

    /// Like [`AnswerWorkflow::run`], but gives up with
    /// [`WorkflowError::Cancelled`] at the next suspension point once `cancel`
    /// fires.
    pub async fn run_with_cancellation(
        &self,
        query: &str,
        cancel: &CancellationToken,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        match self.drive(WorkflowState::new(query), Some(cancel)).await {
            Err(WorkflowError::Cancelled) => Err(WorkflowError::Cancelled),
            Err(e) => Ok(self.failed(query, &e)),
            Ok(outcome) => Ok(outcome),
        }
    }

    fn failed(&self, query: &str, error: &WorkflowError) -> WorkflowOutcome {
        tracing::error!(error = %error, "Workflow aborted");
        WorkflowOutcome {
            query: query.to_string(),
            answer: apology(&error.to_string()),
            confidence: 0.0,
            sources: Vec::new(),
            error: Some(error.to_string()),
        }
    }

    #[tracing::instrument(skip_all)]
    async fn drive(
        &self,
        mut state: WorkflowState,
        cancel: Option<&CancellationToken>,
    ) -> Result<WorkflowOutcome, WorkflowError> {
        let mut best: Option<AnswerResult> = None;

        loop {
            if cancel.is_some_and(CancellationToken::is_cancelled) {
                return Err(WorkflowError::Cancelled);
            }

            match state.step {
                WorkflowStep::Analyze => state.advance(WorkflowEvent::Analyzed)?,
                WorkflowStep::Generate => {
                    let request = self.rag_service.request(state.query.clone());
                    let result = match cancel {
                        Some(token) => tokio::select! {
                            biased;
                            _ = token.cancelled() => return Err(WorkflowError::Cancelled),
                            result = self.rag_service.answer(&request) => result,
                        },
                        None => self.rag_service.answer(&request).await,
                    };

                    match result {
                        Ok(answer) => {
                            state.apply(answer);
                            state.advance(WorkflowEvent::Generated)?;
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "Answer generation failed");
                            state.error = Some(e.to_string());
                            state.advance(WorkflowEvent::GenerationFailed)?;
                        }
                    }
                }
                WorkflowStep::Validate => {
                    let candidate = state.snapshot();
                    if best
                        .as_ref()
                        .is_none_or(|b| outranks(&candidate, b, &self.policy))
                    {
                        best = Some(candidate);
                    }

                    let can_retry = state.retry_count < self.policy.max_retries;
                    match validate(&state.answer, state.confidence, &self.policy) {
                        Validation::Passed => state.advance(WorkflowEvent::Accepted)?,
                        Validation::Rejected { reason } if can_retry => {
                            tracing::debug!(?reason, retry = state.retry_count, "Answer rejected");
                            state.advance(WorkflowEvent::Rejected)?;
                        }
                        Validation::Rejected { reason } => {
                            tracing::info!(
                                ?reason,
                                retries = state.retry_count,
                                "Retry cap reached, keeping best answer"
                            );
                            if let Some(best) = best.take() {
                                state.apply(best);
                            }
                            state.advance(WorkflowEvent::RetriesExhausted)?;
                        }
                    }
                }
                WorkflowStep::Regenerate => {
                    state.retry_count += 1;
                    state.advance(WorkflowEvent::Retried)?;
                }
                WorkflowStep::Error => {
                    let message = state.error.as_deref().unwrap_or("unknown error");
                    state.answer = apology(message);
                    state.confidence = 0.0;
                    state.sources.clear();
                    state.context.clear();
                    state.advance(WorkflowEvent::ErrorHandled)?;
                }
                WorkflowStep::End => return Ok(state.into()),
            }
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("workflow cancelled")]
    Cancelled,
    #[error("no transition from {step} on {event:?}")]
    InvalidTransition {
        step: WorkflowStep,
        event: WorkflowEvent,
    },
}
