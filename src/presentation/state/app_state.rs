use std::sync::Arc;

use crate::application::services::{AnswerWorkflow, RagService};
use crate::presentation::config::Settings;

#[derive(Clone)]
pub struct AppState {
    pub rag_service: Arc<RagService>,
    pub workflow: Arc<AnswerWorkflow>,
    pub settings: Arc<Settings>,
}
