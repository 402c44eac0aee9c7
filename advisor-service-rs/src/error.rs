use classifier::ClassifierError;
use thiserror::Error;

use crate::llm_client::LLMError;

/// Failures that stop the process before it starts serving.
#[derive(Error, Debug)]
pub enum StartupError {
    #[error("Configuration error: {0}")]
    Settings(String),

    #[error("Classifier initialization failed: {0}")]
    Classifier(#[from] ClassifierError),

    #[error("LLM client initialization failed: {0}")]
    LlmClient(#[from] LLMError),
}
