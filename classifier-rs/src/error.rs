use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClassifierError {
    /// Request-level failure: the body is missing a feature or carries a
    /// non-numeric value. Never reaches the model.
    #[error("{0}")]
    MalformedInput(String),

    #[error("Model artifact I/O error: {0}")]
    ArtifactIo(#[from] std::io::Error),

    #[error("Model artifact is not valid JSON: {0}")]
    ArtifactFormat(#[from] serde_json::Error),

    /// Fitting, scaling or prediction rejected by the learning backend.
    #[error("Model error: {0}")]
    Model(#[from] aprender::error::AprenderError),

    #[error("Invalid model: {0}")]
    InvalidModel(String),
}

impl ClassifierError {
    /// Startup failures abort the process; everything else is scoped to a
    /// single request.
    pub fn is_startup_failure(&self) -> bool {
        !matches!(self, ClassifierError::MalformedInput(_))
    }
}

pub type Result<T> = std::result::Result<T, ClassifierError>;
