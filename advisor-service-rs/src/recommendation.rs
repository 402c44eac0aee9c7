//! Recommendation requests to the remote language model.
//!
//! Every failure on this path is converted into a [`RecommendationError`]
//! and, at the HTTP edge, into an in-band `error` string. Nothing here is
//! allowed to fail the request itself.

use serde::Serialize;
use std::fmt::Write as _;
use std::sync::Arc;
use thiserror::Error;

use classifier::{FeatureSchema, FeatureVector, SustainabilityClass};

use crate::llm_client::ChatCompletion;

pub const SYSTEM_PROMPT: &str =
    "You are a helpful assistant that provides recommendations for plant health.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecommendationError {
    #[error("{service} API key is not set. Please configure the API key.")]
    MissingCredential { service: String },

    #[error("Error calling {service} API: {message}")]
    RemoteCallFailure { service: String, message: String },

    #[error("Invalid request format: {0}")]
    MalformedInput(String),
}

impl RecommendationError {
    pub fn kind(&self) -> &'static str {
        match self {
            RecommendationError::MissingCredential { .. } => "missing_credential",
            RecommendationError::RemoteCallFailure { .. } => "remote_call_failure",
            RecommendationError::MalformedInput(_) => "malformed_input",
        }
    }
}

/// Wire shape of `/recommend`: exactly one of the two fields is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecommendationOutcome {
    pub recommendation: Option<String>,
    pub error: Option<String>,
}

impl From<Result<String, RecommendationError>> for RecommendationOutcome {
    fn from(result: Result<String, RecommendationError>) -> Self {
        match result {
            Ok(text) => Self {
                recommendation: Some(text),
                error: None,
            },
            Err(err) => Self {
                recommendation: None,
                error: Some(err.to_string()),
            },
        }
    }
}

/// Builds the user prompt: the predicted class plus every feature with
/// its label and unit, in schema order.
pub fn render_prompt(
    schema: FeatureSchema,
    prediction: SustainabilityClass,
    features: &FeatureVector,
) -> String {
    let mut prompt = format!(
        "Given a plant growth prediction of {} with the following conditions:\n",
        prediction
    );
    for (field, value) in schema.fields().iter().zip(features.as_slice()) {
        let _ = writeln!(prompt, "- {}: {}{}", field.label, value, field.unit);
    }
    prompt.push_str(
        "\nProvide a brief recommendation for improving or maintaining plant health.",
    );
    prompt
}

#[derive(Clone)]
pub struct RecommendationRequester {
    provider: Arc<dyn ChatCompletion>,
    service_name: String,
}

impl RecommendationRequester {
    pub fn new(provider: Arc<dyn ChatCompletion>, service_name: impl Into<String>) -> Self {
        Self {
            provider,
            service_name: service_name.into(),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_configured()
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    /// One remote call per invocation; no caching, no retry.
    pub async fn recommend(
        &self,
        schema: FeatureSchema,
        prediction: SustainabilityClass,
        features: &FeatureVector,
    ) -> Result<String, RecommendationError> {
        if !self.provider.is_configured() {
            return Err(RecommendationError::MissingCredential {
                service: self.service_name.clone(),
            });
        }

        let prompt = render_prompt(schema, prediction, features);
        match self.provider.complete(SYSTEM_PROMPT, &prompt).await {
            Ok(text) => Ok(text.trim().to_string()),
            Err(err) => {
                log::error!("Error calling {} API: {}", self.service_name, err);
                Err(RecommendationError::RemoteCallFailure {
                    service: self.service_name.clone(),
                    message: err.to_string(),
                })
            }
        }
    }
}
