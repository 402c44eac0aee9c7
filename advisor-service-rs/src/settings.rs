//! Process configuration, read once from the environment at startup.

use std::net::SocketAddr;
use std::path::PathBuf;

use classifier::{FeatureSchema, DEFAULT_MODEL_PATH};

use crate::error::StartupError;

/// Service name used for `ADVISOR_SERVICE_ADDR` / `ADVISOR_SERVICE_PORT`.
pub const SERVICE_NAME: &str = "ADVISOR";
pub const DEFAULT_PORT: u16 = 5000;

pub const DEFAULT_LLM_API_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_LLM_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_LLM_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_LLM_SERVICE_NAME: &str = "OpenAI";

/// Where the classifier comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Fit the built-in greenhouse training set in-process.
    Builtin,
    /// Load a persisted artifact.
    Artifact(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmSettings {
    /// `None` when unset or empty; reported per request, never fatal.
    pub api_key: Option<String>,
    pub api_url: String,
    pub model: String,
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    /// Provider label used in user-facing error messages.
    pub service_name: String,
}

impl LlmSettings {
    pub fn from_env() -> Self {
        Self {
            api_key: config_rs::get_secret(&["LLM_API_KEY", "OPENAI_API_KEY"]),
            api_url: config_rs::get_env_string("LLM_API_URL", DEFAULT_LLM_API_URL),
            model: config_rs::get_env_string("LLM_MODEL", DEFAULT_LLM_MODEL),
            max_tokens: std::env::var("LLM_MAX_TOKENS")
                .ok()
                .and_then(|v| v.trim().parse().ok()),
            timeout_secs: effective_timeout_secs(config_rs::get_env_or(
                "LLM_TIMEOUT_SECS",
                DEFAULT_LLM_TIMEOUT_SECS,
            )),
            service_name: config_rs::get_env_string("LLM_SERVICE_NAME", DEFAULT_LLM_SERVICE_NAME),
        }
    }
}

/// A zero timeout would fail every remote call immediately; treat it as unset.
pub fn effective_timeout_secs(secs: u64) -> u64 {
    if secs == 0 {
        log::warn!(
            "LLM_TIMEOUT_SECS=0 is not a usable timeout, using default {}",
            DEFAULT_LLM_TIMEOUT_SECS
        );
        DEFAULT_LLM_TIMEOUT_SECS
    } else {
        secs
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvisorSettings {
    pub schema: FeatureSchema,
    pub model_source: ModelSource,
    pub bind_addr: SocketAddr,
    pub llm: LlmSettings,
}

impl AdvisorSettings {
    /// Reads `ADVISOR_VARIANT` (`greenhouse` | `soil`), `MODEL_PATH`, the
    /// bind address and the LLM settings.
    pub fn from_env() -> Result<Self, StartupError> {
        let schema = match std::env::var("ADVISOR_VARIANT") {
            Ok(raw) => raw.parse::<FeatureSchema>().map_err(StartupError::Settings)?,
            Err(_) => FeatureSchema::Greenhouse,
        };

        Ok(Self {
            schema,
            model_source: model_source_for(
                schema,
                config_rs::get_env_string("MODEL_PATH", DEFAULT_MODEL_PATH),
            ),
            bind_addr: config_rs::get_bind_address(SERVICE_NAME, DEFAULT_PORT),
            llm: LlmSettings::from_env(),
        })
    }
}

/// The greenhouse variant always fits in-process; the soil variant always
/// loads its persisted random forest.
pub fn model_source_for(schema: FeatureSchema, model_path: impl Into<PathBuf>) -> ModelSource {
    match schema {
        FeatureSchema::Greenhouse => ModelSource::Builtin,
        FeatureSchema::Soil => ModelSource::Artifact(model_path.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_source_follows_variant() {
        assert_eq!(
            model_source_for(FeatureSchema::Greenhouse, "ignored.json"),
            ModelSource::Builtin
        );
        assert_eq!(
            model_source_for(FeatureSchema::Soil, "static/rfc_model.json"),
            ModelSource::Artifact(PathBuf::from("static/rfc_model.json"))
        );
    }

    #[test]
    fn test_zero_timeout_falls_back_to_default() {
        assert_eq!(effective_timeout_secs(0), DEFAULT_LLM_TIMEOUT_SECS);
        assert_eq!(effective_timeout_secs(15), 15);
    }
}
