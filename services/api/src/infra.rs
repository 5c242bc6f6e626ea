use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::Value;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::debug;
use unslop::config::{AppConfig, PromptDefaults};
use unslop::error::AppError;
use unslop::prompt::{
    PromptError, Scorer, Suggestions, TransformConfig, TransformResult, Transformer,
};
use unslop::telemetry;

use crate::report::ScoredAnalysis;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) defaults: PromptDefaults,
}

/// Loads configuration and installs the tracing subscriber.
pub(crate) fn bootstrap() -> Result<AppConfig, AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    Ok(config)
}

/// Optional transform settings accepted by the HTTP and MCP surfaces.
///
/// Fields are read leniently: a value of the wrong type counts as omitted, so
/// the server default applies and the request still succeeds.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct TransformOptions {
    pub(crate) style: Option<String>,
    pub(crate) mood: Option<String>,
    pub(crate) imperfection: Option<String>,
    pub(crate) preserve_original: bool,
    pub(crate) seed: Option<u64>,
}

impl TransformOptions {
    pub(crate) fn from_payload(payload: &Value) -> Self {
        Self {
            style: option_string(payload, "style"),
            mood: option_string(payload, "mood"),
            imperfection: option_string(payload, "imperfection"),
            preserve_original: payload
                .get("preserve_original")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            seed: payload.get("seed").and_then(|raw| {
                let seed = raw.as_u64();
                if seed.is_none() && !raw.is_null() {
                    debug!(%raw, "ignoring non-integer seed");
                }
                seed
            }),
        }
    }

    pub(crate) fn config(&self, defaults: &PromptDefaults) -> TransformConfig {
        defaults.resolve(
            self.style.as_deref(),
            self.mood.as_deref(),
            self.imperfection.as_deref(),
            self.preserve_original,
        )
    }
}

fn option_string(payload: &Value, field: &'static str) -> Option<String> {
    let raw = payload.get(field)?;
    match raw.as_str() {
        Some(value) => Some(value.to_string()),
        None => {
            if !raw.is_null() {
                debug!(field, %raw, "ignoring non-string option");
            }
            None
        }
    }
}

/// Pulls a usable prompt out of a loosely typed payload field.
pub(crate) fn require_prompt(value: Option<&Value>) -> Result<String, PromptError> {
    match value {
        None | Some(Value::Null) => Err(PromptError::invalid_input("prompt is required")),
        Some(Value::String(prompt)) if prompt.trim().is_empty() => {
            Err(PromptError::invalid_input("prompt must not be empty"))
        }
        Some(Value::String(prompt)) => Ok(prompt.clone()),
        Some(_) => Err(PromptError::invalid_input("prompt must be a string")),
    }
}

pub(crate) fn analyze_payload(payload: &Value) -> Result<ScoredAnalysis, PromptError> {
    let prompt = require_prompt(payload.get("prompt"))?;
    Ok(ScoredAnalysis::from(Scorer::standard().analyze(&prompt)))
}

pub(crate) fn transform_payload(
    payload: &Value,
    defaults: &PromptDefaults,
) -> Result<TransformResult, PromptError> {
    let prompt = require_prompt(payload.get("prompt"))?;
    let options = TransformOptions::from_payload(payload);
    let config = options.config(defaults);
    run_transform(&prompt, config, options.seed.or(defaults.seed))
}

pub(crate) fn suggest_payload(payload: &Value) -> Result<Suggestions, PromptError> {
    let prompt = require_prompt(payload.get("prompt"))?;
    Transformer::new().suggest(&prompt)
}

/// A seed selects a reproducible generator; otherwise the thread-local one is used.
pub(crate) fn run_transform(
    prompt: &str,
    config: TransformConfig,
    seed: Option<u64>,
) -> Result<TransformResult, PromptError> {
    match seed {
        Some(seed) => Transformer::seeded(seed).transform(prompt, config),
        None => Transformer::new().transform(prompt, config),
    }
}
