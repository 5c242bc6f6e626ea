//! Prompt scoring and transformation engine.
//!
//! [`Scorer`] evaluates a prompt against the ordered [`rules::detection_rules`]
//! table and the realism indicators. [`Transformer`] strips flagged phrase
//! families, qualifies bare subjects and locations, appends photographic
//! modifiers from the [`Vocabulary`], and re-scores the result.

pub mod random;
mod rewrite;
pub mod rules;
pub mod scorer;
pub mod transformer;
pub mod vocabulary;

#[cfg(test)]
mod tests;

pub use random::{RandomSource, ScriptedRandom, SeededRandom, ThreadRandom};
pub use scorer::{AnalysisResult, Issue, Scorer};
pub use transformer::{
    ImperfectionLevel, Mood, Style, Suggestions, TransformConfig, TransformResult, Transformer,
};
pub use vocabulary::Vocabulary;

/// Caller contract violations. Configuration values never produce an error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PromptError {
    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl PromptError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            reason: reason.into(),
        }
    }
}

pub fn analyze(prompt: &str) -> AnalysisResult {
    Scorer::standard().analyze(prompt)
}

pub fn transform(prompt: &str, config: TransformConfig) -> Result<TransformResult, PromptError> {
    Transformer::new().transform(prompt, config)
}

pub fn suggest(prompt: &str) -> Result<Suggestions, PromptError> {
    Transformer::new().suggest(prompt)
}
