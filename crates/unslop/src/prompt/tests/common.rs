use crate::prompt::scorer::AnalysisResult;
use crate::prompt::vocabulary::Vocabulary;
use crate::prompt::{
    ImperfectionLevel, Mood, ScriptedRandom, Style, TransformConfig, Transformer,
};

pub(super) const REFERENCE_PROMPT: &str =
    "a beautiful woman in a coffee shop, 8k, trending on artstation";

pub(super) fn reference_config() -> TransformConfig {
    TransformConfig {
        style: Style::Film,
        mood: Mood::Natural,
        imperfection: ImperfectionLevel::Medium,
        preserve_original: false,
    }
}

pub(super) fn scripted_transformer() -> Transformer<ScriptedRandom> {
    Transformer::with_source(ScriptedRandom::first())
}

pub(super) fn phrases(category: &str) -> &'static [&'static str] {
    Vocabulary::standard()
        .category(category)
        .expect("category present in standard vocabulary")
}

pub(super) fn issue_ids(result: &AnalysisResult) -> Vec<&str> {
    result.issues.iter().map(|issue| issue.id.as_str()).collect()
}
