use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::random::{choose, choose_many, RandomSource, SeededRandom, ThreadRandom};
use super::rewrite::{
    enhance_location, enhance_subjects, mentions_human_subject, strip_problem_phrases,
};
use super::scorer::{Issue, Scorer};
use super::vocabulary::{category, Vocabulary, MAJOR_GROUPS};
use super::PromptError;

/// Camera phrase used for the phone style instead of a sampled body.
pub const SMARTPHONE_PHRASE: &str = "shot on a smartphone";

const HUMAN_DETAIL_COUNT: usize = 2;
const SUGGESTIONS_PER_GROUP: usize = 2;
const SUGGESTED_HUMAN_DETAILS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    #[default]
    Film,
    Digital,
    Phone,
}

impl Style {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "film" => Some(Self::Film),
            "digital" => Some(Self::Digital),
            "phone" => Some(Self::Phone),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Style::Film => "film",
            Style::Digital => "digital",
            Style::Phone => "phone",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    #[default]
    Natural,
    Moody,
    Harsh,
}

impl Mood {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "natural" => Some(Self::Natural),
            "moody" => Some(Self::Moody),
            "harsh" => Some(Self::Harsh),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Mood::Natural => "natural",
            Mood::Moody => "moody",
            Mood::Harsh => "harsh",
        }
    }

    fn lighting_category(&self) -> &'static str {
        match self {
            Mood::Natural => category::LIGHTING_NATURAL,
            Mood::Moody => category::LIGHTING_MOODY,
            Mood::Harsh => category::LIGHTING_ARTIFICIAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImperfectionLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl ImperfectionLevel {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ImperfectionLevel::Low => "low",
            ImperfectionLevel::Medium => "medium",
            ImperfectionLevel::High => "high",
        }
    }
}

/// Unrecognized values fall back to the field default; configuration always resolves.
fn resolve_or_default<T>(raw: Option<&str>, parse: fn(&str) -> Option<T>, field: &'static str) -> T
where
    T: Default,
{
    match raw {
        None => T::default(),
        Some(value) => parse(value).unwrap_or_else(|| {
            debug!(field, value, "unrecognized option, using default");
            T::default()
        }),
    }
}

/// Controls which modifier categories the transformer samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TransformConfig {
    pub style: Style,
    pub mood: Mood,
    pub imperfection: ImperfectionLevel,
    /// Skip phrase stripping and keep the prompt text as written.
    pub preserve_original: bool,
}

impl TransformConfig {
    /// Builds a config from loosely typed options, as supplied by the CLI or a request body.
    pub fn from_options(
        style: Option<&str>,
        mood: Option<&str>,
        imperfection: Option<&str>,
        preserve_original: bool,
    ) -> Self {
        Self {
            style: resolve_or_default(style, Style::parse, "style"),
            mood: resolve_or_default(mood, Mood::parse, "mood"),
            imperfection: resolve_or_default(
                imperfection,
                ImperfectionLevel::parse,
                "imperfection",
            ),
            preserve_original,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransformResult {
    pub original: String,
    pub transformed: String,
    pub original_score: u32,
    pub new_score: u32,
    /// `original_score - new_score`; negative when injected phrases trip a rule.
    pub improvement: i32,
    pub issues_fixed: Vec<String>,
    pub modifiers_added: Vec<String>,
}

/// Read-only analysis plus candidate modifiers keyed by group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestions {
    pub score: u32,
    pub issues: Vec<Issue>,
    pub modifiers: BTreeMap<String, Vec<String>>,
}

/// Rewrites prompts using the scorer and the modifier vocabulary.
///
/// Every uniform choice goes through the injected [`RandomSource`], so a scripted
/// or seeded source makes the output reproducible.
#[derive(Debug)]
pub struct Transformer<S = ThreadRandom> {
    scorer: Scorer,
    vocabulary: &'static Vocabulary,
    source: S,
}

impl Default for Transformer<ThreadRandom> {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer<ThreadRandom> {
    pub fn new() -> Self {
        Self::with_source(ThreadRandom)
    }
}

impl Transformer<SeededRandom> {
    pub fn seeded(seed: u64) -> Self {
        Self::with_source(SeededRandom::new(seed))
    }
}

impl<S> Transformer<S>
where
    S: RandomSource,
{
    pub fn with_source(source: S) -> Self {
        Self {
            scorer: Scorer::standard(),
            vocabulary: Vocabulary::standard(),
            source,
        }
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn transform(
        &self,
        prompt: &str,
        config: TransformConfig,
    ) -> Result<TransformResult, PromptError> {
        require_prompt(prompt)?;

        let before = self.scorer.analyze(prompt);

        let base = if config.preserve_original {
            prompt.trim().to_string()
        } else {
            strip_problem_phrases(prompt)
        };
        let base = enhance_subjects(&base, &self.source);
        let base = enhance_location(&base, &self.source);

        let mut modifiers = Vec::new();
        self.push_technical(config, &mut modifiers);
        self.push_imperfections(config.imperfection, &mut modifiers);
        modifiers.extend(self.pick(category::COMPOSITION_NATURAL));
        if mentions_human_subject(prompt) {
            modifiers.extend(self.sample(category::HUMAN_DETAILS, HUMAN_DETAIL_COUNT));
        }

        let transformed = compose(&base, &modifiers);
        let after = self.scorer.analyze(&transformed);
        let improvement = before.score as i32 - after.score as i32;

        debug!(
            original_score = before.score,
            new_score = after.score,
            modifiers = modifiers.len(),
            style = config.style.label(),
            "transformed prompt"
        );

        Ok(TransformResult {
            original: prompt.to_string(),
            transformed,
            original_score: before.score,
            new_score: after.score,
            improvement,
            issues_fixed: before.issue_names(),
            modifiers_added: modifiers.into_iter().map(str::to_string).collect(),
        })
    }

    pub fn suggest(&self, prompt: &str) -> Result<Suggestions, PromptError> {
        require_prompt(prompt)?;

        let analysis = self.scorer.analyze(prompt);
        let mut modifiers = BTreeMap::new();
        for group in MAJOR_GROUPS {
            let phrases = self.vocabulary.group(group);
            let picked = choose_many(&self.source, &phrases, SUGGESTIONS_PER_GROUP);
            modifiers.insert(
                group.to_string(),
                picked.into_iter().map(|phrase| phrase.to_string()).collect(),
            );
        }
        if mentions_human_subject(prompt) {
            let details = self.sample(category::HUMAN_DETAILS, SUGGESTED_HUMAN_DETAILS);
            modifiers.insert(
                category::HUMAN_DETAILS.to_string(),
                details.into_iter().map(str::to_string).collect(),
            );
        }

        Ok(Suggestions {
            score: analysis.score,
            issues: analysis.issues,
            modifiers,
        })
    }

    fn push_technical(&self, config: TransformConfig, modifiers: &mut Vec<&'static str>) {
        match config.style {
            Style::Film => modifiers.extend(self.pick(category::CAMERAS_FILM)),
            Style::Digital => modifiers.extend(self.pick(category::CAMERAS_MODERN)),
            Style::Phone => modifiers.push(SMARTPHONE_PHRASE),
        }
        if config.style != Style::Phone {
            modifiers.extend(self.pick(category::LENSES));
        }
        modifiers.extend(self.pick(config.mood.lighting_category()));
    }

    fn push_imperfections(&self, level: ImperfectionLevel, modifiers: &mut Vec<&'static str>) {
        modifiers.extend(self.pick(category::IMPERFECTIONS_FILM));
        if matches!(level, ImperfectionLevel::Medium | ImperfectionLevel::High) {
            modifiers.extend(self.pick(category::IMPERFECTIONS_FOCUS));
        }
        if level == ImperfectionLevel::High {
            modifiers.extend(self.pick(category::IMPERFECTIONS_SURFACE));
        }
    }

    fn pick(&self, name: &str) -> Option<&'static str> {
        let phrases = self.vocabulary.category(name)?;
        choose(&self.source, phrases).copied()
    }

    fn sample(&self, name: &str, count: usize) -> Vec<&'static str> {
        let phrases = self.vocabulary.category(name).unwrap_or_default();
        choose_many(&self.source, phrases, count)
            .into_iter()
            .copied()
            .collect()
    }
}

fn require_prompt(prompt: &str) -> Result<(), PromptError> {
    if prompt.trim().is_empty() {
        return Err(PromptError::invalid_input("prompt must not be empty"));
    }
    Ok(())
}

fn compose(base: &str, modifiers: &[&str]) -> String {
    let base = base.trim_matches(|c: char| c.is_whitespace() || matches!(c, ',' | ';' | '.'));
    let mut parts = Vec::with_capacity(modifiers.len() + 1);
    if !base.is_empty() {
        parts.push(base);
    }
    parts.extend_from_slice(modifiers);
    parts.join(", ")
}
