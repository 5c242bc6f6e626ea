use clap::Args;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use unslop::error::AppError;
use unslop::prompt::{AnalysisResult, PromptError, Scorer, Suggestions, TransformResult, Vocabulary};

use crate::infra::{bootstrap, run_transform};

/// Human-facing label for a proneness score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub(crate) enum ScoreBand {
    Low,
    Medium,
    High,
    VeryHigh,
}

impl ScoreBand {
    pub(crate) fn for_score(score: u32) -> Self {
        match score {
            0..=29 => Self::Low,
            30..=59 => Self::Medium,
            60..=79 => Self::High,
            _ => Self::VeryHigh,
        }
    }

    pub(crate) fn label(&self) -> &'static str {
        match self {
            ScoreBand::Low => "low",
            ScoreBand::Medium => "medium",
            ScoreBand::High => "high",
            ScoreBand::VeryHigh => "very high",
        }
    }

    pub(crate) fn emoji(&self) -> &'static str {
        match self {
            ScoreBand::Low => "🟢",
            ScoreBand::Medium => "🟡",
            ScoreBand::High => "🟠",
            ScoreBand::VeryHigh => "🔴",
        }
    }
}

/// Analysis as returned to callers, with its band attached.
#[derive(Debug, Clone, Serialize)]
pub(crate) struct ScoredAnalysis {
    #[serde(flatten)]
    pub(crate) analysis: AnalysisResult,
    pub(crate) band: ScoreBand,
}

impl From<AnalysisResult> for ScoredAnalysis {
    fn from(analysis: AnalysisResult) -> Self {
        let band = ScoreBand::for_score(analysis.score);
        Self { analysis, band }
    }
}

#[derive(Args, Debug)]
pub(crate) struct AnalyzeArgs {
    /// Prompt text to score
    pub(crate) prompt: String,
    /// Emit the analysis as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct TransformArgs {
    /// Prompt text to rewrite
    pub(crate) prompt: String,
    /// Camera style: film, digital or phone
    #[arg(long)]
    pub(crate) style: Option<String>,
    /// Lighting mood: natural, moody or harsh
    #[arg(long)]
    pub(crate) mood: Option<String>,
    /// Imperfection level: low, medium or high
    #[arg(long)]
    pub(crate) imperfection: Option<String>,
    /// Keep flagged phrases instead of stripping them
    #[arg(long)]
    pub(crate) preserve: bool,
    /// Seed for reproducible modifier choices
    #[arg(long)]
    pub(crate) seed: Option<u64>,
    /// Emit the result as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct SuggestArgs {
    /// Prompt text to inspect
    pub(crate) prompt: String,
    /// Emit the suggestions as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug, Default)]
pub(crate) struct ModifiersArgs {
    /// Restrict the listing to one category or group (e.g. `lighting`, `cameras.film`)
    #[arg(long)]
    pub(crate) category: Option<String>,
    /// Emit the listing as JSON
    #[arg(long)]
    pub(crate) json: bool,
}

pub(crate) fn run_analyze(args: AnalyzeArgs) -> Result<(), AppError> {
    bootstrap()?;
    let analysis = ScoredAnalysis::from(Scorer::standard().analyze(&args.prompt));
    if args.json {
        return print_json(&analysis);
    }
    print!("{}", format_analysis(&analysis));
    Ok(())
}

pub(crate) fn run_transform_command(args: TransformArgs) -> Result<(), AppError> {
    let config = bootstrap()?;
    let transform_config = config.prompt.resolve(
        args.style.as_deref(),
        args.mood.as_deref(),
        args.imperfection.as_deref(),
        args.preserve,
    );
    let result = run_transform(&args.prompt, transform_config, args.seed.or(config.prompt.seed))?;
    if args.json {
        return print_json(&result);
    }
    print!("{}", format_transform(&result));
    Ok(())
}

pub(crate) fn run_suggest(args: SuggestArgs) -> Result<(), AppError> {
    bootstrap()?;
    let suggestions = unslop::prompt::suggest(&args.prompt)?;
    if args.json {
        return print_json(&suggestions);
    }
    print!("{}", format_suggestions(&suggestions));
    Ok(())
}

pub(crate) fn run_modifiers(args: ModifiersArgs) -> Result<(), AppError> {
    bootstrap()?;
    let listing = Vocabulary::standard().listing(args.category.as_deref());
    if listing.is_empty() {
        let name = args.category.unwrap_or_default();
        let reason = format!("unknown modifier category '{name}'");
        return Err(PromptError::invalid_input(reason).into());
    }
    if args.json {
        return print_json(&listing);
    }
    print!("{}", format_modifiers(&listing));
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn score_line(score: u32) -> String {
    let band = ScoreBand::for_score(score);
    format!("{score}/100 {} {}", band.emoji(), band.label())
}

pub(crate) fn format_analysis(scored: &ScoredAnalysis) -> String {
    let analysis = &scored.analysis;
    let mut out = String::new();
    let _ = writeln!(out, "AI-proneness: {}", score_line(analysis.score));
    let _ = writeln!(
        out,
        "AI markers: {} | realism markers: {}",
        analysis.ai_score, analysis.realism_score
    );
    if analysis.issues.is_empty() {
        let _ = writeln!(out, "No issues detected.");
        return out;
    }
    let _ = writeln!(out, "Issues ({}):", analysis.issue_count);
    for issue in &analysis.issues {
        let _ = writeln!(out, "  - {} (+{})", issue.name, issue.weight);
        let _ = writeln!(out, "    {}", issue.suggestion);
    }
    out
}

pub(crate) fn format_transform(result: &TransformResult) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Original ({}):", score_line(result.original_score));
    let _ = writeln!(out, "  {}", result.original);
    let _ = writeln!(out, "Transformed ({}):", score_line(result.new_score));
    let _ = writeln!(out, "  {}", result.transformed);
    let _ = writeln!(out, "Improvement: {:+}", result.improvement);
    if !result.issues_fixed.is_empty() {
        let _ = writeln!(out, "Issues addressed: {}", result.issues_fixed.join(", "));
    }
    let _ = writeln!(out, "Modifiers added:");
    for modifier in &result.modifiers_added {
        let _ = writeln!(out, "  - {modifier}");
    }
    out
}

pub(crate) fn format_suggestions(suggestions: &Suggestions) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "AI-proneness: {}", score_line(suggestions.score));
    for issue in &suggestions.issues {
        let _ = writeln!(out, "  - {}: {}", issue.name, issue.suggestion);
    }
    let _ = writeln!(out, "Suggested modifiers:");
    for (group, phrases) in &suggestions.modifiers {
        let _ = writeln!(out, "  {group}: {}", phrases.join("; "));
    }
    out
}

pub(crate) fn format_modifiers(listing: &BTreeMap<String, Vec<&'static str>>) -> String {
    let mut out = String::new();
    for (category, phrases) in listing {
        let _ = writeln!(out, "{category} ({})", phrases.len());
        for phrase in phrases {
            let _ = writeln!(out, "  - {phrase}");
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use unslop::prompt::analyze;

    #[test]
    fn bands_cover_the_whole_range() {
        assert_eq!(ScoreBand::for_score(0), ScoreBand::Low);
        assert_eq!(ScoreBand::for_score(29), ScoreBand::Low);
        assert_eq!(ScoreBand::for_score(30), ScoreBand::Medium);
        assert_eq!(ScoreBand::for_score(59), ScoreBand::Medium);
        assert_eq!(ScoreBand::for_score(60), ScoreBand::High);
        assert_eq!(ScoreBand::for_score(79), ScoreBand::High);
        assert_eq!(ScoreBand::for_score(80), ScoreBand::VeryHigh);
        assert_eq!(ScoreBand::for_score(100), ScoreBand::VeryHigh);
    }

    #[test]
    fn analysis_report_lists_issues_with_band() {
        let scored = ScoredAnalysis::from(analyze(
            "a beautiful woman in a coffee shop, 8k, trending on artstation",
        ));
        let rendered = format_analysis(&scored);

        assert!(rendered.starts_with("AI-proneness: 85/100 🔴 very high"));
        assert!(rendered.contains("Issues (6):"));
        assert!(rendered.contains("  - Resolution Spam (+3)"));
    }

    #[test]
    fn clean_prompt_reports_no_issues() {
        let scored = ScoredAnalysis::from(analyze("   "));
        assert!(format_analysis(&scored).contains("No issues detected."));
        assert_eq!(scored.band, ScoreBand::Low);
    }

    #[test]
    fn band_serializes_next_to_analysis_fields() {
        let scored = ScoredAnalysis::from(analyze("a dog"));
        let value = serde_json::to_value(&scored).expect("serializes");

        assert_eq!(value["score"], 25);
        assert_eq!(value["band"], "low");
        assert_eq!(value["issues"][0]["id"], "missing_imperfection");
    }

    #[test]
    fn modifier_listing_counts_phrases() {
        let listing = Vocabulary::standard().listing(Some("cameras"));
        let rendered = format_modifiers(&listing);

        assert!(rendered.contains("cameras.film (5)"));
        assert!(rendered.contains("cameras.modern (5)"));
        assert!(!rendered.contains("lenses"));
    }
}
