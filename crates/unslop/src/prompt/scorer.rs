use serde::{Deserialize, Serialize};
use tracing::debug;

use super::rules::{detection_rules, realism_indicators, DetectionRule, RealismIndicator};

/// Multiplier spreading the small integer weight range across 0-100.
pub const SCORE_SCALE: u32 = 5;
pub const MAX_SCORE: u32 = 100;

/// One detection rule that fired for a specific prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issue {
    pub id: String,
    pub name: String,
    pub description: String,
    pub weight: u32,
    pub suggestion: String,
}

impl From<&DetectionRule> for Issue {
    fn from(rule: &DetectionRule) -> Self {
        Self {
            id: rule.id.to_string(),
            name: rule.name.to_string(),
            description: rule.description.to_string(),
            weight: rule.weight,
            suggestion: rule.suggestion.to_string(),
        }
    }
}

/// Scoring output: normalized proneness plus the raw sums behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub score: u32,
    pub ai_score: u32,
    pub realism_score: u32,
    pub issues: Vec<Issue>,
    pub issue_count: usize,
}

impl AnalysisResult {
    pub fn issue_names(&self) -> Vec<String> {
        self.issues.iter().map(|issue| issue.name.clone()).collect()
    }

    pub fn has_issue(&self, id: &str) -> bool {
        self.issues.iter().any(|issue| issue.id == id)
    }
}

/// Stateless evaluator over the fixed rule and indicator tables.
#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    rules: &'static [DetectionRule],
    indicators: &'static [RealismIndicator],
}

impl Default for Scorer {
    fn default() -> Self {
        Self::standard()
    }
}

impl Scorer {
    pub fn standard() -> Self {
        Self {
            rules: detection_rules(),
            indicators: realism_indicators(),
        }
    }

    pub fn analyze(&self, prompt: &str) -> AnalysisResult {
        let issues: Vec<Issue> = self
            .rules
            .iter()
            .filter(|rule| rule.matches(prompt))
            .map(Issue::from)
            .collect();

        let ai_score: u32 = issues.iter().map(|issue| issue.weight).sum();
        let realism_score: u32 = self
            .indicators
            .iter()
            .filter(|indicator| indicator.matches(prompt))
            .map(|indicator| indicator.weight)
            .sum();
        let score = normalize_score(ai_score, realism_score);

        debug!(
            score,
            ai_score,
            realism_score,
            issues = issues.len(),
            "analyzed prompt"
        );

        AnalysisResult {
            score,
            ai_score,
            realism_score,
            issue_count: issues.len(),
            issues,
        }
    }
}

pub(crate) fn normalize_score(ai_score: u32, realism_score: u32) -> u32 {
    ai_score
        .saturating_sub(realism_score)
        .saturating_mul(SCORE_SCALE)
        .min(MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_scales_and_clamps() {
        assert_eq!(normalize_score(0, 0), 0);
        assert_eq!(normalize_score(3, 5), 0);
        assert_eq!(normalize_score(7, 2), 25);
        assert_eq!(normalize_score(40, 0), MAX_SCORE);
    }
}
