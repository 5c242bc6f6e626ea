use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use super::random::{choose, RandomSource};
use super::rules::{generic_subject, strippable_phrase_sets, NounMatch};

static HUMAN_SUBJECT_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(?:wom[ae]n|m[ae]n|persons?|girls?|boys?|child|children|people",
        r"|portraits?|faces?|models?|figures?)\b",
    ))
    .expect("human subject vocabulary compiles")
});

static SPACE_BEFORE_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+([,;])").expect("separator pattern compiles"));
static REPEATED_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([,;])(?:\s*[,;])+").expect("separator pattern compiles"));
static ARTICLE_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(an?)\s*[,;]\s+").expect("article pattern compiles"));
static REPEATED_WHITESPACE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s{2,}").expect("whitespace pattern compiles"));
static EDGE_SEPARATOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\s,;.]+|[\s,;.]+$").expect("edge pattern compiles"));

struct SubjectProfile {
    noun: &'static str,
    ages: &'static [&'static str],
    details: &'static [&'static str],
}

const SUBJECT_PROFILES: &[SubjectProfile] = &[
    SubjectProfile {
        noun: "woman",
        ages: &[
            "in her early twenties",
            "in her late twenties",
            "in her mid-thirties",
            "in her early forties",
            "in her fifties",
        ],
        details: &[
            "with faint freckles across her nose",
            "with a few loose strands of hair across her cheek",
            "with a small scar above one eyebrow",
            "with tired eyes and a half smile",
            "with laugh lines around her eyes",
        ],
    },
    SubjectProfile {
        noun: "man",
        ages: &[
            "in his early twenties",
            "in his late twenties",
            "in his mid-thirties",
            "in his forties",
            "in his late fifties",
        ],
        details: &[
            "with a few days of stubble",
            "with a slightly crooked nose",
            "with graying temples",
            "with tired eyes and a faint smile",
            "with a chipped front tooth",
        ],
    },
];

const PERSON_DESCRIPTORS: &[&str] = &[
    "a retired schoolteacher in a faded cardigan",
    "a middle-aged barista on a smoke break",
    "a young bike courier with a battered helmet",
    "a night-shift nurse in wrinkled scrubs",
    "an elderly street vendor with weathered hands",
    "a college student with a worn canvas backpack",
];

/// A generic place noun and the richer scenes it can be swapped for.
pub(crate) struct LocationFamily {
    pub key: &'static str,
    pattern: Regex,
    alternatives: &'static [&'static str],
}

impl LocationFamily {
    fn new(key: &'static str, nouns: &[&str], alternatives: &'static [&'static str]) -> Self {
        let nouns = nouns
            .iter()
            .map(|noun| regex::escape(noun).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?:in|at)\s+(?:a|an|the)\s+(?:{nouns})\b"))
            .expect("location family compiles");
        Self {
            key,
            pattern,
            alternatives,
        }
    }
}

static LOCATION_FAMILIES: Lazy<Vec<LocationFamily>> = Lazy::new(|| {
    vec![
        LocationFamily::new(
            "coffee_shop",
            &["coffee shop", "cafe", "café"],
            &[
                "in a cramped corner coffee shop with fogged-up windows",
                "at a scratched wooden table in a busy neighborhood coffee shop",
                "in a dim coffee shop with mismatched chairs and a chalkboard menu",
            ],
        ),
        LocationFamily::new(
            "office",
            &["office"],
            &[
                "in a cluttered open-plan office under flickering fluorescent tubes",
                "at a desk buried in paperwork in a cramped back office",
                "in a half-empty office late in the evening with most desks abandoned",
            ],
        ),
        LocationFamily::new(
            "street",
            &["street", "city street"],
            &[
                "on a rain-slicked side street with scooters parked along the curb",
                "on a narrow street lined with shuttered shops and tangled power lines",
                "at a busy crosswalk with pedestrians blurred mid-stride",
            ],
        ),
        LocationFamily::new(
            "park",
            &["park"],
            &[
                "in a city park with patchy grass and a rusted bench",
                "on a worn footpath through a neighborhood park with overflowing trash cans",
                "in a small park crowded with joggers and dog walkers",
            ],
        ),
        LocationFamily::new(
            "kitchen",
            &["kitchen"],
            &[
                "in a small apartment kitchen with dishes piled in the sink",
                "at a cluttered kitchen counter under a single overhead light",
                "in a narrow galley kitchen with grease-stained tiles",
            ],
        ),
    ]
});

pub(crate) fn mentions_human_subject(text: &str) -> bool {
    HUMAN_SUBJECT_RE.is_match(text)
}

pub(crate) fn mentions_generic_location(text: &str) -> bool {
    LOCATION_FAMILIES
        .iter()
        .any(|family| family.pattern.is_match(text))
}

/// Removes every strippable phrase family, then tidies the leftovers.
pub(crate) fn strip_problem_phrases(text: &str) -> String {
    let stripped = strippable_phrase_sets().fold(text.to_string(), |working, set| {
        set.remove_all(&working).into_owned()
    });
    normalize_separators(&stripped)
}

pub(crate) fn normalize_separators(text: &str) -> String {
    let text = SPACE_BEFORE_SEPARATOR_RE.replace_all(text, "$1");
    let text = REPEATED_SEPARATOR_RE.replace_all(&text, "$1");
    // An article left in front of a separator once its adjectives are gone.
    let text = ARTICLE_SEPARATOR_RE.replace_all(&text, "$1 ");
    let text = REPEATED_WHITESPACE_RE.replace_all(&text, " ");
    EDGE_SEPARATOR_RE.replace_all(&text, "").into_owned()
}

/// Qualifies every bare "a woman" / "a man" and replaces every bare "a person".
pub(crate) fn enhance_subjects<S>(text: &str, source: &S) -> String
where
    S: RandomSource + ?Sized,
{
    let matches = generic_subject().find_unqualified(text);
    if matches.is_empty() {
        return text.to_string();
    }

    let mut enhanced = String::with_capacity(text.len() + matches.len() * 48);
    let mut cursor = 0;
    for found in &matches {
        enhanced.push_str(&text[cursor..found.start]);
        enhanced.push_str(&render_subject(text, found, source));
        cursor = found.end;
    }
    enhanced.push_str(&text[cursor..]);
    debug!(subjects = matches.len(), "qualified generic subjects");
    enhanced
}

fn render_subject<S>(text: &str, found: &NounMatch<'_>, source: &S) -> String
where
    S: RandomSource + ?Sized,
{
    let original = &text[found.start..found.end];
    let noun = found.noun.to_ascii_lowercase();

    match SUBJECT_PROFILES.iter().find(|profile| profile.noun == noun) {
        Some(profile) => match (choose(source, profile.ages), choose(source, profile.details)) {
            (Some(age), Some(detail)) => {
                format!("{} {} {} {}", found.article, found.noun, age, detail)
            }
            _ => original.to_string(),
        },
        None => match choose(source, PERSON_DESCRIPTORS) {
            Some(descriptor) => match_leading_case(original, descriptor),
            None => original.to_string(),
        },
    }
}

/// Rewrites the first generic location of the first family that appears.
pub(crate) fn enhance_location<S>(text: &str, source: &S) -> String
where
    S: RandomSource + ?Sized,
{
    for family in LOCATION_FAMILIES.iter() {
        let Some(found) = family.pattern.find(text) else {
            continue;
        };
        let Some(alternative) = choose(source, family.alternatives) else {
            return text.to_string();
        };
        debug!(family = family.key, "enriched generic location");
        return format!(
            "{}{}{}",
            &text[..found.start()],
            match_leading_case(found.as_str(), alternative),
            &text[found.end()..]
        );
    }
    text.to_string()
}

fn match_leading_case(original: &str, replacement: &str) -> String {
    let starts_upper = original
        .chars()
        .next()
        .map(char::is_uppercase)
        .unwrap_or(false);
    let mut chars = replacement.chars();
    match chars.next() {
        Some(first) if starts_upper => first.to_uppercase().chain(chars).collect(),
        _ => replacement.to_string(),
    }
}
