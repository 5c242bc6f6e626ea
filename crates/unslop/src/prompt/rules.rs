use std::borrow::Cow;
use std::collections::BTreeSet;

use once_cell::sync::Lazy;
use regex::Regex;

use super::rewrite::mentions_generic_location;

/// Literal phrase family compiled into one case-insensitive, word-bounded pattern.
///
/// Detection and stripping share the compiled pattern, so anything the scorer
/// flags is exactly what the transformer removes.
#[derive(Debug)]
pub struct PhraseSet {
    phrases: &'static [&'static str],
    pattern: Regex,
}

impl PhraseSet {
    pub fn new(phrases: &'static [&'static str]) -> Self {
        let mut ordered: Vec<&str> = phrases.to_vec();
        // Longest first so "trending on artstation" wins over "artstation".
        ordered.sort_by(|a, b| b.len().cmp(&a.len()));
        let alternation = ordered
            .iter()
            .map(|phrase| regex::escape(phrase).replace(' ', r"\s+"))
            .collect::<Vec<_>>()
            .join("|");
        let pattern =
            Regex::new(&format!(r"(?i)\b(?:{alternation})\b")).expect("phrase set compiles");
        Self { phrases, pattern }
    }

    pub fn phrases(&self) -> &'static [&'static str] {
        self.phrases
    }

    pub fn is_match(&self, text: &str) -> bool {
        self.pattern.is_match(text)
    }

    pub fn remove_all<'t>(&self, text: &'t str) -> Cow<'t, str> {
        self.pattern.replace_all(text, "")
    }
}

/// An article + noun pair that only counts when the next word does not already
/// qualify it ("a woman" matches, "a woman wearing a coat" does not).
#[derive(Debug)]
pub struct QualifiedNoun {
    pattern: Regex,
    qualifiers: &'static [&'static str],
}

/// Byte span of one unqualified noun phrase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NounMatch<'t> {
    pub start: usize,
    pub end: usize,
    pub article: &'t str,
    pub noun: &'t str,
}

impl QualifiedNoun {
    pub fn new(nouns: &'static [&'static str], qualifiers: &'static [&'static str]) -> Self {
        let nouns = nouns
            .iter()
            .map(|noun| regex::escape(noun))
            .collect::<Vec<_>>()
            .join("|");
        let pattern = Regex::new(&format!(r"(?i)\b(?P<article>an?)\s+(?P<noun>{nouns})\b"))
            .expect("qualified noun compiles");
        Self {
            pattern,
            qualifiers,
        }
    }

    pub fn find_unqualified<'t>(&self, text: &'t str) -> Vec<NounMatch<'t>> {
        self.pattern
            .captures_iter(text)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let article = caps.name("article")?.as_str();
                let noun = caps.name("noun")?.as_str();
                if self.is_qualified(&text[whole.end()..]) {
                    None
                } else {
                    Some(NounMatch {
                        start: whole.start(),
                        end: whole.end(),
                        article,
                        noun,
                    })
                }
            })
            .collect()
    }

    pub fn is_match(&self, text: &str) -> bool {
        !self.find_unqualified(text).is_empty()
    }

    fn is_qualified(&self, rest: &str) -> bool {
        let rest = rest.trim_start();
        self.qualifiers
            .iter()
            .any(|qualifier| starts_with_words(rest, qualifier))
    }
}

/// Case-insensitive prefix check that stops at a word boundary.
fn starts_with_words(text: &str, phrase: &str) -> bool {
    let Some(head) = text.get(..phrase.len()) else {
        return false;
    };
    head.eq_ignore_ascii_case(phrase)
        && text[phrase.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric())
}

/// How a rule decides whether it fires.
#[derive(Debug)]
pub enum Matcher {
    PhraseSet(&'static PhraseSet),
    QualifiedNoun(&'static QualifiedNoun),
    /// Whole-prompt check, used for absence and shape rules.
    Predicate(fn(&str) -> bool),
}

impl Matcher {
    pub fn matches(&self, prompt: &str) -> bool {
        match self {
            Matcher::PhraseSet(set) => set.is_match(prompt),
            Matcher::QualifiedNoun(noun) => noun.is_match(prompt),
            Matcher::Predicate(predicate) => predicate(prompt),
        }
    }
}

/// Weighted check for a pattern that correlates with generic output.
#[derive(Debug)]
pub struct DetectionRule {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub weight: u32,
    pub matcher: Matcher,
    pub suggestion: &'static str,
    /// The transformer removes this family when rewriting.
    pub strippable: bool,
}

impl DetectionRule {
    pub fn matches(&self, prompt: &str) -> bool {
        self.matcher.matches(prompt)
    }
}

/// Positive signal that the prompt is already grounded in photographic language.
#[derive(Debug)]
pub struct RealismIndicator {
    pub id: &'static str,
    pub weight: u32,
    pattern: Regex,
}

impl RealismIndicator {
    fn new(id: &'static str, weight: u32, pattern: &str) -> Self {
        Self {
            id,
            weight,
            pattern: Regex::new(pattern).expect("realism indicator compiles"),
        }
    }

    pub fn matches(&self, prompt: &str) -> bool {
        self.pattern.is_match(prompt)
    }
}

/// Followers that already qualify a bare subject and suppress rewriting.
/// "in" only counts as an age phrase; "a woman in a cafe" is still bare.
pub const SUBJECT_QUALIFIERS: &[&str] = &[
    "with", "wearing", "holding", "in her", "in his", "in their", "who", "aged", "around",
];

const IMPERFECTION_VOCABULARY: &str = concat!(
    r"(?i)\b(?:grain|grainy|noise|noisy|blur|blurry|blurred|out of focus|soft focus",
    r"|missed focus|focus slightly missed|light leaks?|dust|scratch(?:es|ed)?|smudged?|smudges",
    r"|lens flare|chromatic aberration|vignett(?:e|ing)|overexposed|underexposed",
    r"|imperfect(?:ion|ions)?|faded|water spots?|fingerprints?|halation)\b",
);

const CAMERA_VOCABULARY: &str = concat!(
    r"(?i)\b(?:camera|lens|lenses|shot on|dslr|mirrorless|film stock|\d{2,3}\s?mm|iso\s?\d+",
    r"|kodak|portra|ektar|fuji(?:film)?|ilford|cinestill|leica|canon|nikon|sony|hasselblad",
    r"|mamiya|pentax|polaroid|iphone|smartphone)\b|\bf/\d",
);

static RESOLUTION_SPAM: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "8k",
        "4k",
        "16k",
        "32k",
        "8k uhd",
        "4k uhd",
        "8k resolution",
        "4k resolution",
        "uhd",
        "ultra hd",
        "full hd",
        "hd",
        "hdr",
        "high resolution",
        "high-resolution",
        "ultra high resolution",
        "high res",
        "highres",
    ])
});

static QUALITY_TAGS: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "masterpiece",
        "best quality",
        "high quality",
        "top quality",
        "award winning",
        "award-winning",
        "sharp focus",
    ])
});

static PLATFORM_TAGS: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "trending on artstation",
        "trending on pixiv",
        "trending on cgsociety",
        "artstation",
        "deviantart",
        "cgsociety",
        "pixiv",
        "behance",
        "unreal engine 5",
        "unreal engine",
        "octane render",
        "octane",
        "redshift render",
        "vray",
    ])
});

static HYPERREALISM_TRAPS: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "hyperrealistic",
        "hyper realistic",
        "hyper-realistic",
        "hyperrealism",
        "photorealistic",
        "photo-realistic",
        "photorealism",
        "ultra realistic",
        "ultra-realistic",
        "ultrarealistic",
        "hyperdetailed",
        "hyper detailed",
        "hyper-detailed",
        "ultra detailed",
        "ultra-detailed",
        "highly detailed",
        "extremely detailed",
        "insanely detailed",
        "intricate details",
    ])
});

static BEAUTY_ADJECTIVES: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "beautiful",
        "gorgeous",
        "stunning",
        "pretty",
        "lovely",
        "attractive",
        "perfect",
        "flawless",
        "breathtaking",
        "exquisite",
        "elegant",
    ])
});

static LIGHTING_CLICHES: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "cinematic lighting",
        "dramatic lighting",
        "volumetric lighting",
        "volumetric light",
        "studio lighting",
        "epic lighting",
        "rim lighting",
        "god rays",
        "soft lighting",
    ])
});

static AIRBRUSHED_SKIN: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "smooth skin",
        "porcelain skin",
        "poreless",
        "airbrushed",
        "glowing skin",
        "perfect skin",
        "flawless skin",
    ])
});

static PERFECT_SYMMETRY: Lazy<PhraseSet> = Lazy::new(|| {
    PhraseSet::new(&[
        "symmetrical",
        "symmetry",
        "perfectly centered",
        "centered composition",
        "perfect composition",
    ])
});

pub(crate) static GENERIC_SUBJECT: Lazy<QualifiedNoun> =
    Lazy::new(|| QualifiedNoun::new(&["woman", "man", "person"], SUBJECT_QUALIFIERS));

static STYLE_WORD_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"(?i)\b(cinematic|dramatic|epic|ethereal|dreamy|surreal|fantasy|magical|vibrant",
        r"|moody|aesthetic|artistic|painterly|stylized|whimsical|majestic|mystical|glamorous)\b",
    ))
    .expect("style vocabulary compiles")
});

static IMPERFECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(IMPERFECTION_VOCABULARY).expect("imperfection vocabulary compiles"));

static CAMERA_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(CAMERA_VOCABULARY).expect("camera vocabulary compiles"));

/// Absence rules only fire once the prompt holds at least one word.
fn has_content(prompt: &str) -> bool {
    prompt.chars().any(char::is_alphanumeric)
}

fn style_overload(prompt: &str) -> bool {
    let distinct: BTreeSet<String> = STYLE_WORD_RE
        .find_iter(prompt)
        .map(|m| m.as_str().to_lowercase())
        .collect();
    distinct.len() > 2
}

fn missing_imperfection(prompt: &str) -> bool {
    has_content(prompt) && !IMPERFECTION_RE.is_match(prompt)
}

fn missing_camera(prompt: &str) -> bool {
    has_content(prompt) && !CAMERA_RE.is_match(prompt)
}

static DETECTION_RULES: Lazy<Vec<DetectionRule>> = Lazy::new(|| {
    vec![
        DetectionRule {
            id: "resolution_spam",
            name: "Resolution Spam",
            description: "Resolution tags like 8k or UHD push models toward over-sharpened stock imagery.",
            weight: 3,
            matcher: Matcher::PhraseSet(&RESOLUTION_SPAM),
            suggestion: "Drop resolution tags and name a camera or film stock instead.",
            strippable: true,
        },
        DetectionRule {
            id: "quality_tags",
            name: "Quality Tag Spam",
            description: "Generic quality boosters such as masterpiece or best quality.",
            weight: 2,
            matcher: Matcher::PhraseSet(&QUALITY_TAGS),
            suggestion: "Remove quality boosters; describe what makes the scene specific.",
            strippable: true,
        },
        DetectionRule {
            id: "platform_tags",
            name: "Platform/Trending Tags",
            description: "Art platform and render engine tags pull toward polished digital art.",
            weight: 4,
            matcher: Matcher::PhraseSet(&PLATFORM_TAGS),
            suggestion: "Remove platform and render engine references for photographic results.",
            strippable: true,
        },
        DetectionRule {
            id: "hyperrealism_trap",
            name: "Hyper-Realism Trap",
            description: "Words like hyperrealistic or highly detailed produce the uncanny CGI look.",
            weight: 4,
            matcher: Matcher::PhraseSet(&HYPERREALISM_TRAPS),
            suggestion: "Replace realism claims with concrete photographic details.",
            strippable: true,
        },
        DetectionRule {
            id: "beauty_adjectives",
            name: "Overused Beauty Adjectives",
            description: "Adjectives like beautiful or stunning converge on the same idealized face.",
            weight: 3,
            matcher: Matcher::PhraseSet(&BEAUTY_ADJECTIVES),
            suggestion: "Describe distinguishing features rather than attractiveness.",
            strippable: true,
        },
        DetectionRule {
            id: "lighting_cliches",
            name: "Generic Lighting Clichés",
            description: "Cinematic or volumetric lighting reads as staged and artificial.",
            weight: 3,
            matcher: Matcher::PhraseSet(&LIGHTING_CLICHES),
            suggestion: "Name a real light source: window light, overcast sky, a bare bulb.",
            strippable: true,
        },
        DetectionRule {
            id: "airbrushed_skin",
            name: "Airbrushed Skin",
            description: "Smooth or porcelain skin requests remove texture and look synthetic.",
            weight: 4,
            matcher: Matcher::PhraseSet(&AIRBRUSHED_SKIN),
            suggestion: "Ask for visible pores, freckles, or uneven skin tone.",
            strippable: false,
        },
        DetectionRule {
            id: "perfect_symmetry",
            name: "Perfect Symmetry",
            description: "Symmetrical, centered framing is a hallmark of generated images.",
            weight: 2,
            matcher: Matcher::PhraseSet(&PERFECT_SYMMETRY),
            suggestion: "Use off-center framing or a slightly tilted horizon.",
            strippable: false,
        },
        DetectionRule {
            id: "generic_subject",
            name: "Generic Subject",
            description: "A bare \"a woman\" or \"a man\" gets the model's average face.",
            weight: 2,
            matcher: Matcher::QualifiedNoun(&GENERIC_SUBJECT),
            suggestion: "Give the subject an age, an occupation, or a distinguishing detail.",
            strippable: false,
        },
        DetectionRule {
            id: "generic_location",
            name: "Generic Location",
            description: "Unqualified places like \"in a coffee shop\" render as stock sets.",
            weight: 2,
            matcher: Matcher::Predicate(mentions_generic_location),
            suggestion: "Describe the place: clutter, wear, weather, time of day.",
            strippable: false,
        },
        DetectionRule {
            id: "style_overload",
            name: "Style Overload",
            description: "More than two style words compete and average into a generic look.",
            weight: 3,
            matcher: Matcher::Predicate(style_overload),
            suggestion: "Keep one style direction and drop the rest.",
            strippable: false,
        },
        DetectionRule {
            id: "missing_imperfection",
            name: "Missing Imperfection",
            description: "Nothing in the prompt allows grain, blur, or other real-world flaws.",
            weight: 3,
            matcher: Matcher::Predicate(missing_imperfection),
            suggestion: "Add film grain, slight motion blur, or a light leak.",
            strippable: false,
        },
        DetectionRule {
            id: "missing_camera",
            name: "Missing Camera Reference",
            description: "No camera, lens, or film stock anchors the image in photography.",
            weight: 2,
            matcher: Matcher::Predicate(missing_camera),
            suggestion: "Name a camera body, lens, or film stock.",
            strippable: false,
        },
    ]
});

static REALISM_INDICATORS: Lazy<Vec<RealismIndicator>> = Lazy::new(|| {
    vec![
        RealismIndicator::new(
            "film_stock",
            3,
            r"(?i)\b(?:kodak|portra|ektar|fuji(?:film)?|superia|ilford|hp5|cinestill|tri-x)\b",
        ),
        RealismIndicator::new(
            "camera_body",
            2,
            r"(?i)\b(?:leica|canon|nikon|sony|contax|pentax|mamiya|hasselblad|olympus|iphone|smartphone|polaroid)\b",
        ),
        RealismIndicator::new("focal_length", 2, r"(?i)\b\d{2,3}\s?mm\b"),
        RealismIndicator::new("aperture", 1, r"(?i)\bf/\d+(?:\.\d+)?"),
        RealismIndicator::new("imperfection", 2, IMPERFECTION_VOCABULARY),
        RealismIndicator::new(
            "candid_framing",
            2,
            r"(?i)\b(?:candid|snapshot|unposed|documentary|street photography|photojournalism|amateur)\b",
        ),
        RealismIndicator::new(
            "skin_texture",
            2,
            r"(?i)\b(?:pores|freckles|wrinkles|skin texture|blemish(?:es)?|stubble|laugh lines)\b",
        ),
        RealismIndicator::new(
            "practical_light",
            1,
            r"(?i)\b(?:window light|overcast|fluorescent|tungsten|streetlight|flash|daylight|bare bulb)\b",
        ),
    ]
});

/// The full ordered rule set, fixed for the process lifetime.
pub fn detection_rules() -> &'static [DetectionRule] {
    &DETECTION_RULES
}

pub fn realism_indicators() -> &'static [RealismIndicator] {
    &REALISM_INDICATORS
}

/// Phrase families the transformer strips, in rule order.
pub(crate) fn strippable_phrase_sets() -> impl Iterator<Item = &'static PhraseSet> {
    detection_rules()
        .iter()
        .filter(|rule| rule.strippable)
        .filter_map(|rule| match rule.matcher {
            Matcher::PhraseSet(set) => Some(set),
            _ => None,
        })
}

pub(crate) fn generic_subject() -> &'static QualifiedNoun {
    &GENERIC_SUBJECT
}
