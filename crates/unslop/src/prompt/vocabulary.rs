use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

pub const CAMERAS: &[(&str, &[&str])] = &[
    (
        "film",
        &[
            "shot on Kodak Portra 400",
            "shot on Kodak Gold 200",
            "shot on Fujifilm Superia 400",
            "shot on Ilford HP5 Plus",
            "shot on CineStill 800T",
        ],
    ),
    (
        "modern",
        &[
            "shot on Sony A7 III",
            "shot on Canon EOS R5",
            "shot on Fujifilm X-T4",
            "shot on Nikon Z6",
            "shot on Leica Q2",
        ],
    ),
];

pub const LENSES: &[&str] = &[
    "35mm lens",
    "50mm lens at f/2",
    "28mm wide-angle lens",
    "85mm lens at f/1.8",
    "40mm pancake lens",
];

pub const LIGHTING: &[(&str, &[&str])] = &[
    (
        "natural",
        &[
            "soft window light",
            "overcast daylight",
            "late afternoon sun through the trees",
            "flat light from a cloudy sky",
        ],
    ),
    (
        "moody",
        &[
            "dim tungsten lamp light",
            "blue hour light through a window",
            "single bare bulb overhead",
            "low winter sun casting long shadows",
        ],
    ),
    (
        "artificial",
        &[
            "harsh fluorescent overhead light",
            "direct on-camera flash",
            "sodium streetlight glow",
            "mixed tungsten and daylight",
        ],
    ),
];

pub const IMPERFECTIONS: &[(&str, &[&str])] = &[
    (
        "film",
        &[
            "visible film grain",
            "slight light leak along the edge",
            "dust specks on the negative",
            "faded color cast",
        ],
    ),
    (
        "focus",
        &[
            "slight motion blur",
            "focus slightly missed",
            "soft focus toward the edges",
            "background a little out of focus",
        ],
    ),
    (
        "surface",
        &[
            "smudged lens",
            "water spots on the lens",
            "faint scratches on the negative",
            "fingerprint haze in one corner",
        ],
    ),
];

pub const COMPOSITION: &[(&str, &[&str])] = &[(
    "natural",
    &[
        "off-center framing",
        "subject slightly cut off at the frame edge",
        "tilted horizon",
        "cluttered background left in frame",
        "shot from a slightly low angle",
    ],
)];

pub const HUMAN_DETAILS: &[&str] = &[
    "visible skin pores",
    "flyaway hairs",
    "uneven skin tone",
    "slightly asymmetrical face",
    "chapped lips",
    "faint under-eye circles",
    "natural unposed expression",
];

/// Category names as they appear in the normalized table.
pub mod category {
    pub const CAMERAS_FILM: &str = "cameras.film";
    pub const CAMERAS_MODERN: &str = "cameras.modern";
    pub const LENSES: &str = "lenses";
    pub const LIGHTING_NATURAL: &str = "lighting.natural";
    pub const LIGHTING_MOODY: &str = "lighting.moody";
    pub const LIGHTING_ARTIFICIAL: &str = "lighting.artificial";
    pub const IMPERFECTIONS_FILM: &str = "imperfections.film";
    pub const IMPERFECTIONS_FOCUS: &str = "imperfections.focus";
    pub const IMPERFECTIONS_SURFACE: &str = "imperfections.surface";
    pub const COMPOSITION_NATURAL: &str = "composition.natural";
    pub const HUMAN_DETAILS: &str = "human_details";
}

/// Groups offered by suggestion mode, two phrases each.
pub const MAJOR_GROUPS: &[&str] = &[
    "cameras",
    "lenses",
    "lighting",
    "imperfections",
    "composition",
];

/// Modifier phrases flattened into `category name -> phrases`.
///
/// Nested tables become dotted names (`lighting.moody`); flat lists keep their
/// own name. Every category is non-empty.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Vocabulary {
    categories: BTreeMap<String, &'static [&'static str]>,
}

static STANDARD: Lazy<Vocabulary> = Lazy::new(|| {
    let mut vocabulary = Vocabulary::default();
    vocabulary.insert_nested("cameras", CAMERAS);
    vocabulary.insert("lenses", LENSES);
    vocabulary.insert_nested("lighting", LIGHTING);
    vocabulary.insert_nested("imperfections", IMPERFECTIONS);
    vocabulary.insert_nested("composition", COMPOSITION);
    vocabulary.insert("human_details", HUMAN_DETAILS);
    vocabulary
});

impl Vocabulary {
    pub fn standard() -> &'static Vocabulary {
        &STANDARD
    }

    fn insert(&mut self, name: &str, phrases: &'static [&'static str]) {
        if !phrases.is_empty() {
            self.categories.insert(name.to_string(), phrases);
        }
    }

    fn insert_nested(
        &mut self,
        group: &str,
        table: &'static [(&'static str, &'static [&'static str])],
    ) {
        for (sub, phrases) in table {
            self.insert(&format!("{group}.{sub}"), phrases);
        }
    }

    pub fn category(&self, name: &str) -> Option<&'static [&'static str]> {
        self.categories.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, &'static [&'static str])> {
        self.categories
            .iter()
            .map(|(name, phrases)| (name.as_str(), *phrases))
    }

    /// All phrases under a group: the category itself or any `group.*` child,
    /// concatenated in name order.
    pub fn group(&self, group: &str) -> Vec<&'static str> {
        let prefix = format!("{group}.");
        self.categories()
            .filter(|(name, _)| *name == group || name.starts_with(&prefix))
            .flat_map(|(_, phrases)| phrases.iter().copied())
            .collect()
    }

    /// Listing used by the outer surfaces; `filter` selects one category or group.
    pub fn listing(&self, filter: Option<&str>) -> BTreeMap<String, Vec<&'static str>> {
        self.categories()
            .filter(|(name, _)| match filter {
                Some(wanted) => *name == wanted || name.starts_with(&format!("{wanted}.")),
                None => true,
            })
            .map(|(name, phrases)| (name.to_string(), phrases.to_vec()))
            .collect()
    }
}
