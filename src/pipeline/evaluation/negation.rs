//! Negation-safety check.
//!
//! Coarse substring test, not a negation-scope parser: a marker present
//! anywhere in the rewrite counts as preserved. Short markers such as "no"
//! also match inside longer words ("not", "know"). This errs toward
//! passing the check only when the marker text survives; a marker that
//! disappears is always flagged.

use std::sync::LazyLock;

/// Negation markers, checked in this order.
pub const NEGATION_TERMS: &[&str] = &[
    "no",
    "not",
    "without",
    "absence of",
    "ruled out",
    "negative for",
    "free of",
    "does not show",
    "cannot be seen",
];

static DEFAULT_LEXICON: LazyLock<NegationLexicon> =
    LazyLock::new(|| NegationLexicon::new(NEGATION_TERMS.iter().copied()));

/// Immutable, ordered list of lowercase negation markers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NegationLexicon {
    markers: Vec<String>,
}

impl NegationLexicon {
    pub fn new<I, S>(markers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            markers: markers
                .into_iter()
                .map(|m| m.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn clinical() -> Self {
        DEFAULT_LEXICON.clone()
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}

impl Default for NegationLexicon {
    fn default() -> Self {
        Self::clinical()
    }
}

/// First marker present in `original` but absent from `simplified`.
pub fn lost_negation<'a>(
    lexicon: &'a NegationLexicon,
    original: &str,
    simplified: &str,
) -> Option<&'a str> {
    let o = original.to_lowercase();
    let s = simplified.to_lowercase();

    lexicon
        .markers
        .iter()
        .find(|marker| o.contains(marker.as_str()) && !s.contains(marker.as_str()))
        .map(String::as_str)
}

/// `false` as soon as one negation marker of the original is missing from
/// the rewrite.
pub fn negation_safe(lexicon: &NegationLexicon, original: &str, simplified: &str) -> bool {
    lost_negation(lexicon, original, simplified).is_none()
}
