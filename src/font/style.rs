//! Recognition of weight and style phrases inside names.

use std::collections::HashSet;

use crate::font::weight::{normalize_phrase, WeightVocabulary};
use crate::models::StyleToken;
use crate::utils::naming::{classify_token, tokenize_stem, ITALIC_MARKERS};

/// Style names every font tool understands, independent of the vocabulary
const BASE_STYLES: [&str; 9] = [
    "Thin",
    "Extra Light",
    "Light",
    "Regular",
    "Medium",
    "Semi Bold",
    "Bold",
    "Extra Bold",
    "Black",
];

/// Subfamily used when a name carries no style phrase
pub const DEFAULT_SUBFAMILY: &str = "Regular";

/// Matches subfamily phrases inside humanized names.
///
/// Only the base styles, each with or without a trailing `Italic`, and a bare
/// `Italic` are recognized, compared exactly. Vocabulary aliases are not
/// subfamily phrases.
#[derive(Debug, Clone)]
pub struct StyleMatcher {
    phrases: HashSet<String>,
}

impl Default for StyleMatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl StyleMatcher {
    pub fn new() -> Self {
        let mut phrases: HashSet<String> = BASE_STYLES
            .iter()
            .flat_map(|base| [base.to_string(), format!("{} Italic", base)])
            .collect();
        phrases.insert("Italic".to_string());
        Self { phrases }
    }

    /// Whether a phrase is a recognized subfamily
    pub fn is_style_phrase(&self, phrase: &str) -> bool {
        self.phrases.contains(phrase)
    }

    /// Split a humanized name into `(family, subfamily)`.
    ///
    /// The rightmost style phrase wins, preferring longer phrases at the same
    /// position. Without one the subfamily is `Regular` and the whole string is
    /// the family.
    pub fn split_family_subfamily(&self, humanized: &str) -> (String, String) {
        let tokens: Vec<&str> = humanized.split(' ').filter(|t| !t.is_empty()).collect();
        if tokens.is_empty() {
            return (String::new(), DEFAULT_SUBFAMILY.to_string());
        }

        let mut found = None;
        'search: for end in (0..tokens.len()).rev() {
            for size in [3usize, 2, 1] {
                if size > end + 1 {
                    continue;
                }
                let start = end + 1 - size;
                if self.is_style_phrase(&tokens[start..=end].join(" ")) {
                    found = Some((start, end));
                    break 'search;
                }
            }
        }

        let Some((start, end)) = found else {
            return (humanized.to_string(), DEFAULT_SUBFAMILY.to_string());
        };

        let subfamily = tokens[start..=end].join(" ");
        let family_tokens: Vec<&str> = tokens[..start]
            .iter()
            .chain(tokens[end + 1..].iter())
            .copied()
            .collect();
        let family = if family_tokens.is_empty() {
            humanized.to_string()
        } else {
            family_tokens.join(" ")
        };
        (family, subfamily)
    }
}

/// Whether a normalized phrase mentions an italic marker
fn has_italic_marker(normalized: &str) -> bool {
    ITALIC_MARKERS.iter().any(|m| normalized.contains(m))
}

/// Infer the numeric weight and italic flag from a style phrase.
///
/// Longer vocabulary phrases are tried first so `extra light` beats `light`.
pub fn weight_and_style_from_phrase(phrase: &str, vocab: &WeightVocabulary) -> (Option<u16>, bool) {
    let normalized = normalize_phrase(phrase);
    let italic = has_italic_marker(&normalized);

    let mut candidates: Vec<&str> = vocab.known_phrases().filter(|p| !p.is_empty()).collect();
    candidates.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

    let weight = candidates
        .into_iter()
        .find(|candidate| normalized.contains(candidate))
        .and_then(|candidate| vocab.lookup_value(candidate));
    (weight, italic)
}

/// Infer weight and italic from a subfamily, then a family, then filename tokens.
///
/// The italic flag is set when any of the sources mentions an italic marker.
pub fn weight_and_style_from_names(
    family: Option<&str>,
    subfamily: Option<&str>,
    stem: &str,
    vocab: &WeightVocabulary,
) -> (Option<u16>, bool) {
    let mut italic = false;
    for source in [subfamily, family].into_iter().flatten() {
        if source.trim().is_empty() {
            continue;
        }
        let (weight, is_italic) = weight_and_style_from_phrase(source, vocab);
        italic |= is_italic;
        if weight.is_some() {
            return (weight, italic);
        }
    }

    let tokens = tokenize_stem(stem);
    italic |= tokens
        .iter()
        .any(|t| classify_token(t, vocab) == StyleToken::ItalicMarker);
    let pairs = tokens.windows(2).map(|pair| pair.join(" "));
    let weight = pairs
        .chain(tokens.iter().cloned())
        .find_map(|phrase| vocab.lookup_value(&phrase));
    (weight, italic)
}
