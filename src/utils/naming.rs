use lazy_static::lazy_static;
use regex::Regex;

use crate::font::weight::WeightVocabulary;
use crate::models::StyleToken;

lazy_static! {
    static ref STEM_SPLIT: Regex = Regex::new(r"[-_]+").unwrap();
    static ref VERSION_TOKEN: Regex = Regex::new(r"^(?:v)?\d+(?:[._]\d+)*$").unwrap();
    static ref CAMEL_CASE: Regex = Regex::new(r"[a-z][A-Z]").unwrap();
    static ref FILENAME_DISALLOWED: Regex = Regex::new(r"[^A-Za-z0-9._-]").unwrap();
    static ref PS_DISALLOWED: Regex = Regex::new(r"[^A-Za-z0-9-]").unwrap();
    static ref UNDERSCORE_RUN: Regex = Regex::new(r"_+").unwrap();
    static ref HYPHEN_RUN: Regex = Regex::new(r"-+").unwrap();
}

/// Markers for italic styles
pub const ITALIC_MARKERS: [&str; 2] = ["italic", "oblique"];

/// Markers for variable fonts
pub const VARIABLE_MARKERS: [&str; 3] = ["vf", "variable", "var"];

/// Split a filename stem on runs of `-` and `_`, keeping the original casing
pub fn split_stem(stem: &str) -> Vec<&str> {
    STEM_SPLIT
        .split(stem)
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Split a filename stem into lowercase tokens
pub fn tokenize_stem(stem: &str) -> Vec<String> {
    split_stem(stem).into_iter().map(str::to_lowercase).collect()
}

/// Whether a token looks like a version, e.g. `0902`, `1.0` or `v1.2.3`
pub fn is_version_token(token: &str) -> bool {
    VERSION_TOKEN.is_match(token)
}

/// Whether a token holds a lowercase-to-uppercase transition, e.g. `NerdFont`
pub fn is_camel_case(token: &str) -> bool {
    CAMEL_CASE.is_match(token)
}

/// Classify the marker tokens that need no vocabulary
fn marker_kind(token: &str) -> Option<StyleToken> {
    if ITALIC_MARKERS.contains(&token) {
        Some(StyleToken::ItalicMarker)
    } else if VARIABLE_MARKERS.contains(&token) {
        Some(StyleToken::ToolMarker)
    } else if is_version_token(token) {
        Some(StyleToken::VersionMarker)
    } else {
        None
    }
}

/// Classify a lowercase token
pub fn classify_token(token: &str, vocab: &WeightVocabulary) -> StyleToken {
    marker_kind(token).unwrap_or_else(|| {
        if vocab.canonical_name_for(token).is_some() {
            StyleToken::WeightPhrase
        } else {
            StyleToken::Plain
        }
    })
}

/// Capitalize the first letter of a word and lowercase the rest
pub fn title_case(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
    }
}

/// Convert a filename stem into a Title Case display string.
///
/// Version tokens and variable-font markers are dropped, CamelCase tokens are
/// kept verbatim: `PragmataProMonoVF_liga_0902-Extra-bold` becomes
/// `PragmataProMono Liga Extra Bold`.
pub fn humanize_stem(stem: &str) -> String {
    let mut out = Vec::new();
    for token in STEM_SPLIT.split(stem).filter(|t| !t.is_empty()) {
        let mut token = token;
        if token.len() > 2 && token.to_lowercase().ends_with("vf") {
            token = &token[..token.len() - 2];
        }
        if token.is_empty() || token.eq_ignore_ascii_case("vf") || is_version_token(token) {
            continue;
        }
        if is_camel_case(token) {
            out.push(token.to_string());
        } else {
            out.push(title_case(token));
        }
    }
    out.join(" ")
}

/// Drop italic markers, variable-font markers and version tokens.
///
/// Weight words stay: the result feeds family-name derivation, where a shared
/// weight word is still part of the common prefix.
pub fn strip_non_family_tokens(tokens: &[String]) -> Vec<String> {
    tokens
        .iter()
        .filter(|t| marker_kind(t.as_str()).is_none())
        .cloned()
        .collect()
}

/// Longest positional common prefix across token lists
pub fn common_token_prefix(lists: &[Vec<String>]) -> Vec<String> {
    let Some(first) = lists.first() else {
        return Vec::new();
    };
    let min_len = lists.iter().map(Vec::len).min().unwrap_or(0);
    let mut prefix = Vec::new();
    for idx in 0..min_len {
        let token = &first[idx];
        if lists.iter().all(|list| &list[idx] == token) {
            prefix.push(token.clone());
        } else {
            break;
        }
    }
    prefix
}

/// Make a filesystem-safe file stem
pub fn sanitize_filename(name: &str) -> String {
    let cleaned = name.replace(' ', "_");
    let cleaned = FILENAME_DISALLOWED.replace_all(&cleaned, "");
    let cleaned = UNDERSCORE_RUN.replace_all(&cleaned, "_");
    let cleaned = HYPHEN_RUN.replace_all(&cleaned, "-");
    cleaned.trim_matches(|c| c == '-' || c == '.' || c == '_').to_string()
}

/// Compose a PostScript name `<Family>-<Subfamily>` without spaces
pub fn ps_name(family: &str, subfamily: &str) -> String {
    let fam = PS_DISALLOWED.replace_all(&family.replace(' ', ""), "").into_owned();
    let sub = PS_DISALLOWED.replace_all(&subfamily.replace(' ', ""), "").into_owned();
    if sub.is_empty() {
        fam
    } else {
        format!("{}-{}", fam, sub)
    }
}

/// Compose a file stem `<Family>-<Subfamily>` with spaces turned into underscores
pub fn make_clean_stem(family: &str, subfamily: &str) -> String {
    let fam = family.replace(' ', "_");
    let sub = subfamily.replace(' ', "_");
    if sub.is_empty() {
        fam
    } else {
        format!("{}-{}", fam, sub)
    }
}

/// Format a weight value without a trailing `.0` for whole numbers
pub fn format_weight(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}
