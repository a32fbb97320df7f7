//! The shared weight vocabulary, loaded from `fontweights.toml`.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use regex::Regex;
use toml::{Table, Value};

use crate::error::{Error, Result};

/// File name looked up in the working directory when no path is given
pub const DEFAULT_WEIGHTS_FILE: &str = "fontweights.toml";

lazy_static! {
    static ref PHRASE_SPLIT: Regex = Regex::new(r"[\s\-]+").unwrap();
}

/// Normalize a weight phrase for case, hyphen and whitespace insensitive matching.
///
/// `"Extra-Light"`, `"extra light"` and `"EXTRA   LIGHT"` all become `"extra light"`.
pub fn normalize_phrase(phrase: &str) -> String {
    PHRASE_SPLIT
        .split(phrase.trim())
        .filter(|part| !part.is_empty())
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Canonical weight names with their numeric values plus the alias table.
#[derive(Debug, Clone)]
pub struct WeightVocabulary {
    canonical_to_value: HashMap<String, u16>,
    normalized_to_canonical: HashMap<String, String>,
}

impl WeightVocabulary {
    /// Path of the vocabulary in the current working directory
    pub fn default_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DEFAULT_WEIGHTS_FILE)
    }

    /// Load the vocabulary from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "{} not found at {}",
                DEFAULT_WEIGHTS_FILE,
                path.display()
            )));
        }
        let text = fs::read_to_string(path)?;
        let vocab = Self::from_toml_str(&text)?;
        log::debug!(
            "Loaded {} canonical weights from {}",
            vocab.canonical_to_value.len(),
            path.display()
        );
        Ok(vocab)
    }

    /// Parse the vocabulary from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let data: Table = text
            .parse()
            .map_err(|e| Error::Config(format!("Invalid {}: {}", DEFAULT_WEIGHTS_FILE, e)))?;

        let weights = match data.get("weights") {
            Some(Value::Table(table)) if !table.is_empty() => table,
            _ => {
                return Err(Error::Config(format!(
                    "{} must define a non-empty [weights] table",
                    DEFAULT_WEIGHTS_FILE
                )))
            }
        };

        let mut canonical_to_value = HashMap::new();
        for (name, value) in weights {
            let number = match value {
                Value::Integer(n) if *n > 0 && *n <= i64::from(u16::MAX) => *n as u16,
                _ => {
                    return Err(Error::Config(format!(
                        "[weights].{} must be an integer weight between 1 and 65535",
                        name
                    )))
                }
            };
            canonical_to_value.insert(name.clone(), number);
        }

        let mut normalized_to_canonical = HashMap::new();
        for name in weights.keys() {
            normalized_to_canonical.insert(normalize_phrase(name), name.clone());
        }

        match data.get("aliases") {
            None => {}
            Some(Value::Table(aliases)) => {
                for (alias, target) in aliases {
                    let Value::String(target) = target else {
                        log::warn!("alias entries must be strings; ignoring one entry");
                        continue;
                    };
                    if !canonical_to_value.contains_key(target) {
                        log::warn!(
                            "alias '{}' refers to unknown canonical '{}'; ignoring",
                            alias,
                            target
                        );
                        continue;
                    }
                    // Later entries overwrite earlier ones, canonical names included.
                    normalized_to_canonical.insert(normalize_phrase(alias), target.clone());
                }
            }
            Some(_) => {
                return Err(Error::Config(
                    "[aliases] must be a table of alias -> canonical name".to_string(),
                ))
            }
        }

        Ok(Self {
            canonical_to_value,
            normalized_to_canonical,
        })
    }

    /// Numeric weight for a phrase, via its canonical name or an alias
    pub fn lookup_value(&self, phrase: &str) -> Option<u16> {
        self.canonical_name_for(phrase)
            .and_then(|name| self.canonical_to_value.get(name).copied())
    }

    /// Canonical weight name for a phrase
    pub fn canonical_name_for(&self, phrase: &str) -> Option<&str> {
        self.normalized_to_canonical
            .get(&normalize_phrase(phrase))
            .map(String::as_str)
    }

    /// All `(value, canonical name)` pairs, ascending by value then name
    pub fn standard_weights(&self) -> Vec<(u16, String)> {
        let mut items: Vec<(u16, String)> = self
            .canonical_to_value
            .iter()
            .map(|(name, value)| (*value, name.clone()))
            .collect();
        items.sort();
        items
    }

    /// Every normalized phrase the vocabulary recognizes
    pub fn known_phrases(&self) -> impl Iterator<Item = &str> {
        self.normalized_to_canonical.keys().map(String::as_str)
    }
}
