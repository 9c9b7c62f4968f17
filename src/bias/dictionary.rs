use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors that can occur while loading a phrase dictionary
#[derive(Debug, thiserror::Error)]
pub enum DictionaryError {
    #[error("Failed to read dictionary file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dictionary file is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Dictionary must contain at least one phrase")]
    Empty,

    #[error("Dictionary entry {0} has a blank phrase")]
    BlankPhrase(usize),

    #[error("Phrase '{0}' appears more than once")]
    DuplicatePhrase(String),
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PhraseInfo {
    pub difficulty: Difficulty,
    pub color: String,
}

/// A dictionary entry as stored on disk
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhraseEntry {
    pub phrase: String,
    pub difficulty: Difficulty,
    pub color: String,
}

const HIGHLIGHT_COLOR: &str = "#E9D5FF";

/// Biased phrases of the built-in headline, in declaration order
const BUILTIN_PHRASES: &[(&str, Difficulty)] = &[
    ("lucky guesses", Difficulty::Medium),
    ("just the truth", Difficulty::Hard),
    ("hiding", Difficulty::Hard),
    ("plain sight", Difficulty::Hard),
    ("it's", Difficulty::Medium),
];

/// Ordered mapping from lowercase phrase to its difficulty and highlight colour.
///
/// Lookup walks the entries in declaration order and the first hit wins, so
/// the order is part of the matching contract.
#[derive(Debug, Clone)]
pub struct PhraseDictionary {
    entries: Vec<(String, PhraseInfo)>,
}

impl Default for PhraseDictionary {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PhraseDictionary {
    pub fn new(entries: Vec<PhraseEntry>) -> Result<Self, DictionaryError> {
        if entries.is_empty() {
            return Err(DictionaryError::Empty);
        }

        let mut normalized: Vec<(String, PhraseInfo)> = Vec::with_capacity(entries.len());
        for (position, entry) in entries.into_iter().enumerate() {
            let key = normalize(&entry.phrase);
            // A blank key is contained in every candidate
            if key.is_empty() {
                return Err(DictionaryError::BlankPhrase(position));
            }
            if normalized.iter().any(|(existing, _)| *existing == key) {
                return Err(DictionaryError::DuplicatePhrase(key));
            }
            normalized.push((
                key,
                PhraseInfo {
                    difficulty: entry.difficulty,
                    color: entry.color,
                },
            ));
        }

        Ok(Self {
            entries: normalized,
        })
    }

    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_PHRASES
                .iter()
                .map(|(phrase, difficulty)| {
                    (
                        phrase.to_string(),
                        PhraseInfo {
                            difficulty: *difficulty,
                            color: HIGHLIGHT_COLOR.to_string(),
                        },
                    )
                })
                .collect(),
        }
    }

    /// Load an ordered JSON array of `{phrase, difficulty, color}` entries
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, DictionaryError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let entries: Vec<PhraseEntry> = serde_json::from_str(&raw)?;
        let dictionary = Self::new(entries)?;
        tracing::info!(
            "Loaded {} phrases from {}",
            dictionary.len(),
            path.as_ref().display()
        );
        Ok(dictionary)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PhraseInfo)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Match a candidate substring against the dictionary.
    ///
    /// The candidate matches a key when, after trimming and lower-casing both,
    /// it equals the key or contains it. Returns the first such key.
    pub fn find_match(&self, candidate: &str) -> Option<(&str, &PhraseInfo)> {
        let candidate = normalize(candidate);
        if candidate.is_empty() {
            return None;
        }

        self.iter()
            .find(|(key, _)| candidate == *key || candidate.contains(key))
    }
}

fn normalize(text: &str) -> String {
    text.trim().to_lowercase()
}
