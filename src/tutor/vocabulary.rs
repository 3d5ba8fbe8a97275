//! German→English word list loaded once at startup.

use std::fmt;
use std::path::{Path, PathBuf};

use rand::Rng;
use serde_json::Value;
use tracing::{error, info, warn};

/// One German-English word pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VocabularyEntry {
    pub german: String,
    /// Empty when the source document had no usable translation.
    pub english: String,
}

/// Result of asking for a random word.
#[derive(Debug, PartialEq, Eq)]
pub enum WordPick<'a> {
    Found(&'a VocabularyEntry),
    Empty,
}

#[derive(Debug)]
pub enum VocabularyError {
    ReadFile { path: PathBuf, source: std::io::Error },
    ParseJson { path: PathBuf, source: serde_json::Error },
}

impl fmt::Display for VocabularyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ReadFile { path, source } => {
                write!(f, "failed to read vocabulary '{}': {}", path.display(), source)
            }
            Self::ParseJson { path, source } => {
                write!(f, "failed to parse vocabulary '{}': {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for VocabularyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::ReadFile { source, .. } => Some(source),
            Self::ParseJson { source, .. } => Some(source),
        }
    }
}

#[derive(Debug, Default)]
pub struct Vocabulary {
    entries: Vec<VocabularyEntry>,
}

impl Vocabulary {
    #[cfg(test)]
    pub fn from_entries(entries: Vec<VocabularyEntry>) -> Self {
        Self { entries }
    }

    /// Load a flat JSON object of German term → English term.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VocabularyError> {
        let path = path.as_ref().to_path_buf();
        let content = std::fs::read_to_string(&path)
            .map_err(|e| VocabularyError::ReadFile { path: path.clone(), source: e })?;
        let document: serde_json::Map<String, Value> = serde_json::from_str(&content)
            .map_err(|e| VocabularyError::ParseJson { path: path.clone(), source: e })?;

        let entries = document
            .into_iter()
            .map(|(german, english)| {
                let english = match english {
                    Value::String(s) => s,
                    other => {
                        warn!("Vocabulary entry '{}' has no usable translation: {}", german, other);
                        String::new()
                    }
                };
                VocabularyEntry { german, english }
            })
            .collect();

        Ok(Self { entries })
    }

    /// Load the word list, falling back to an empty one so the bot still runs.
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(vocabulary) if vocabulary.is_empty() => {
                warn!("Vocabulary file has no entries, quizzes and lessons will fail");
                vocabulary
            }
            Ok(vocabulary) => {
                info!("📚 Loaded {} vocabulary entries", vocabulary.len());
                vocabulary
            }
            Err(e) => {
                error!("Error loading vocabulary: {e}");
                Self::default()
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn random_entry(&self) -> WordPick<'_> {
        self.pick_with(&mut rand::thread_rng())
    }

    /// Pick an entry uniformly at random using the given generator.
    pub fn pick_with<R: Rng>(&self, rng: &mut R) -> WordPick<'_> {
        if self.entries.is_empty() {
            warn!("No words available");
            return WordPick::Empty;
        }
        WordPick::Found(&self.entries[rng.gen_range(0..self.entries.len())])
    }
}
