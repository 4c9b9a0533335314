//! Translator configuration.
//!
//! Allows a project embedding this translator to extend the recognised
//! variable-type set beyond spec's fixed list, and to toggle whether
//! the auxiliary-declaration block is sorted in the output — sorting
//! is the right default for a stable build artifact, but turning it
//! off makes the output easier to diff against a specific source
//! ordering during development.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TranslateError};

/// Configuration for one translation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslateConfig {
    /// Extra type words accepted alongside the built-in set (e.g.
    /// vendor-specific numeric typedefs like `int8_t`).
    pub extra_type_words: Vec<String>,

    /// Whether the emitted auxiliary-declaration block is sorted
    /// lexicographically. Defaults to `true`, matching the documented
    /// stable-output contract.
    pub sort_declarations: bool,
}

impl Default for TranslateConfig {
    fn default() -> Self {
        TranslateConfig { extra_type_words: Vec::new(), sort_declarations: true }
    }
}

impl TranslateConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a configuration from a TOML file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            TranslateError::MalformedInput(format!("reading config {}: {}", path.display(), e))
        })?;
        toml::from_str(&content).map_err(|e| {
            TranslateError::MalformedInput(format!("parsing config {}: {}", path.display(), e))
        })
    }

    pub fn with_extra_type_word(mut self, word: impl Into<String>) -> Self {
        self.extra_type_words.push(word.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_sorts_declarations() {
        let config = TranslateConfig::new();
        assert!(config.sort_declarations);
        assert!(config.extra_type_words.is_empty());
    }

    #[test]
    fn builder_adds_type_words() {
        let config = TranslateConfig::new().with_extra_type_word("int8_t");
        assert_eq!(config.extra_type_words, vec!["int8_t".to_string()]);
    }

    #[test]
    fn from_toml_file_parses_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latchc.toml");
        std::fs::write(&path, "sort_declarations = false\nextra_type_words = [\"int8_t\"]\n").unwrap();
        let config = TranslateConfig::from_toml_file(&path).unwrap();
        assert!(!config.sort_declarations);
        assert_eq!(config.extra_type_words, vec!["int8_t".to_string()]);
    }
}
