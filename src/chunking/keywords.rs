// src/chunking/keywords.rs

use crate::config::{ChunkingConfig, DEFAULT_KEYWORD_LIMIT, DEFAULT_KEYWORD_MIN_CHARS};

/// Title-word keyword heuristic: lowercase words of a minimum length, in
/// title order, capped at `limit`. No stop words, no de-duplication.
#[derive(Debug, Clone, Copy)]
pub struct KeywordExtractor {
    limit: usize,
    min_chars: usize,
}

impl Default for KeywordExtractor {
    fn default() -> Self {
        Self {
            limit: DEFAULT_KEYWORD_LIMIT,
            min_chars: DEFAULT_KEYWORD_MIN_CHARS,
        }
    }
}

impl From<&ChunkingConfig> for KeywordExtractor {
    fn from(config: &ChunkingConfig) -> Self {
        Self {
            limit: config.keyword_limit,
            min_chars: config.keyword_min_chars,
        }
    }
}

impl KeywordExtractor {
    pub fn extract(&self, title: &str) -> Vec<String> {
        title
            .to_lowercase()
            .split_whitespace()
            .filter(|word| word.chars().count() >= self.min_chars)
            .take(self.limit)
            .map(str::to_string)
            .collect()
    }
}

pub fn extract_keywords_from_title(title: &str) -> Vec<String> {
    KeywordExtractor::default().extract(title)
}
