// src/chunking/adaptive.rs

use crate::config::{
    ChunkingConfig, DEFAULT_BASE_CHUNK_SIZE, DEFAULT_MAX_OVERLAP, DEFAULT_OVERLAP_RATIO,
};
use serde::{Deserialize, Serialize};

/// Label of the keyword line placed between the title and the body.
pub const KEYWORDS_LABEL: &str = "Ключевые слова";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HierarchicalChunk {
    pub text: String,
    pub section_path: String,
    pub hierarchy_level: usize,
    pub section_title: String,
    pub keywords: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlap_info: Option<OverlapInfo>,
    /// Character range of the section content covered by this chunk.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub span: Option<ChunkSpan>,
}

impl HierarchicalChunk {
    /// The content excerpt without the title and keyword prefix.
    pub fn body(&self) -> &str {
        body_of(&self.text)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverlapInfo {
    pub overlap_size: usize,
    /// Tail of the section content that precedes this chunk's start.
    pub previous_chunk_end: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkSpan {
    pub start: usize,
    pub end: usize,
}

impl ChunkSpan {
    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Text after the last blank-line separator when the text has the
/// `title / keywords / body` shape, otherwise the whole text.
pub fn body_of(text: &str) -> &str {
    let parts = text.split("\n\n").count();
    if parts > 2 {
        text.rsplit("\n\n").next().unwrap_or(text)
    } else {
        text
    }
}

/// Builds the visible chunk text: title, keyword line, then the excerpt.
pub fn compose_chunk_text(section_title: &str, keywords: &[String], body: &str) -> String {
    format!(
        "{}\n\n{}: {}\n\n{}",
        section_title,
        KEYWORDS_LABEL,
        keywords.join(", "),
        body
    )
}

/// Splits section content into word-aligned chunks with an overlap that
/// shrinks as the section runs out.
#[derive(Debug, Clone, Copy)]
pub struct AdaptiveChunker {
    base_size: usize,
    max_overlap: usize,
    overlap_ratio: f64,
}

impl Default for AdaptiveChunker {
    fn default() -> Self {
        Self {
            base_size: DEFAULT_BASE_CHUNK_SIZE,
            max_overlap: DEFAULT_MAX_OVERLAP,
            overlap_ratio: DEFAULT_OVERLAP_RATIO,
        }
    }
}

impl From<&ChunkingConfig> for AdaptiveChunker {
    fn from(config: &ChunkingConfig) -> Self {
        Self {
            base_size: config.base_chunk_size,
            max_overlap: config.max_overlap,
            overlap_ratio: config.overlap_ratio,
        }
    }
}

impl AdaptiveChunker {
    pub fn with_base_size(base_size: usize) -> Self {
        Self {
            base_size,
            ..Self::default()
        }
    }

    pub fn base_size(&self) -> usize {
        self.base_size
    }

    /// Overlap for the chunk that starts with `remaining` characters left.
    pub fn overlap_for(&self, remaining: usize) -> usize {
        let proportional = (remaining as f64 * self.overlap_ratio).floor() as usize;
        proportional.min(self.max_overlap)
    }

    /// Chunks one section body. Sizes and offsets are in characters.
    ///
    /// Hierarchy fields are provisional (`section_path` is the title,
    /// level 1) until the assembler fills them in.
    pub fn chunk(
        &self,
        content: &str,
        section_title: &str,
        keywords: &[String],
    ) -> Vec<HierarchicalChunk> {
        if content.trim().is_empty() {
            return Vec::new();
        }

        // A zero budget would never advance.
        let base_size = self.base_size.max(1);
        let chars: Vec<char> = content.chars().collect();
        let content_length = chars.len();

        if content_length <= base_size {
            return vec![self.make_chunk(
                content,
                section_title,
                keywords,
                ChunkSpan {
                    start: 0,
                    end: content_length,
                },
                None,
            )];
        }

        // Forward progress needs the overlap to stay below the budget.
        let max_overlap = self.max_overlap.min(base_size.saturating_sub(1));

        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < content_length {
            let remaining = content_length - start;
            let overlap_size = self.overlap_for(remaining).min(max_overlap);

            let mut end = (start + base_size).min(content_length);
            if end < content_length {
                let snapped = snap_backward(&chars, end);
                // A window without whitespace is cut mid-word rather than emptied.
                if snapped > start {
                    end = snapped;
                }
            }

            let body: String = chars[start..end].iter().collect();
            let overlap_info = (start > 0).then(|| OverlapInfo {
                overlap_size,
                previous_chunk_end: chars[start.saturating_sub(overlap_size)..start]
                    .iter()
                    .collect(),
            });

            chunks.push(self.make_chunk(
                &body,
                section_title,
                keywords,
                ChunkSpan { start, end },
                overlap_info,
            ));

            if end >= content_length {
                break;
            }

            let next = (start + base_size - overlap_size).max(end.saturating_sub(overlap_size));
            // Never skip past the current end, so consecutive spans leave no gap.
            start = snap_forward(&chars, next).min(end);
        }

        chunks
    }

    fn make_chunk(
        &self,
        body: &str,
        section_title: &str,
        keywords: &[String],
        span: ChunkSpan,
        overlap_info: Option<OverlapInfo>,
    ) -> HierarchicalChunk {
        HierarchicalChunk {
            text: compose_chunk_text(section_title, keywords, body),
            section_path: section_title.to_string(),
            hierarchy_level: 1,
            section_title: section_title.to_string(),
            keywords: keywords.to_vec(),
            overlap_info,
            span: Some(span),
        }
    }
}

/// Moves `pos` left until the preceding character is whitespace.
fn snap_backward(chars: &[char], pos: usize) -> usize {
    let mut pos = pos.min(chars.len());
    while pos > 0 && !chars[pos - 1].is_whitespace() {
        pos -= 1;
    }
    pos
}

/// Moves `pos` right until it sits on whitespace or the end of text.
fn snap_forward(chars: &[char], pos: usize) -> usize {
    let mut pos = pos;
    while pos < chars.len() && !chars[pos].is_whitespace() {
        pos += 1;
    }
    pos
}

pub fn create_adaptive_chunks(
    content: &str,
    section_title: &str,
    keywords: &[String],
    base_chunk_size: usize,
) -> Vec<HierarchicalChunk> {
    AdaptiveChunker::with_base_size(base_chunk_size).chunk(content, section_title, keywords)
}
