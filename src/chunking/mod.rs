// src/chunking/mod.rs

pub mod adaptive;
pub mod assembler;
pub mod flat;
pub mod keywords;
pub mod section;

pub use adaptive::{
    create_adaptive_chunks, AdaptiveChunker, ChunkSpan, HierarchicalChunk, OverlapInfo,
    KEYWORDS_LABEL,
};
pub use assembler::{assign_hierarchy, hierarchical_chunk_documents, DocumentChunks, HierarchicalChunker};
pub use keywords::{extract_keywords_from_title, KeywordExtractor};
pub use section::{parse_sections, HeadingRule, LengthPunctuationRule, Section, SectionParser};
