// src/chunking/assembler.rs

use super::adaptive::{AdaptiveChunker, HierarchicalChunk};
use super::flat;
use super::keywords::KeywordExtractor;
use super::section::{HeadingRule, LengthPunctuationRule, Section, SectionParser};
use crate::config::ChunkingConfig;
use crate::monitoring::chunking_stats::{record_chunking_snapshot, ChunkingStatsSnapshot};
use rayon::prelude::*;
use std::collections::BTreeMap;
use std::time::Instant;
use tracing::{debug, warn};

/// Chunks of one document plus how they were obtained.
#[derive(Debug, Clone)]
pub struct DocumentChunks {
    pub chunks: Vec<HierarchicalChunk>,
    pub sections: usize,
    pub flat_fallback: bool,
}

/// Backfills the owning section's level and breadcrumb into its chunks.
pub fn assign_hierarchy(section: &Section, chunks: &mut [HierarchicalChunk]) {
    let section_path = section.full_path();
    for chunk in chunks.iter_mut() {
        chunk.hierarchy_level = section.level;
        chunk.section_path = section_path.clone();
    }
}

/// Parser, keyword extractor and adaptive chunker wired together.
pub struct HierarchicalChunker<R: HeadingRule = LengthPunctuationRule> {
    parser: SectionParser<R>,
    keywords: KeywordExtractor,
    adaptive: AdaptiveChunker,
    flat_chunk_size: usize,
    flat_overlap: usize,
    flat_fallback: bool,
}

impl HierarchicalChunker<LengthPunctuationRule> {
    pub fn new(config: &ChunkingConfig) -> Self {
        Self::with_rule(config, LengthPunctuationRule::from(config))
    }

    pub fn with_default() -> Self {
        Self::new(&ChunkingConfig::default())
    }
}

impl<R: HeadingRule> HierarchicalChunker<R> {
    pub fn with_rule(config: &ChunkingConfig, rule: R) -> Self {
        Self {
            parser: SectionParser::new(rule),
            keywords: KeywordExtractor::from(config),
            adaptive: AdaptiveChunker::from(config),
            flat_chunk_size: config.flat_chunk_size,
            flat_overlap: config.flat_overlap,
            flat_fallback: config.flat_fallback,
        }
    }

    /// Chunks every section in order and concatenates the results.
    pub fn chunk_sections(&self, sections: &[Section]) -> Vec<HierarchicalChunk> {
        let mut all_chunks = Vec::new();
        for section in sections {
            let keywords = self.keywords.extract(&section.title);
            let mut chunks = self
                .adaptive
                .chunk(&section.content, &section.heading(), &keywords);
            assign_hierarchy(section, &mut chunks);
            all_chunks.extend(chunks);
        }
        all_chunks
    }

    /// Parses and chunks one document, recording a stats snapshot.
    pub fn chunk_document(&self, name: &str, text: &str) -> DocumentChunks {
        let started = Instant::now();
        let sections = self.parser.parse(text);

        let (chunks, flat_fallback) = if sections.is_empty() && !text.trim().is_empty() {
            if self.flat_fallback {
                warn!(document = name, "No numbered headings found, using flat chunking");
                (self.flat_chunks(text), true)
            } else {
                warn!(document = name, "No numbered headings found, document skipped");
                (Vec::new(), false)
            }
        } else {
            (self.chunk_sections(&sections), false)
        };

        let mut snapshot = ChunkingStatsSnapshot::new(
            name,
            sections.len(),
            flat_fallback,
            started.elapsed().as_millis() as u64,
        );
        for chunk in &chunks {
            snapshot.observe_chunk(&chunk.text, chunk.overlap_info.is_some());
        }
        record_chunking_snapshot(snapshot);

        debug!(
            document = name,
            sections = sections.len(),
            chunks = chunks.len(),
            "Document chunked"
        );

        DocumentChunks {
            chunks,
            sections: sections.len(),
            flat_fallback,
        }
    }

    fn flat_chunks(&self, text: &str) -> Vec<HierarchicalChunk> {
        flat::chunk_text(text, self.flat_chunk_size, self.flat_overlap)
            .into_iter()
            .map(|text| HierarchicalChunk {
                text,
                section_path: String::new(),
                hierarchy_level: 1,
                section_title: String::new(),
                keywords: Vec::new(),
                overlap_info: None,
                span: None,
            })
            .collect()
    }
}

/// Chunks a batch of documents; documents are independent, so they fan
/// out over the rayon pool when `config.parallel` is set.
pub fn hierarchical_chunk_documents(
    documents: &BTreeMap<String, String>,
    config: &ChunkingConfig,
) -> BTreeMap<String, Vec<HierarchicalChunk>> {
    let chunker = HierarchicalChunker::new(config);
    let run = |(name, text): (&String, &String)| {
        (name.clone(), chunker.chunk_document(name, text).chunks)
    };

    if config.parallel {
        documents.par_iter().map(run).collect()
    } else {
        documents.iter().map(run).collect()
    }
}
