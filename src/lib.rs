pub mod chunking;
pub mod config;
pub mod monitoring;
pub mod pipeline;

pub use chunking::{
    hierarchical_chunk_documents, parse_sections, HierarchicalChunk, HierarchicalChunker, Section,
};
pub use config::{ChunkingConfig, PipelineConfig};
pub use pipeline::{ChunkRecord, ChunkStore, PipelineError};
