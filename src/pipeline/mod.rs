// src/pipeline/mod.rs

pub mod enrich;
pub mod loader;
pub mod repair;
pub mod store;

use crate::config::ConfigError;
use thiserror::Error;

pub use enrich::{
    backfill_document_titles, build_metadata, drop_processed_documents, enrich_documents,
    EnrichSummary, MetadataEnricher, StructuralEnricher,
};
pub use loader::{extract_document_title, load_document_names, load_documents};
pub use repair::{repair_records, repair_store, repair_store_file, RepairReport, RepairedChunk};
pub use store::{ChunkRecord, ChunkStore, IntegrityReport, Metadata, StoreError};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("failed to read {path}: {source}")]
    ReadDocuments {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
