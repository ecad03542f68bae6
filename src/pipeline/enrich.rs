// src/pipeline/enrich.rs
// Wraps chunks into persisted records, resuming from a progress file

use super::loader::extract_document_title;
use super::store::{ChunkRecord, ChunkStore, Metadata, StoreError};
use crate::chunking::HierarchicalChunk;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Produces per-chunk metadata from the chunk body, e.g. a summary and
/// questions from a language model. Structural fields are added afterwards
/// and take precedence over anything returned here.
pub trait MetadataEnricher {
    fn enrich(&self, body: &str) -> Metadata;
}

/// Adds nothing beyond the structural fields.
#[derive(Debug, Clone, Copy, Default)]
pub struct StructuralEnricher;

impl MetadataEnricher for StructuralEnricher {
    fn enrich(&self, _body: &str) -> Metadata {
        Metadata::new()
    }
}

/// Metadata for one chunk: enricher output plus the structural fields.
pub fn build_metadata<E: MetadataEnricher + ?Sized>(
    chunk: &HierarchicalChunk,
    document_title: &str,
    enricher: &E,
) -> Metadata {
    let mut metadata = enricher.enrich(chunk.body());
    metadata.insert("document_title".to_string(), Value::from(document_title));
    metadata.insert("section_path".to_string(), Value::from(chunk.section_path.as_str()));
    metadata.insert("hierarchy_level".to_string(), Value::from(chunk.hierarchy_level));
    metadata.insert("section_title".to_string(), Value::from(chunk.section_title.as_str()));
    metadata.insert("keywords".to_string(), Value::from(chunk.keywords.join(", ")));
    if let Some(overlap) = &chunk.overlap_info {
        metadata.insert("overlap_size".to_string(), Value::from(overlap.overlap_size));
    }
    metadata
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichSummary {
    pub processed: Vec<String>,
    pub skipped: Vec<String>,
    pub chunks: usize,
}

/// Removes documents the store already holds, so a resumed run does not
/// chunk them again. Returns how many were removed.
pub fn drop_processed_documents(documents: &mut BTreeMap<String, String>, store: &ChunkStore) -> usize {
    let before = documents.len();
    documents.retain(|name, _| !store.contains(name));
    let removed = before - documents.len();
    info!(already_processed = removed, pending = documents.len(), "Resuming from progress file");
    removed
}

/// Enriches every document not yet present in `store`.
///
/// The store's document set is the checkpoint: documents already in it are
/// skipped, and the store is written to `progress_file` after each newly
/// finished document.
pub fn enrich_documents<E: MetadataEnricher + ?Sized>(
    chunked: &BTreeMap<String, Vec<HierarchicalChunk>>,
    names: &HashMap<String, String>,
    enricher: &E,
    store: &mut ChunkStore,
    progress_file: Option<&Path>,
) -> Result<EnrichSummary, StoreError> {
    let mut summary = EnrichSummary::default();
    let remaining: usize = chunked
        .iter()
        .filter(|(name, _)| !store.contains(name))
        .map(|(_, chunks)| chunks.len())
        .sum();
    info!(documents = chunked.len(), remaining_chunks = remaining, "Enriching chunks");

    for (doc_name, chunks) in chunked {
        if store.contains(doc_name) {
            debug!(document = %doc_name, "Already processed, skipping");
            summary.skipped.push(doc_name.clone());
            continue;
        }

        let started = Instant::now();
        let first_text = chunks.first().map(|c| c.text.as_str()).unwrap_or("");
        let document_title = extract_document_title(doc_name, first_text, names);

        let records: Vec<ChunkRecord> = chunks
            .iter()
            .map(|chunk| ChunkRecord::new(chunk.text.clone(), build_metadata(chunk, &document_title, enricher)))
            .collect();

        summary.chunks += records.len();
        store.insert(doc_name.clone(), records);
        summary.processed.push(doc_name.clone());

        if let Some(path) = progress_file {
            store.save(path)?;
        }
        info!(
            document = %doc_name,
            chunks = chunks.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Document enriched, progress saved"
        );
    }

    Ok(summary)
}

/// Sets `document_title` on all chunks of documents whose first chunk
/// lacks it or carries a different one. Returns whether anything changed.
pub fn backfill_document_titles(store: &mut ChunkStore, names: &HashMap<String, String>) -> bool {
    let mut updated = false;

    for (doc_name, records) in store.iter_mut() {
        let Some(first) = records.first() else {
            continue;
        };

        let full_text: String = records.iter().map(|r| r.text.as_str()).collect();
        let title = extract_document_title(doc_name, &full_text, names);
        if first.metadata_str("document_title") == Some(title.as_str()) {
            continue;
        }

        info!(document = %doc_name, title = %title, "Updating document title");
        for record in records.iter_mut() {
            record
                .metadata
                .insert("document_title".to_string(), Value::from(title.as_str()));
        }
        updated = true;
    }

    updated
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunking::HierarchicalChunker;
    use serde_json::json;

    struct SummaryEnricher;

    impl MetadataEnricher for SummaryEnricher {
        fn enrich(&self, body: &str) -> Metadata {
            let mut metadata = Metadata::new();
            metadata.insert("summary".to_string(), json!(format!("{} символов", body.chars().count())));
            metadata.insert("document_title".to_string(), json!("будет перезаписано"));
            metadata
        }
    }

    fn chunked() -> BTreeMap<String, Vec<HierarchicalChunk>> {
        let chunker = HierarchicalChunker::with_default();
        let mut map = BTreeMap::new();
        map.insert(
            "reg.txt".to_string(),
            chunker
                .chunk_document("reg.txt", "1. Общие положения\nТекст положения.\n1.1. Термины\nТермины и определения.")
                .chunks,
        );
        map
    }

    #[test]
    fn test_structural_metadata_fields() {
        let chunks = chunked();
        let names = HashMap::new();
        let mut store = ChunkStore::new();

        enrich_documents(&chunks, &names, &SummaryEnricher, &mut store, None).unwrap();

        let records = store.get("reg.txt").unwrap();
        assert_eq!(records.len(), 2);
        let second = &records[1];
        assert_eq!(second.metadata["section_path"], json!("Общие положения > 1.1. Термины"));
        assert_eq!(second.metadata["hierarchy_level"], json!(2));
        assert_eq!(second.metadata["section_title"], json!("1.1. Термины"));
        assert_eq!(second.metadata["keywords"], json!("термины"));
        assert_eq!(second.metadata["summary"], json!("22 символов"));
        assert_eq!(second.metadata["document_title"], json!("1. Общие положения"));
        assert!(second.metadata.get("overlap_size").is_none());
    }

    #[test]
    fn test_processed_documents_are_skipped_and_progress_saved() {
        let dir = tempfile::tempdir().unwrap();
        let progress = dir.path().join("progress.json");
        let chunks = chunked();
        let names = HashMap::new();

        let mut store = ChunkStore::new();
        let first = enrich_documents(&chunks, &names, &StructuralEnricher, &mut store, Some(progress.as_path())).unwrap();
        assert_eq!(first.processed, vec!["reg.txt"]);
        assert_eq!(first.chunks, 2);

        let mut resumed = ChunkStore::load(&progress).unwrap();
        let second = enrich_documents(&chunks, &names, &StructuralEnricher, &mut resumed, Some(progress.as_path())).unwrap();
        assert!(second.processed.is_empty());
        assert_eq!(second.skipped, vec!["reg.txt"]);
        assert_eq!(resumed, store);
    }

    #[test]
    fn test_processed_documents_are_not_rechunked() {
        let mut store = ChunkStore::new();
        store.insert("done.txt", vec![ChunkRecord::new("1. Раздел", Metadata::new())]);

        let mut documents = BTreeMap::new();
        documents.insert("done.txt".to_string(), "1. Раздел\nтекст".to_string());
        documents.insert("new.txt".to_string(), "2. Раздел\nтекст".to_string());

        assert_eq!(drop_processed_documents(&mut documents, &store), 1);
        assert_eq!(documents.keys().collect::<Vec<_>>(), vec!["new.txt"]);
        assert_eq!(drop_processed_documents(&mut documents, &store), 0);
    }

    #[test]
    fn test_backfill_titles() {
        let mut store = ChunkStore::new();
        store.insert(
            "Standart_NOSO.txt",
            vec![ChunkRecord::new("а", Metadata::new()), ChunkRecord::new("б", Metadata::new())],
        );
        let mut names = HashMap::new();
        names.insert("Standart_NOSO".to_string(), "Стандарт организации".to_string());

        assert!(backfill_document_titles(&mut store, &names));
        for record in store.get("Standart_NOSO.txt").unwrap() {
            assert_eq!(record.metadata_str("document_title"), Some("Стандарт организации"));
        }
        assert!(!backfill_document_titles(&mut store, &names));
    }
}
