use hierchunk::chunking::hierarchical_chunk_documents;
use hierchunk::config::ChunkingConfig;
use hierchunk::pipeline::{
    backfill_document_titles, enrich_documents, load_document_names, load_documents,
    ChunkStore, IntegrityReport, Metadata, MetadataEnricher, StructuralEnricher,
};
use serde_json::json;
use std::cell::Cell;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

const CONTRACT: &str = "ДОГОВОР ПОСТАВКИ ОБОРУДОВАНИЯ\n\n1. Предмет договора\nПоставщик передает оборудование.\n2. Порядок поставки\nПоставка выполняется партиями.\n2.1. Сроки поставки\nНе позднее 30 дней.\n";
const POLICY: &str = "УТВЕРЖДЕНО\nг. Москва\nПолитика обработки данных\n\n1. Цели обработки\nДанные обрабатываются для исполнения договоров.\n";

/// Counts the chunks it was asked to enrich.
struct CountingEnricher {
    calls: Cell<usize>,
}

impl MetadataEnricher for CountingEnricher {
    fn enrich(&self, body: &str) -> Metadata {
        self.calls.set(self.calls.get() + 1);
        let mut metadata = Metadata::new();
        metadata.insert("summary".to_string(), json!(body));
        metadata
    }
}

fn write_documents(dir: &Path) {
    fs::write(dir.join("contract.txt"), CONTRACT).unwrap();
    fs::write(dir.join("policy.txt"), POLICY).unwrap();
    fs::write(dir.join("notes.md"), "не документ").unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_documents_are_chunked_into_progress_file() {
        let dir = tempdir().expect("Failed to create temp directory");
        write_documents(dir.path());
        let progress = dir.path().join("progress.json");

        let documents = load_documents(dir.path()).unwrap();
        assert_eq!(documents.len(), 2);

        let chunked = hierarchical_chunk_documents(&documents, &ChunkingConfig::default());
        let names = load_document_names(dir.path().join("document_names.txt")).unwrap();
        let mut store = ChunkStore::load_or_default(&progress).unwrap();
        let summary = enrich_documents(&chunked, &names, &StructuralEnricher, &mut store, Some(progress.as_path())).unwrap();

        assert_eq!(summary.processed, vec!["contract.txt", "policy.txt"]);
        assert_eq!(summary.chunks, 4);

        let saved = ChunkStore::load(&progress).unwrap();
        assert_eq!(saved, store);

        let contract = saved.get("contract.txt").unwrap();
        assert_eq!(contract.len(), 3);
        assert_eq!(
            contract[2].metadata["section_path"],
            json!("Порядок поставки > 2.1. Сроки поставки")
        );
        assert_eq!(contract[2].metadata["hierarchy_level"], json!(2));
        assert_eq!(contract[2].metadata["keywords"], json!("сроки, поставки"));
        assert_eq!(contract[0].metadata_str("document_title"), Some("1. Предмет договора"));

        let report = IntegrityReport::from_store(&saved);
        assert!(report.is_ok());
        assert_eq!(report.total_chunks, 4);
        assert_eq!(report.documents["policy.txt"], 1);
    }

    #[test]
    fn test_rerun_skips_processed_documents() {
        let dir = tempdir().expect("Failed to create temp directory");
        write_documents(dir.path());
        let progress = dir.path().join("progress.json");
        let documents = load_documents(dir.path()).unwrap();
        let chunked = hierarchical_chunk_documents(&documents, &ChunkingConfig::default());
        let names = Default::default();

        // A previous run stopped after the first document.
        let mut partial = ChunkStore::new();
        let first_only: BTreeMap<_, _> = chunked
            .iter()
            .take(1)
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        enrich_documents(&first_only, &names, &StructuralEnricher, &mut partial, Some(progress.as_path())).unwrap();

        let enricher = CountingEnricher { calls: Cell::new(0) };
        let mut resumed = ChunkStore::load_or_default(&progress).unwrap();
        let summary = enrich_documents(&chunked, &names, &enricher, &mut resumed, Some(progress.as_path())).unwrap();

        assert_eq!(summary.skipped, vec!["contract.txt"]);
        assert_eq!(summary.processed, vec!["policy.txt"]);
        assert_eq!(enricher.calls.get(), 1);

        let saved = ChunkStore::load(&progress).unwrap();
        assert_eq!(saved.len(), 2);
        assert!(saved.get("contract.txt").unwrap()[0].metadata.get("summary").is_none());
        assert_eq!(
            saved.get("policy.txt").unwrap()[0].metadata["summary"],
            json!("Данные обрабатываются для исполнения договоров.")
        );
    }

    #[test]
    fn test_title_backfill_from_names_file() {
        let dir = tempdir().expect("Failed to create temp directory");
        write_documents(dir.path());
        let progress = dir.path().join("progress.json");
        let documents = load_documents(dir.path()).unwrap();
        let chunked = hierarchical_chunk_documents(&documents, &ChunkingConfig::default());

        let mut store = ChunkStore::new();
        enrich_documents(&chunked, &Default::default(), &StructuralEnricher, &mut store, Some(progress.as_path())).unwrap();

        let names_file = dir.path().join("document_names.txt");
        fs::write(&names_file, "contract\tДоговор поставки оборудования\n").unwrap();
        let names = load_document_names(&names_file).unwrap();

        let mut store = ChunkStore::load(&progress).unwrap();
        assert!(backfill_document_titles(&mut store, &names));
        for record in store.get("contract.txt").unwrap() {
            assert_eq!(record.metadata_str("document_title"), Some("Договор поставки оборудования"));
        }
        assert!(!backfill_document_titles(&mut store, &names));
    }
}
