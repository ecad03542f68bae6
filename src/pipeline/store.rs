// src/pipeline/store.rs
// Persisted per-document chunk records: load/save as JSON

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info};

pub type Metadata = Map<String, Value>;

/// A chunk after metadata enrichment: the text handed to the embedder plus
/// free-form metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ChunkRecord {
    pub fn new(text: impl Into<String>, metadata: Metadata) -> Self {
        Self {
            text: text.into(),
            metadata,
        }
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Not found: {0}")]
    NotFound(String),
}

/// Document name to its ordered chunk records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChunkStore {
    documents: BTreeMap<String, Vec<ChunkRecord>>,
}

impl ChunkStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(StoreError::NotFound(format!(
                "chunk store not found: {}",
                path.display()
            )));
        }

        let json = std::fs::read_to_string(path)?;
        let store: ChunkStore = serde_json::from_str(&json)?;
        info!(
            path = %path.display(),
            documents = store.len(),
            chunks = store.total_chunks(),
            "Chunk store loaded"
        );
        Ok(store)
    }

    /// Loads `path`, or starts empty when it does not exist yet.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        match Self::load(path) {
            Err(StoreError::NotFound(msg)) => {
                debug!(reason = %msg, "Starting with an empty chunk store");
                Ok(Self::default())
            }
            other => other,
        }
    }

    /// Writes pretty JSON next to `path` and renames it into place.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), StoreError> {
        let path = path.as_ref();
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir)?;

        let mut tmp = NamedTempFile::new_in(dir)?;
        serde_json::to_writer_pretty(&mut tmp, self)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;

        debug!(path = %path.display(), documents = self.len(), "Chunk store saved");
        Ok(())
    }

    pub fn contains(&self, document: &str) -> bool {
        self.documents.contains_key(document)
    }

    pub fn get(&self, document: &str) -> Option<&[ChunkRecord]> {
        self.documents.get(document).map(Vec::as_slice)
    }

    pub fn insert(&mut self, document: impl Into<String>, records: Vec<ChunkRecord>) {
        self.documents.insert(document.into(), records);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<ChunkRecord>)> {
        self.documents.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut Vec<ChunkRecord>)> {
        self.documents.iter_mut()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.documents.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn total_chunks(&self) -> usize {
        self.documents.values().map(Vec::len).sum()
    }
}

/// Chunk counts per document and records with empty text.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IntegrityReport {
    pub documents: BTreeMap<String, usize>,
    pub total_chunks: usize,
    pub documents_with_empty_chunks: Vec<String>,
}

impl IntegrityReport {
    pub fn from_store(store: &ChunkStore) -> Self {
        let mut report = Self::default();
        for (name, records) in store.iter() {
            report.documents.insert(name.clone(), records.len());
            report.total_chunks += records.len();
            if records.iter().any(|r| r.text.trim().is_empty()) {
                report.documents_with_empty_chunks.push(name.clone());
            }
        }
        report
    }

    pub fn is_ok(&self) -> bool {
        self.documents_with_empty_chunks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(text: &str) -> ChunkRecord {
        let mut metadata = Metadata::new();
        metadata.insert("document_title".to_string(), json!("Положение"));
        ChunkRecord::new(text, metadata)
    }

    #[test]
    fn test_save_and_load_keeps_cyrillic_unescaped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("progress.json");

        let mut store = ChunkStore::new();
        store.insert("doc.txt", vec![record("Первый"), record("второй")]);
        store.save(&path).unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("Первый"));

        let loaded = ChunkStore::load(&path).unwrap();
        assert_eq!(loaded, store);
        assert_eq!(loaded.total_chunks(), 2);
        assert_eq!(loaded.get("doc.txt").unwrap()[0].metadata_str("document_title"), Some("Положение"));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.json");

        assert!(matches!(ChunkStore::load(&path), Err(StoreError::NotFound(_))));
        assert!(ChunkStore::load_or_default(&path).unwrap().is_empty());
    }

    #[test]
    fn test_records_without_metadata_parse() {
        let store: ChunkStore =
            serde_json::from_str(r#"{"a.txt": [{"text": "x"}]}"#).unwrap();
        assert!(store.get("a.txt").unwrap()[0].metadata.is_empty());
    }

    #[test]
    fn test_integrity_report_flags_empty_text() {
        let mut store = ChunkStore::new();
        store.insert("good.txt", vec![record("a"), record("b")]);
        store.insert("bad.txt", vec![record("  ")]);

        let report = IntegrityReport::from_store(&store);
        assert_eq!(report.total_chunks, 3);
        assert_eq!(report.documents["good.txt"], 2);
        assert_eq!(report.documents_with_empty_chunks, vec!["bad.txt"]);
        assert!(!report.is_ok());
    }
}
