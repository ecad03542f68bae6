// src/pipeline/repair.rs
// Mends chunks that begin mid-sentence by borrowing the sentence tail
// from the preceding chunk.

use super::store::{ChunkRecord, ChunkStore, StoreError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::path::Path;
use tracing::{debug, info};

static SENTENCE_BOUNDARY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]\s+").expect("sentence boundary pattern must compile"));

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairedChunk {
    pub document: String,
    pub index: usize,
    pub borrowed: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    pub repairs: Vec<RepairedChunk>,
}

impl RepairReport {
    pub fn len(&self) -> usize {
        self.repairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.repairs.is_empty()
    }
}

/// First character is a lowercase letter.
pub fn starts_lowercase(text: &str) -> bool {
    text.chars().next().is_some_and(char::is_lowercase)
}

pub fn ends_without_terminal_punctuation(text: &str) -> bool {
    !text.ends_with(['.', '!', '?'])
}

/// Text after the last "punctuation + whitespace" boundary, trimmed.
pub fn last_sentence(text: &str) -> &str {
    let tail_start = SENTENCE_BOUNDARY
        .find_iter(text)
        .last()
        .map(|m| m.end())
        .unwrap_or(0);
    text[tail_start..].trim()
}

/// Fragment to prepend to `current`, judged on trimmed texts.
pub fn fragment_to_borrow<'a>(previous: &'a str, current: &str) -> Option<&'a str> {
    let previous = previous.trim();
    let current = current.trim();

    if !starts_lowercase(current) || !ends_without_terminal_punctuation(previous) {
        return None;
    }

    let sentence = last_sentence(previous);
    if sentence.is_empty() {
        return None;
    }
    Some(sentence)
}

/// The text `current` had before an earlier pass prepended the fragment
/// borrowed from `previous`, if it has exactly that shape.
fn strip_borrowed<'a>(previous: &str, current: &'a str) -> Option<&'a str> {
    if !ends_without_terminal_punctuation(previous) {
        return None;
    }
    let sentence = last_sentence(previous);
    if sentence.is_empty() {
        return None;
    }
    let rest = current.strip_prefix(sentence)?.strip_prefix(' ')?;
    starts_lowercase(rest).then_some(rest)
}

/// Chunk texts with fragments from earlier passes removed. Index 0 is
/// never repaired, so each entry is derived from the one before it.
fn unrepaired_texts(texts: &[String]) -> Vec<&str> {
    let mut originals: Vec<&str> = Vec::with_capacity(texts.len());
    for text in texts {
        let original = originals
            .last()
            .and_then(|previous| strip_borrowed(previous, text))
            .unwrap_or(text.as_str());
        originals.push(original);
    }
    originals
}

/// Plans then applies repairs for one document's chunk sequence.
///
/// Every decision reads the texts as they were before this pass, so a
/// chunk repaired at index `i` never feeds its new text into index `i + 1`.
/// Chunks that already carry the fragment an earlier pass would borrow are
/// left alone, and their predecessors are judged on their unrepaired text.
pub fn repair_records(records: &mut [ChunkRecord]) -> Vec<(usize, String)> {
    if records.len() < 2 {
        return Vec::new();
    }

    let snapshot: Vec<String> = records.iter().map(|r| r.text.trim().to_string()).collect();
    let originals = unrepaired_texts(&snapshot);
    let planned: Vec<(usize, String)> = (1..snapshot.len())
        .filter(|&index| originals[index] == snapshot[index])
        .filter_map(|index| {
            fragment_to_borrow(originals[index - 1], &snapshot[index])
                .map(|fragment| (index, fragment.to_string()))
        })
        .collect();

    for (index, fragment) in &planned {
        records[*index].text = format!("{} {}", fragment, snapshot[*index]);
    }

    planned
}

/// Repairs every document of the store in place.
pub fn repair_store(store: &mut ChunkStore) -> RepairReport {
    let mut report = RepairReport::default();

    for (document, records) in store.iter_mut() {
        for (index, borrowed) in repair_records(records) {
            debug!(
                document = %document,
                chunk = index,
                borrowed = %borrowed,
                "Prepended sentence tail from previous chunk"
            );
            report.repairs.push(RepairedChunk {
                document: document.clone(),
                index,
                borrowed,
            });
        }
    }

    report
}

/// Loads the persisted store at `path`, repairs it and writes it back.
pub fn repair_store_file<P: AsRef<Path>>(path: P) -> Result<RepairReport, StoreError> {
    let path = path.as_ref();
    let mut store = ChunkStore::load(path)?;
    let report = repair_store(&mut store);
    store.save(path)?;
    info!(path = %path.display(), repairs = report.len(), "Chunk overlap repaired");
    Ok(report)
}
