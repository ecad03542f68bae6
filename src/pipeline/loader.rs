// src/pipeline/loader.rs

use super::PipelineError;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

const TITLE_SCAN_LINES: usize = 10;
const MIN_TITLE_CHARS: usize = 10;
const TITLE_SKIP_PREFIXES: [&str; 2] = ["УТВЕРЖДЕНО", "г."];

/// Reads every `*.txt` file directly inside `dir`.
pub fn load_documents<P: AsRef<Path>>(dir: P) -> Result<BTreeMap<String, String>, PipelineError> {
    let dir = dir.as_ref();
    let entries = fs::read_dir(dir).map_err(|source| PipelineError::ReadDocuments {
        path: dir.display().to_string(),
        source,
    })?;

    let mut documents = BTreeMap::new();
    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("txt") {
            continue;
        }
        let Some(name) = path.file_name().and_then(|s| s.to_str()) else {
            warn!(path = %path.display(), "Skipping document with non UTF-8 name");
            continue;
        };
        let text = fs::read_to_string(&path).map_err(|source| PipelineError::ReadDocuments {
            path: path.display().to_string(),
            source,
        })?;
        debug!(document = name, chars = text.chars().count(), "Loaded document");
        documents.insert(name.to_string(), text);
    }

    info!(dir = %dir.display(), documents = documents.len(), "Documents loaded");
    Ok(documents)
}

/// Parses `file<TAB>title` lines. A missing file gives an empty mapping.
pub fn load_document_names<P: AsRef<Path>>(path: P) -> Result<HashMap<String, String>, PipelineError> {
    let path = path.as_ref();
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "Document names file not found, titles will be taken from text");
            return Ok(HashMap::new());
        }
        Err(source) => {
            return Err(PipelineError::ReadDocuments {
                path: path.display().to_string(),
                source,
            })
        }
    };
    Ok(parse_document_names(&raw))
}

pub fn parse_document_names(raw: &str) -> HashMap<String, String> {
    raw.lines()
        .filter_map(|line| line.trim().split_once('\t'))
        .map(|(file, title)| (file.trim().to_string(), title.trim().to_string()))
        .filter(|(file, title)| !file.is_empty() && !title.is_empty())
        .collect()
}

/// Human-readable title for a document.
///
/// Order: the names mapping (keyed without `.txt`), then the first early
/// line that looks like a title, then the file name itself.
pub fn extract_document_title(doc_name: &str, text: &str, names: &HashMap<String, String>) -> String {
    let base_name = doc_name.replace(".txt", "");
    if let Some(title) = names.get(&base_name) {
        return title.clone();
    }

    text.split('\n')
        .take(TITLE_SCAN_LINES)
        .map(str::trim)
        .find(|line| {
            line.chars().count() > MIN_TITLE_CHARS
                && !TITLE_SKIP_PREFIXES.iter().any(|prefix| line.starts_with(prefix))
        })
        .map(str::to_string)
        .unwrap_or_else(|| doc_name.replace('_', " ").replace(".txt", ""))
}
