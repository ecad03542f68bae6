use chrono::Utc;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

const DEFAULT_HISTORY_SIZE: usize = 50;
const MIN_HISTORY_SIZE: usize = 1;
const MAX_HISTORY_SIZE: usize = 1000;

static HISTORY_CAPACITY: Lazy<AtomicUsize> = Lazy::new(|| AtomicUsize::new(DEFAULT_HISTORY_SIZE));
static SNAPSHOTS: Lazy<Mutex<VecDeque<ChunkingStatsSnapshot>>> =
    Lazy::new(|| Mutex::new(VecDeque::with_capacity(DEFAULT_HISTORY_SIZE)));
static LOGGING_ENABLED: Lazy<AtomicBool> = Lazy::new(|| AtomicBool::new(true));

/// Outcome of chunking one document.
#[derive(Clone, Serialize, Debug, PartialEq)]
pub struct ChunkingStatsSnapshot {
    pub recorded_at: String,
    pub document: String,
    pub sections: usize,
    pub chunks: usize,
    /// Chunks carrying overlap provenance from a preceding chunk.
    pub overlapped_chunks: usize,
    pub flat_fallback: bool,
    pub total_chars: usize,
    pub longest_chunk_chars: usize,
    pub duration_ms: u64,
}

impl ChunkingStatsSnapshot {
    pub fn new(document: &str, sections: usize, flat_fallback: bool, duration_ms: u64) -> Self {
        Self {
            recorded_at: Utc::now().to_rfc3339(),
            document: document.to_string(),
            sections,
            chunks: 0,
            overlapped_chunks: 0,
            flat_fallback,
            total_chars: 0,
            longest_chunk_chars: 0,
            duration_ms,
        }
    }

    /// Accounts one emitted chunk text.
    pub fn observe_chunk(&mut self, text: &str, overlapped: bool) {
        let chars = text.chars().count();
        self.chunks += 1;
        self.total_chars += chars;
        self.longest_chunk_chars = self.longest_chunk_chars.max(chars);
        if overlapped {
            self.overlapped_chunks += 1;
        }
    }

    pub fn average_chunk_chars(&self) -> Option<f64> {
        if self.chunks == 0 {
            None
        } else {
            Some(self.total_chars as f64 / self.chunks as f64)
        }
    }
}

fn current_capacity() -> usize {
    HISTORY_CAPACITY
        .load(Ordering::Relaxed)
        .clamp(MIN_HISTORY_SIZE, MAX_HISTORY_SIZE)
}

pub fn set_chunking_history_capacity(new_cap: usize) -> usize {
    let bounded = new_cap.clamp(MIN_HISTORY_SIZE, MAX_HISTORY_SIZE);
    HISTORY_CAPACITY.store(bounded, Ordering::Relaxed);
    bounded
}

pub fn set_chunking_logging_enabled(enabled: bool) {
    LOGGING_ENABLED.store(enabled, Ordering::Relaxed);
}

pub fn record_chunking_snapshot(snapshot: ChunkingStatsSnapshot) {
    if LOGGING_ENABLED.load(Ordering::Relaxed) {
        tracing::info!(
            target: "chunking_snapshot",
            document = %snapshot.document,
            sections = snapshot.sections,
            chunks = snapshot.chunks,
            flat_fallback = snapshot.flat_fallback,
            duration_ms = snapshot.duration_ms,
            "Document chunked"
        );
    }

    if let Ok(mut guard) = SNAPSHOTS.lock() {
        let cap = current_capacity();
        while guard.len() >= cap {
            guard.pop_front();
        }
        guard.push_back(snapshot);
    }
}

pub fn latest_chunking_snapshot() -> Option<ChunkingStatsSnapshot> {
    SNAPSHOTS
        .lock()
        .ok()
        .and_then(|guard| guard.back().cloned())
}

/// Most recent snapshots first, at most `limit` of them.
pub fn chunking_snapshot_history(limit: usize) -> Vec<ChunkingStatsSnapshot> {
    let limit = limit
        .clamp(MIN_HISTORY_SIZE, MAX_HISTORY_SIZE)
        .min(current_capacity());
    SNAPSHOTS
        .lock()
        .map(|guard| guard.iter().rev().take(limit).cloned().collect())
        .unwrap_or_default()
}
