//! Monitoring for the chunking pipeline
//!
//! Provides:
//! - Structured logging with tracing
//! - Per-document chunking statistics with a bounded history

pub mod chunking_stats;
pub mod config;
pub mod tracing_config;

pub use chunking_stats::{
    chunking_snapshot_history, latest_chunking_snapshot, record_chunking_snapshot,
    set_chunking_history_capacity, set_chunking_logging_enabled, ChunkingStatsSnapshot,
};
pub use config::{LogFormat, MonitoringConfig};
pub use tracing_config::init_tracing;
