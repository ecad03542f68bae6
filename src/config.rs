// src/config.rs
use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Default chunk budget in characters of section content.
pub const DEFAULT_BASE_CHUNK_SIZE: usize = 1250;
/// Upper bound for the adaptive overlap carried between chunks.
pub const DEFAULT_MAX_OVERLAP: usize = 200;
/// Share of the remaining content used as overlap, before the cap applies.
pub const DEFAULT_OVERLAP_RATIO: f64 = 0.15;
pub const DEFAULT_MAX_TITLE_CHARS: usize = 200;
pub const DEFAULT_MAX_TITLE_PERIODS: usize = 1;
pub const DEFAULT_KEYWORD_LIMIT: usize = 5;
pub const DEFAULT_KEYWORD_MIN_CHARS: usize = 4;
pub const DEFAULT_FLAT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_FLAT_OVERLAP: usize = 200;

static CONFIG_KEYS: ChunkConfigKeys = ChunkConfigKeys {
    base_size: "CHUNK_BASE_SIZE",
    max_overlap: "CHUNK_MAX_OVERLAP",
    overlap_ratio: "CHUNK_OVERLAP_RATIO",
    max_title_chars: "HEADING_MAX_TITLE_CHARS",
    max_title_periods: "HEADING_MAX_PERIODS",
    keyword_limit: "KEYWORD_LIMIT",
    keyword_min_chars: "KEYWORD_MIN_CHARS",
    flat_size: "FLAT_CHUNK_SIZE",
    flat_overlap: "FLAT_CHUNK_OVERLAP",
    flat_fallback: "FLAT_FALLBACK",
    parallel: "CHUNK_PARALLEL",
};

struct ChunkConfigKeys {
    base_size: &'static str,
    max_overlap: &'static str,
    overlap_ratio: &'static str,
    max_title_chars: &'static str,
    max_title_periods: &'static str,
    keyword_limit: &'static str,
    keyword_min_chars: &'static str,
    flat_size: &'static str,
    flat_overlap: &'static str,
    flat_fallback: &'static str,
    parallel: &'static str,
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("inconsistent chunking settings: {0}")]
    Inconsistent(String),
}

type Result<T> = std::result::Result<T, ConfigError>;

/// Tunables for section parsing, keyword extraction and chunk sizing.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkingConfig {
    pub base_chunk_size: usize,
    pub max_overlap: usize,
    pub overlap_ratio: f64,
    /// Heading titles must be strictly shorter than this (in characters).
    pub max_title_chars: usize,
    pub max_title_periods: usize,
    pub keyword_limit: usize,
    pub keyword_min_chars: usize,
    pub flat_chunk_size: usize,
    pub flat_overlap: usize,
    /// Chunk documents without numbered headings with the flat chunker.
    pub flat_fallback: bool,
    /// Fan documents out across the rayon pool.
    pub parallel: bool,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            base_chunk_size: DEFAULT_BASE_CHUNK_SIZE,
            max_overlap: DEFAULT_MAX_OVERLAP,
            overlap_ratio: DEFAULT_OVERLAP_RATIO,
            max_title_chars: DEFAULT_MAX_TITLE_CHARS,
            max_title_periods: DEFAULT_MAX_TITLE_PERIODS,
            keyword_limit: DEFAULT_KEYWORD_LIMIT,
            keyword_min_chars: DEFAULT_KEYWORD_MIN_CHARS,
            flat_chunk_size: DEFAULT_FLAT_CHUNK_SIZE,
            flat_overlap: DEFAULT_FLAT_OVERLAP,
            flat_fallback: true,
            parallel: true,
        }
    }
}

impl ChunkingConfig {
    /// Defaults overridden by environment variables (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ChunkingConfig::from_env`] but reads values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        let keys = &CONFIG_KEYS;

        if let Some(v) = read(&lookup, keys.base_size)? {
            cfg.base_chunk_size = v;
        }
        if let Some(v) = read(&lookup, keys.max_overlap)? {
            cfg.max_overlap = v;
        }
        if let Some(v) = read(&lookup, keys.overlap_ratio)? {
            cfg.overlap_ratio = v;
        }
        if let Some(v) = read(&lookup, keys.max_title_chars)? {
            cfg.max_title_chars = v;
        }
        if let Some(v) = read(&lookup, keys.max_title_periods)? {
            cfg.max_title_periods = v;
        }
        if let Some(v) = read(&lookup, keys.keyword_limit)? {
            cfg.keyword_limit = v;
        }
        if let Some(v) = read(&lookup, keys.keyword_min_chars)? {
            cfg.keyword_min_chars = v;
        }
        if let Some(v) = read(&lookup, keys.flat_size)? {
            cfg.flat_chunk_size = v;
        }
        if let Some(v) = read(&lookup, keys.flat_overlap)? {
            cfg.flat_overlap = v;
        }
        if let Some(v) = read_flag(&lookup, keys.flat_fallback)? {
            cfg.flat_fallback = v;
        }
        if let Some(v) = read_flag(&lookup, keys.parallel)? {
            cfg.parallel = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Checks the settings the chunkers rely on for forward progress.
    pub fn validate(&self) -> Result<()> {
        if self.base_chunk_size == 0 {
            return Err(ConfigError::Inconsistent(
                "base chunk size must be positive".to_string(),
            ));
        }
        if self.max_overlap >= self.base_chunk_size {
            return Err(ConfigError::Inconsistent(format!(
                "max overlap {} must be smaller than base chunk size {}",
                self.max_overlap, self.base_chunk_size
            )));
        }
        if !(0.0..1.0).contains(&self.overlap_ratio) {
            return Err(ConfigError::Inconsistent(format!(
                "overlap ratio {} must be within [0, 1)",
                self.overlap_ratio
            )));
        }
        if self.flat_overlap >= self.flat_chunk_size {
            return Err(ConfigError::Inconsistent(format!(
                "flat overlap {} must be smaller than flat chunk size {}",
                self.flat_overlap, self.flat_chunk_size
            )));
        }
        Ok(())
    }
}

/// Locations used by the batch driver.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub documents_dir: PathBuf,
    pub progress_file: PathBuf,
    pub document_names_file: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("documents/txts"),
            progress_file: PathBuf::from("progress_metadata_hierarchical.json"),
            document_names_file: PathBuf::from("Names_of_ documents.txt"),
        }
    }
}

impl PipelineConfig {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let mut config = Self::default();
        if let Ok(dir) = env::var("DOCUMENTS_DIR") {
            config.documents_dir = PathBuf::from(dir);
        }
        if let Ok(file) = env::var("PROGRESS_FILE") {
            config.progress_file = PathBuf::from(file);
        }
        if let Ok(file) = env::var("DOCUMENT_NAMES_FILE") {
            config.document_names_file = PathBuf::from(file);
        }
        config
    }
}

fn read<F, T>(lookup: &F, key: &str) -> Result<Option<T>>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(key)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: format!("{}", e),
                })
        })
        .transpose()
}

fn read_flag<F>(lookup: &F, key: &str) -> Result<Option<bool>>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|raw| match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(ConfigError::InvalidValue {
                key: key.to_string(),
                message: format!("expected a boolean, got '{}'", other),
            }),
        })
        .transpose()
}
