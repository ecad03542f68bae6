// hierchunk/src/main.rs
use clap::{Parser, Subcommand};
use hierchunk::chunking::hierarchical_chunk_documents;
use hierchunk::config::{ChunkingConfig, PipelineConfig};
use hierchunk::monitoring::{init_tracing, set_chunking_logging_enabled, MonitoringConfig};
use hierchunk::pipeline::{
    backfill_document_titles, drop_processed_documents, enrich_documents, load_document_names,
    load_documents, repair_store_file, ChunkStore, IntegrityReport, PipelineError, StructuralEnricher,
};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "hierchunk", about = "Hierarchical chunking of numbered documents")]
struct Cli {
    /// Do not log a line per chunked document
    #[arg(long, global = true)]
    quiet_stats: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Chunk all .txt documents and record them in the progress file
    Chunk {
        #[arg(long)]
        dir: Option<PathBuf>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Prepend cut-off sentence starts to chunks that continue a sentence
    Repair {
        #[arg(long)]
        file: Option<PathBuf>,
    },
    /// Refresh document titles from the names mapping
    Titles {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        names: Option<PathBuf>,
    },
    /// Print chunk counts per document as JSON
    Check {
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let _log_guard = match init_tracing(&MonitoringConfig::from_env()) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("failed to initialize logging: {}", e);
            None
        }
    };
    set_chunking_logging_enabled(!cli.quiet_stats);

    match run(cli.command, PipelineConfig::from_env()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "Command failed");
            ExitCode::FAILURE
        }
    }
}

fn run(command: Command, paths: PipelineConfig) -> Result<(), PipelineError> {
    match command {
        Command::Chunk { dir, out } => {
            let config = ChunkingConfig::from_env()?;
            let dir = dir.unwrap_or(paths.documents_dir);
            let out = out.unwrap_or(paths.progress_file);

            let mut store = ChunkStore::load_or_default(&out)?;
            let mut documents = load_documents(&dir)?;
            drop_processed_documents(&mut documents, &store);

            let chunked = hierarchical_chunk_documents(&documents, &config);
            let names = load_document_names(&paths.document_names_file)?;

            let summary = enrich_documents(
                &chunked,
                &names,
                &StructuralEnricher,
                &mut store,
                Some(out.as_path()),
            )?;
            info!(
                processed = summary.processed.len(),
                chunks = summary.chunks,
                "Chunking finished"
            );
        }
        Command::Repair { file } => {
            let file = file.unwrap_or(paths.progress_file);
            let report = repair_store_file(&file)?;
            info!(repairs = report.len(), "Overlap repair finished");
        }
        Command::Titles { file, names } => {
            let file = file.unwrap_or(paths.progress_file);
            let names = load_document_names(names.unwrap_or(paths.document_names_file))?;
            let mut store = ChunkStore::load(&file)?;
            if backfill_document_titles(&mut store, &names) {
                store.save(&file)?;
                info!("Document titles updated");
            } else {
                info!("Document titles already up to date");
            }
        }
        Command::Check { file } => {
            let file = file.unwrap_or(paths.progress_file);
            let store = ChunkStore::load(&file)?;
            let report = IntegrityReport::from_store(&store);
            let json = serde_json::to_string_pretty(&report)
                .map_err(|e| PipelineError::Store(e.into()))?;
            println!("{}", json);
        }
    }
    Ok(())
}
