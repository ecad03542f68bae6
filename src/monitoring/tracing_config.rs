//! Structured logging with tracing
//!
//! Sets up:
//! - Console logging on stderr, text or JSON
//! - Optional file logging with daily rotation (always JSON)
//! - Level filtering from RUST_LOG

use super::config::{LogFormat, MonitoringConfig};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::daily;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const LOG_FILE_PREFIX: &str = "hierchunk.log";

/// Initialize the global tracing subscriber.
///
/// Returns the file writer guard when file logging is on; dropping it stops
/// the background writer, so keep it alive for the duration of the program.
/// A second call is a no-op.
pub fn init_tracing(config: &MonitoringConfig) -> std::io::Result<Option<WorkerGuard>> {
    if !config.enabled {
        return Ok(None);
    }

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let console_layer = config.enable_console_logging.then(|| {
        let layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true);
        match config.log_format {
            LogFormat::Json => layer.json().boxed(),
            LogFormat::Text => layer.boxed(),
        }
    });

    let (file_layer, guard) = if config.enable_file_logging {
        config.ensure_log_dir()?;
        let file_appender = daily(&config.log_dir, LOG_FILE_PREFIX);
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
        let layer = fmt::layer()
            .with_writer(non_blocking_file)
            .with_ansi(false)
            .json()
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    Ok(guard)
}
