pub use tracing::{debug, error, info, instrument, trace, warn};

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt::{self, format::FmtSpan}};

use crate::image_pipeline::{LoggingConfig, PipelineError, Result};

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Returns the log file path when a log directory is configured.
pub fn init(config: &LoggingConfig) -> Result<Option<PathBuf>> {
    let default_level = if config.debug_mode { "debug" } else { config.level.as_str() };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_level))
        .map_err(|e| PipelineError::ConfigError(format!("log level {:?}: {}", default_level, e)))?;

    let filter = env_filter.to_string();
    let is_debug = filter.contains("debug") || filter.contains("trace");
    let span_events = if is_debug { FmtSpan::CLOSE } else { FmtSpan::NONE };

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(span_events.clone());

    let (file_layer, log_path) = match &config.log_dir {
        Some(dir) => {
            let path = next_log_file(dir)?;
            let file = File::create(&path)
                .map_err(|e| PipelineError::OutputWriteError(format!("{}: {}", path.display(), e)))?;
            let layer = fmt::layer()
                .with_ansi(false)
                .with_target(false)
                .with_writer(Mutex::new(file))
                .with_span_events(span_events);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| PipelineError::ConfigError(format!("logger already installed: {}", e)))?;

    Ok(log_path)
}

/// `dir/logfile_<N>.log`, N being one more than the entries already in `dir`.
pub fn next_log_file(dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .map_err(|e| PipelineError::OutputWriteError(format!("{}: {}", dir.display(), e)))?;
    let existing = fs::read_dir(dir)?.count();
    Ok(dir.join(format!("logfile_{}.log", existing + 1)))
}
