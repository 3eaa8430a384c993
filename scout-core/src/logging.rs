//! File logging for scout
//!
//! Searches log to daily files (`scout.YYYY-MM-DD.log`) in the XDG state
//! directory. HTTP client internals are capped at `warn` so a debug log shows
//! the search flow rather than connection chatter, unless `RUST_LOG` says
//! otherwise.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};

const FILE_PREFIX: &str = "scout";
const FILE_SUFFIX: &str = "log";

/// Crates whose debug output drowns the search flow
const QUIET_TARGETS: [&str; 5] = ["hyper", "hyper_util", "h2", "reqwest", "rustls"];

/// Start logging to the state directory.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard> {
    init_in(&Config::state_dir(), config)
}

/// Start logging to `log_dir`, keeping at most `max_files` daily files.
fn init_in(log_dir: &Path, config: &LoggingConfig) -> Result<LoggingGuard> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(FILE_PREFIX)
        .filename_suffix(FILE_SUFFIX)
        .max_log_files(config.max_files.max(1))
        .build(log_dir)
        .map_err(|e| Error::Config(format!("failed to create log file appender: {e}")))?;
    let (non_blocking, worker) = tracing_appender::non_blocking(file_appender);

    let (level, recognized) = base_level(&config.level);
    let filter = match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => search_filter(level),
    };

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .try_init()
        .map_err(|e| Error::Config(format!("failed to install log subscriber: {e}")))?;

    if !recognized {
        tracing::warn!(level = %config.level, "Unknown logging.level, using info");
    }
    tracing::info!(log_dir = %log_dir.display(), level = %level, "Logging initialized");

    Ok(LoggingGuard {
        log_dir: log_dir.to_path_buf(),
        _worker: worker,
    })
}

/// Parse `logging.level`; unknown values fall back to info.
fn base_level(level: &str) -> (LevelFilter, bool) {
    match LevelFilter::from_str(level.trim()) {
        Ok(level) => (level, true),
        Err(_) => (LevelFilter::INFO, false),
    }
}

fn search_filter(level: LevelFilter) -> EnvFilter {
    let mut filter = EnvFilter::default().add_directive(level.into());
    for target in QUIET_TARGETS {
        if let Ok(directive) = format!("{target}=warn").parse() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

/// Initialize logging for tests (logs to stdout)
pub fn init_test() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .with_span_events(FmtSpan::CLOSE)
        .try_init();
}

/// Keeps the background writer alive; pending lines are flushed on drop.
pub struct LoggingGuard {
    log_dir: PathBuf,
    _worker: tracing_appender::non_blocking::WorkerGuard,
}

impl LoggingGuard {
    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }
}

/// Scout log files in `dir`, newest first.
pub fn log_files(dir: &Path) -> Vec<PathBuf> {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| is_log_file(path))
        .collect();
    // Daily suffixes are ISO dates, so name order is age order
    files.sort_unstable_by(|a, b| b.cmp(a));
    files
}

/// Most recent log file in the state directory, if logging ever ran.
pub fn latest_log_file() -> Option<PathBuf> {
    log_files(&Config::state_dir()).into_iter().next()
}

fn is_log_file(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| {
            name.starts_with(&format!("{FILE_PREFIX}."))
                && name.ends_with(&format!(".{FILE_SUFFIX}"))
        })
}
