use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use clap::ValueEnum;
use tracing::level_filters::LevelFilter;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::EnvFilter;

/// Overrides the filter computed from `--log-level` when set.
pub const FILTER_ENV: &str = "DUNGEON_LOG_FILTER";

/// Crates whose verbosity follows `--log-level` beyond `info`.
const OWN_CRATES: [&str; 3] = ["dungeon_client", "dungeon_sync", "dungeon_sdk"];

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Error,
    #[default]
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

/// Where log lines go. The play REPL owns stdout, so logs never go there.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum LogSink {
    #[default]
    Stderr,
    File(PathBuf),
}

#[derive(Clone, Debug, Default)]
pub struct LogConfig {
    pub level: LogLevel,
    pub sink: LogSink,
}

#[derive(thiserror::Error, Debug)]
pub enum TelemetryError {
    #[error("cannot open log file {}: {source}", path.display())]
    OpenLogFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("a global tracing subscriber is already installed")]
    SubscriberTaken,
}

static WRITER_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Installs the process-wide subscriber once. Later calls return `Ok`
/// without touching the first configuration.
pub fn init(config: &LogConfig) -> Result<(), TelemetryError> {
    if WRITER_GUARD.get().is_some() {
        return Ok(());
    }

    let (writer, guard): (NonBlocking, WorkerGuard) = match &config.sink {
        LogSink::Stderr => tracing_appender::non_blocking(io::stderr()),
        LogSink::File(path) => tracing_appender::non_blocking(open_log_file(path)?),
    };
    let to_file = matches!(config.sink, LogSink::File(_));

    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter_for(config.level))
        .with_target(to_file || config.level >= LogLevel::Debug)
        .with_ansi(!to_file)
        .with_writer(writer)
        .try_init()
        .map_err(|_| TelemetryError::SubscriberTaken)?;

    let _ = WRITER_GUARD.set(guard);
    Ok(())
}

/// Opens `path` for appending, creating missing parent directories.
fn open_log_file(path: &Path) -> Result<File, TelemetryError> {
    let open = || -> io::Result<File> {
        if let Some(parent) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    };
    open().map_err(|source| TelemetryError::OpenLogFile {
        path: path.to_path_buf(),
        source,
    })
}

fn filter_for(level: LogLevel) -> EnvFilter {
    match std::env::var(FILTER_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::new(directives),
        _ => EnvFilter::new(default_directives(level)),
    }
}

/// Quiet levels apply everywhere. Verbose levels raise only our crates and
/// leave HTTP plumbing at `info`.
fn default_directives(level: LogLevel) -> String {
    let filter = LevelFilter::from(level).to_string().to_ascii_lowercase();
    if level < LogLevel::Debug {
        return filter;
    }
    let mut directives = vec!["info".to_string()];
    directives.extend(OWN_CRATES.iter().map(|krate| format!("{krate}={filter}")));
    directives.join(",")
}
