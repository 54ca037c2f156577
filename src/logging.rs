use crate::config::{Config, DEFAULT_LOG_LEVEL};
use std::fs::{self, File, OpenOptions};
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::warn;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::ChronoLocal;
use tracing_subscriber::{fmt, EnvFilter};

/// Level applied to every crate other than this one.
const DEPENDENCY_LEVEL: &str = "warn";

/// Where diagnostics end up. Never stdout, which carries the rendered card
/// when no output file is configured.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File(PathBuf),
}

impl LogTarget {
    /// Picks the log file unless it is blank or would clobber the rendered
    /// output file.
    pub fn for_config(config: &Config) -> Self {
        let log_file = config.log_file.trim();
        if log_file.is_empty() {
            return LogTarget::Stderr;
        }
        let output = config.output.trim();
        if !output.is_empty() && Path::new(output) == Path::new(log_file) {
            return LogTarget::Stderr;
        }
        LogTarget::File(PathBuf::from(log_file))
    }
}

/// Parses the configured level; `None` when it is not a level name.
pub fn card_level(level: &str) -> Option<LevelFilter> {
    let level = level.trim();
    if level.is_empty() {
        return LevelFilter::from_str(DEFAULT_LOG_LEVEL).ok();
    }
    LevelFilter::from_str(level).ok()
}

/// Filter that scopes the configured level to the card's own targets and
/// keeps dependencies at `warn`.
pub fn card_directives(level: LevelFilter) -> String {
    let crate_target = env!("CARGO_PKG_NAME").replace('-', "_");
    format!("{DEPENDENCY_LEVEL},{crate_target}={level}")
}

fn open_log_file(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

/// Installs the global subscriber when logging is enabled. `RUST_LOG`
/// replaces the card directives entirely.
pub fn init(config: &Config) -> Option<WorkerGuard> {
    if !config.log_enabled {
        return None;
    }

    let parsed_level = card_level(&config.log_level);
    let directives = card_directives(parsed_level.unwrap_or(LevelFilter::INFO));
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let mut open_error = None;
    let file = match LogTarget::for_config(config) {
        LogTarget::File(path) => open_log_file(&path)
            .map_err(|err| open_error = Some(format!("{}: {err}", path.display())))
            .ok(),
        LogTarget::Stderr => None,
    };
    let to_stderr = file.is_none();
    let (writer, guard) = match file {
        Some(file) => tracing_appender::non_blocking(file),
        None => tracing_appender::non_blocking(io::stderr()),
    };

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(to_stderr && io::stderr().is_terminal())
        .with_target(true)
        .with_timer(ChronoLocal::new("%Y-%m-%dT%H:%M:%S%.3f".to_string()))
        .compact()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    if parsed_level.is_none() {
        warn!(level = %config.log_level, "unknown log level, using info");
    }
    if let Some(reason) = open_error {
        warn!("cannot open log file {reason}, logging to stderr");
    }
    Some(guard)
}
