//! Process-wide logging for the server and CLI.
//!
//! # Responsibility
//! - Start the rolling file logger once per process.
//! - Mirror warnings and errors to stderr.
//! - Turn panics into a single `event=panic_captured` line.
//!
//! # Invariants
//! - Calling [`init_logging`] again with the same settings is a no-op;
//!   different settings are refused with [`LoggingError::Conflict`].
//! - Initialization never panics.
//! - Log lines carry ids, counts and statuses; never passwords, hashes or
//!   entry content.

use flexi_logger::{
    Cleanup, Criterion, Duplicate, FileSpec, Logger, LoggerHandle, Naming, WriteMode,
};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::panic::PanicHookInfo;
use std::path::{Path, PathBuf};
use std::sync::Once;

const FILE_BASENAME: &str = "tasknotes";
const ROTATE_AT_BYTES: u64 = 10 * 1024 * 1024;
const KEEP_FILES: usize = 5;
const PANIC_PAYLOAD_LIMIT: usize = 160;

static ACTIVE: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: Once = Once::new();

/// Validated `init_logging` arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
struct LogSettings {
    level: &'static str,
    dir: PathBuf,
}

impl LogSettings {
    fn parse(level: &str, dir: &str) -> Result<Self, LoggingError> {
        let level = match level.trim().to_ascii_lowercase().as_str() {
            "trace" => "trace",
            "debug" => "debug",
            "info" => "info",
            "warn" | "warning" => "warn",
            "error" => "error",
            other => return Err(LoggingError::UnsupportedLevel(other.to_string())),
        };

        let dir = dir.trim();
        if dir.is_empty() {
            return Err(LoggingError::InvalidDirectory(
                "log directory is blank".to_string(),
            ));
        }
        if !Path::new(dir).is_absolute() {
            return Err(LoggingError::InvalidDirectory(format!(
                "log directory `{dir}` is not absolute"
            )));
        }
        Ok(Self {
            level,
            dir: PathBuf::from(dir),
        })
    }
}

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnsupportedLevel(String),
    /// Blank or relative directory.
    InvalidDirectory(String),
    /// Already running with other settings.
    Conflict(String),
    /// Directory creation or logger start failed.
    Backend(String),
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedLevel(level) => {
                write!(f, "unknown log level `{level}` (use trace, debug, info, warn or error)")
            }
            Self::InvalidDirectory(message) => write!(f, "{message}"),
            Self::Conflict(message) => write!(f, "logging already configured: {message}"),
            Self::Backend(message) => write!(f, "logger backend: {message}"),
        }
    }
}

impl Error for LoggingError {}

/// Starts file logging at `level` into the absolute directory `log_dir`.
pub fn init_logging(level: &str, log_dir: &str) -> Result<(), LoggingError> {
    let wanted = LogSettings::parse(level, log_dir)?;
    let active = ACTIVE.get_or_try_init(|| start(wanted.clone()))?;
    if active.settings == wanted {
        return Ok(());
    }
    Err(LoggingError::Conflict(format!(
        "running with level={} dir={}, asked for level={} dir={}",
        active.settings.level,
        active.settings.dir.display(),
        wanted.level,
        wanted.dir.display()
    )))
}

fn start(settings: LogSettings) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&settings.dir).map_err(|err| {
        LoggingError::Backend(format!("cannot create `{}`: {err}", settings.dir.display()))
    })?;

    let handle = Logger::try_with_str(settings.level)
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(
            FileSpec::default()
                .directory(&settings.dir)
                .basename(FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(ROTATE_AT_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(KEEP_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .duplicate_to_stderr(Duplicate::Warn)
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    PANIC_HOOK.call_once(install_panic_hook);
    info!(
        "event=logging_init module=logging status=ok level={} log_dir={} version={} debug_build={}",
        settings.level,
        settings.dir.display(),
        env!("CARGO_PKG_VERSION"),
        cfg!(debug_assertions)
    );

    Ok(ActiveLogger {
        settings,
        _handle: handle,
    })
}

/// Level and directory in use, or `None` before [`init_logging`] succeeded.
pub fn logging_status() -> Option<(&'static str, PathBuf)> {
    ACTIVE
        .get()
        .map(|active| (active.settings.level, active.settings.dir.clone()))
}

/// Level used when configuration does not name one.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(|| "unknown".to_string(), |at| format!("{}:{}", at.file(), at.line()));
        error!(
            "event=panic_captured module=logging status=error location={location} payload={}",
            one_line(&payload_text(info), PANIC_PAYLOAD_LIMIT)
        );
        previous(info);
    }));
}

fn payload_text(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    payload
        .downcast_ref::<&str>()
        .map(|text| (*text).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "<non-string payload>".to_string())
}

/// Collapses line breaks and caps `text` at `limit` characters.
fn one_line(text: &str, limit: usize) -> String {
    let mut flat: String = text
        .chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .take(limit)
        .collect();
    if text.chars().count() > limit {
        flat.push('…');
    }
    flat
}

#[cfg(test)]
mod tests {
    use super::{init_logging, logging_status, one_line, LogSettings, LoggingError};

    #[test]
    fn settings_accept_known_levels_only() {
        assert_eq!(LogSettings::parse(" WARNING ", "/tmp/x").unwrap().level, "warn");
        assert_eq!(
            LogSettings::parse("loud", "/tmp/x"),
            Err(LoggingError::UnsupportedLevel("loud".to_string()))
        );
    }

    #[test]
    fn settings_require_absolute_directory() {
        assert!(matches!(
            LogSettings::parse("info", "var/log"),
            Err(LoggingError::InvalidDirectory(message)) if message.contains("not absolute")
        ));
        assert!(matches!(
            LogSettings::parse("info", "  "),
            Err(LoggingError::InvalidDirectory(_))
        ));
    }

    #[test]
    fn one_line_flattens_and_caps() {
        assert_eq!(one_line("a\nb\rc", 10), "a b c");
        assert_eq!(one_line("abcdef", 3), "abc…");
    }

    #[test]
    fn repeated_init_is_idempotent_and_conflicts_are_refused() {
        let first = tempfile::tempdir().unwrap();
        let other = tempfile::tempdir().unwrap();
        let dir = first.path().join("logs");
        let dir_str = dir.to_str().unwrap();

        init_logging("info", dir_str).unwrap();
        init_logging("INFO", dir_str).unwrap();

        assert!(matches!(
            init_logging("debug", dir_str),
            Err(LoggingError::Conflict(_))
        ));
        assert!(matches!(
            init_logging("info", other.path().to_str().unwrap()),
            Err(LoggingError::Conflict(_))
        ));

        assert_eq!(logging_status(), Some(("info", dir)));
    }
}
