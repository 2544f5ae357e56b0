//! Program logging, built on `fern`.
//!
//! Messages go to the console (coloured when attached to a terminal) and, for model runs, to log
//! files in the output folder. Warnings and errors are kept apart from ordinary progress messages
//! in both places.
use anyhow::{Context, Result};
use chrono::Local;
use fern::colors::{Color, ColoredLevelConfig};
use fern::{Dispatch, FormatCallback};
use log::{LevelFilter, Metadata, Record};
use std::env;
use std::fmt::{Arguments, Display};
use std::fs::File;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::OnceLock;

/// Set once the logger has been installed
static LOGGER_INIT: OnceLock<()> = OnceLock::new();

/// Environment variable which overrides the log level from the settings file
const LOG_LEVEL_ENV_VAR: &str = "GENCAP_LOG_LEVEL";

/// The log level used when neither the environment nor the settings file specify one
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Log file for progress messages from a run
const LOG_INFO_FILE_NAME: &str = "gencap_info.log";

/// Log file for warnings and errors from a run
const LOG_ERROR_FILE_NAME: &str = "gencap_error.log";

/// Whether the program logger has been initialised
pub fn is_logger_initialised() -> bool {
    LOGGER_INIT.get().is_some()
}

/// Initialise the program logger.
///
/// The log level is taken from the `GENCAP_LOG_LEVEL` environment variable if set, otherwise from
/// `settings.toml`, otherwise [`DEFAULT_LOG_LEVEL`]. Valid levels are `off`, `error`, `warn`,
/// `info`, `debug` and `trace` (case-insensitive).
///
/// # Arguments
///
/// * `log_level_from_settings`: The log level specified in `settings.toml`
/// * `log_file_path`: Folder in which to create log files, if any
pub fn init(log_level_from_settings: Option<&str>, log_file_path: Option<&Path>) -> Result<()> {
    let env_level = env::var(LOG_LEVEL_ENV_VAR).ok();
    let level = resolve_log_level(env_level.as_deref(), log_level_from_settings)?;

    let mut dispatch = Dispatch::new()
        .chain(console_dispatch(level, Stream::Stdout))
        .chain(console_dispatch(level, Stream::Stderr));
    if let Some(log_file_path) = log_file_path {
        dispatch = dispatch.chain(file_dispatch(level, log_file_path)?);
    }

    dispatch.apply().context("Failed to initialise logging.")?;

    // Can only fail if already set, which `apply` has ruled out
    LOGGER_INIT.set(()).ok();

    Ok(())
}

/// Pick the log level, giving the environment precedence over settings
fn resolve_log_level(from_env: Option<&str>, from_settings: Option<&str>) -> Result<LevelFilter> {
    let level = from_env.or(from_settings).unwrap_or(DEFAULT_LOG_LEVEL);
    level
        .parse()
        .ok()
        .with_context(|| format!("Unknown log level: {level}"))
}

/// A console output stream
#[derive(Clone, Copy)]
enum Stream {
    /// Progress messages (info and below)
    Stdout,
    /// Warnings and errors
    Stderr,
}

/// Whether a record counts as a warning or error
fn is_problem(metadata: &Metadata) -> bool {
    metadata.level() <= LevelFilter::Warn
}

/// Console output for one stream, coloured if the stream is a terminal
fn console_dispatch(level: LevelFilter, stream: Stream) -> Dispatch {
    let colours = ColoredLevelConfig::new()
        .error(Color::Red)
        .warn(Color::Yellow)
        .info(Color::Green)
        .debug(Color::Blue)
        .trace(Color::Magenta);

    let (dispatch, use_colour) = match stream {
        Stream::Stdout => (
            Dispatch::new()
                .filter(|metadata| !is_problem(metadata))
                .level(level)
                .chain(std::io::stdout()),
            std::io::stdout().is_terminal(),
        ),
        Stream::Stderr => (
            Dispatch::new()
                .level(level.min(LevelFilter::Warn))
                .chain(std::io::stderr()),
            std::io::stderr().is_terminal(),
        ),
    };

    dispatch.format(move |out, message, record| {
        if use_colour {
            write_log(out, colours.color(record.level()), record, message);
        } else {
            write_log(out, record.level(), record, message);
        }
    })
}

/// Plain-text log files in `log_file_path`.
///
/// Progress is always recorded at info level or more verbose, even if the console is quieter.
fn file_dispatch(level: LevelFilter, log_file_path: &Path) -> Result<Dispatch> {
    let create = |file_name: &str| {
        let file_path = log_file_path.join(file_name);
        File::create(&file_path)
            .with_context(|| format!("Could not create log file {}", file_path.display()))
    };

    let info_file = Dispatch::new()
        .filter(|metadata| !is_problem(metadata))
        .level(level.max(LevelFilter::Info))
        .chain(create(LOG_INFO_FILE_NAME)?);
    let error_file = Dispatch::new()
        .level(LevelFilter::Warn)
        .chain(create(LOG_ERROR_FILE_NAME)?);

    Ok(Dispatch::new()
        .format(|out, message, record| write_log(out, record.level(), record, message))
        .chain(info_file)
        .chain(error_file))
}

/// Format a log line as `[time level target] message`
fn write_log<T: Display>(out: FormatCallback, level: T, record: &Record, message: &Arguments) {
    let timestamp = Local::now().format("%H:%M:%S");
    let target = record.target();

    out.finish(format_args!("[{timestamp} {level} {target}] {message}"));
}
