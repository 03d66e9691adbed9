//! Structured telemetry initialisation for embedding applications.
//!
//! The engine only emits `tracing` events, each under a per-module target
//! such as `fints_jobs::version` or `fints_jobs::tan`. Applications that do
//! not bring their own subscriber call [`initialise`] with their
//! [`EngineConfig`]; those that do can still validate the configured filter
//! through [`engine_filter`].

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

use crate::engine::EngineConfig;

/// Format of the subscriber installed by [`initialise`], once there is one.
static TELEMETRY_GUARD: OnceCell<LogFormat> = OnceCell::new();

/// Supported logging output formats.
#[derive(
    Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Human-readable single line output.
    Compact,
}

/// Errors encountered while parsing a [`LogFormat`] from text.
pub type LogFormatParseError = strum::ParseError;

/// Records which logging setup serves the engine's `tracing` events.
///
/// Every handle reports the format chosen by the call that installed the
/// subscriber, so an application can tell when a later configuration was
/// ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TelemetryHandle {
    format: LogFormat,
}

impl TelemetryHandle {
    /// Returns the output format of the installed subscriber.
    #[must_use]
    pub const fn format(self) -> LogFormat {
        self.format
    }
}

/// Errors encountered while configuring telemetry.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// The configured `log_filter` is not a valid filter directive list.
    #[error("invalid log filter '{filter}': {message}")]
    Filter {
        /// Directive list as configured.
        filter: String,
        /// Parser diagnostic.
        message: String,
    },
    /// The embedding application already installed its own subscriber.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Parses the configured filter without touching global state.
///
/// Applications that bring their own subscriber can use this to validate an
/// [`EngineConfig`] up front and reuse the resulting filter.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the directives do not parse.
pub fn engine_filter(config: &EngineConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_new(config.log_filter()).map_err(|error| TelemetryError::Filter {
        filter: config.log_filter().to_owned(),
        message: error.to_string(),
    })
}

/// Routes the job engine's `tracing` events to stderr.
///
/// Only the first successful call installs a subscriber. Later calls leave
/// global state alone and return a handle describing the subscriber that
/// is already in place, even when they pass a different configuration. A
/// call whose filter fails to parse installs nothing, so a corrected
/// configuration can be retried.
///
/// # Examples
///
/// ```no_run
/// use fints_config::{EngineConfig, LogFormat, telemetry};
///
/// let config = EngineConfig::default()
///     .with_log_filter("fints_jobs::tan=debug,info")
///     .with_log_format(LogFormat::Compact);
/// let handle = telemetry::initialise(&config)?;
/// assert_eq!(handle.format(), LogFormat::Compact);
/// # Ok::<(), telemetry::TelemetryError>(())
/// ```
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the configured filter does not
/// parse, or [`TelemetryError::Subscriber`] when the application installed
/// another global subscriber first.
pub fn initialise(config: &EngineConfig) -> Result<TelemetryHandle, TelemetryError> {
    TELEMETRY_GUARD
        .get_or_try_init(|| install_subscriber(config))
        .map(|format| TelemetryHandle { format: *format })
}

fn install_subscriber(config: &EngineConfig) -> Result<LogFormat, TelemetryError> {
    let filter = engine_filter(config)?;
    let base = fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .with_ansi(io::stderr().is_terminal())
        .with_timer(fmt::time::UtcTime::rfc_3339());

    let format = config.log_format();
    let subscriber: Box<dyn Subscriber + Send + Sync> = match format {
        LogFormat::Json => Box::new(base.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(base.compact().finish()),
    };
    tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
    Ok(format)
}
