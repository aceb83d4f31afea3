//! Log output for the `stackfx` command.
//!
//! Diagnostics always go to stderr so stdout carries only catalogue output
//! and `--json` listings stay machine-readable. The subscriber is installed
//! once per process: the first [`initialise`] call wins and later calls, such
//! as repeated `run` invocations inside one test binary, keep it as is.

use std::io::{self, IsTerminal};

use once_cell::sync::OnceCell;
use tracing::{Subscriber, subscriber::SetGlobalDefaultError};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::fmt::{self, SubscriberBuilder};

use stackfx_config::{Config, LogFormat};

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Errors encountered while configuring log output.
#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// `log_filter` is not a valid `tracing` filter expression.
    #[error("invalid log filter: {0}")]
    Filter(String),
    /// Another global subscriber was installed outside this module.
    #[error("failed to install telemetry subscriber: {0}")]
    Subscriber(SetGlobalDefaultError),
}

/// Installs the stderr subscriber described by `config`.
///
/// Returns `true` when this call installed the subscriber and `false` when an
/// earlier call already had; in that case `config` is ignored.
///
/// # Errors
///
/// Returns [`TelemetryError::Filter`] when the log filter does not parse and
/// [`TelemetryError::Subscriber`] when a foreign subscriber is already the
/// global default.
pub fn initialise(config: &Config) -> Result<bool, TelemetryError> {
    let mut installed_now = false;
    INSTALLED.get_or_try_init(|| {
        let subscriber = subscriber_for(config)?;
        tracing::subscriber::set_global_default(subscriber).map_err(TelemetryError::Subscriber)?;
        installed_now = true;
        Ok::<(), TelemetryError>(())
    })?;
    Ok(installed_now)
}

/// Builds the subscriber for `config` without installing it.
pub(crate) fn subscriber_for(
    config: &Config,
) -> Result<Box<dyn Subscriber + Send + Sync>, TelemetryError> {
    let filter = EnvFilter::try_new(config.log_filter())
        .map_err(|error| TelemetryError::Filter(error.to_string()))?;
    let builder = stderr_builder(filter);
    let subscriber: Box<dyn Subscriber + Send + Sync> = match config.log_format() {
        LogFormat::Json => Box::new(builder.json().flatten_event(true).finish()),
        LogFormat::Compact => Box::new(builder.compact().finish()),
    };
    Ok(subscriber)
}

type StderrBuilder = SubscriberBuilder<DefaultFields, Format, EnvFilter, fn() -> io::Stderr>;

fn stderr_builder(filter: EnvFilter) -> StderrBuilder {
    let writer: fn() -> io::Stderr = io::stderr;
    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_writer(writer)
        .with_ansi(io::stderr().is_terminal())
}
