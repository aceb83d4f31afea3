use std::path::PathBuf;

use crate::logging::LogFormat;

/// Directory scanned for filter packages when none is configured.
pub const DEFAULT_PLUGIN_ROOT: &str = "filters";

/// Default log filter expression used by the binary.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Default plugin root as an owned path.
#[must_use]
pub fn default_plugin_root() -> PathBuf {
    PathBuf::from(DEFAULT_PLUGIN_ROOT)
}

/// Default log filter expression used by the binary.
#[must_use]
pub const fn default_log_filter() -> &'static str {
    DEFAULT_LOG_FILTER
}

/// Owned log filter value used where allocation is required (e.g. serde).
#[must_use]
pub fn default_log_filter_string() -> String {
    DEFAULT_LOG_FILTER.to_owned()
}

/// Default logging format for the binary.
#[must_use]
pub const fn default_log_format() -> LogFormat {
    LogFormat::Json
}
