//! Shared configuration for the stackfx tools.
//!
//! [`Config`] is layered by `ortho_config`: built-in defaults, then a
//! configuration file (`--config-path` or `STACKFX_CONFIG_PATH`), then
//! `STACKFX_*` environment variables, then command-line flags.

use std::path::{Path, PathBuf};

use ortho_config::OrthoConfig;
use serde::{Deserialize, Serialize};

mod defaults;
mod logging;

pub use defaults::{
    DEFAULT_LOG_FILTER, DEFAULT_PLUGIN_ROOT, default_log_filter, default_log_filter_string,
    default_log_format, default_plugin_root,
};
pub use logging::{LogFormat, LogFormatParseError};

/// Resolved configuration for the filter catalogue and its telemetry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, OrthoConfig)]
#[ortho_config(prefix = "STACKFX")]
pub struct Config {
    /// Directory holding one sub-directory per filter package.
    #[ortho_config(default = default_plugin_root())]
    pub plugin_root: PathBuf,
    /// JSON file with persisted per-filter settings such as favourites.
    pub settings_path: Option<PathBuf>,
    /// Backend services the media engine provides. Empty means every
    /// service is assumed available.
    #[ortho_config(merge_strategy = "append")]
    pub backend_services: Vec<String>,
    /// `tracing` filter expression, for example `info,stackfx::discovery=debug`.
    #[ortho_config(default = default_log_filter_string())]
    pub log_filter: String,
    /// Log output format.
    #[ortho_config(default = default_log_format())]
    pub log_format: LogFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            plugin_root: default_plugin_root(),
            settings_path: None,
            backend_services: Vec::new(),
            log_filter: default_log_filter_string(),
            log_format: default_log_format(),
        }
    }
}

impl Config {
    /// Directory scanned by discovery.
    #[must_use]
    pub fn plugin_root(&self) -> &Path {
        self.plugin_root.as_path()
    }

    /// Settings file, when one is configured.
    #[must_use]
    pub fn settings_path(&self) -> Option<&Path> {
        self.settings_path.as_deref()
    }

    /// Backend services reported as available.
    #[must_use]
    pub fn backend_services(&self) -> &[String] {
        &self.backend_services
    }

    /// Log filter expression.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_str()
    }

    /// Log output format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        self.log_format
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_matches_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.plugin_root(), Path::new(DEFAULT_PLUGIN_ROOT));
        assert_eq!(config.settings_path(), None);
        assert!(config.backend_services().is_empty());
        assert_eq!(config.log_filter(), default_log_filter());
        assert_eq!(config.log_format(), LogFormat::Json);
    }
}
