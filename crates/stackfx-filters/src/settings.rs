//! Persisted per-descriptor settings.
//!
//! Discovery consults a [`SettingsStore`] when finalising each descriptor so
//! user preferences such as favourites survive across sessions.

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FilterError;

/// User preferences stored for one descriptor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorSettings {
    /// The user marked the filter as a favourite.
    pub favorite: bool,
}

/// Source of persisted descriptor settings.
pub trait SettingsStore {
    /// Returns the settings for `unique_id`, or defaults when none are stored.
    fn load(&self, unique_id: &str) -> DescriptorSettings;
}

/// Store that always yields defaults.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoSettings;

impl SettingsStore for NoSettings {
    fn load(&self, _unique_id: &str) -> DescriptorSettings {
        DescriptorSettings::default()
    }
}

/// Store backed by a JSON object keyed by unique id.
///
/// ```json
/// { "blur": { "favorite": true } }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonSettingsStore {
    entries: HashMap<String, DescriptorSettings>,
}

impl JsonSettingsStore {
    /// Loads the store from `path`. A missing file yields an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Settings`] when the file exists but cannot be
    /// read or parsed.
    pub fn open(path: &Path) -> Result<Self, FilterError> {
        let contents = match fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Self::default()),
            Err(err) => {
                return Err(FilterError::Settings {
                    path: path.to_path_buf(),
                    message: err.to_string(),
                });
            }
        };
        let entries = serde_json::from_str(&contents).map_err(|err| FilterError::Settings {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Ok(Self { entries })
    }

    /// Returns the number of descriptors with stored settings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no settings are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SettingsStore for JsonSettingsStore {
    fn load(&self, unique_id: &str) -> DescriptorSettings {
        self.entries.get(unique_id).copied().unwrap_or_default()
    }
}
