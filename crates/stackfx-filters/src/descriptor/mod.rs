//! Filter descriptors: the static declaration of one filter plugin.
//!
//! A descriptor file is a JSON document named `meta*.json` inside a filter
//! package directory. It declares the filter's display name, the backend
//! service implementing it, and capability flags. Parsing yields a
//! [`FilterDescriptor`], which is immutable once discovery has stamped its
//! source directory and persisted settings.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::FilterError;
use crate::settings::DescriptorSettings;

/// File-name prefix shared by all descriptor files.
pub const DESCRIPTOR_PREFIX: &str = "meta";

/// File extension shared by all descriptor files.
pub const DESCRIPTOR_EXTENSION: &str = "json";

/// Returns `true` when `file_name` matches the `meta*.json` pattern.
///
/// # Example
///
/// ```
/// use stackfx_filters::descriptor::is_descriptor_file;
///
/// assert!(is_descriptor_file("meta.json"));
/// assert!(is_descriptor_file("meta_audio.json"));
/// assert!(!is_descriptor_file("ui.json"));
/// assert!(!is_descriptor_file("meta.qml"));
/// assert!(!is_descriptor_file("Meta.json"));
/// ```
///
/// Both the prefix and the extension match case-sensitively.
#[must_use]
pub fn is_descriptor_file(file_name: &str) -> bool {
    file_name.starts_with(DESCRIPTOR_PREFIX)
        && Path::new(file_name)
            .extension()
            .is_some_and(|ext| ext == DESCRIPTOR_EXTENSION)
}

/// On-disk form of a descriptor.
#[derive(Debug, Deserialize)]
struct DescriptorFile {
    name: String,
    #[serde(alias = "service")]
    mlt_service: String,
    #[serde(default)]
    unique_id: Option<String>,
    #[serde(default)]
    single_instance: bool,
    #[serde(default)]
    is_audio: bool,
    #[serde(default)]
    is_hidden: bool,
    #[serde(default)]
    keywords: Vec<String>,
    #[serde(default)]
    ui: Option<String>,
}

/// Declaration of one filter plugin's identity and backend binding.
///
/// # Example
///
/// ```
/// use stackfx_filters::FilterDescriptor;
///
/// let legacy = FilterDescriptor::new("Blur", "boxblur");
/// assert_eq!(legacy.unique_id(), "boxblur");
///
/// let blur = FilterDescriptor::new("Blur", "boxblur")
///     .with_unique_id("blur")
///     .with_single_instance(true);
/// assert_eq!(blur.unique_id(), "blur");
/// assert!(blur.is_single_instance());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterDescriptor {
    unique_id: Option<String>,
    name: String,
    service: String,
    path: PathBuf,
    single_instance: bool,
    is_audio: bool,
    is_hidden: bool,
    favorite: bool,
    keywords: Vec<String>,
    ui: Option<String>,
}

impl FilterDescriptor {
    /// Creates a descriptor with no explicit unique id and default flags.
    #[must_use]
    pub fn new(name: impl Into<String>, service: impl Into<String>) -> Self {
        Self {
            unique_id: None,
            name: name.into(),
            service: service.into(),
            path: PathBuf::new(),
            single_instance: false,
            is_audio: false,
            is_hidden: false,
            favorite: false,
            keywords: Vec::new(),
            ui: None,
        }
    }

    /// Sets an explicit unique id.
    #[must_use]
    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    /// Marks the filter as allowing at most one attachment per producer.
    #[must_use]
    pub const fn with_single_instance(mut self, single_instance: bool) -> Self {
        self.single_instance = single_instance;
        self
    }

    /// Marks the filter as processing audio rather than video.
    #[must_use]
    pub const fn with_audio(mut self, is_audio: bool) -> Self {
        self.is_audio = is_audio;
        self
    }

    /// Hides the filter from catalogue listings.
    #[must_use]
    pub const fn with_hidden(mut self, is_hidden: bool) -> Self {
        self.is_hidden = is_hidden;
        self
    }

    /// Sets the search keywords.
    #[must_use]
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Parses and validates the descriptor file at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Descriptor`] when the file cannot be read, is
    /// not valid JSON, or declares an empty name, service, or unique id.
    pub fn from_file(path: &Path) -> Result<Self, FilterError> {
        let contents = fs::read_to_string(path).map_err(|err| FilterError::Descriptor {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json(path, &contents)
    }

    fn from_json(path: &Path, contents: &str) -> Result<Self, FilterError> {
        let file: DescriptorFile =
            serde_json::from_str(contents).map_err(|err| FilterError::Descriptor {
                path: path.to_path_buf(),
                message: err.to_string(),
            })?;
        let descriptor = Self {
            unique_id: file.unique_id,
            name: file.name,
            service: file.mlt_service,
            path: PathBuf::new(),
            single_instance: file.single_instance,
            is_audio: file.is_audio,
            is_hidden: file.is_hidden,
            favorite: false,
            keywords: file.keywords,
            ui: file.ui,
        };
        descriptor.validate(path)?;
        Ok(descriptor)
    }

    fn validate(&self, path: &Path) -> Result<(), FilterError> {
        let reject = |message: &str| {
            Err(FilterError::Descriptor {
                path: path.to_path_buf(),
                message: message.to_owned(),
            })
        };
        if self.name.trim().is_empty() {
            return reject("filter name must not be empty");
        }
        if self.service.trim().is_empty() {
            return reject("backend service must not be empty");
        }
        if self
            .unique_id
            .as_deref()
            .is_some_and(|id| id.trim().is_empty())
        {
            return reject("unique id must not be empty when present");
        }
        Ok(())
    }

    /// Applies persisted settings and stamps the package directory.
    #[must_use]
    pub(crate) fn finalize(mut self, settings: DescriptorSettings, directory: &Path) -> Self {
        self.favorite = settings.favorite;
        self.path = directory.to_path_buf();
        self
    }

    /// Returns the stable identity, falling back to the backend service.
    #[must_use]
    pub fn unique_id(&self) -> &str {
        self.unique_id.as_deref().unwrap_or(self.service.as_str())
    }

    /// Returns the display name.
    #[must_use]
    pub const fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Returns the backend service name.
    #[must_use]
    pub const fn service(&self) -> &str {
        self.service.as_str()
    }

    /// Returns the directory the descriptor was loaded from.
    ///
    /// Empty for descriptors built in code.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns `true` when at most one attachment per producer is allowed.
    #[must_use]
    pub const fn is_single_instance(&self) -> bool {
        self.single_instance
    }

    /// Returns `true` for audio filters.
    #[must_use]
    pub const fn is_audio(&self) -> bool {
        self.is_audio
    }

    /// Returns `true` when the filter is hidden from listings.
    #[must_use]
    pub const fn is_hidden(&self) -> bool {
        self.is_hidden
    }

    /// Returns `true` when the user marked the filter as a favourite.
    #[must_use]
    pub const fn is_favorite(&self) -> bool {
        self.favorite
    }

    /// Returns the search keywords.
    #[must_use]
    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Returns the editor definition file, relative to [`Self::path`].
    #[must_use]
    pub fn ui(&self) -> Option<&str> {
        self.ui.as_deref()
    }

    /// Returns the editor definition resolved against the package directory.
    #[must_use]
    pub fn ui_path(&self) -> Option<PathBuf> {
        self.ui.as_deref().map(|ui| self.path.join(ui))
    }
}
