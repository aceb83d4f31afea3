//! Seams to the external media engine.
//!
//! The crate never processes media itself. It asks a [`ServiceRepository`]
//! whether a backend service exists, creates and removes live filters through
//! a [`Producer`], and asks a [`PipelineRefresh`] collaborator to recompute
//! output after the attached filter composition changes.
//!
//! [`memory`] provides an in-process engine used by headless callers and the
//! test suite.

use std::collections::BTreeSet;
use std::fmt;
use std::rc::Rc;

use thiserror::Error;

pub mod memory;

pub use self::memory::{MemoryFilter, MemoryProducer};

/// Property stamped on every filter created through the attachment list.
///
/// Rebinding a producer uses it to map pipeline filters back to their
/// descriptors.
pub const UNIQUE_ID_PROPERTY: &str = "stackfx:filter";

/// Error reported by the media engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct EngineError {
    message: String,
}

impl EngineError {
    /// Creates an engine error from a human-readable message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Returns the engine's description of the failure.
    #[must_use]
    pub const fn message(&self) -> &str {
        self.message.as_str()
    }
}

/// Read-only view of the engine's filter-service repository.
pub trait ServiceRepository {
    /// Returns `true` when the engine can instantiate the named filter service.
    fn has_filter(&self, service: &str) -> bool;
}

/// Repository backed by a fixed set of service names.
///
/// # Example
///
/// ```
/// use stackfx_filters::engine::{ServiceRepository, StaticRepository};
///
/// let repository = StaticRepository::new(["boxblur"]);
/// assert!(repository.has_filter("boxblur"));
/// assert!(!repository.has_filter("frei0r.glow"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StaticRepository {
    services: BTreeSet<String>,
}

impl StaticRepository {
    /// Creates a repository exposing the given services.
    pub fn new<I, S>(services: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            services: services.into_iter().map(Into::into).collect(),
        }
    }

    /// Returns the number of services exposed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Returns `true` when no services are exposed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl ServiceRepository for StaticRepository {
    fn has_filter(&self, service: &str) -> bool {
        self.services.contains(service)
    }
}

/// A filter instance living inside the media pipeline.
///
/// Implementations use interior mutability: the engine owns the filter state
/// and handles only reference it.
pub trait LiveFilter: fmt::Debug {
    /// Returns the backend service the filter was created from.
    fn service(&self) -> &str;

    /// Reads a filter property.
    fn property(&self, name: &str) -> Option<String>;

    /// Writes a filter property.
    fn set_property(&self, name: &str, value: &str);
}

/// Handle to a live filter.
pub type FilterHandle = Rc<dyn LiveFilter>;

/// Returns `true` when both handles refer to the same live filter.
#[must_use]
pub fn same_filter(left: &FilterHandle, right: &FilterHandle) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(left), Rc::as_ptr(right))
}

/// Media object that filters attach to.
pub trait Producer: fmt::Debug {
    /// Returns the filters currently attached, in processing order.
    fn filters(&self) -> Vec<FilterHandle>;

    /// Creates a filter for `service` and attaches it at `position`.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the service cannot be instantiated or
    /// the position is not valid for this producer.
    fn attach_filter(&mut self, service: &str, position: usize)
    -> Result<FilterHandle, EngineError>;

    /// Detaches a filter previously returned by this producer.
    ///
    /// # Errors
    ///
    /// Returns an [`EngineError`] when the filter is not attached here.
    fn detach_filter(&mut self, filter: &FilterHandle) -> Result<(), EngineError>;
}

/// Collaborator that recomputes the rendered output.
pub trait PipelineRefresh {
    /// Requests a refresh. Callers never wait for it to complete.
    fn refresh(&self);
}

/// Refresh collaborator that does nothing, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRefresh;

impl PipelineRefresh for NoRefresh {
    fn refresh(&self) {}
}
