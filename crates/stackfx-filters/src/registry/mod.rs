//! Metadata registry holding discovered filter descriptors.
//!
//! The [`MetadataRegistry`] stores descriptors in discovery order and is
//! read-only once discovery has finished. Registrations for a unique id that
//! is already present are rejected, so the first discovered descriptor wins.

use std::slice;
use std::sync::Arc;

use crate::descriptor::FilterDescriptor;
use crate::engine::{LiveFilter, UNIQUE_ID_PROPERTY};
use crate::error::FilterError;

/// Ordered catalogue of available filters.
///
/// # Example
///
/// ```
/// use stackfx_filters::{FilterDescriptor, MetadataRegistry};
///
/// let registry = MetadataRegistry::from_descriptors([
///     FilterDescriptor::new("Blur", "boxblur").with_unique_id("blur"),
///     FilterDescriptor::new("Volume", "volume"),
/// ])
/// .expect("unique ids");
/// assert_eq!(registry.len(), 2);
/// assert_eq!(registry.position("volume"), Some(1));
/// ```
#[derive(Debug, Clone, Default)]
pub struct MetadataRegistry {
    descriptors: Vec<Arc<FilterDescriptor>>,
}

impl MetadataRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from descriptors, in order.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::DuplicateId`] if two descriptors share a unique
    /// id.
    pub fn from_descriptors<I>(descriptors: I) -> Result<Self, FilterError>
    where
        I: IntoIterator<Item = FilterDescriptor>,
    {
        let mut registry = Self::new();
        for descriptor in descriptors {
            registry.push(descriptor)?;
        }
        Ok(registry)
    }

    /// Appends a descriptor unless its unique id is already registered.
    pub(crate) fn push(&mut self, descriptor: FilterDescriptor) -> Result<(), FilterError> {
        if self.position(descriptor.unique_id()).is_some() {
            return Err(FilterError::DuplicateId {
                unique_id: descriptor.unique_id().to_owned(),
            });
        }
        self.descriptors.push(Arc::new(descriptor));
        Ok(())
    }

    /// Returns the descriptor at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Arc<FilterDescriptor>> {
        self.descriptors.get(index)
    }

    /// Iterates descriptors in discovery order.
    pub fn iter(&self) -> slice::Iter<'_, Arc<FilterDescriptor>> {
        self.descriptors.iter()
    }

    /// Looks up a descriptor by unique id.
    #[must_use]
    pub fn find(&self, unique_id: &str) -> Option<&Arc<FilterDescriptor>> {
        self.descriptors.iter().find(|d| d.unique_id() == unique_id)
    }

    /// Returns the index of the descriptor with `unique_id`.
    #[must_use]
    pub fn position(&self, unique_id: &str) -> Option<usize> {
        self.descriptors
            .iter()
            .position(|d| d.unique_id() == unique_id)
    }

    /// Resolves the descriptor a live filter was created from.
    ///
    /// Filters carry the descriptor's unique id in
    /// [`UNIQUE_ID_PROPERTY`]; legacy filters without it are matched by
    /// backend service name.
    #[must_use]
    pub fn for_filter(&self, filter: &dyn LiveFilter) -> Option<&Arc<FilterDescriptor>> {
        let unique_id = filter
            .property(UNIQUE_ID_PROPERTY)
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| filter.service().to_owned());
        self.find(&unique_id)
    }

    /// Returns descriptors that are not hidden.
    #[must_use]
    pub fn visible(&self) -> Vec<&Arc<FilterDescriptor>> {
        self.descriptors.iter().filter(|d| !d.is_hidden()).collect()
    }

    /// Returns visible descriptors the user marked as favourites.
    #[must_use]
    pub fn favorites(&self) -> Vec<&Arc<FilterDescriptor>> {
        self.descriptors
            .iter()
            .filter(|d| d.is_favorite() && !d.is_hidden())
            .collect()
    }

    /// Returns visible descriptors whose name or keywords contain `query`,
    /// ignoring ASCII case.
    #[must_use]
    pub fn search(&self, query: &str) -> Vec<&Arc<FilterDescriptor>> {
        let needle = query.to_ascii_lowercase();
        self.descriptors
            .iter()
            .filter(|d| !d.is_hidden())
            .filter(|d| {
                d.name().to_ascii_lowercase().contains(&needle)
                    || d
                        .keywords()
                        .iter()
                        .any(|k| k.to_ascii_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Returns the number of descriptors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` when no descriptors are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<'a> IntoIterator for &'a MetadataRegistry {
    type Item = &'a Arc<FilterDescriptor>;
    type IntoIter = slice::Iter<'a, Arc<FilterDescriptor>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests;
