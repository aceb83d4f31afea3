//! Filters attached to the current producer.
//!
//! [`AttachedFilters`] is the ordered list binding descriptors to live filters
//! on one [`Producer`]. List order is processing order in the pipeline. Each
//! mutating method takes an [`AttachedFiltersObserver`] and reports the change
//! to it synchronously, passing the list back in so the observer can read the
//! post-change state.

use std::sync::Arc;

use tracing::{debug, info};

use crate::descriptor::FilterDescriptor;
use crate::engine::{FilterHandle, Producer, UNIQUE_ID_PROPERTY};
use crate::error::FilterError;
use crate::registry::MetadataRegistry;

const ATTACHED_TARGET: &str = "stackfx::attached";

/// Receives structural change notifications from [`AttachedFilters`].
///
/// All methods default to doing nothing.
pub trait AttachedFiltersObserver {
    /// The list is about to be cleared and rebuilt for another producer.
    fn about_to_reset(&mut self, _list: &AttachedFilters) {}

    /// Entries `first..=last` were inserted.
    fn rows_inserted(&mut self, _list: &AttachedFilters, _first: usize, _last: usize) {}

    /// Entries `first..=last` were removed.
    fn rows_removed(&mut self, _list: &AttachedFilters, _first: usize, _last: usize) {}

    /// A single-instance filter was attached again; `index` holds the
    /// existing entry.
    fn duplicate_rejected(&mut self, _list: &AttachedFilters, _index: usize) {}

    /// The filter composition changed.
    fn changed(&mut self, _list: &AttachedFilters) {}
}

/// Observer that ignores every notification.
impl AttachedFiltersObserver for () {}

/// One live filter attached to the producer.
#[derive(Debug, Clone)]
pub struct AttachmentEntry {
    descriptor: Option<Arc<FilterDescriptor>>,
    filter: FilterHandle,
    is_new: bool,
}

impl AttachmentEntry {
    /// Returns the descriptor, absent for pipeline filters no discovered
    /// descriptor matches.
    #[must_use]
    pub const fn descriptor(&self) -> Option<&Arc<FilterDescriptor>> {
        self.descriptor.as_ref()
    }

    /// Returns the live filter.
    #[must_use]
    pub const fn filter(&self) -> &FilterHandle {
        &self.filter
    }

    /// Returns `true` until the insertion has been acknowledged.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.is_new
    }
}

/// Ordered list of filters attached to the current producer.
#[derive(Debug, Default)]
pub struct AttachedFilters {
    producer: Option<Box<dyn Producer>>,
    entries: Vec<AttachmentEntry>,
}

impl AttachedFilters {
    /// Creates an empty list with no producer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once a producer is bound.
    #[must_use]
    pub const fn has_producer(&self) -> bool {
        self.producer.is_some()
    }

    /// Binds the list to `producer`.
    ///
    /// Existing entries are released and the list is rebuilt from the filters
    /// already attached to `producer`, matched to descriptors in `registry`.
    pub fn set_producer(
        &mut self,
        producer: Box<dyn Producer>,
        registry: &MetadataRegistry,
        observer: &mut dyn AttachedFiltersObserver,
    ) {
        observer.about_to_reset(self);
        self.entries = producer
            .filters()
            .into_iter()
            .map(|filter| AttachmentEntry {
                descriptor: registry.for_filter(&*filter).cloned(),
                filter,
                is_new: false,
            })
            .collect();
        self.producer = Some(producer);
        debug!(
            target: ATTACHED_TARGET,
            attached = self.entries.len(),
            "rebound attached filters to producer"
        );
        observer.changed(self);
    }

    /// Releases the producer and every entry.
    pub fn clear_producer(&mut self, observer: &mut dyn AttachedFiltersObserver) {
        observer.about_to_reset(self);
        self.entries.clear();
        self.producer = None;
        observer.changed(self);
    }

    /// Attaches a new filter for `descriptor` at `position`, or at the end
    /// when `position` is `None` or past the end.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Duplicate`] when `descriptor` is single-instance
    /// and already attached, [`FilterError::NoProducer`] when no producer is
    /// bound, and [`FilterError::Engine`] when the producer rejects the filter.
    pub fn attach(
        &mut self,
        descriptor: Arc<FilterDescriptor>,
        position: Option<usize>,
        observer: &mut dyn AttachedFiltersObserver,
    ) -> Result<usize, FilterError> {
        if descriptor.is_single_instance()
            && let Some(index) = self.position_of(descriptor.unique_id())
        {
            debug!(
                target: ATTACHED_TARGET,
                filter = descriptor.unique_id(),
                index,
                "rejected duplicate single-instance filter"
            );
            observer.duplicate_rejected(self, index);
            return Err(FilterError::Duplicate {
                name: descriptor.name().to_owned(),
                index,
            });
        }

        let len = self.entries.len();
        let index = position.map_or(len, |requested| requested.min(len));
        let producer = self.producer.as_mut().ok_or(FilterError::NoProducer)?;
        let filter = producer
            .attach_filter(descriptor.service(), index)
            .map_err(|source| FilterError::Engine {
                operation: "attach filter",
                source,
            })?;
        filter.set_property(UNIQUE_ID_PROPERTY, descriptor.unique_id());
        info!(
            target: ATTACHED_TARGET,
            filter = descriptor.unique_id(),
            index,
            "attached filter"
        );
        self.entries.insert(
            index,
            AttachmentEntry {
                descriptor: Some(descriptor),
                filter,
                is_new: true,
            },
        );
        observer.rows_inserted(self, index, index);
        observer.changed(self);
        Ok(index)
    }

    /// Detaches the filter at `index` and releases it.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::IndexOutOfRange`] when `index` is not attached
    /// and [`FilterError::Engine`] when the producer fails to remove it.
    pub fn detach(
        &mut self,
        index: usize,
        observer: &mut dyn AttachedFiltersObserver,
    ) -> Result<(), FilterError> {
        let len = self.entries.len();
        let entry = self
            .entries
            .get(index)
            .ok_or(FilterError::IndexOutOfRange { index, len })?;
        let producer = self.producer.as_mut().ok_or(FilterError::NoProducer)?;
        producer
            .detach_filter(&entry.filter)
            .map_err(|source| FilterError::Engine {
                operation: "detach filter",
                source,
            })?;
        let removed = self.entries.remove(index);
        info!(
            target: ATTACHED_TARGET,
            filter = removed.filter.service(),
            index,
            "detached filter"
        );
        drop(removed);
        observer.rows_removed(self, index, index);
        observer.changed(self);
        Ok(())
    }

    /// Clears the new-entry flag once the insertion has been acknowledged.
    pub fn mark_acknowledged(&mut self, index: usize) {
        if let Some(entry) = self.entries.get_mut(index) {
            entry.is_new = false;
        }
    }

    /// Returns the entry at `index`.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&AttachmentEntry> {
        self.entries.get(index)
    }

    /// Returns the descriptor of the entry at `index`.
    #[must_use]
    pub fn descriptor_at(&self, index: usize) -> Option<&Arc<FilterDescriptor>> {
        self.entries.get(index).and_then(AttachmentEntry::descriptor)
    }

    /// Returns the live filter of the entry at `index`.
    #[must_use]
    pub fn filter_at(&self, index: usize) -> Option<&FilterHandle> {
        self.entries.get(index).map(AttachmentEntry::filter)
    }

    /// Returns the index of the first entry created from `unique_id`.
    #[must_use]
    pub fn position_of(&self, unique_id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| {
            entry
                .descriptor
                .as_deref()
                .is_some_and(|d| d.unique_id() == unique_id)
        })
    }

    /// Iterates entries in processing order.
    pub fn iter(&self) -> std::slice::Iter<'_, AttachmentEntry> {
        self.entries.iter()
    }

    /// Returns the number of attached filters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when no filters are attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
