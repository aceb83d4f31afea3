//! Filter attachment controller and its selection state machine.
//!
//! [`FilterController`] owns the [`MetadataRegistry`] and the
//! [`AttachedFilters`] list. It listens to the list's notifications through an
//! internal observer that tracks which attached filter is active for editing,
//! publishes [`FilterEvent`]s to subscribers, and asks the
//! [`PipelineRefresh`] collaborator to recompute output whenever the filter
//! composition changes.
//!
//! Selection follows these rules:
//!
//! - selecting the current index is a no-op;
//! - a list reset selects nothing before the entries disappear;
//! - removing rows keeps a selection that lay after the removed range on the
//!   same entry, otherwise selects the first removed position; either way
//!   the index is clamped to the new bounds and the selection is always
//!   republished, even when the index is numerically unchanged;
//! - inserting rows selects the first inserted entry and flags it as new;
//! - a rejected duplicate attach selects the existing entry and publishes a
//!   status message.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::attached::{AttachedFilters, AttachedFiltersObserver};
use crate::descriptor::FilterDescriptor;
use crate::discovery::{SkippedDescriptor, discover};
use crate::engine::{FilterHandle, PipelineRefresh, Producer, ServiceRepository};
use crate::error::FilterError;
use crate::registry::MetadataRegistry;
use crate::settings::SettingsStore;

const CONTROLLER_TARGET: &str = "stackfx::controller";

/// Notification published by the controller.
#[derive(Debug, Clone, Copy)]
pub enum FilterEvent<'a> {
    /// The active filter is about to be replaced. Consumers flush pending
    /// edits.
    CurrentFilterAboutToChange,
    /// The active filter was replaced.
    CurrentFilterChanged {
        /// New active filter, absent when nothing editable is selected.
        filter: Option<&'a ActiveFilter>,
        /// Descriptor of the new active filter.
        descriptor: Option<&'a FilterDescriptor>,
        /// Newly selected index.
        index: Option<usize>,
    },
    /// Human-readable status message.
    StatusChanged(&'a str),
    /// The attached list is about to be cleared and rebuilt.
    AboutToReset,
    /// Attached entries `first..=last` were inserted.
    RowsInserted {
        /// First inserted index.
        first: usize,
        /// Last inserted index.
        last: usize,
    },
    /// Attached entries `first..=last` were removed.
    RowsRemoved {
        /// First removed index.
        first: usize,
        /// Last removed index.
        last: usize,
    },
    /// The attached filter composition changed.
    ListChanged,
}

/// Attached filter currently exposed for editing.
#[derive(Debug)]
pub struct ActiveFilter {
    filter: FilterHandle,
    descriptor: Arc<FilterDescriptor>,
    is_new: bool,
}

impl ActiveFilter {
    /// Returns the live filter being edited.
    #[must_use]
    pub const fn handle(&self) -> &FilterHandle {
        &self.filter
    }

    /// Returns the filter's descriptor.
    #[must_use]
    pub fn descriptor(&self) -> &FilterDescriptor {
        &self.descriptor
    }

    /// Returns `true` when the filter was just attached and the insertion has
    /// not been acknowledged.
    #[must_use]
    pub const fn is_new(&self) -> bool {
        self.is_new
    }

    /// Reads a property of the live filter.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        self.filter.property(name)
    }

    /// Writes a property of the live filter.
    pub fn set(&self, name: &str, value: &str) {
        self.filter.set_property(name, value);
    }
}

/// Progress of the one-shot discovery pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryState {
    /// Discovery will run on the next idle tick.
    Scheduled,
    /// Discovery finished.
    Complete,
    /// The plugin root could not be read; the registry stays empty.
    Failed,
}

/// Selection index including the internal resync sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Current {
    None,
    Selected(usize),
    ForceResync,
}

impl From<Option<usize>> for Current {
    fn from(index: Option<usize>) -> Self {
        index.map_or(Self::None, Self::Selected)
    }
}

type Listener = Box<dyn FnMut(&FilterEvent<'_>)>;

/// Selection state driven by the attached list's notifications.
struct Selection {
    current: Current,
    active: Option<ActiveFilter>,
    listeners: Vec<Listener>,
    pipeline: Box<dyn PipelineRefresh>,
}

impl Selection {
    fn emit(&mut self, event: &FilterEvent<'_>) {
        for listener in &mut self.listeners {
            listener(event);
        }
    }

    fn index(&self) -> Option<usize> {
        match self.current {
            Current::Selected(index) => Some(index),
            Current::None | Current::ForceResync => None,
        }
    }

    fn select(&mut self, list: &AttachedFilters, index: Option<usize>) {
        let target = Current::from(index);
        if target == self.current {
            return;
        }
        self.current = target;
        let replacement = index.and_then(|i| active_for(list, i, false));
        self.publish(replacement, index);
    }

    /// Publishes `replacement` and only then releases the previous filter.
    fn publish(&mut self, replacement: Option<ActiveFilter>, index: Option<usize>) {
        debug!(
            target: CONTROLLER_TARGET,
            index = ?index,
            editable = replacement.is_some(),
            "current filter changing"
        );
        self.emit(&FilterEvent::CurrentFilterAboutToChange);
        self.emit(&FilterEvent::CurrentFilterChanged {
            filter: replacement.as_ref(),
            descriptor: replacement.as_ref().map(ActiveFilter::descriptor),
            index,
        });
        let previous = std::mem::replace(&mut self.active, replacement);
        drop(previous);
    }
}

fn active_for(list: &AttachedFilters, index: usize, is_new: bool) -> Option<ActiveFilter> {
    let entry = list.get(index)?;
    let descriptor = entry.descriptor()?;
    Some(ActiveFilter {
        filter: FilterHandle::clone(entry.filter()),
        descriptor: Arc::clone(descriptor),
        is_new,
    })
}

impl AttachedFiltersObserver for Selection {
    fn about_to_reset(&mut self, list: &AttachedFilters) {
        self.emit(&FilterEvent::AboutToReset);
        self.select(list, None);
    }

    fn rows_inserted(&mut self, list: &AttachedFilters, first: usize, last: usize) {
        self.emit(&FilterEvent::RowsInserted { first, last });
        self.current = Current::Selected(first);
        let replacement = active_for(list, first, true);
        self.publish(replacement, Some(first));
    }

    fn rows_removed(&mut self, list: &AttachedFilters, first: usize, last: usize) {
        self.emit(&FilterEvent::RowsRemoved { first, last });
        let removed = last.saturating_sub(first) + 1;
        let preferred = match self.current {
            Current::Selected(index) if index > last => index - removed,
            Current::Selected(_) | Current::None | Current::ForceResync => first,
        };
        let target = list.len().checked_sub(1).map(|max| preferred.min(max));
        self.current = Current::ForceResync;
        self.select(list, target);
    }

    fn duplicate_rejected(&mut self, list: &AttachedFilters, index: usize) {
        let name = list
            .descriptor_at(index)
            .map_or("", |descriptor| descriptor.name());
        let message = format!("Only one {name} filter is allowed.");
        warn!(target: CONTROLLER_TARGET, index, "{message}");
        self.emit(&FilterEvent::StatusChanged(&message));
        self.select(list, Some(index));
    }

    fn changed(&mut self, _list: &AttachedFilters) {
        self.emit(&FilterEvent::ListChanged);
        self.pipeline.refresh();
    }
}

/// Orchestrates discovery, the attached filter list, and the active
/// selection.
///
/// # Example
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use stackfx_filters::engine::{MemoryProducer, NoRefresh, StaticRepository};
/// use stackfx_filters::settings::NoSettings;
/// use stackfx_filters::{FilterController, FilterDescriptor, FilterEvent, MetadataRegistry};
///
/// let registry = MetadataRegistry::from_descriptors([
///     FilterDescriptor::new("Blur", "boxblur").with_unique_id("blur").with_single_instance(true),
/// ])
/// .unwrap();
/// let mut controller = FilterController::with_registry(registry, Box::new(NoRefresh));
///
/// let statuses = Rc::new(RefCell::new(Vec::new()));
/// let sink = Rc::clone(&statuses);
/// controller.subscribe(move |event| {
///     if let FilterEvent::StatusChanged(message) = event {
///         sink.borrow_mut().push(message.to_string());
///     }
/// });
///
/// controller.set_producer(Box::new(MemoryProducer::new()));
/// assert_eq!(controller.attach_by_id("blur", None).unwrap(), 0);
/// let err = controller.attach_by_id("blur", None).unwrap_err();
/// assert_eq!(err.duplicate_index(), Some(0));
/// assert_eq!(controller.current_index(), Some(0));
/// assert_eq!(statuses.borrow().as_slice(), ["Only one Blur filter is allowed."]);
/// ```
pub struct FilterController {
    metadata: MetadataRegistry,
    attached: AttachedFilters,
    selection: Selection,
    discovery: DiscoveryState,
    plugin_root: PathBuf,
    repository: Option<Box<dyn ServiceRepository>>,
    settings: Option<Box<dyn SettingsStore>>,
    skipped: Vec<SkippedDescriptor>,
}

impl FilterController {
    /// Creates a controller and schedules discovery of `plugin_root` for the
    /// first [`Self::process_idle`] call.
    ///
    /// The registry is empty until discovery has run.
    pub fn new(
        plugin_root: impl Into<PathBuf>,
        repository: Box<dyn ServiceRepository>,
        settings: Box<dyn SettingsStore>,
        pipeline: Box<dyn PipelineRefresh>,
    ) -> Self {
        Self {
            metadata: MetadataRegistry::new(),
            attached: AttachedFilters::new(),
            selection: Self::selection(pipeline),
            discovery: DiscoveryState::Scheduled,
            plugin_root: plugin_root.into(),
            repository: Some(repository),
            settings: Some(settings),
            skipped: Vec::new(),
        }
    }

    /// Creates a controller around an already populated registry.
    #[must_use]
    pub fn with_registry(registry: MetadataRegistry, pipeline: Box<dyn PipelineRefresh>) -> Self {
        Self {
            metadata: registry,
            attached: AttachedFilters::new(),
            selection: Self::selection(pipeline),
            discovery: DiscoveryState::Complete,
            plugin_root: PathBuf::new(),
            repository: None,
            settings: None,
            skipped: Vec::new(),
        }
    }

    fn selection(pipeline: Box<dyn PipelineRefresh>) -> Selection {
        Selection {
            current: Current::None,
            active: None,
            listeners: Vec::new(),
            pipeline,
        }
    }

    /// Runs deferred work. The first call performs discovery; later calls
    /// return immediately.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::PluginRoot`] when the plugin root cannot be
    /// read. Discovery is not retried.
    pub fn process_idle(&mut self) -> Result<(), FilterError> {
        let (Some(repository), Some(settings)) = (self.repository.take(), self.settings.take())
        else {
            return Ok(());
        };
        match discover(&self.plugin_root, repository.as_ref(), settings.as_ref()) {
            Ok(report) => {
                self.metadata = report.registry;
                self.skipped = report.skipped;
                self.discovery = DiscoveryState::Complete;
                Ok(())
            }
            Err(err) => {
                warn!(target: CONTROLLER_TARGET, error = %err, "filter discovery failed");
                self.discovery = DiscoveryState::Failed;
                Err(err)
            }
        }
    }

    /// Returns the progress of discovery.
    #[must_use]
    pub const fn discovery_state(&self) -> &DiscoveryState {
        &self.discovery
    }

    /// Returns the plugin root scanned by discovery.
    #[must_use]
    pub fn plugin_root(&self) -> &Path {
        &self.plugin_root
    }

    /// Returns descriptor files discovery skipped.
    #[must_use]
    pub fn skipped(&self) -> &[SkippedDescriptor] {
        &self.skipped
    }

    /// Returns the catalogue of available filters.
    #[must_use]
    pub const fn metadata(&self) -> &MetadataRegistry {
        &self.metadata
    }

    /// Returns the filters attached to the current producer.
    #[must_use]
    pub const fn attached(&self) -> &AttachedFilters {
        &self.attached
    }

    /// Registers a listener for every [`FilterEvent`].
    pub fn subscribe(&mut self, listener: impl FnMut(&FilterEvent<'_>) + 'static) {
        self.selection.listeners.push(Box::new(listener));
    }

    /// Rebinds the attached list to `producer`. The selection is cleared.
    pub fn set_producer(&mut self, producer: Box<dyn Producer>) {
        self.attached
            .set_producer(producer, &self.metadata, &mut self.selection);
    }

    /// Releases the current producer. The selection is cleared.
    pub fn clear_producer(&mut self) {
        self.attached.clear_producer(&mut self.selection);
    }

    /// Attaches `descriptor` at `position` (default: end) and selects it.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::Duplicate`] when a single-instance filter is
    /// already attached; the existing entry becomes selected and a status
    /// message is published. Other errors come from
    /// [`AttachedFilters::attach`].
    pub fn attach(
        &mut self,
        descriptor: &Arc<FilterDescriptor>,
        position: Option<usize>,
    ) -> Result<usize, FilterError> {
        self.attached
            .attach(Arc::clone(descriptor), position, &mut self.selection)
    }

    /// Attaches the discovered filter with `unique_id`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::UnknownFilter`] when no such descriptor was
    /// discovered, otherwise as [`Self::attach`].
    pub fn attach_by_id(
        &mut self,
        unique_id: &str,
        position: Option<usize>,
    ) -> Result<usize, FilterError> {
        let descriptor = self
            .metadata
            .find(unique_id)
            .cloned()
            .ok_or_else(|| FilterError::UnknownFilter {
                unique_id: unique_id.to_owned(),
            })?;
        self.attach(&descriptor, position)
    }

    /// Detaches the filter at `index`.
    ///
    /// # Errors
    ///
    /// As [`AttachedFilters::detach`].
    pub fn detach(&mut self, index: usize) -> Result<(), FilterError> {
        self.attached.detach(index, &mut self.selection)
    }

    /// Selects the attached filter at `index`, or nothing for `None`.
    ///
    /// # Errors
    ///
    /// Returns [`FilterError::IndexOutOfRange`] when `index` is not attached.
    pub fn set_current_filter(&mut self, index: Option<usize>) -> Result<(), FilterError> {
        if let Some(requested) = index
            && requested >= self.attached.len()
        {
            return Err(FilterError::IndexOutOfRange {
                index: requested,
                len: self.attached.len(),
            });
        }
        self.selection.select(&self.attached, index);
        Ok(())
    }

    /// Returns the selected index.
    #[must_use]
    pub fn current_index(&self) -> Option<usize> {
        self.selection.index()
    }

    /// Returns the active filter, absent when nothing editable is selected.
    #[must_use]
    pub const fn current_filter(&self) -> Option<&ActiveFilter> {
        self.selection.active.as_ref()
    }

    /// Acknowledges a freshly attached filter, clearing its new flag.
    pub fn acknowledge_new_filter(&mut self) {
        if let Some(active) = self.selection.active.as_mut() {
            active.is_new = false;
        }
        if let Some(index) = self.selection.index() {
            self.attached.mark_acknowledged(index);
        }
    }
}

impl std::fmt::Debug for FilterController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterController")
            .field("metadata", &self.metadata.len())
            .field("attached", &self.attached)
            .field("current", &self.selection.current)
            .field("discovery", &self.discovery)
            .finish_non_exhaustive()
    }
}
