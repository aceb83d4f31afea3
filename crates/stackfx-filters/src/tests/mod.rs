//! Crate-level test doubles and behaviour tests.

use std::cell::{Cell, RefCell};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use mockall::mock;

use crate::controller::{FilterController, FilterEvent};
use crate::descriptor::FilterDescriptor;
use crate::engine::{PipelineRefresh, ServiceRepository};
use crate::registry::MetadataRegistry;


mock! {
    pub Repository {}
    impl ServiceRepository for Repository {
        fn has_filter(&self, service: &str) -> bool;
    }
}

mock! {
    pub Pipeline {}
    impl PipelineRefresh for Pipeline {
        fn refresh(&self);
    }
}

/// Writes `contents` to `root/package/file`, creating the package directory.
pub(crate) fn write_descriptor(root: &Path, package: &str, file: &str, contents: &str) {
    let directory = root.join(package);
    fs::create_dir_all(&directory).expect("create package directory");
    fs::write(directory.join(file), contents).expect("write descriptor");
}

/// Pipeline double counting refresh requests.
#[derive(Debug, Clone, Default)]
pub(crate) struct CountingPipeline(Rc<Cell<usize>>);

impl CountingPipeline {
    pub(crate) fn count(&self) -> usize {
        self.0.get()
    }
}

impl PipelineRefresh for CountingPipeline {
    fn refresh(&self) {
        self.0.set(self.0.get() + 1);
    }
}

/// Owned copy of a [`FilterEvent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Recorded {
    AboutToChange,
    Changed {
        index: Option<usize>,
        filter: Option<String>,
        is_new: bool,
    },
    Status(String),
    AboutToReset,
    Inserted(usize, usize),
    Removed(usize, usize),
    ListChanged,
}

impl From<&FilterEvent<'_>> for Recorded {
    fn from(event: &FilterEvent<'_>) -> Self {
        match *event {
            FilterEvent::CurrentFilterAboutToChange => Self::AboutToChange,
            FilterEvent::CurrentFilterChanged {
                filter,
                descriptor,
                index,
            } => Self::Changed {
                index,
                filter: descriptor.map(|d| d.unique_id().to_owned()),
                is_new: filter.is_some_and(|f| f.is_new()),
            },
            FilterEvent::StatusChanged(message) => Self::Status(message.to_owned()),
            FilterEvent::AboutToReset => Self::AboutToReset,
            FilterEvent::RowsInserted { first, last } => Self::Inserted(first, last),
            FilterEvent::RowsRemoved { first, last } => Self::Removed(first, last),
            FilterEvent::ListChanged => Self::ListChanged,
        }
    }
}

/// Records every event a controller publishes.
#[derive(Debug, Clone, Default)]
pub(crate) struct EventLog(Rc<RefCell<Vec<Recorded>>>);

impl EventLog {
    pub(crate) fn subscribe_to(controller: &mut FilterController) -> Self {
        let log = Self::default();
        let sink = Rc::clone(&log.0);
        controller.subscribe(move |event| sink.borrow_mut().push(Recorded::from(event)));
        log
    }

    /// Drains the recorded events.
    pub(crate) fn take(&self) -> Vec<Recorded> {
        self.0.take()
    }

    /// Returns the indices carried by recorded selection changes.
    pub(crate) fn selection_changes(&self) -> Vec<Option<usize>> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Recorded::Changed { index, .. } => Some(*index),
                _ => None,
            })
            .collect()
    }

    /// Returns the recorded status messages.
    pub(crate) fn statuses(&self) -> Vec<String> {
        self.0
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Recorded::Status(message) => Some(message.clone()),
                _ => None,
            })
            .collect()
    }
}

/// Registry with a single-instance blur, a brightness, and a volume filter.
pub(crate) fn sample_registry() -> MetadataRegistry {
    MetadataRegistry::from_descriptors([
        FilterDescriptor::new("Blur", "boxblur")
            .with_unique_id("blur")
            .with_single_instance(true),
        FilterDescriptor::new("Brightness", "brightness"),
        FilterDescriptor::new("Volume", "volume").with_audio(true),
    ])
    .expect("sample registry has unique ids")
}
