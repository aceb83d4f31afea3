//! Runs discovery for the configured plugin root and renders the results.

use std::cell::RefCell;
use std::io::Write;
use std::rc::Rc;
use std::sync::Arc;

use serde::Serialize;
use stackfx_config::Config;
use stackfx_filters::engine::{MemoryProducer, NoRefresh, ServiceRepository, StaticRepository};
use stackfx_filters::settings::{JsonSettingsStore, NoSettings, SettingsStore};
use stackfx_filters::{FilterController, FilterDescriptor, FilterEvent, SkippedDescriptor};
use tracing::debug;

use crate::AppError;

const CATALOGUE_TARGET: &str = "stackfx::cli";

/// Backend services as configured. An empty list trusts every service.
#[derive(Debug)]
enum ConfiguredServices {
    Any,
    Listed(StaticRepository),
}

impl ConfiguredServices {
    fn from_config(config: &Config) -> Self {
        if config.backend_services().is_empty() {
            debug!(
                target: CATALOGUE_TARGET,
                "no backend services configured; accepting every descriptor"
            );
            Self::Any
        } else {
            Self::Listed(StaticRepository::new(
                config.backend_services().iter().map(String::as_str),
            ))
        }
    }
}

impl ServiceRepository for ConfiguredServices {
    fn has_filter(&self, service: &str) -> bool {
        match self {
            Self::Any => true,
            Self::Listed(repository) => repository.has_filter(service),
        }
    }
}

/// Which discovered descriptors `list` prints.
#[derive(Debug, Default, Clone)]
pub(crate) struct ListOptions {
    pub(crate) all: bool,
    pub(crate) favorites: bool,
    pub(crate) search: Option<String>,
    pub(crate) json: bool,
}

#[derive(Serialize)]
struct DescriptorView<'a> {
    unique_id: &'a str,
    name: &'a str,
    service: &'a str,
    single_instance: bool,
    audio: bool,
    hidden: bool,
    favorite: bool,
    keywords: &'a [String],
}

impl<'a> From<&'a FilterDescriptor> for DescriptorView<'a> {
    fn from(descriptor: &'a FilterDescriptor) -> Self {
        Self {
            unique_id: descriptor.unique_id(),
            name: descriptor.name(),
            service: descriptor.service(),
            single_instance: descriptor.is_single_instance(),
            audio: descriptor.is_audio(),
            hidden: descriptor.is_hidden(),
            favorite: descriptor.is_favorite(),
            keywords: descriptor.keywords(),
        }
    }
}

#[derive(Serialize)]
struct SkippedView {
    path: String,
    reason: String,
}

impl From<&SkippedDescriptor> for SkippedView {
    fn from(skipped: &SkippedDescriptor) -> Self {
        Self {
            path: skipped.path.display().to_string(),
            reason: skipped.reason.to_string(),
        }
    }
}

/// Controller populated from the configured plugin root.
pub(crate) struct Catalogue {
    controller: FilterController,
}

impl Catalogue {
    /// Runs discovery with the configured services and settings.
    pub(crate) fn discover(config: &Config) -> Result<Self, AppError> {
        let settings: Box<dyn SettingsStore> = match config.settings_path() {
            Some(path) => Box::new(JsonSettingsStore::open(path)?),
            None => Box::new(NoSettings),
        };
        let mut controller = FilterController::new(
            config.plugin_root(),
            Box::new(ConfiguredServices::from_config(config)),
            settings,
            Box::new(NoRefresh),
        );
        controller.process_idle()?;
        Ok(Self { controller })
    }

    /// Writes the selected descriptors, one per line or as a JSON array.
    pub(crate) fn write_list<W: Write>(
        &self,
        options: &ListOptions,
        out: &mut W,
    ) -> Result<(), AppError> {
        let registry = self.controller.metadata();
        let mut selected: Vec<&Arc<FilterDescriptor>> = if options.all {
            registry.iter().collect()
        } else {
            registry.visible()
        };
        if options.favorites {
            selected.retain(|descriptor| descriptor.is_favorite());
        }
        if let Some(query) = options.search.as_deref() {
            let matches = registry.search(query);
            selected.retain(|descriptor| matches.iter().any(|m| Arc::ptr_eq(m, descriptor)));
        }

        if options.json {
            let views: Vec<DescriptorView<'_>> = selected
                .iter()
                .map(|descriptor| DescriptorView::from(Arc::as_ref(descriptor)))
                .collect();
            return write_json(out, &views);
        }
        for descriptor in selected {
            writeln!(
                out,
                "{}\t{}\t{}{}",
                descriptor.unique_id(),
                descriptor.name(),
                descriptor.service(),
                flags(descriptor)
            )
            .map_err(AppError::Write)?;
        }
        Ok(())
    }

    /// Writes the descriptor files discovery skipped.
    pub(crate) fn write_skipped<W: Write>(&self, json: bool, out: &mut W) -> Result<(), AppError> {
        let skipped = self.controller.skipped();
        if json {
            let views: Vec<SkippedView> = skipped.iter().map(SkippedView::from).collect();
            return write_json(out, &views);
        }
        for entry in skipped {
            writeln!(out, "{}: {}", entry.path.display(), entry.reason).map_err(AppError::Write)?;
        }
        Ok(())
    }

    /// Attaches `filters` in order to an empty in-memory producer and writes
    /// any status messages followed by the resulting chain. The selected
    /// entry is marked with `*`.
    pub(crate) fn write_attached<W: Write>(
        mut self,
        filters: &[String],
        out: &mut W,
    ) -> Result<(), AppError> {
        let statuses = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&statuses);
        self.controller.subscribe(move |event| {
            if let FilterEvent::StatusChanged(message) = event {
                sink.borrow_mut().push((*message).to_owned());
            }
        });
        self.controller.set_producer(Box::new(MemoryProducer::new()));

        for unique_id in filters {
            match self.controller.attach_by_id(unique_id, None) {
                Ok(_) => {}
                Err(error) if error.duplicate_index().is_some() => {}
                Err(error) => return Err(error.into()),
            }
        }

        for message in statuses.borrow().iter() {
            writeln!(out, "{message}").map_err(AppError::Write)?;
        }
        let current = self.controller.current_index();
        for (index, entry) in self.controller.attached().iter().enumerate() {
            let marker = if current == Some(index) { '*' } else { ' ' };
            let label = entry
                .descriptor()
                .map_or_else(|| entry.filter().service(), |descriptor| descriptor.name());
            writeln!(out, "{marker} {index} {label}").map_err(AppError::Write)?;
        }
        Ok(())
    }
}

fn flags(descriptor: &FilterDescriptor) -> String {
    [
        (descriptor.is_single_instance(), " [single]"),
        (descriptor.is_audio(), " [audio]"),
        (descriptor.is_hidden(), " [hidden]"),
        (descriptor.is_favorite(), " [favorite]"),
    ]
    .iter()
    .filter(|(set, _)| *set)
    .map(|(_, label)| *label)
    .collect()
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<(), AppError> {
    serde_json::to_writer_pretty(&mut *out, value).map_err(AppError::Serialise)?;
    out.write_all(b"\n").map_err(AppError::Write)?;
    out.flush().map_err(AppError::Write)
}
