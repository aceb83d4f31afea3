//! Filter discovery, attachment, and selection for `stackfx`.
//!
//! The `stackfx-filters` crate implements the filter attachment controller:
//! it discovers effect-filter descriptors on disk, keeps the ordered list of
//! filters attached to a media producer, and tracks which attached filter is
//! active for editing. The media engine itself stays outside the crate and is
//! reached through the seams in [`engine`].
//!
//! # Architecture
//!
//! - [`discovery`] walks a plugin root, parses `meta*.json` descriptors, and
//!   keeps only those whose backend service the engine can provide.
//! - [`MetadataRegistry`] owns the discovered [`FilterDescriptor`]s in
//!   discovery order.
//! - [`AttachedFilters`] binds descriptors to live filters on the current
//!   [`Producer`] and reports every structural change to an
//!   [`AttachedFiltersObserver`].
//! - [`FilterController`] owns both collections, drives the selection state
//!   machine from the list's notifications, and publishes [`FilterEvent`]s to
//!   subscribers.
//!
//! # Example
//!
//! ```rust,no_run
//! use stackfx_filters::engine::{MemoryProducer, NoRefresh, StaticRepository};
//! use stackfx_filters::settings::NoSettings;
//! use stackfx_filters::FilterController;
//!
//! let repository = StaticRepository::new(["boxblur", "brightness"]);
//! let mut controller = FilterController::new(
//!     "/usr/share/stackfx/filters",
//!     Box::new(repository),
//!     Box::new(NoSettings),
//!     Box::new(NoRefresh),
//! );
//!
//! // Discovery runs on the first idle tick.
//! controller.process_idle().expect("plugin root exists");
//! controller.set_producer(Box::new(MemoryProducer::new()));
//! let index = controller.attach_by_id("blur", None).expect("blur attaches");
//! assert_eq!(controller.current_index(), Some(index));
//! ```

pub mod attached;
pub mod controller;
pub mod descriptor;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod registry;
pub mod settings;

#[cfg(test)]
mod tests;

pub use self::attached::{AttachedFilters, AttachedFiltersObserver, AttachmentEntry};
pub use self::controller::{ActiveFilter, DiscoveryState, FilterController, FilterEvent};
pub use self::descriptor::FilterDescriptor;
pub use self::discovery::{DiscoveryReport, SkipReason, SkippedDescriptor, discover};
pub use self::engine::{
    EngineError, FilterHandle, LiveFilter, PipelineRefresh, Producer, ServiceRepository,
};
pub use self::error::FilterError;
pub use self::registry::MetadataRegistry;
