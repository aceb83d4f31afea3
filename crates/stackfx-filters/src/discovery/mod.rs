//! One-shot discovery of filter packages under a plugin root.
//!
//! Every immediate subdirectory of the root is a filter package. Each package
//! may contain several `meta*.json` descriptors. Directories and files are
//! visited in name order so the resulting [`MetadataRegistry`] is
//! deterministic.
//!
//! Only an unreadable plugin root aborts discovery. Malformed descriptors,
//! descriptors whose backend service is missing from the engine, and
//! descriptors reusing an already registered unique id are skipped and
//! recorded in the [`DiscoveryReport`].

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::descriptor::{FilterDescriptor, is_descriptor_file};
use crate::engine::ServiceRepository;
use crate::error::FilterError;
use crate::registry::MetadataRegistry;
use crate::settings::SettingsStore;

const DISCOVERY_TARGET: &str = "stackfx::discovery";

/// Why a descriptor file did not make it into the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The file could not be parsed or failed validation.
    Malformed {
        /// Parser or validation message.
        message: String,
    },
    /// The engine does not provide the declared backend service.
    BackendUnavailable {
        /// Backend service the descriptor declared.
        service: String,
    },
    /// An earlier descriptor already registered the same unique id.
    DuplicateId {
        /// Conflicting unique id.
        unique_id: String,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed { message } => write!(f, "malformed: {message}"),
            Self::BackendUnavailable { service } => {
                write!(f, "backend service '{service}' is unavailable")
            }
            Self::DuplicateId { unique_id } => write!(f, "duplicate unique id '{unique_id}'"),
        }
    }
}

/// A descriptor file that discovery skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedDescriptor {
    /// Descriptor file path.
    pub path: PathBuf,
    /// Reason it was skipped.
    pub reason: SkipReason,
}

/// Outcome of a discovery pass.
#[derive(Debug, Clone, Default)]
pub struct DiscoveryReport {
    /// Descriptors accepted, in discovery order.
    pub registry: MetadataRegistry,
    /// Descriptor files that were skipped.
    pub skipped: Vec<SkippedDescriptor>,
}

/// Discovers filter descriptors under `root`.
///
/// # Errors
///
/// Returns [`FilterError::PluginRoot`] if `root` cannot be enumerated.
/// Problems with individual packages or descriptor files never fail the
/// pass.
pub fn discover(
    root: &Path,
    repository: &dyn ServiceRepository,
    settings: &dyn SettingsStore,
) -> Result<DiscoveryReport, FilterError> {
    let packages = sorted_entries(root, |path| path.is_dir()).map_err(|source| {
        FilterError::PluginRoot {
            path: root.to_path_buf(),
            source: Arc::new(source),
        }
    })?;

    let mut report = DiscoveryReport::default();
    for package in packages {
        let descriptors = match sorted_entries(&package, is_descriptor_path) {
            Ok(files) => files,
            Err(err) => {
                warn!(
                    target: DISCOVERY_TARGET,
                    package = %package.display(),
                    error = %err,
                    "skipping unreadable filter package"
                );
                continue;
            }
        };
        for file in descriptors {
            load_descriptor(&package, &file, repository, settings, &mut report);
        }
    }

    info!(
        target: DISCOVERY_TARGET,
        root = %root.display(),
        added = report.registry.len(),
        skipped = report.skipped.len(),
        "filter discovery finished"
    );
    Ok(report)
}

fn load_descriptor(
    package: &Path,
    file: &Path,
    repository: &dyn ServiceRepository,
    settings: &dyn SettingsStore,
    report: &mut DiscoveryReport,
) {
    debug!(
        target: DISCOVERY_TARGET,
        file = %file.display(),
        "reading filter metadata"
    );

    let descriptor = match FilterDescriptor::from_file(file) {
        Ok(descriptor) => descriptor,
        Err(err) => {
            warn!(target: DISCOVERY_TARGET, error = %err, "skipping malformed filter descriptor");
            report.skip(
                file,
                SkipReason::Malformed {
                    message: err.to_string(),
                },
            );
            return;
        }
    };

    if !repository.has_filter(descriptor.service()) {
        debug!(
            target: DISCOVERY_TARGET,
            filter = descriptor.unique_id(),
            service = descriptor.service(),
            "backend service unavailable"
        );
        report.skip(
            file,
            SkipReason::BackendUnavailable {
                service: descriptor.service().to_owned(),
            },
        );
        return;
    }

    let stored = settings.load(descriptor.unique_id());
    let finalized = descriptor.finalize(stored, package);
    let unique_id = finalized.unique_id().to_owned();
    let name = finalized.name().to_owned();
    match report.registry.push(finalized) {
        Ok(()) => {
            info!(target: DISCOVERY_TARGET, filter = %unique_id, name = %name, "added filter");
        }
        Err(err) => {
            warn!(target: DISCOVERY_TARGET, error = %err, "skipping duplicate filter descriptor");
            report.skip(file, SkipReason::DuplicateId { unique_id });
        }
    }
}

impl DiscoveryReport {
    fn skip(&mut self, path: &Path, reason: SkipReason) {
        self.skipped.push(SkippedDescriptor {
            path: path.to_path_buf(),
            reason,
        });
    }
}

fn is_descriptor_path(path: &Path) -> bool {
    path.is_file()
        && path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_descriptor_file)
}

fn sorted_entries(
    directory: &Path,
    keep: impl Fn(&Path) -> bool,
) -> Result<Vec<PathBuf>, std::io::Error> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(directory)? {
        let path = entry?.path();
        if keep(&path) {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(test)]
mod tests;
