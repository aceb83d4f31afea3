//! Unit tests for plugin-root discovery.

use std::fs;

use rstest::{fixture, rstest};
use tempfile::TempDir;

use super::*;
use crate::engine::StaticRepository;
use crate::settings::{DescriptorSettings, NoSettings};
use crate::tests::{MockRepository, write_descriptor};

struct FavouriteBlur;

impl SettingsStore for FavouriteBlur {
    fn load(&self, unique_id: &str) -> DescriptorSettings {
        DescriptorSettings {
            favorite: unique_id == "blur",
        }
    }
}

#[fixture]
fn plugin_root() -> TempDir {
    let root = TempDir::new().expect("temp dir");
    write_descriptor(
        root.path(),
        "blur",
        "meta.json",
        r#"{ "name": "Blur", "mlt_service": "boxblur", "unique_id": "blur", "single_instance": true }"#,
    );
    write_descriptor(
        root.path(),
        "audio",
        "meta_volume.json",
        r#"{ "name": "Volume", "mlt_service": "volume" }"#,
    );
    write_descriptor(
        root.path(),
        "audio",
        "meta_gain.json",
        r#"{ "name": "Gain", "mlt_service": "volume", "unique_id": "gain" }"#,
    );
    write_descriptor(
        root.path(),
        "glow",
        "meta.json",
        r#"{ "name": "Glow", "mlt_service": "frei0r.glow" }"#,
    );
    write_descriptor(root.path(), "broken", "meta.json", "{ not json");
    write_descriptor(
        root.path(),
        "blur",
        "ui.json",
        r#"{ "name": "ignored", "mlt_service": "boxblur" }"#,
    );
    fs::write(root.path().join("meta.json"), "{}").expect("write stray root file");
    root
}

fn repository() -> StaticRepository {
    StaticRepository::new(["boxblur", "volume"])
}

#[rstest]
fn adds_available_descriptors_in_directory_then_file_order(plugin_root: TempDir) {
    let report = discover(plugin_root.path(), &repository(), &NoSettings).expect("discover");
    let ids: Vec<&str> = report.registry.iter().map(|d| d.unique_id()).collect();
    assert_eq!(ids, ["gain", "volume", "blur"]);
}

#[rstest]
fn stamps_package_directory(plugin_root: TempDir) {
    let report = discover(plugin_root.path(), &repository(), &NoSettings).expect("discover");
    let blur = report.registry.find("blur").expect("blur");
    assert_eq!(blur.path(), plugin_root.path().join("blur"));
    assert!(blur.is_single_instance());
}

#[rstest]
fn records_skipped_descriptors(plugin_root: TempDir) {
    let report = discover(plugin_root.path(), &repository(), &NoSettings).expect("discover");
    assert_eq!(report.skipped.len(), 2);
    assert!(report.skipped.iter().any(|s| matches!(
        &s.reason,
        SkipReason::BackendUnavailable { service } if service == "frei0r.glow"
    )));
    assert!(
        report
            .skipped
            .iter()
            .any(|s| matches!(s.reason, SkipReason::Malformed { .. })
                && s.path.ends_with("broken/meta.json"))
    );
}

#[rstest]
fn applies_persisted_settings(plugin_root: TempDir) {
    let report = discover(plugin_root.path(), &repository(), &FavouriteBlur).expect("discover");
    assert!(report.registry.find("blur").expect("blur").is_favorite());
    assert!(!report.registry.find("volume").expect("volume").is_favorite());
}

#[test]
fn duplicate_unique_id_keeps_first_discovered() {
    let root = TempDir::new().expect("temp dir");
    write_descriptor(
        root.path(),
        "a_blur",
        "meta.json",
        r#"{ "name": "Box Blur", "mlt_service": "boxblur", "unique_id": "blur" }"#,
    );
    write_descriptor(
        root.path(),
        "b_blur",
        "meta.json",
        r#"{ "name": "Other Blur", "mlt_service": "boxblur", "unique_id": "blur" }"#,
    );
    let report = discover(root.path(), &repository(), &NoSettings).expect("discover");
    assert_eq!(report.registry.len(), 1);
    assert_eq!(
        report.registry.find("blur").expect("blur").name(),
        "Box Blur"
    );
    assert!(matches!(
        report.skipped.first().map(|s| &s.reason),
        Some(SkipReason::DuplicateId { unique_id }) if unique_id == "blur"
    ));
}

#[test]
fn queries_repository_once_per_parsed_descriptor() {
    let root = TempDir::new().expect("temp dir");
    write_descriptor(
        root.path(),
        "blur",
        "meta.json",
        r#"{ "name": "Blur", "mlt_service": "boxblur" }"#,
    );
    write_descriptor(root.path(), "broken", "meta.json", "[]");

    let mut repository = MockRepository::new();
    repository
        .expect_has_filter()
        .withf(|service| service.to_string() == "boxblur")
        .times(1)
        .return_const(false);

    let report = discover(root.path(), &repository, &NoSettings).expect("discover");
    assert!(report.registry.is_empty());
    assert_eq!(report.skipped.len(), 2);
}

#[test]
fn empty_root_yields_empty_registry() {
    let root = TempDir::new().expect("temp dir");
    let report = discover(root.path(), &repository(), &NoSettings).expect("discover");
    assert!(report.registry.is_empty());
    assert!(report.skipped.is_empty());
}

#[test]
fn missing_root_is_fatal() {
    let root = TempDir::new().expect("temp dir");
    let missing = root.path().join("filters");
    let err = discover(&missing, &repository(), &NoSettings).expect_err("missing root");
    assert!(matches!(err, FilterError::PluginRoot { ref path, .. } if *path == missing));
}

#[rstest]
#[case::malformed(
    SkipReason::Malformed { message: String::from("missing field `name`") },
    "malformed: missing field `name`"
)]
#[case::backend(
    SkipReason::BackendUnavailable { service: String::from("frei0r.glow") },
    "backend service 'frei0r.glow' is unavailable"
)]
#[case::duplicate(
    SkipReason::DuplicateId { unique_id: String::from("blur") },
    "duplicate unique id 'blur'"
)]
fn skip_reasons_render_for_operators(#[case] reason: SkipReason, #[case] expected: &str) {
    assert_eq!(reason.to_string(), expected);
}
