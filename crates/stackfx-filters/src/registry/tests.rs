//! Unit tests for the metadata registry.

use rstest::{fixture, rstest};

use super::*;
use crate::engine::MemoryFilter;
use crate::settings::DescriptorSettings;

fn favourite(descriptor: FilterDescriptor) -> FilterDescriptor {
    descriptor.finalize(DescriptorSettings { favorite: true }, std::path::Path::new(""))
}

#[fixture]
fn populated_registry() -> MetadataRegistry {
    MetadataRegistry::from_descriptors([
        FilterDescriptor::new("Blur", "boxblur")
            .with_unique_id("blur")
            .with_keywords(vec!["soften".into()]),
        favourite(FilterDescriptor::new("Brightness", "brightness")),
        FilterDescriptor::new("Volume", "volume").with_audio(true),
        favourite(FilterDescriptor::new("Loader", "loader").with_hidden(true)),
    ])
    .expect("unique ids")
}

// ---------------------------------------------------------------------------
// Construction
// ---------------------------------------------------------------------------

#[test]
fn new_registry_is_empty() {
    let registry = MetadataRegistry::new();
    assert!(registry.is_empty());
    assert_eq!(registry.len(), 0);
    assert!(registry.get(0).is_none());
}

#[test]
fn push_rejects_duplicate_unique_id() {
    let mut registry = MetadataRegistry::new();
    registry
        .push(FilterDescriptor::new("Blur", "boxblur").with_unique_id("blur"))
        .expect("first push");
    let err = registry
        .push(FilterDescriptor::new("Gaussian Blur", "avfilter.gblur").with_unique_id("blur"))
        .expect_err("duplicate should fail");
    assert!(matches!(err, FilterError::DuplicateId { .. }));
    assert_eq!(registry.len(), 1);
    assert_eq!(registry.get(0).expect("first entry").name(), "Blur");
}

#[test]
fn legacy_id_collides_with_explicit_id() {
    let err = MetadataRegistry::from_descriptors([
        FilterDescriptor::new("Volume", "volume"),
        FilterDescriptor::new("Gain", "gain").with_unique_id("volume"),
    ])
    .expect_err("collision should fail");
    assert!(err.to_string().contains("volume"));
}

// ---------------------------------------------------------------------------
// Lookup
// ---------------------------------------------------------------------------

#[rstest]
fn preserves_insertion_order(populated_registry: MetadataRegistry) {
    let ids: Vec<&str> = populated_registry.iter().map(|d| d.unique_id()).collect();
    assert_eq!(ids, ["blur", "brightness", "volume", "loader"]);
}

#[rstest]
fn find_and_position_agree(populated_registry: MetadataRegistry) {
    let found = populated_registry.find("volume").expect("volume");
    assert_eq!(found.service(), "volume");
    assert_eq!(populated_registry.position("volume"), Some(2));
    assert!(populated_registry.find("missing").is_none());
}

#[rstest]
fn for_filter_prefers_stamped_unique_id(populated_registry: MetadataRegistry) {
    let filter = MemoryFilter::new("boxblur").with_property(UNIQUE_ID_PROPERTY, "blur");
    let found = populated_registry.for_filter(&filter).expect("resolved");
    assert_eq!(found.unique_id(), "blur");
}

#[rstest]
#[case::legacy("volume", Some("volume"))]
#[case::explicit_id_not_matched_by_service("boxblur", None)]
#[case::unknown("frei0r.glow", None)]
fn for_filter_falls_back_to_service(
    populated_registry: MetadataRegistry,
    #[case] service: &str,
    #[case] expected: Option<&str>,
) {
    let filter = MemoryFilter::new(service);
    let found = populated_registry.for_filter(&filter).map(|d| d.unique_id());
    assert_eq!(found, expected);
}

#[rstest]
fn visible_excludes_hidden(populated_registry: MetadataRegistry) {
    let visible = populated_registry.visible();
    assert_eq!(visible.len(), 3);
    assert!(visible.iter().all(|d| d.unique_id() != "loader"));
}

#[rstest]
fn favorites_exclude_hidden(populated_registry: MetadataRegistry) {
    let favorites: Vec<&str> = populated_registry
        .favorites()
        .iter()
        .map(|d| d.unique_id())
        .collect();
    assert_eq!(favorites, ["brightness"]);
}

#[rstest]
#[case::by_name("BLUR", 1)]
#[case::by_keyword("soft", 1)]
#[case::hidden_ignored("loader", 0)]
#[case::shared_letters("r", 2)]
fn search_matches_name_and_keywords(
    populated_registry: MetadataRegistry,
    #[case] query: &str,
    #[case] expected: usize,
) {
    assert_eq!(populated_registry.search(query).len(), expected);
}
